#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod board;
pub mod cli;
pub mod coords;
pub mod game;
pub mod players;
pub mod types;

pub use board::{Board, Placement, Tile};
pub use coords::{EdgeId, NodeId, TileId, TopologyError};
pub use game::{Game, GameConfig, GameError, GamePhase, GameSession, Hand, Move, MoveKind, PlayerId};
pub use players::{Agent, SearchBudget};
pub use types::{Card, DevelopmentCard, Resource};
