pub mod action;
pub mod bank;
pub mod game;
pub mod hand;
mod legal;
pub mod players;
pub mod state;

pub use action::{Move, MoveKind};
pub use bank::Bank;
pub use game::Game;
pub use hand::{COST_CITY, COST_DEVELOPMENT, COST_ROAD, COST_SETTLEMENT, Hand, HandError};
pub use players::{Player, PlayerId, RosterBuilder};
pub use state::{GameConfig, GameError, GamePhase, GameSession};
