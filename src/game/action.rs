use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::board::Placement;
use crate::coords::TileId;
use crate::game::hand::Hand;
use crate::game::players::PlayerId;
use crate::types::{BuildingKind, DevelopmentCard, Resource};

/// One proposed action. A move carries everything needed to replay it, so two
/// moves are interchangeable exactly when they compare equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Move {
    Pass {
        player: PlayerId,
    },
    BuyDevelopment {
        player: PlayerId,
    },
    /// Robber move. `robber_activated` marks the forced move after a 7, which
    /// does not consume a knight card.
    UseKnight {
        player: PlayerId,
        tile: TileId,
        victim: Option<PlayerId>,
        robber_activated: bool,
    },
    UseMonopoly {
        player: PlayerId,
        resource: Resource,
    },
    UseYearOfPlenty {
        player: PlayerId,
        resources: [Resource; 2],
    },
    UseRoadBuilding {
        player: PlayerId,
    },
    Build {
        player: PlayerId,
        placement: Placement,
        free: bool,
    },
    Trade {
        player: PlayerId,
        gives: Hand,
        gets: Hand,
    },
    Throw {
        player: PlayerId,
        cards: Hand,
    },
}

/// Coarse move categories, used for category-first sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum MoveKind {
    Pass,
    BuyDevelopment,
    UseDevelopment,
    Build,
    Trade,
    Throw,
}

impl Move {
    pub fn player(&self) -> PlayerId {
        match *self {
            Move::Pass { player }
            | Move::BuyDevelopment { player }
            | Move::UseKnight { player, .. }
            | Move::UseMonopoly { player, .. }
            | Move::UseYearOfPlenty { player, .. }
            | Move::UseRoadBuilding { player }
            | Move::Build { player, .. }
            | Move::Trade { player, .. }
            | Move::Throw { player, .. } => player,
        }
    }

    pub fn kind(&self) -> MoveKind {
        match self {
            Move::Pass { .. } => MoveKind::Pass,
            Move::BuyDevelopment { .. } => MoveKind::BuyDevelopment,
            Move::UseKnight { .. }
            | Move::UseMonopoly { .. }
            | Move::UseYearOfPlenty { .. }
            | Move::UseRoadBuilding { .. } => MoveKind::UseDevelopment,
            Move::Build { .. } => MoveKind::Build,
            Move::Trade { .. } => MoveKind::Trade,
            Move::Throw { .. } => MoveKind::Throw,
        }
    }

    /// The card a development move plays. Forced robber moves play none.
    pub fn development(&self) -> Option<DevelopmentCard> {
        match self {
            Move::UseKnight {
                robber_activated: false,
                ..
            } => Some(DevelopmentCard::Knight),
            Move::UseKnight { .. } => None,
            Move::UseMonopoly { .. } => Some(DevelopmentCard::Monopoly),
            Move::UseYearOfPlenty { .. } => Some(DevelopmentCard::YearOfPlenty),
            Move::UseRoadBuilding { .. } => Some(DevelopmentCard::RoadBuilding),
            _ => None,
        }
    }

    /// Development card type used to group moves for sampling, including the
    /// forced knight.
    pub fn development_group(&self) -> Option<DevelopmentCard> {
        match self {
            Move::UseKnight { .. } => Some(DevelopmentCard::Knight),
            _ => self.development(),
        }
    }

    pub fn is_forced_knight(&self) -> bool {
        matches!(
            self,
            Move::UseKnight {
                robber_activated: true,
                ..
            }
        )
    }

    pub fn building_kind(&self) -> Option<BuildingKind> {
        match self {
            Move::Build { placement, .. } => Some(placement.kind()),
            _ => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Pass { player } => write!(f, "{player} passes"),
            Move::BuyDevelopment { player } => write!(f, "{player} buys a development card"),
            Move::UseKnight {
                player,
                tile,
                victim,
                robber_activated,
            } => {
                let source = if *robber_activated { "robber" } else { "knight" };
                match victim {
                    Some(victim) => write!(f, "{player} {source} to {tile}, robbing {victim}"),
                    None => write!(f, "{player} {source} to {tile}"),
                }
            }
            Move::UseMonopoly { player, resource } => {
                write!(f, "{player} monopoly on {resource}")
            }
            Move::UseYearOfPlenty { player, resources } => {
                write!(f, "{player} year of plenty {} + {}", resources[0], resources[1])
            }
            Move::UseRoadBuilding { player } => write!(f, "{player} road building"),
            Move::Build {
                player,
                placement,
                free,
            } => {
                let suffix = if *free { " (free)" } else { "" };
                write!(
                    f,
                    "{player} builds {} at {:#04x}{suffix}",
                    placement.kind(),
                    placement.coord()
                )
            }
            Move::Trade {
                player,
                gives,
                gets,
            } => write!(f, "{player} trades [{gives}] for [{gets}]"),
            Move::Throw { player, cards } => write!(f, "{player} throws [{cards}]"),
        }
    }
}
