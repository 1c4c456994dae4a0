use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    Forest,
    Ore,
    Brick,
    Sheep,
    Wheat,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Forest,
        Resource::Ore,
        Resource::Brick,
        Resource::Sheep,
        Resource::Wheat,
    ];

    pub const fn card(self) -> Card {
        match self {
            Resource::Forest => Card::Forest,
            Resource::Ore => Card::Ore,
            Resource::Brick => Card::Brick,
            Resource::Sheep => Card::Sheep,
            Resource::Wheat => Card::Wheat,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DevelopmentCard {
    Knight,
    VictoryPoint,
    Monopoly,
    YearOfPlenty,
    RoadBuilding,
}

impl DevelopmentCard {
    pub const ALL: [DevelopmentCard; 5] = [
        DevelopmentCard::Knight,
        DevelopmentCard::VictoryPoint,
        DevelopmentCard::Monopoly,
        DevelopmentCard::YearOfPlenty,
        DevelopmentCard::RoadBuilding,
    ];

    pub const fn card(self) -> Card {
        match self {
            DevelopmentCard::Knight => Card::Knight,
            DevelopmentCard::VictoryPoint => Card::VictoryPoint,
            DevelopmentCard::Monopoly => Card::Monopoly,
            DevelopmentCard::YearOfPlenty => Card::YearOfPlenty,
            DevelopmentCard::RoadBuilding => Card::RoadBuilding,
        }
    }

    /// Copies of each card in a fresh development deck.
    pub const fn deck_count(self) -> u8 {
        match self {
            DevelopmentCard::Knight => 14,
            DevelopmentCard::VictoryPoint => 5,
            DevelopmentCard::Monopoly => 2,
            DevelopmentCard::YearOfPlenty => 2,
            DevelopmentCard::RoadBuilding => 2,
        }
    }
}

/// Every tag a card multiset can hold. `Desert` and `Any` are board markers
/// (tile kind and generic harbor) and never sit in a player's hand.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Card {
    Forest,
    Ore,
    Brick,
    Sheep,
    Wheat,
    Desert,
    Any,
    Knight,
    VictoryPoint,
    Monopoly,
    YearOfPlenty,
    RoadBuilding,
}

impl Card {
    pub const COUNT: usize = 12;

    pub const ALL: [Card; Card::COUNT] = [
        Card::Forest,
        Card::Ore,
        Card::Brick,
        Card::Sheep,
        Card::Wheat,
        Card::Desert,
        Card::Any,
        Card::Knight,
        Card::VictoryPoint,
        Card::Monopoly,
        Card::YearOfPlenty,
        Card::RoadBuilding,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn class(self) -> CardClass {
        match self {
            Card::Knight
            | Card::VictoryPoint
            | Card::Monopoly
            | Card::YearOfPlenty
            | Card::RoadBuilding => CardClass::Development,
            _ => CardClass::Resource,
        }
    }

    pub const fn resource(self) -> Option<Resource> {
        match self {
            Card::Forest => Some(Resource::Forest),
            Card::Ore => Some(Resource::Ore),
            Card::Brick => Some(Resource::Brick),
            Card::Sheep => Some(Resource::Sheep),
            Card::Wheat => Some(Resource::Wheat),
            _ => None,
        }
    }

    pub const fn development(self) -> Option<DevelopmentCard> {
        match self {
            Card::Knight => Some(DevelopmentCard::Knight),
            Card::VictoryPoint => Some(DevelopmentCard::VictoryPoint),
            Card::Monopoly => Some(DevelopmentCard::Monopoly),
            Card::YearOfPlenty => Some(DevelopmentCard::YearOfPlenty),
            Card::RoadBuilding => Some(DevelopmentCard::RoadBuilding),
            _ => None,
        }
    }
}

impl From<Resource> for Card {
    fn from(resource: Resource) -> Self {
        resource.card()
    }
}

impl From<DevelopmentCard> for Card {
    fn from(card: DevelopmentCard) -> Self {
        card.card()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CardClass {
    Resource,
    Development,
}

/// What a tile yields. The desert is its own kind rather than `Option<Resource>`
/// so tile listings read the way the hex deck is counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TileKind {
    Yield(Resource),
    Desert,
}

impl TileKind {
    pub const fn resource(self) -> Option<Resource> {
        match self {
            TileKind::Yield(resource) => Some(resource),
            TileKind::Desert => None,
        }
    }
}

/// Trade bonus attached to a pair of coastal nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Harbor {
    Generic,
    Special(Resource),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display, EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildingKind {
    Settlement,
    City,
    Road,
}

impl BuildingKind {
    pub const ALL: [BuildingKind; 3] = [
        BuildingKind::Settlement,
        BuildingKind::City,
        BuildingKind::Road,
    ];
}
