//! State evaluation for search agents.
//!
//! Every [`Feature`] is a raw sub-score scaled by a fixed normalization into
//! a roughly unit range, so weight vectors stay comparable across presets and
//! can be tuned externally. [`Weighted`] composes features into a preset.

use smallvec::SmallVec;
use strum::{Display, EnumIter};

use crate::board::dice_probability;
use crate::game::players::{MAX_CITIES, MAX_ROADS, MAX_SETTLEMENTS};
use crate::game::state::MAX_CARDS_IN_HAND;
use crate::game::{
    COST_CITY, COST_DEVELOPMENT, COST_ROAD, COST_SETTLEMENT, GameSession, Hand, Player, PlayerId,
};
use crate::types::{Resource, TileKind};

/// Terminal bonus (or penalty) once the game has a winner.
pub const GAME_WON_SCORE: f64 = 100_000.0;

const NUM_HARBOR_KINDS: f64 = 6.0;
const BUILD_IN_GOOD_PLACES_BOUND: f64 = 227.5;
const PREFER_RESOURCES_BOUND: f64 = 150.0;
const ENOUGH_RESOURCES_BOUND: f64 = 3.0;
const CAN_BUY_BOUND: f64 = 15.0;

pub trait Heuristic: Send + Sync {
    fn value(&self, session: &GameSession, player: PlayerId) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    VictoryPoints,
    Harbors,
    GameWon,
    Roads,
    Settlements,
    Cities,
    AvoidThrow,
    DevCards,
    ResourceDiversity,
    BuildInGoodPlaces,
    EnoughResources,
    PreferResourcesPerStage,
    Probability,
    LongestRoad,
    OpponentScore,
    CanBuy,
    HandSize,
    HandDiversity,
}

impl Feature {
    pub fn normalization(self) -> f64 {
        match self {
            Feature::VictoryPoints => 1.0 / 10.0,
            Feature::Harbors => 1.0 / NUM_HARBOR_KINDS,
            Feature::Roads | Feature::LongestRoad => 1.0 / MAX_ROADS as f64,
            Feature::Settlements => 1.0 / MAX_SETTLEMENTS as f64,
            Feature::Cities => 1.0 / MAX_CITIES as f64,
            Feature::AvoidThrow => 1.0 / (MAX_CARDS_IN_HAND + 1) as f64,
            Feature::DevCards => 1.0 / (Hand::development_deck().size() + 1) as f64,
            Feature::ResourceDiversity | Feature::HandDiversity => {
                1.0 / Resource::ALL.len() as f64
            }
            Feature::BuildInGoodPlaces => 1.0 / BUILD_IN_GOOD_PLACES_BOUND,
            Feature::EnoughResources => 1.0 / ENOUGH_RESOURCES_BOUND,
            Feature::PreferResourcesPerStage => 1.0 / PREFER_RESOURCES_BOUND,
            Feature::CanBuy => 1.0 / CAN_BUY_BOUND,
            Feature::HandSize => 1.0 / MAX_CARDS_IN_HAND as f64,
            Feature::GameWon | Feature::Probability | Feature::OpponentScore => 1.0,
        }
    }

    /// Normalized score of `player` in `session`.
    pub fn score(self, session: &GameSession, player: &Player) -> f64 {
        self.raw(session, player) * self.normalization()
    }

    fn raw(self, session: &GameSession, player: &Player) -> f64 {
        let hand = player.resource_hand();
        match self {
            Feature::VictoryPoints => player.victory_points() as f64,
            Feature::Harbors => player.harbors().len() as f64,
            Feature::GameWon => match session.winner() {
                Some(winner) if winner == player.id() => GAME_WON_SCORE,
                Some(_) => -GAME_WON_SCORE,
                None => 0.0,
            },
            Feature::Roads => player.num_roads() as f64,
            Feature::Settlements => player.num_settlements() as f64,
            Feature::Cities => player.num_cities() as f64,
            Feature::AvoidThrow => {
                let size = hand.size();
                if size > MAX_CARDS_IN_HAND {
                    MAX_CARDS_IN_HAND as f64 - size as f64
                } else {
                    0.0
                }
            }
            Feature::DevCards => {
                (player.dev_hand().size() + 2 * player.used_dev_hand().size()) as f64
            }
            Feature::ResourceDiversity | Feature::HandDiversity => {
                hand.resource_kinds().count() as f64
            }
            Feature::BuildInGoodPlaces => build_in_good_places(session, player),
            Feature::EnoughResources => [
                (COST_ROAD, 0.5),
                (COST_SETTLEMENT, 1.0),
                (COST_CITY, 1.5),
                (COST_DEVELOPMENT, 1.0),
            ]
            .iter()
            .filter(|(cost, _)| hand.contains(cost))
            .map(|(_, score)| score)
            .sum(),
            Feature::PreferResourcesPerStage => prefer_resources_per_stage(player),
            Feature::Probability => {
                let board = session.board();
                board.probability_score(player, false)
                    + board.expectation_score(player)
                    + session.potential_probability_score(player.id())
            }
            Feature::LongestRoad => session.board().longest_road_length(player) as f64,
            Feature::OpponentScore => opponent_score(session, player),
            Feature::CanBuy => can_buy(hand),
            Feature::HandSize => hand.size().min(MAX_CARDS_IN_HAND) as f64,
        }
    }
}

impl Heuristic for Feature {
    fn value(&self, session: &GameSession, player: PlayerId) -> f64 {
        session
            .player(player)
            .map(|p| self.score(session, p))
            .unwrap_or(0.0)
    }
}

/// Tile count times distinct tile kinds times summed roll probability, over
/// the player's settlements.
fn build_in_good_places(session: &GameSession, player: &Player) -> f64 {
    let board = session.board();
    let mut kinds: SmallVec<[TileKind; 6]> = SmallVec::new();
    let mut num_tiles = 0usize;
    let mut probability = 0.0;
    for node in player.settlements() {
        for tile in node.tiles().iter().map(|t| board.tile(*t)) {
            num_tiles += 1;
            if !kinds.contains(&tile.kind()) {
                kinds.push(tile.kind());
            }
            probability += dice_probability(tile.token());
        }
    }
    num_tiles as f64 * kinds.len() as f64 * probability
}

/// Favors brick and forest early and ore, sheep and wheat once the player has
/// built out. Zero before anything is built.
fn prefer_resources_per_stage(player: &Player) -> f64 {
    let hand = player.resource_hand();
    let count = |r: Resource| hand.count(r) as f64;
    let buildings = (player.num_roads() + player.num_settlements() + player.num_cities()) as f64;
    if buildings == 0.0 {
        return 0.0;
    }
    let (forest, brick, sheep, wheat, ore) = (
        count(Resource::Forest),
        count(Resource::Brick),
        count(Resource::Sheep),
        count(Resource::Wheat),
        count(Resource::Ore),
    );
    100.0 * (0.8 * forest + 1.2 * brick + 0.3 * sheep + 0.3 * wheat)
        / (buildings * (1.0 + 0.75 * sheep + 0.75 * wheat + 1.5 * ore))
}

/// Inverse strength of the leading opponent; weaker leaders score higher.
fn opponent_score(session: &GameSession, player: &Player) -> f64 {
    let Some(leader) = session
        .opponents(player.id())
        .min_by_key(|p| std::cmp::Reverse(p.victory_points()))
    else {
        return 0.0;
    };
    let strength = Feature::HandSize.score(session, leader)
        + 10.0 * Feature::VictoryPoints.score(session, leader)
        + 1.5 * Feature::LongestRoad.score(session, leader);
    if strength == 0.0 { 0.0 } else { 1.0 / strength }
}

/// Partial credit for each cost card already held, plus a bonus when the
/// hand covers a cost twice over.
fn can_buy(hand: &Hand) -> f64 {
    let mut score = 0.0;
    for (cost, reward) in [
        (COST_ROAD, 0.5),
        (COST_SETTLEMENT, 1.0),
        (COST_CITY, 2.0),
        (COST_DEVELOPMENT, 0.5),
    ] {
        let partial = reward / cost.size() as f64;
        score += cost.cards().filter(|c| hand.count(*c) > 0).count() as f64 * partial;
        let mut twice = cost;
        twice.insert(&cost);
        if hand.contains(&twice) {
            score += 2.0 * reward;
        }
    }
    score
}

pub const EVERYTHING_FEATURES: [Feature; 9] = [
    Feature::Probability,
    Feature::VictoryPoints,
    Feature::LongestRoad,
    Feature::GameWon,
    Feature::HandSize,
    Feature::HandDiversity,
    Feature::DevCards,
    Feature::CanBuy,
    Feature::OpponentScore,
];

pub const MAIN_FEATURES: [Feature; 12] = [
    Feature::VictoryPoints,
    Feature::Harbors,
    Feature::PreferResourcesPerStage,
    Feature::Roads,
    Feature::Settlements,
    Feature::Cities,
    Feature::ResourceDiversity,
    Feature::BuildInGoodPlaces,
    Feature::DevCards,
    Feature::GameWon,
    Feature::EnoughResources,
    Feature::AvoidThrow,
];

pub const EVERYTHING_WEIGHTS: [f64; 9] = [1.0, 30.0, 1.5, 1.0, 0.1, 0.1, 2.5, 1.0, 1.0];

pub const MAIN_WEIGHTS: [f64; 12] = [2.0, 0.8, 0.2, 0.6, 0.7, 2.5, 0.5, 5.0, 2.0, 1.0, 1.0, 0.01];

pub const BUILDER_WEIGHTS: [f64; 12] = [
    1.0, 0.01, 0.01, 1.0, 0.01, 1.0, 0.01, 1.0, 0.01, 1.0, 0.01, 0.01,
];

pub const AMOSS_COMB1_WEIGHTS: [f64; 12] = [
    2.0, 0.01, 0.01, 0.6, 0.01, 2.5, 0.01, 5.0, 2.0, 1.0, 0.01, 0.01,
];

pub const AMOSS_COMB2_WEIGHTS: [f64; 12] = [
    2.0, 0.01, 0.01, 0.01, 0.01, 0.01, 0.01, 5.0, 2.0, 1.0, 0.01, 0.01,
];

pub const AMOSS_COMB3_WEIGHTS: [f64; 12] = [
    2.0, 0.01, 0.01, 0.01, 0.01, 0.01, 0.5, 5.0, 0.01, 1.0, 0.01, 0.01,
];

pub const AMOSS_COMB4_WEIGHTS: [f64; 12] = [
    2.0, 0.01, 0.2, 0.01, 0.01, 0.01, 0.01, 5.0, 2.0, 1.0, 0.01, 0.01,
];

/// Everything-weights found by the external genetic search (generation 32).
pub const GENETIC1_WEIGHTS: [f64; 9] = [
    0.46428154, 0.82164505, 0.59430118, 0.33544462, 0.18126786, 0.05332921, 0.94682948,
    0.26080832, 0.45609072,
];

/// Everything-weights found by the external genetic search (generation 19).
pub const GENETIC2_WEIGHTS: [f64; 9] = [
    0.77197979, 0.8782323, 0.07241402, 0.82772027, 0.45152069, 0.17718227, 0.37266962,
    0.15663299, 0.19536229,
];

/// A weighted sum of features.
#[derive(Debug, Clone, PartialEq)]
pub struct Weighted {
    terms: Vec<(Feature, f64)>,
}

impl Weighted {
    pub fn new(terms: impl IntoIterator<Item = (Feature, f64)>) -> Self {
        Self {
            terms: terms.into_iter().collect(),
        }
    }

    pub fn everything(weights: [f64; 9]) -> Self {
        Self::new(EVERYTHING_FEATURES.into_iter().zip(weights))
    }

    pub fn main(weights: [f64; 12]) -> Self {
        Self::new(MAIN_FEATURES.into_iter().zip(weights))
    }

    pub fn builder_characteristic() -> Self {
        Self::main(BUILDER_WEIGHTS)
    }

    pub fn amoss_comb1() -> Self {
        Self::main(AMOSS_COMB1_WEIGHTS)
    }

    pub fn amoss_comb2() -> Self {
        Self::main(AMOSS_COMB2_WEIGHTS)
    }

    pub fn amoss_comb3() -> Self {
        Self::main(AMOSS_COMB3_WEIGHTS)
    }

    pub fn amoss_comb4() -> Self {
        Self::main(AMOSS_COMB4_WEIGHTS)
    }

    pub fn terms(&self) -> &[(Feature, f64)] {
        &self.terms
    }

    pub fn score(&self, session: &GameSession, player: &Player) -> f64 {
        self.terms
            .iter()
            .map(|(feature, weight)| feature.score(session, player) * weight)
            .sum()
    }
}

impl Default for Weighted {
    fn default() -> Self {
        Self::everything(EVERYTHING_WEIGHTS)
    }
}

impl Heuristic for Weighted {
    fn value(&self, session: &GameSession, player: PlayerId) -> f64 {
        session
            .player(player)
            .map(|p| self.score(session, p))
            .unwrap_or(0.0)
    }
}
