use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::board::harbor_at;
use crate::coords::{EdgeId, NodeId};
use crate::game::hand::{Hand, HandError};
use crate::game::state::GameError;
use crate::types::{Card, DevelopmentCard, Harbor};

pub const MAX_ROADS: usize = 15;
pub const MAX_SETTLEMENTS: usize = 5;
pub const MAX_CITIES: usize = 4;

pub const VP_SETTLEMENT: u8 = 1;
pub const VP_CITY: u8 = 2;
pub const VP_LONGEST_ROAD: u8 = 2;
pub const VP_LARGEST_ARMY: u8 = 2;
pub const VP_DEVELOPMENT_CARD: u8 = 1;

/// Stable seat identity. Equality of players is equality of ids, never names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PlayerId(u8);

impl PlayerId {
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out sequential ids while seating players, so identity never depends
/// on process-wide counters.
#[derive(Debug, Default)]
pub struct RosterBuilder {
    next_id: u8,
    players: Vec<Player>,
}

impl RosterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seats one more player. Fails once the id space is exhausted.
    pub fn add(&mut self, name: Option<&str>) -> Result<PlayerId, GameError> {
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or(GameError::InvalidPlayerCount(self.players.len() + 1))?;
        let id = PlayerId(self.next_id);
        let name = name
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Player{}", id.0));
        self.players.push(Player::new(id, name));
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn build(self) -> Vec<Player> {
        self.players
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    id: PlayerId,
    name: Arc<str>,
    resources: Hand,
    developments: Hand,
    used_developments: Hand,
    settlements: SmallVec<[NodeId; MAX_SETTLEMENTS]>,
    cities: SmallVec<[NodeId; MAX_CITIES]>,
    roads: SmallVec<[EdgeId; MAX_ROADS]>,
    has_longest_road: bool,
    has_largest_army: bool,
}

impl Player {
    fn new(id: PlayerId, name: String) -> Self {
        Self {
            id,
            name: name.into(),
            resources: Hand::empty(),
            developments: Hand::empty(),
            used_developments: Hand::empty(),
            settlements: SmallVec::new(),
            cities: SmallVec::new(),
            roads: SmallVec::new(),
            has_longest_road: false,
            has_largest_army: false,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_hand(&self) -> &Hand {
        &self.resources
    }

    pub fn resource_hand_size(&self) -> usize {
        self.resources.size()
    }

    /// Development cards not yet played.
    pub fn dev_hand(&self) -> &Hand {
        &self.developments
    }

    pub fn used_dev_hand(&self) -> &Hand {
        &self.used_developments
    }

    pub fn settlements(&self) -> &[NodeId] {
        &self.settlements
    }

    pub fn cities(&self) -> &[NodeId] {
        &self.cities
    }

    pub fn roads(&self) -> &[EdgeId] {
        &self.roads
    }

    /// Settlement and city nodes, settlements first.
    pub fn buildings(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.settlements.iter().chain(self.cities.iter()).copied()
    }

    pub fn num_settlements(&self) -> usize {
        self.settlements.len()
    }

    pub fn num_cities(&self) -> usize {
        self.cities.len()
    }

    pub fn num_roads(&self) -> usize {
        self.roads.len()
    }

    pub fn has_longest_road(&self) -> bool {
        self.has_longest_road
    }

    pub fn has_largest_army(&self) -> bool {
        self.has_largest_army
    }

    pub fn army_size(&self) -> usize {
        self.used_developments.count(Card::Knight) as usize
    }

    pub fn victory_points(&self) -> u8 {
        let mut vp = self.settlements.len() as u8 * VP_SETTLEMENT
            + self.cities.len() as u8 * VP_CITY
            + self.developments.count(Card::VictoryPoint) * VP_DEVELOPMENT_CARD;
        if self.has_longest_road {
            vp += VP_LONGEST_ROAD;
        }
        if self.has_largest_army {
            vp += VP_LARGEST_ARMY;
        }
        vp
    }

    /// One entry per building that sits on a harbor node.
    pub fn harbors(&self) -> Vec<Harbor> {
        self.buildings().filter_map(harbor_at).collect()
    }

    /// Distinct harbor kinds the player can trade through.
    pub fn harbor_kinds(&self) -> SmallVec<[Harbor; 6]> {
        let mut kinds = SmallVec::new();
        for harbor in self.buildings().filter_map(harbor_at) {
            if !kinds.contains(&harbor) {
                kinds.push(harbor);
            }
        }
        kinds
    }

    pub fn has_generic_harbor(&self) -> bool {
        self.buildings().any(|n| harbor_at(n) == Some(Harbor::Generic))
    }

    pub(crate) fn receive_cards(&mut self, cards: &Hand) {
        self.resources.insert(&cards.resources());
        self.developments.insert(&cards.developments());
    }

    pub(crate) fn throw_cards(&mut self, cards: &Hand) -> Result<(), HandError> {
        self.resources.remove(cards)
    }

    pub(crate) fn resources_mut(&mut self) -> &mut Hand {
        &mut self.resources
    }

    pub(crate) fn use_development(&mut self, card: DevelopmentCard) -> Result<(), HandError> {
        let used = Hand::of(card, 1);
        self.developments.remove(&used)?;
        self.used_developments.insert(&used);
        Ok(())
    }

    pub(crate) fn add_settlement(&mut self, node: NodeId) {
        self.settlements.push(node);
    }

    /// Replaces the settlement at `node` with a city.
    pub(crate) fn add_city(&mut self, node: NodeId) {
        self.settlements.retain(|n| *n != node);
        self.cities.push(node);
    }

    pub(crate) fn add_road(&mut self, edge: EdgeId) {
        self.roads.push(edge);
    }

    pub(crate) fn set_longest_road(&mut self, value: bool) {
        self.has_longest_road = value;
    }

    pub(crate) fn set_largest_army(&mut self, value: bool) {
        self.has_largest_army = value;
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Resource;

    fn node(coord: u8) -> NodeId {
        NodeId::new(coord).unwrap()
    }

    #[test]
    fn roster_allocates_sequential_ids() {
        let mut roster = RosterBuilder::new();
        let a = roster.add(Some("Roy")).unwrap();
        let b = roster.add(None).unwrap();
        assert_ne!(a, b);
        let players = roster.build();
        assert_eq!(players[0].name(), "Roy");
        assert_eq!(players[1].name(), format!("Player{}", b.get()));
    }

    #[test]
    fn roster_stops_when_ids_run_out() {
        let mut roster = RosterBuilder::new();
        for _ in 0..u8::MAX {
            roster.add(None).unwrap();
        }
        assert_eq!(
            roster.add(None),
            Err(GameError::InvalidPlayerCount(u8::MAX as usize + 1))
        );
        assert_eq!(roster.len(), u8::MAX as usize);
    }

    #[test]
    fn victory_points_are_derived() {
        let mut roster = RosterBuilder::new();
        roster.add(None).unwrap();
        let mut player = roster.build().remove(0);
        player.add_settlement(node(0x27));
        player.add_settlement(node(0x49));
        player.add_city(node(0x49));
        player.receive_cards(&Hand::of(DevelopmentCard::VictoryPoint, 1));
        player.set_largest_army(true);
        assert_eq!(player.num_settlements(), 1);
        assert_eq!(player.victory_points(), 1 + 2 + 1 + 2);
    }

    #[test]
    fn harbors_follow_buildings() {
        let mut roster = RosterBuilder::new();
        roster.add(None).unwrap();
        let mut player = roster.build().remove(0);
        player.add_settlement(node(0x27));
        player.add_settlement(node(0x25));
        player.add_city(node(0x25));
        assert_eq!(
            player.harbors(),
            vec![Harbor::Generic, Harbor::Special(Resource::Ore)]
        );
        assert!(player.has_generic_harbor());
    }

    #[test]
    fn playing_a_development_moves_it_to_used() {
        let mut roster = RosterBuilder::new();
        roster.add(None).unwrap();
        let mut player = roster.build().remove(0);
        player.receive_cards(&Hand::of(DevelopmentCard::Knight, 1).with(Card::Ore, 2));
        assert_eq!(player.resource_hand_size(), 2);
        player.use_development(DevelopmentCard::Knight).unwrap();
        assert_eq!(player.army_size(), 1);
        assert!(player.use_development(DevelopmentCard::Knight).is_err());
    }
}
