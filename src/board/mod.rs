use once_cell::sync::Lazy;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::coords::{EdgeId, NUM_TILES, NodeId, TileId};
use crate::game::hand::{COST_CITY, COST_ROAD, COST_SETTLEMENT, Hand};
use crate::game::players::{Player, PlayerId};
use crate::types::{BuildingKind, Harbor, Resource, TileKind};

mod roads;

/// The 19 hexes before shuffling.
pub const HEX_DECK: [TileKind; NUM_TILES] = [
    TileKind::Yield(Resource::Ore),
    TileKind::Yield(Resource::Ore),
    TileKind::Yield(Resource::Ore),
    TileKind::Yield(Resource::Brick),
    TileKind::Yield(Resource::Brick),
    TileKind::Yield(Resource::Brick),
    TileKind::Yield(Resource::Wheat),
    TileKind::Yield(Resource::Wheat),
    TileKind::Yield(Resource::Wheat),
    TileKind::Yield(Resource::Wheat),
    TileKind::Yield(Resource::Sheep),
    TileKind::Yield(Resource::Sheep),
    TileKind::Yield(Resource::Sheep),
    TileKind::Yield(Resource::Sheep),
    TileKind::Yield(Resource::Forest),
    TileKind::Yield(Resource::Forest),
    TileKind::Yield(Resource::Forest),
    TileKind::Yield(Resource::Forest),
    TileKind::Desert,
];

/// Dice tokens handed out in tile-id order, skipping the robber's desert.
pub const TOKEN_ORDER: [u8; 18] = [5, 2, 6, 3, 8, 10, 9, 12, 11, 4, 8, 10, 9, 4, 5, 6, 3, 11];

pub const BANK_TRADE_RATIO: u8 = 4;
pub const GENERIC_HARBOR_RATIO: u8 = 3;
pub const SPECIAL_HARBOR_RATIO: u8 = 2;

const HARBOR_NODES: [(Harbor, &[u8]); 6] = [
    (Harbor::Special(Resource::Sheep), &[0x5a, 0x6b]),
    (Harbor::Special(Resource::Ore), &[0x25, 0x34]),
    (Harbor::Special(Resource::Brick), &[0xc9, 0xda]),
    (Harbor::Special(Resource::Forest), &[0xa5, 0xb6]),
    (Harbor::Special(Resource::Wheat), &[0x43, 0x52]),
    (Harbor::Generic, &[0x72, 0x83, 0x27, 0x38, 0x9c, 0xad, 0xcd, 0xdc]),
];

static HARBOR_BY_NODE: Lazy<[Option<Harbor>; 256]> = Lazy::new(|| {
    let mut table = [None; 256];
    for (harbor, nodes) in HARBOR_NODES {
        for &coord in nodes {
            table[coord as usize] = Some(harbor);
        }
    }
    table
});

pub fn harbor_at(node: NodeId) -> Option<Harbor> {
    HARBOR_BY_NODE[node.coord() as usize]
}

/// Chance of rolling `sum` with two six-sided dice.
pub fn dice_probability(sum: u8) -> f64 {
    if !(2..=12).contains(&sum) {
        return 0.0;
    }
    (6 - (7 - sum as i32).abs()) as f64 / 36.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    id: TileId,
    kind: TileKind,
    token: u8,
    robber: bool,
}

impl Tile {
    pub fn id(&self) -> TileId {
        self.id
    }

    pub fn kind(&self) -> TileKind {
        self.kind
    }

    pub fn resource(&self) -> Option<Resource> {
        self.kind.resource()
    }

    /// Dice value that makes this tile yield; 0 on the robber's starting desert.
    pub fn token(&self) -> u8 {
        self.token
    }

    pub fn has_robber(&self) -> bool {
        self.robber
    }

    pub fn is_desert(&self) -> bool {
        self.kind == TileKind::Desert
    }
}

/// Where a structure sits. Settlements and cities occupy nodes, roads occupy edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placement {
    Settlement(NodeId),
    City(NodeId),
    Road(EdgeId),
}

impl Placement {
    pub fn kind(self) -> BuildingKind {
        match self {
            Placement::Settlement(_) => BuildingKind::Settlement,
            Placement::City(_) => BuildingKind::City,
            Placement::Road(_) => BuildingKind::Road,
        }
    }

    pub fn coord(self) -> u8 {
        match self {
            Placement::Settlement(node) | Placement::City(node) => node.coord(),
            Placement::Road(edge) => edge.coord(),
        }
    }

    pub fn cost(self) -> Hand {
        match self {
            Placement::Settlement(_) => COST_SETTLEMENT,
            Placement::City(_) => COST_CITY,
            Placement::Road(_) => COST_ROAD,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Buildable {
    pub owner: PlayerId,
    pub placement: Placement,
}

impl Buildable {
    pub fn new(owner: PlayerId, placement: Placement) -> Self {
        Self { owner, placement }
    }

    pub fn kind(&self) -> BuildingKind {
        self.placement.kind()
    }

    /// Cards a node building yields per matching roll.
    fn yield_multiplier(&self) -> u8 {
        match self.placement {
            Placement::City(_) => 2,
            _ => 1,
        }
    }
}

/// Tiles, robber and structure occupancy. Occupancy is stored in flat
/// coordinate-indexed arrays so a branch copy is a plain memcpy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    tiles: [Tile; NUM_TILES],
    robber: TileId,
    nodes: [Option<Buildable>; 256],
    edges: [Option<Buildable>; 256],
}

impl Board {
    /// Shuffles the hex deck and lays out tokens and robber.
    pub fn new<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = HEX_DECK;
        deck.shuffle(rng);
        Self::lay_out(deck)
    }

    /// Builds a board from an explicit tile order. Returns `None` when the
    /// layout has no desert to hold the robber.
    pub fn from_layout(kinds: [TileKind; NUM_TILES]) -> Option<Self> {
        if kinds.contains(&TileKind::Desert) {
            Some(Self::lay_out(kinds))
        } else {
            None
        }
    }

    fn lay_out(kinds: [TileKind; NUM_TILES]) -> Self {
        let mut tokens = TOKEN_ORDER.iter().copied();
        let mut robber = None;
        let tiles: [Tile; NUM_TILES] = std::array::from_fn(|idx| {
            let id = TileId::ALL[idx];
            let kind = kinds[idx];
            if kind == TileKind::Desert && robber.is_none() {
                robber = Some(id);
                Tile {
                    id,
                    kind,
                    token: 0,
                    robber: true,
                }
            } else {
                Tile {
                    id,
                    kind,
                    token: tokens.next().unwrap_or(0),
                    robber: false,
                }
            }
        });
        let robber = robber.unwrap_or(TileId::ALL[0]);
        Self {
            tiles,
            robber,
            nodes: [None; 256],
            edges: [None; 256],
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, id: TileId) -> &Tile {
        &self.tiles[id.index()]
    }

    pub fn robber_tile(&self) -> TileId {
        self.robber
    }

    pub fn move_robber_to(&mut self, tile: TileId) {
        self.tiles[self.robber.index()].robber = false;
        self.tiles[tile.index()].robber = true;
        self.robber = tile;
    }

    pub fn node(&self, node: NodeId) -> Option<&Buildable> {
        self.nodes[node.coord() as usize].as_ref()
    }

    pub fn edge(&self, edge: EdgeId) -> Option<&Buildable> {
        self.edges[edge.coord() as usize].as_ref()
    }

    /// Occupied nodes in coordinate order.
    pub fn nodes(&self) -> impl Iterator<Item = &Buildable> + '_ {
        self.nodes.iter().flatten()
    }

    /// Occupied edges in coordinate order.
    pub fn edges(&self) -> impl Iterator<Item = &Buildable> + '_ {
        self.edges.iter().flatten()
    }

    /// Records a structure. A city takes over the settlement slot at its node.
    pub fn build(&mut self, buildable: Buildable) {
        let slot = match buildable.placement {
            Placement::Settlement(node) | Placement::City(node) => {
                &mut self.nodes[node.coord() as usize]
            }
            Placement::Road(edge) => &mut self.edges[edge.coord() as usize],
        };
        *slot = Some(buildable);
    }

    /// Distance rule: the node and every neighbor are free.
    pub fn is_settleable(&self, node: NodeId) -> bool {
        self.node(node).is_none() && node.neighbors().iter().all(|n| self.node(*n).is_none())
    }

    pub fn owner_at(&self, node: NodeId) -> Option<PlayerId> {
        self.node(node).map(|b| b.owner)
    }

    /// Cards owed to each player for a roll, in first-credited order.
    /// Robber tiles yield nothing and the decks are not touched.
    pub fn resource_distribution(&self, dice_sum: u8) -> Vec<(PlayerId, Hand)> {
        let mut dist: Vec<(PlayerId, Hand)> = Vec::new();
        for tile in self.tiles.iter().filter(|t| t.token == dice_sum && !t.robber) {
            let Some(resource) = tile.resource() else {
                continue;
            };
            for node in tile.id.nodes() {
                let Some(building) = self.node(*node) else {
                    continue;
                };
                let amount = building.yield_multiplier();
                match dist.iter_mut().find(|(owner, _)| *owner == building.owner) {
                    Some((_, hand)) => hand.add(resource, amount),
                    None => dist.push((building.owner, Hand::of(resource, amount))),
                }
            }
        }
        dist
    }

    /// One card per non-desert tile touching `node`.
    pub fn resource_distribution_by_node(&self, node: NodeId) -> Hand {
        node.tiles()
            .iter()
            .filter_map(|t| self.tile(*t).resource())
            .map(Resource::card)
            .collect()
    }

    /// Distinct resource kinds the player's buildings can ever collect.
    pub fn resources_player_can_get(&self, player: &Player) -> Vec<Resource> {
        let mut reachable = Hand::empty();
        for node in player.buildings() {
            reachable.insert(&self.resource_distribution_by_node(node));
        }
        reachable.resource_kinds().collect()
    }

    pub fn harbors_of(&self, player: &Player) -> Vec<Harbor> {
        player.harbors()
    }

    /// Chance the player collects anything on a roll: the distinct tokens
    /// around their buildings. Robber tiles are skipped unless
    /// `exclude_robber` is set.
    pub fn probability_score(&self, player: &Player, exclude_robber: bool) -> f64 {
        let mut seen = [false; 13];
        for node in player.buildings() {
            for tile in node.tiles().iter().map(|t| self.tile(*t)) {
                if exclude_robber || !tile.robber {
                    seen[tile.token as usize % 13] = true;
                }
            }
        }
        seen.iter()
            .enumerate()
            .filter(|(_, hit)| **hit)
            .map(|(token, _)| dice_probability(token as u8))
            .sum()
    }

    /// Expected cards per roll, counting cities twice.
    pub fn expectation_score(&self, player: &Player) -> f64 {
        let weighted = player
            .settlements()
            .iter()
            .map(|n| (*n, 1.0))
            .chain(player.cities().iter().map(|n| (*n, 2.0)));
        weighted
            .flat_map(|(node, weight)| {
                node.tiles()
                    .iter()
                    .map(move |t| dice_probability(self.tile(*t).token) * weight)
            })
            .sum()
    }
}
