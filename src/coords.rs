//! Fixed hex-grid coordinate scheme for the 19-tile board.
//!
//! Tiles, nodes and edges share one byte-sized coordinate space: the high
//! nibble is the column and the low nibble the row. A tile at coordinate
//! `t` touches the nodes `t + {0x01, -0x10, -0x01, 0x10, 0x21, 0x12}` and
//! the edges `t + {-0x10, -0x11, -0x01, 0x10, 0x11, 0x01}`. The legal node
//! and edge sets are exactly the unions of those over all tiles, which gives
//! 54 nodes and 72 edges.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::Display;

pub const NUM_TILES: usize = 19;

/// Tile coordinates indexed by tile id (0-based, in spiral order from the
/// top-left tile).
pub const TILE_COORDS: [u8; NUM_TILES] = [
    0x37, 0x35, 0x33, 0x53, 0x73, 0x95, 0xB7, 0xB9, 0xBB, 0x9B, 0x7B, 0x59, 0x57, 0x55, 0x75,
    0x97, 0x99, 0x79, 0x77,
];

const TILE_NODE_OFFSETS: [i16; 6] = [0x01, -0x10, -0x01, 0x10, 0x21, 0x12];
const TILE_EDGE_OFFSETS: [i16; 6] = [-0x10, -0x11, -0x01, 0x10, 0x11, 0x01];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "lowercase")]
pub enum CoordKind {
    Node,
    Edge,
    Tile,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TopologyError {
    #[error("invalid {kind} coordinate {coord:#04x}")]
    InvalidCoordinate { kind: CoordKind, coord: u16 },
}

impl TopologyError {
    fn invalid(kind: CoordKind, coord: impl Into<u16>) -> Self {
        TopologyError::InvalidCoordinate {
            kind,
            coord: coord.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct NodeId(u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct EdgeId(u8);

/// A tile index in `0..19`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct TileId(u8);

struct Tables {
    node_legal: [bool; 256],
    edge_legal: [bool; 256],
    tile_by_coord: [Option<TileId>; 256],
    nodes: Vec<NodeId>,
    edges: Vec<EdgeId>,
    tile_nodes: Vec<[NodeId; 6]>,
    tile_edges: Vec<[EdgeId; 6]>,
    node_neighbors: Vec<SmallVec<[NodeId; 3]>>,
    node_edges: Vec<SmallVec<[EdgeId; 3]>>,
    node_tiles: Vec<SmallVec<[TileId; 3]>>,
    edge_nodes: Vec<[NodeId; 2]>,
}

static TABLES: Lazy<Tables> = Lazy::new(Tables::build);

fn shift(coord: u8, delta: i16) -> Option<u8> {
    u8::try_from(coord as i16 + delta).ok()
}

impl Tables {
    fn build() -> Self {
        let mut node_legal = [false; 256];
        let mut edge_legal = [false; 256];
        let mut tile_by_coord = [None; 256];
        let mut tile_nodes = Vec::with_capacity(NUM_TILES);
        let mut tile_edges = Vec::with_capacity(NUM_TILES);

        for (idx, &coord) in TILE_COORDS.iter().enumerate() {
            tile_by_coord[coord as usize] = Some(TileId(idx as u8));
            let mut nodes = [NodeId(0); 6];
            let mut edges = [EdgeId(0); 6];
            for (slot, offset) in TILE_NODE_OFFSETS.iter().enumerate() {
                let node = shift(coord, *offset).unwrap_or_default();
                node_legal[node as usize] = true;
                nodes[slot] = NodeId(node);
            }
            for (slot, offset) in TILE_EDGE_OFFSETS.iter().enumerate() {
                let edge = shift(coord, *offset).unwrap_or_default();
                edge_legal[edge as usize] = true;
                edges[slot] = EdgeId(edge);
            }
            tile_nodes.push(nodes);
            tile_edges.push(edges);
        }

        let nodes: Vec<NodeId> = (0..=255u8)
            .filter(|c| node_legal[*c as usize])
            .map(NodeId)
            .collect();
        let edges: Vec<EdgeId> = (0..=255u8)
            .filter(|c| edge_legal[*c as usize])
            .map(EdgeId)
            .collect();

        let mut node_neighbors = vec![SmallVec::new(); 256];
        let mut node_edges = vec![SmallVec::new(); 256];
        let mut node_tiles = vec![SmallVec::new(); 256];
        for node in &nodes {
            let n = node.0;
            let odd = n % 2 == 1;
            let neighbor_offsets: [i16; 3] = if odd {
                [-0x11, 0x11, 0x0f]
            } else {
                [-0x11, 0x11, -0x0f]
            };
            let edge_offsets: [i16; 3] = if odd {
                [0x00, -0x11, -0x01]
            } else {
                [-0x10, -0x11, 0x00]
            };
            let tile_offsets: [i16; 3] = if odd {
                [0x10, -0x10, -0x12]
            } else {
                [-0x01, 0x01, -0x21]
            };
            node_neighbors[n as usize] = neighbor_offsets
                .iter()
                .filter_map(|d| shift(n, *d))
                .filter(|c| node_legal[*c as usize])
                .map(NodeId)
                .collect();
            node_edges[n as usize] = edge_offsets
                .iter()
                .filter_map(|d| shift(n, *d))
                .filter(|c| edge_legal[*c as usize])
                .map(EdgeId)
                .collect();
            node_tiles[n as usize] = tile_offsets
                .iter()
                .filter_map(|d| shift(n, *d))
                .filter_map(|c| tile_by_coord[c as usize])
                .collect();
        }

        let mut edge_nodes = vec![[NodeId(0); 2]; 256];
        for edge in &edges {
            let e = edge.0;
            let (a, b) = (e >> 4, e & 0x0f);
            edge_nodes[e as usize] = if a % 2 == 0 && b % 2 == 0 {
                [NodeId((a << 4) | (b + 1)), NodeId(((a + 1) << 4) | b)]
            } else {
                [NodeId(e), NodeId(((a + 1) << 4) | (b + 1))]
            };
        }

        Self {
            node_legal,
            edge_legal,
            tile_by_coord,
            nodes,
            edges,
            tile_nodes,
            tile_edges,
            node_neighbors,
            node_edges,
            node_tiles,
            edge_nodes,
        }
    }
}

impl NodeId {
    pub fn new(coord: u8) -> Result<Self, TopologyError> {
        if TABLES.node_legal[coord as usize] {
            Ok(NodeId(coord))
        } else {
            Err(TopologyError::invalid(CoordKind::Node, coord))
        }
    }

    pub const fn coord(self) -> u8 {
        self.0
    }

    /// Nodes one edge away, in `[-0x11, +0x11, ±0x0f]` order.
    pub fn neighbors(self) -> &'static [NodeId] {
        &TABLES.node_neighbors[self.0 as usize]
    }

    pub fn edges(self) -> &'static [EdgeId] {
        &TABLES.node_edges[self.0 as usize]
    }

    pub fn tiles(self) -> &'static [TileId] {
        &TABLES.node_tiles[self.0 as usize]
    }
}

impl EdgeId {
    pub fn new(coord: u8) -> Result<Self, TopologyError> {
        if TABLES.edge_legal[coord as usize] {
            Ok(EdgeId(coord))
        } else {
            Err(TopologyError::invalid(CoordKind::Edge, coord))
        }
    }

    pub const fn coord(self) -> u8 {
        self.0
    }

    pub fn nodes(self) -> [NodeId; 2] {
        TABLES.edge_nodes[self.0 as usize]
    }

    pub fn touches(self, node: NodeId) -> bool {
        self.nodes().contains(&node)
    }
}

impl TileId {
    pub fn new(index: u8) -> Result<Self, TopologyError> {
        if (index as usize) < NUM_TILES {
            Ok(TileId(index))
        } else {
            Err(TopologyError::invalid(CoordKind::Tile, index))
        }
    }

    pub fn from_coord(coord: u8) -> Result<Self, TopologyError> {
        TABLES.tile_by_coord[coord as usize]
            .ok_or_else(|| TopologyError::invalid(CoordKind::Tile, coord))
    }

    pub const ALL: [TileId; NUM_TILES] = {
        let mut ids = [TileId(0); NUM_TILES];
        let mut idx = 0;
        while idx < NUM_TILES {
            ids[idx] = TileId(idx as u8);
            idx += 1;
        }
        ids
    };

    pub fn all() -> impl Iterator<Item = TileId> {
        Self::ALL.into_iter()
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub const fn coord(self) -> u8 {
        TILE_COORDS[self.0 as usize]
    }

    pub fn nodes(self) -> &'static [NodeId; 6] {
        &TABLES.tile_nodes[self.0 as usize]
    }

    pub fn edges(self) -> &'static [EdgeId; 6] {
        &TABLES.tile_edges[self.0 as usize]
    }
}

macro_rules! coord_conversions {
    ($ty:ident, $ctor:ident) => {
        impl TryFrom<u8> for $ty {
            type Error = TopologyError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                $ty::$ctor(value)
            }
        }

        impl From<$ty> for u8 {
            fn from(value: $ty) -> u8 {
                value.0
            }
        }
    };
}

coord_conversions!(NodeId, new);
coord_conversions!(EdgeId, new);
coord_conversions!(TileId, new);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x}", self.0)
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile {}", self.0)
    }
}

pub fn legal_nodes() -> &'static [NodeId] {
    &TABLES.nodes
}

pub fn legal_edges() -> &'static [EdgeId] {
    &TABLES.edges
}

pub fn adjacent_nodes(coord: u8) -> Result<&'static [NodeId], TopologyError> {
    Ok(NodeId::new(coord)?.neighbors())
}

pub fn adjacent_edges(coord: u8) -> Result<&'static [EdgeId], TopologyError> {
    Ok(NodeId::new(coord)?.edges())
}

pub fn adjacent_tiles(coord: u8) -> Result<&'static [TileId], TopologyError> {
    Ok(NodeId::new(coord)?.tiles())
}

pub fn nodes_touching_edge(coord: u8) -> Result<[NodeId; 2], TopologyError> {
    Ok(EdgeId::new(coord)?.nodes())
}
