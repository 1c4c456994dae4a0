use smallvec::SmallVec;

use crate::coords::NodeId;
use crate::game::players::{MAX_ROADS, Player};

use super::Board;

impl Board {
    /// Longest chain of distinct roads owned by `player`.
    ///
    /// This is a trail, not a simple path: no road is used twice, but nodes
    /// may repeat, so a closed ring of six roads counts as six.
    ///
    /// Walks every trail from every road endpoint with an explicit stack; the
    /// used-road set is a bitmask over the player's road list, which is capped
    /// at 15 entries. A trail may end on a node held by another player but
    /// never passes through it. The player's own buildings do not break it.
    pub fn longest_road_length(&self, player: &Player) -> usize {
        let roads = player.roads();
        debug_assert!(roads.len() <= MAX_ROADS);
        if roads.is_empty() {
            return 0;
        }
        let owner = player.id();
        let breaks_at = |node: NodeId| self.owner_at(node).is_some_and(|o| o != owner);

        let mut starts: SmallVec<[NodeId; 32]> = roads.iter().flat_map(|e| e.nodes()).collect();
        starts.sort_unstable();
        starts.dedup();

        let mut best = 0;
        let mut stack: Vec<(NodeId, u16, usize)> = Vec::with_capacity(roads.len() * 2);
        for start in starts {
            stack.push((start, 0, 0));
            while let Some((node, used, length)) = stack.pop() {
                best = best.max(length);
                if length > 0 && breaks_at(node) {
                    continue;
                }
                for (idx, edge) in roads.iter().enumerate() {
                    let bit = 1u16 << idx;
                    if used & bit != 0 || !edge.touches(node) {
                        continue;
                    }
                    let [a, b] = edge.nodes();
                    let next = if a == node { b } else { a };
                    stack.push((next, used | bit, length + 1));
                }
            }
        }
        best
    }
}
