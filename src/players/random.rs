use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::game::{GameSession, Move, MoveKind, PlayerId};
use crate::players::Agent;

/// Samples a move category first, then a sub-group for builds and
/// development plays, then a move. A list holding one Pass and fifty trades
/// yields Pass about half the time rather than once in fifty-one.
#[derive(Debug, Clone)]
pub struct RandomAgent {
    rng: StdRng,
}

impl Default for RandomAgent {
    fn default() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl RandomAgent {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn pick(&mut self, moves: &[Move]) -> Option<Move> {
        let kind = *distinct(moves.iter().map(Move::kind)).choose(&mut self.rng)?;
        let in_kind: Vec<Move> = moves.iter().filter(|m| m.kind() == kind).copied().collect();

        let group: Vec<Move> = match kind {
            MoveKind::Build => {
                let building = *distinct(in_kind.iter().map(Move::building_kind))
                    .choose(&mut self.rng)?;
                in_kind
                    .into_iter()
                    .filter(|m| m.building_kind() == building)
                    .collect()
            }
            MoveKind::UseDevelopment => {
                let card = *distinct(in_kind.iter().map(Move::development_group))
                    .choose(&mut self.rng)?;
                in_kind
                    .into_iter()
                    .filter(|m| m.development_group() == card)
                    .collect()
            }
            _ => in_kind,
        };
        group.choose(&mut self.rng).copied()
    }
}

/// Distinct values in first-seen order, so a seeded agent stays reproducible.
fn distinct<T: PartialEq>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

impl Agent for RandomAgent {
    fn choose(&mut self, moves: &[Move], _player: PlayerId, _session: &GameSession) -> Option<Move> {
        self.pick(moves)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Hand, RosterBuilder};
    use crate::types::Resource;

    #[test]
    fn category_first_sampling() {
        let mut roster = RosterBuilder::new();
        let p = roster.add(None).unwrap();
        let mut moves = vec![Move::Pass { player: p }];
        for i in 0..50u8 {
            moves.push(Move::Trade {
                player: p,
                gives: Hand::of(Resource::Wheat, 4 + i),
                gets: Hand::of(Resource::Ore, 1),
            });
        }

        let mut agent = RandomAgent::with_seed(11);
        let draws = 4000;
        let passes = (0..draws)
            .filter(|_| matches!(agent.pick(&moves), Some(Move::Pass { .. })))
            .count();
        let ratio = passes as f64 / draws as f64;
        assert!((0.45..0.55).contains(&ratio), "pass ratio {ratio}");
    }

    #[test]
    fn empty_list_has_no_choice() {
        assert_eq!(RandomAgent::with_seed(0).pick(&[]), None);
    }
}
