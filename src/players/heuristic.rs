use std::sync::Arc;

use log::{trace, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::game::{GameSession, Move, PlayerId};
use crate::players::heuristics::{Feature, Heuristic, Weighted};
use crate::players::{Agent, RandomAgent};
use crate::types::Resource;

const MONOPOLY_BONUS: f64 = 0.5;
/// Trade bonuses count half against the state score.
const TRADE_BONUS_WEIGHT: f64 = 0.5;

/// Looks one move ahead: branches the session for every candidate, applies
/// it, and keeps the candidates whose resulting state scores best for the
/// mover. Ties go to a [`RandomAgent`].
#[derive(Clone)]
pub struct OneMoveAgent {
    heuristic: Arc<dyn Heuristic>,
    tie_break: RandomAgent,
    rng: StdRng,
    parallel: bool,
}

impl OneMoveAgent {
    pub fn new(heuristic: Arc<dyn Heuristic>, seed: u64) -> Self {
        Self {
            heuristic,
            tie_break: RandomAgent::with_seed(seed),
            rng: StdRng::seed_from_u64(seed.wrapping_add(1)),
            parallel: true,
        }
    }

    /// One-move agent over the board probability feature.
    pub fn probability(seed: u64) -> Self {
        Self::new(Arc::new(Feature::Probability), seed)
    }

    /// Agent used by the `O` seat code.
    pub fn amoss(seed: u64) -> Self {
        Self::new(Arc::new(Weighted::amoss_comb1()), seed)
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn heuristic(&self) -> &Arc<dyn Heuristic> {
        &self.heuristic
    }

    /// Heuristic value of each candidate after applying it on its own branch,
    /// plus whatever `bonus` adds for that move.
    pub(crate) fn evaluate<B>(&mut self, moves: &[Move], session: &GameSession, bonus: B) -> Vec<f64>
    where
        B: Fn(&Move, &GameSession) -> f64 + Sync,
    {
        let seeds: Vec<u64> = moves.iter().map(|_| self.rng.r#gen()).collect();
        let heuristic = self.heuristic.as_ref();
        let score = |(mv, seed): (&Move, &u64)| {
            let mut branch = session.branch(*seed);
            if let Err(err) = branch.simulate(*mv) {
                warn!("candidate {mv} failed on its branch: {err}");
                return f64::NEG_INFINITY;
            }
            heuristic.value(&branch, mv.player()) + bonus(mv, &branch)
        };
        if self.parallel {
            moves.par_iter().zip(seeds.par_iter()).map(score).collect()
        } else {
            moves.iter().zip(seeds.iter()).map(score).collect()
        }
    }

    pub(crate) fn pick_best(&mut self, moves: &[Move], values: &[f64]) -> Option<Move> {
        let best = best_moves(moves, values);
        trace!("{} of {} candidates tie at the top", best.len(), moves.len());
        self.tie_break.pick(&best)
    }
}

impl Agent for OneMoveAgent {
    fn choose(&mut self, moves: &[Move], _player: PlayerId, session: &GameSession) -> Option<Move> {
        let values = self.evaluate(moves, session, |_, _| 0.0);
        self.pick_best(moves, &values)
    }
}

/// Moves whose value equals the maximum. When no value compares (all NaN),
/// every move stays a candidate.
pub(crate) fn best_moves(moves: &[Move], values: &[f64]) -> Vec<Move> {
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let best: Vec<Move> = moves
        .iter()
        .zip(values)
        .filter(|(_, v)| **v == max)
        .map(|(m, _)| *m)
        .collect();
    if best.is_empty() { moves.to_vec() } else { best }
}

/// One-move scoring with two move-specific nudges: a Monopoly on the kind
/// opponents hold most of, and trades that bring in a kind the player cannot
/// roll for.
#[derive(Clone)]
pub struct OptimizedAgent {
    inner: OneMoveAgent,
}

impl OptimizedAgent {
    pub fn new(heuristic: Arc<dyn Heuristic>, seed: u64) -> Self {
        Self {
            inner: OneMoveAgent::new(heuristic, seed),
        }
    }
}

impl Agent for OptimizedAgent {
    fn choose(&mut self, moves: &[Move], player: PlayerId, session: &GameSession) -> Option<Move> {
        let target = monopoly_target(session, player);
        let values = self
            .inner
            .evaluate(moves, session, |mv, after| move_bonus(mv, after, target));
        self.inner.pick_best(moves, &values)
    }
}

/// Extra value of `mv` on top of the score of the state it leads to.
fn move_bonus(mv: &Move, after: &GameSession, monopoly: Option<Resource>) -> f64 {
    match *mv {
        Move::UseMonopoly { resource, .. } if Some(resource) == monopoly => MONOPOLY_BONUS,
        Move::Trade { player, gets, .. } => {
            TRADE_BONUS_WEIGHT * trade_bonus(after, player, gets.resource_kinds())
        }
        _ => 0.0,
    }
}

/// The kind maximizing opponents' holdings minus half of the player's own.
fn monopoly_target(session: &GameSession, player: PlayerId) -> Option<Resource> {
    let own = session.player(player).ok()?.resource_hand();
    let mut best: Option<(Resource, f64)> = None;
    for resource in Resource::ALL {
        let theirs: f64 = session
            .opponents(player)
            .map(|p| p.resource_hand().count(resource) as f64)
            .sum();
        let net = theirs - own.count(resource) as f64 / 2.0;
        if best.is_none_or(|(_, value)| net > value) {
            best = Some((resource, net));
        }
    }
    best.map(|(resource, _)| resource)
}

fn trade_bonus(
    after: &GameSession,
    player: PlayerId,
    mut gets: impl Iterator<Item = Resource>,
) -> f64 {
    let (Some(resource), Ok(me)) = (gets.next(), after.player(player)) else {
        return 0.0;
    };
    if after.board().resources_player_can_get(me).contains(&resource) {
        return 0.0;
    }
    match me.resource_hand().count(resource) {
        0 => 0.5,
        held => 1.0 / (2.0 * held as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, Hand, RosterBuilder};

    fn session(seed: u64) -> GameSession {
        let mut roster = RosterBuilder::new();
        for _ in 0..3 {
            roster.add(None).unwrap();
        }
        let config = GameConfig {
            seed,
            ..GameConfig::default()
        };
        let mut game = GameSession::new(roster.build(), config).unwrap();
        game.start();
        game
    }

    #[test]
    fn best_moves_keeps_all_ties() {
        let mut roster = RosterBuilder::new();
        let p = roster.add(None).unwrap();
        let moves = [
            Move::Pass { player: p },
            Move::BuyDevelopment { player: p },
            Move::UseRoadBuilding { player: p },
        ];
        assert_eq!(best_moves(&moves, &[1.0, 3.0, 3.0]), moves[1..].to_vec());
    }

    #[test]
    fn one_move_choice_is_offered_and_leaves_session_alone() {
        let game = session(5);
        let before = game.possible_moves().to_vec();
        let actor = game.acting_player();
        let mut agent = OneMoveAgent::probability(1);
        let chosen = agent.choose(&before, actor, &game).unwrap();
        assert!(before.contains(&chosen));
        assert_eq!(game.possible_moves(), &before[..]);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let game = session(8);
        let moves = game.possible_moves().to_vec();
        let actor = game.acting_player();
        let mut parallel = OneMoveAgent::amoss(4);
        let mut sequential = OneMoveAgent::amoss(4).sequential();
        assert_eq!(
            parallel.choose(&moves, actor, &game),
            sequential.choose(&moves, actor, &game)
        );
    }

    #[test]
    fn trade_bonus_prefers_unreachable_kinds() {
        let game = session(2);
        let me = game.players()[0].id();
        // Nobody has built yet, so every kind is unreachable and unheld.
        let gets = Hand::of(Resource::Ore, 1);
        assert_eq!(trade_bonus(&game, me, gets.resource_kinds()), 0.5);
        assert_eq!(monopoly_target(&game, me), Some(Resource::ALL[0]));
    }

    #[test]
    fn optimized_bonuses_per_move_kind() {
        let game = session(2);
        let me = game.players()[0].id();
        let trade = Move::Trade {
            player: me,
            gives: Hand::of(Resource::Sheep, 4),
            gets: Hand::of(Resource::Ore, 1),
        };
        assert_eq!(move_bonus(&trade, &game, None), 0.25);
        let monopoly = Move::UseMonopoly {
            player: me,
            resource: Resource::Wheat,
        };
        assert_eq!(move_bonus(&monopoly, &game, Some(Resource::Wheat)), 0.5);
        assert_eq!(move_bonus(&monopoly, &game, Some(Resource::Ore)), 0.0);
        assert_eq!(move_bonus(&Move::Pass { player: me }, &game, None), 0.0);
    }

    #[test]
    fn unordered_values_still_leave_a_choice() {
        let mut roster = RosterBuilder::new();
        let p = roster.add(None).unwrap();
        let moves = [Move::Pass { player: p }, Move::BuyDevelopment { player: p }];
        assert_eq!(best_moves(&moves, &[f64::NAN, f64::NAN]), moves.to_vec());
        assert_eq!(best_moves(&moves, &[f64::NAN, 1.0]), vec![moves[1]]);
    }
}
