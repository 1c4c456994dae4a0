//! Limited-depth Monte Carlo search with heavy playouts.
//!
//! Each candidate move is tried on independent branches of the session. A
//! rollout finishes the searcher's turn with a one-move policy, then plays
//! `depth` more rounds of the searcher's pending moves followed by every
//! opponent turn (random, restricted to the moves a searcher can see), and
//! scores the final state. Candidates are evaluated in parallel; each worker
//! owns its branches and its agents outright.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::game::{GameSession, Move, PlayerId};
use crate::players::heuristic::best_moves;
use crate::players::heuristics::Heuristic;
use crate::players::{Agent, OneMoveAgent, RandomAgent};

/// Upper bound on moves a single rollout phase may apply, so a policy that
/// keeps trading back and forth cannot stall a decision.
const MAX_PHASE_MOVES: usize = 256;

/// Per-decision work limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBudget {
    /// Rollouts per candidate move.
    pub iterations: usize,
    /// Extra opponent/self rounds after the searcher's own turn.
    pub depth: usize,
    /// Wall-clock cap per decision. Every candidate still gets one rollout.
    pub deadline: Option<Duration>,
    pub parallel: bool,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            iterations: 1,
            depth: 0,
            deadline: None,
            parallel: true,
        }
    }
}

impl SearchBudget {
    pub fn new(iterations: usize, depth: usize) -> Self {
        Self {
            iterations,
            depth,
            ..Self::default()
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }
}

/// Agents and dice owned by one rollout worker.
struct Rollout<'a> {
    me: PlayerId,
    heuristic: &'a dyn Heuristic,
    policy: OneMoveAgent,
    random: RandomAgent,
    rng: StdRng,
}

impl<'a> Rollout<'a> {
    fn new(me: PlayerId, heuristic: &'a Arc<dyn Heuristic>, seed: u64) -> Self {
        Self {
            me,
            heuristic: heuristic.as_ref(),
            policy: OneMoveAgent::new(Arc::clone(heuristic), seed).sequential(),
            random: RandomAgent::with_seed(seed ^ 0x9e37_79b9),
            rng: StdRng::seed_from_u64(seed.rotate_left(17)),
        }
    }

    fn branch_after(&mut self, session: &GameSession, mv: Move) -> Option<GameSession> {
        let mut branch = session.branch(self.rng.r#gen());
        match branch.simulate(mv) {
            Ok(_) => Some(branch),
            Err(err) => {
                debug!("rollout could not apply {mv}: {err}");
                None
            }
        }
    }

    /// Plays the searcher's moves with the one-move policy while they act.
    fn sim_me(&mut self, session: &mut GameSession) {
        for _ in 0..MAX_PHASE_MOVES {
            if session.acting_player() != self.me || session.possible_moves().is_empty() {
                return;
            }
            let actor = session.acting_player();
            let Some(mv) = self.policy.choose(session.possible_moves(), actor, session) else {
                return;
            };
            if session.simulate(mv).is_err() {
                return;
            }
        }
    }

    /// Plays the searcher's moves with the category-first random policy,
    /// recording them.
    fn sim_me_random(&mut self, session: &mut GameSession, path: &mut Vec<Move>) {
        for _ in 0..MAX_PHASE_MOVES {
            if session.acting_player() != self.me {
                return;
            }
            let Some(mv) = self.random.pick(session.possible_moves()) else {
                return;
            };
            if session.simulate(mv).is_err() {
                return;
            }
            path.push(mv);
        }
    }

    /// Plays the searcher's moves uniformly at random.
    fn sim_me_flat(&mut self, session: &mut GameSession) {
        for _ in 0..MAX_PHASE_MOVES {
            if session.acting_player() != self.me {
                return;
            }
            let Some(mv) = session.possible_moves().choose(&mut self.rng).copied() else {
                return;
            };
            if session.simulate(mv).is_err() {
                return;
            }
        }
    }

    /// Plays opponents randomly over what the searcher can see of their
    /// options.
    fn sim_opponents(&mut self, session: &mut GameSession, flat: bool) {
        for _ in 0..MAX_PHASE_MOVES {
            if session.acting_player() == self.me {
                return;
            }
            let visible = session.possible_sim_moves(self.me);
            let choice = if flat {
                visible.choose(&mut self.rng).copied()
            } else {
                self.random.pick(&visible)
            };
            let Some(mv) = choice else {
                return;
            };
            if session.simulate(mv).is_err() {
                return;
            }
        }
    }

    fn score(&self, session: &GameSession) -> f64 {
        self.heuristic.value(session, self.me)
    }
}

fn out_of_time(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// Averages heuristic values over `iterations` rollouts per candidate and
/// resolves ties with a one-move agent.
pub struct MonteCarloAgent {
    heuristic: Arc<dyn Heuristic>,
    budget: SearchBudget,
    tie_break: OneMoveAgent,
    rng: StdRng,
}

impl MonteCarloAgent {
    pub fn new(heuristic: Arc<dyn Heuristic>, budget: SearchBudget, seed: u64) -> Self {
        Self {
            tie_break: OneMoveAgent::new(Arc::clone(&heuristic), seed),
            heuristic,
            budget,
            rng: StdRng::seed_from_u64(seed.wrapping_add(7)),
        }
    }

    pub fn budget(&self) -> &SearchBudget {
        &self.budget
    }

    fn expected_value(
        &self,
        session: &GameSession,
        me: PlayerId,
        mv: Move,
        seed: u64,
        deadline: Option<Instant>,
    ) -> f64 {
        let mut rollout = Rollout::new(me, &self.heuristic, seed);
        let mut total = 0.0;
        let mut runs = 0usize;
        for _ in 0..self.budget.iterations.max(1) {
            if runs > 0 && out_of_time(deadline) {
                break;
            }
            let Some(mut branch) = rollout.branch_after(session, mv) else {
                return f64::NEG_INFINITY;
            };
            rollout.sim_me(&mut branch);
            for _ in 0..self.budget.depth {
                rollout.sim_me(&mut branch);
                rollout.sim_opponents(&mut branch, false);
            }
            let value = rollout.score(&branch);
            trace!("rollout of {mv}: {value:.4}");
            total += value;
            runs += 1;
        }
        total / runs as f64
    }
}

impl Agent for MonteCarloAgent {
    fn choose(&mut self, moves: &[Move], player: PlayerId, session: &GameSession) -> Option<Move> {
        if let [only] = moves {
            return Some(*only);
        }
        let deadline = self.budget.deadline.map(|d| Instant::now() + d);
        let seeds: Vec<u64> = moves.iter().map(|_| self.rng.r#gen()).collect();
        let this = &*self;
        let evaluate = |(mv, seed): (&Move, &u64)| {
            this.expected_value(session, player, *mv, *seed, deadline)
        };
        let values: Vec<f64> = if self.budget.parallel {
            moves.par_iter().zip(seeds.par_iter()).map(evaluate).collect()
        } else {
            moves.iter().zip(seeds.iter()).map(evaluate).collect()
        };

        let best = best_moves(moves, &values);
        debug!(
            "monte carlo over {} moves: {} best",
            moves.len(),
            best.len()
        );
        match best.as_slice() {
            [only] => Some(*only),
            [] => self.tie_break.choose(moves, player, session),
            _ => self.tie_break.choose(&best, player, session),
        }
    }
}

/// Cheaper search: random self-play, maximum rather than mean per candidate,
/// and a remembered best path for the rest of the turn.
///
/// When consulted again in the same turn without finding anything better
/// than the remembered value, it replays the next move of the remembered
/// path if that move is still offered. The path can be stale when opponents
/// acted in between; that is accepted.
pub struct LiteMonteCarloAgent {
    heuristic: Arc<dyn Heuristic>,
    budget: SearchBudget,
    tie_break: OneMoveAgent,
    rng: StdRng,
    last_seen_turn: Option<u32>,
    last_value: f64,
    path: Vec<Move>,
}

/// Best outcome of one candidate across its iterations.
struct LiteOutcome {
    max: f64,
    path: Vec<Move>,
}

impl LiteMonteCarloAgent {
    pub fn new(heuristic: Arc<dyn Heuristic>, budget: SearchBudget, seed: u64) -> Self {
        Self {
            tie_break: OneMoveAgent::new(Arc::clone(&heuristic), seed),
            heuristic,
            budget,
            rng: StdRng::seed_from_u64(seed.wrapping_add(13)),
            last_seen_turn: None,
            last_value: 0.0,
            path: Vec::new(),
        }
    }

    fn best_outcome(
        &self,
        session: &GameSession,
        me: PlayerId,
        mv: Move,
        seed: u64,
        deadline: Option<Instant>,
    ) -> LiteOutcome {
        let mut rollout = Rollout::new(me, &self.heuristic, seed);
        let mut outcome = LiteOutcome {
            max: 0.0,
            path: Vec::new(),
        };
        for run in 0..self.budget.iterations.max(1) {
            if run > 0 && out_of_time(deadline) {
                break;
            }
            let Some(mut branch) = rollout.branch_after(session, mv) else {
                break;
            };
            let mut path = Vec::new();
            for _ in 0..self.budget.depth.max(1) {
                rollout.sim_me_random(&mut branch, &mut path);
                rollout.sim_opponents(&mut branch, true);
                rollout.sim_me_flat(&mut branch);
            }
            let value = rollout.score(&branch);
            if value > outcome.max {
                outcome.max = value;
                outcome.path = path;
            }
        }
        outcome
    }

    /// Pops the remembered next move when it is still offered.
    fn replay(&mut self, moves: &[Move]) -> Option<Move> {
        let next = *self.path.first()?;
        if moves.contains(&next) {
            self.path.remove(0);
            Some(next)
        } else {
            None
        }
    }
}

impl Agent for LiteMonteCarloAgent {
    fn choose(&mut self, moves: &[Move], player: PlayerId, session: &GameSession) -> Option<Move> {
        if let [only] = moves {
            return Some(*only);
        }
        let deadline = self.budget.deadline.map(|d| Instant::now() + d);
        let seeds: Vec<u64> = moves.iter().map(|_| self.rng.r#gen()).collect();
        let this = &*self;
        let evaluate =
            |(mv, seed): (&Move, &u64)| this.best_outcome(session, player, *mv, *seed, deadline);
        let outcomes: Vec<LiteOutcome> = if self.budget.parallel {
            moves.par_iter().zip(seeds.par_iter()).map(evaluate).collect()
        } else {
            moves.iter().zip(seeds.iter()).map(evaluate).collect()
        };

        // First candidate reaching the overall maximum supplies the path.
        let mut best_value = 0.0;
        let mut best_path: &[Move] = &[];
        for outcome in &outcomes {
            if outcome.max > best_value {
                best_value = outcome.max;
                best_path = &outcome.path;
            }
        }

        let turn = session.num_turns_played();
        if self.last_seen_turn == Some(turn) && best_value < self.last_value {
            if let Some(mv) = self.replay(moves) {
                trace!("replaying remembered {mv}");
                return Some(mv);
            }
        }
        self.last_seen_turn = Some(turn);
        self.last_value = best_value;
        self.path = best_path.to_vec();

        let maxima: Vec<f64> = outcomes.iter().map(|o| o.max).collect();
        let best: Vec<Move> = moves
            .iter()
            .zip(&maxima)
            .filter(|(_, max)| **max == best_value)
            .map(|(m, _)| *m)
            .collect();
        match best.as_slice() {
            [only] => Some(*only),
            [] => self.tie_break.choose(moves, player, session),
            _ => self.tie_break.choose(&best, player, session),
        }
    }
}
