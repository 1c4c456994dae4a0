use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::game::{Game, GameError, PlayerId};

/// Outcome of one simulated game, as printed by `--json`.
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub index: u32,
    pub id: String,
    pub seed: u64,
    pub winner: Option<u8>,
    pub turns: u32,
    pub moves: usize,
    /// Victory points per player id, in turn order.
    pub victory_points: Vec<(u8, u8)>,
    pub duration_ms: u128,
    pub error: Option<String>,
}

impl GameSummary {
    pub fn new<A>(
        index: u32,
        game: &Game<A>,
        result: &Result<Option<PlayerId>, GameError>,
        duration: Duration,
    ) -> Self {
        let session = game.session();
        Self {
            index,
            id: game.id.to_string(),
            seed: session.config().seed,
            winner: result.as_ref().ok().copied().flatten().map(PlayerId::get),
            turns: session.num_turns_played(),
            moves: game.history().len(),
            victory_points: session
                .players()
                .iter()
                .map(|p| (p.id().get(), p.victory_points()))
                .collect(),
            duration_ms: duration.as_millis(),
            error: result.as_ref().err().map(ToString::to_string),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct GameStats {
    pub wins: BTreeMap<u8, u32>,
    pub results_by_player: BTreeMap<u8, Vec<u8>>,
    pub games: u32,
    pub unfinished: u32,
    pub total_moves: u64,
    pub total_turns: u64,
    pub total_duration: Duration,
}

impl GameStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, summary: &GameSummary) {
        self.games += 1;
        self.total_duration += Duration::from_millis(summary.duration_ms as u64);
        self.total_turns += summary.turns as u64;
        self.total_moves += summary.moves as u64;

        match summary.winner {
            Some(winner) => *self.wins.entry(winner).or_insert(0) += 1,
            None => self.unfinished += 1,
        }
        for (id, vp) in &summary.victory_points {
            self.results_by_player.entry(*id).or_default().push(*vp);
        }
    }

    pub fn wins_of(&self, id: u8) -> u32 {
        self.wins.get(&id).copied().unwrap_or(0)
    }

    pub fn avg_vps_of(&self, id: u8) -> f64 {
        match self.results_by_player.get(&id) {
            Some(vps) if !vps.is_empty() => {
                vps.iter().map(|v| *v as f64).sum::<f64>() / vps.len() as f64
            }
            _ => 0.0,
        }
    }

    pub fn avg_moves(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_moves as f64 / self.games as f64
    }

    pub fn avg_turns(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games as f64
    }

    pub fn avg_duration(&self) -> Duration {
        if self.games == 0 {
            return Duration::ZERO;
        }
        self.total_duration / self.games
    }
}
