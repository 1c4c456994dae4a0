use log::{debug, warn};
use uuid::Uuid;

use crate::game::action::Move;
use crate::game::players::{Player, PlayerId};
use crate::game::state::{GameConfig, GameError, GameSession};
use crate::players::Agent;

/// Blocking driver: asks each seat's agent for a move and feeds it to the
/// session until someone wins. It only uses the public stepping API, so a
/// fresh session fed [`Game::history`] reaches the same state.
pub struct Game<A> {
    pub id: Uuid,
    session: GameSession,
    agents: Vec<(PlayerId, A)>,
    history: Vec<Move>,
}

impl<A: Agent> Game<A> {
    pub fn new(seats: Vec<(Player, A)>, config: GameConfig) -> Result<Self, GameError> {
        let (players, agents): (Vec<Player>, Vec<(PlayerId, A)>) = seats
            .into_iter()
            .map(|(player, agent)| {
                let id = player.id();
                (player, (id, agent))
            })
            .unzip();
        let mut session = GameSession::new(players, config)?;
        session.start();
        Ok(Self {
            id: Uuid::new_v4(),
            session,
            agents,
            history: Vec::new(),
        })
    }

    /// Plays to completion and returns the winner.
    ///
    /// Fails with [`GameError::TurnLimitReached`] once the configured number
    /// of main-game turns has elapsed without a winner, and with any engine
    /// error raised while applying a move.
    pub fn play(&mut self) -> Result<Option<PlayerId>, GameError> {
        let limit = self.session.config().turn_limit;
        while !self.session.is_game_over() {
            if self.session.num_turns_played() > limit {
                warn!("game {} hit the turn limit of {limit}", self.id);
                return Err(GameError::TurnLimitReached(limit));
            }
            self.play_tick()?;
        }
        Ok(self.session.winner())
    }

    /// Asks the acting player's agent for one move and applies it.
    pub fn play_tick(&mut self) -> Result<Option<Move>, GameError> {
        if self.session.is_game_over() {
            return Ok(None);
        }
        let actor = self.session.acting_player();
        let agent = self
            .agents
            .iter_mut()
            .find(|(id, _)| *id == actor)
            .map(|(_, agent)| agent)
            .ok_or(GameError::UnknownPlayer(actor))?;

        let moves = self.session.possible_moves();
        let Some(mv) = agent.choose(moves, actor, &self.session) else {
            return Err(GameError::IllegalMoveSubmitted {
                player: actor,
                description: "no move chosen".to_string(),
            });
        };
        self.execute(mv)?;
        Ok(Some(mv))
    }

    pub fn execute(&mut self, mv: Move) -> Result<(), GameError> {
        self.session.simulate(mv)?;
        debug!("game {}: {mv}", self.id);
        self.history.push(mv);
        Ok(())
    }
}

impl<A> Game<A> {
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Every move applied so far, in order.
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.session.winner()
    }
}
