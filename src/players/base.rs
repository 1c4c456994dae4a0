use crate::game::{GameSession, Move, PlayerId};

/// Decision seam between the engine and a strategy.
///
/// `moves` is the set the session currently offers to `player`; the returned
/// move must equal one of them. `None` is only valid for an empty set.
pub trait Agent {
    fn choose(&mut self, moves: &[Move], player: PlayerId, session: &GameSession) -> Option<Move>;
}

impl<A: Agent + ?Sized> Agent for Box<A> {
    fn choose(&mut self, moves: &[Move], player: PlayerId, session: &GameSession) -> Option<Move> {
        (**self).choose(moves, player, session)
    }
}
