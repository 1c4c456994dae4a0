use std::collections::HashMap;
use std::sync::Arc;

use catan_sim::game::{Game, GameConfig, GameError, GamePhase, GameSession, Hand, Move};
use catan_sim::game::{Player, PlayerId, RosterBuilder};
use catan_sim::players::{Agent, MonteCarloAgent, RandomAgent, SearchBudget, Weighted};
use catan_sim::{NodeId, Placement};
use pretty_assertions::assert_eq;

fn roster(n: usize) -> Vec<Player> {
    let mut builder = RosterBuilder::new();
    for _ in 0..n {
        builder.add(None).unwrap();
    }
    builder.build()
}

fn config(seed: u64) -> GameConfig {
    GameConfig {
        seed,
        ..GameConfig::default()
    }
}

fn non_desert_tiles(session: &GameSession, node: NodeId) -> usize {
    node.tiles()
        .iter()
        .filter(|t| session.board().tile(**t).resource().is_some())
        .count()
}

/// Steps a session with one seeded random agent per player, calling `observe`
/// before every move. Stops after `max_moves`, but never in the middle of a
/// discard round.
fn drive<F>(session: &mut GameSession, seed: u64, max_moves: usize, mut observe: F)
where
    F: FnMut(&GameSession, &Move),
{
    let mut agents: HashMap<PlayerId, RandomAgent> = session
        .players()
        .iter()
        .enumerate()
        .map(|(i, p)| (p.id(), RandomAgent::with_seed(seed + i as u64)))
        .collect();
    session.start();
    for step in 0.. {
        if session.is_game_over()
            || (step >= max_moves && session.phase() != GamePhase::RobberThrow)
        {
            return;
        }
        let actor = session.acting_player();
        let agent = agents.get_mut(&actor).unwrap();
        let mv = agent
            .choose(session.possible_moves(), actor, session)
            .unwrap();
        observe(session, &mv);
        session.simulate(mv).unwrap();
    }
}

#[test]
fn second_settlement_pays_one_card_per_adjacent_resource_tile() {
    for seed in 0..6 {
        let mut session = GameSession::new(roster(3), config(seed)).unwrap();
        let n = session.players().len();
        let mut moves = session.start().to_vec();
        let mut step = 0;
        let mut settlement = None;
        while matches!(
            session.phase(),
            GamePhase::PreGameSettlement | GamePhase::PreGameRoad
        ) {
            let mv = moves[0];
            let mover = mv.player();
            if let Move::Build {
                placement: Placement::Settlement(node),
                ..
            } = mv
            {
                settlement = Some(node);
            }
            let was_road = session.phase() == GamePhase::PreGameRoad;
            moves = session.simulate(mv).unwrap().to_vec();
            if was_road {
                // The last placement also triggers the first roll.
                if step >= n && step < 2 * n - 1 {
                    let expected = non_desert_tiles(&session, settlement.unwrap());
                    let hand = session.player(mover).unwrap().resource_hand_size();
                    assert_eq!(hand, expected);
                    assert!(hand <= 3);
                }
                step += 1;
            }
        }
        assert_eq!(step, 2 * n);
        let held: usize = session
            .players()
            .iter()
            .map(Player::resource_hand_size)
            .sum();
        let taken = Hand::resource_deck().size() - session.bank().resources().size();
        assert_eq!(held, taken);
    }
}

#[test]
fn robber_discards_halve_every_large_hand() {
    let mut expected = 0usize;
    let mut thrown = 0usize;
    for seed in 0..4 {
        let mut session = GameSession::new(roster(4), config(seed)).unwrap();
        let mut current: Option<(PlayerId, usize)> = None;
        drive(&mut session, seed * 10, 6000, |session, mv| {
            if session.phase() != GamePhase::RobberThrow {
                current = None;
                return;
            }
            let actor = session.acting_player();
            if current.map(|(p, _)| p) != Some(actor) {
                let size = session.player(actor).unwrap().resource_hand_size();
                assert!(size > 7);
                expected += size / 2;
                current = Some((actor, size));
            }
            if let Move::Throw { cards, .. } = mv {
                thrown += cards.size();
            }
        });
    }
    assert_eq!(thrown, expected);
}

#[test]
fn at_most_one_development_card_per_turn() {
    for seed in 0..4 {
        let mut session = GameSession::new(roster(3), config(seed)).unwrap();
        let mut played: HashMap<u32, usize> = HashMap::new();
        drive(&mut session, seed, 6000, |session, mv| {
            if mv.development().is_some() {
                *played.entry(session.num_turns_played()).or_insert(0) += 1;
            }
        });
        assert!(played.values().all(|count| *count <= 1), "{played:?}");
    }
}

#[test]
fn rollout_view_never_shows_opponent_development_plays() {
    let mut session = GameSession::new(roster(3), config(17)).unwrap();
    let watcher = session.players()[0].id();
    drive(&mut session, 17, 4000, |session, _| {
        if session.acting_player() != watcher {
            assert!(
                session
                    .possible_sim_moves(watcher)
                    .iter()
                    .all(|m| m.development().is_none())
            );
        }
    });
}

#[test]
fn driver_and_stepping_api_agree() {
    let limited = GameConfig {
        seed: 99,
        turn_limit: 80,
        ..GameConfig::default()
    };
    let seats: Vec<(Player, RandomAgent)> = roster(4)
        .into_iter()
        .enumerate()
        .map(|(i, p)| (p, RandomAgent::with_seed(i as u64)))
        .collect();
    let mut game = Game::new(seats, limited.clone()).unwrap();
    match game.play() {
        Ok(_) | Err(GameError::TurnLimitReached(_)) => {}
        Err(other) => panic!("unexpected engine error: {other}"),
    }

    let mut replay = GameSession::new(roster(4), limited).unwrap();
    replay.start();
    for mv in game.history() {
        replay.simulate(*mv).unwrap();
    }
    assert_eq!(replay.players(), game.session().players());
    assert_eq!(replay.board(), game.session().board());
    assert_eq!(replay.bank(), game.session().bank());
    assert_eq!(replay.phase(), game.session().phase());
    assert_eq!(replay.possible_moves(), game.session().possible_moves());
}

#[test]
fn monte_carlo_returns_the_only_candidate() {
    let mut session = GameSession::new(roster(3), config(1)).unwrap();
    let only = session.start()[0];
    let mut agent =
        MonteCarloAgent::new(Arc::new(Weighted::default()), SearchBudget::new(1, 0), 0);
    assert_eq!(agent.choose(&[only], only.player(), &session), Some(only));
}

#[test]
fn invalid_roster_is_rejected() {
    assert_eq!(
        GameSession::new(roster(5), GameConfig::default()).unwrap_err(),
        GameError::InvalidPlayerCount(5)
    );
}
