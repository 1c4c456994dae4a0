use std::cmp::Reverse;

use log::{debug, info, trace};
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::board::{Board, Buildable, Placement};
use crate::coords::{NodeId, TileId, TopologyError};
use crate::game::action::Move;
use crate::game::bank::Bank;
use crate::game::hand::{COST_DEVELOPMENT, Hand, HandError};
use crate::game::players::{Player, PlayerId};
use crate::types::{DevelopmentCard, Resource};

pub const MIN_PLAYERS: usize = 3;
pub const MAX_PLAYERS: usize = 4;
pub const MAX_CARDS_IN_HAND: usize = 7;
pub const ROBBER_DICE_VALUE: u8 = 7;
pub const ROAD_BUILDING_NUM_ROADS: u8 = 2;
pub const MIN_LONGEST_ROAD: usize = 5;
pub const MIN_LARGEST_ARMY: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub vps_to_win: u8,
    pub seed: u64,
    /// Main-game turns the blocking driver plays before giving up.
    pub turn_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            vps_to_win: 10,
            seed: 42,
            turn_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    Start,
    PreGameSettlement,
    PreGameRoad,
    RobberThrow,
    RobberPlace,
    MakeMove,
    /// Placing the free roads of a Road Building card, inside the same turn.
    RoadBuilding,
    GameOver,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("player {player} submitted a move that was not offered: {description}")]
    IllegalMoveSubmitted {
        player: PlayerId,
        description: String,
    },
    #[error("a game needs {MIN_PLAYERS} to {MAX_PLAYERS} players, got {0}")]
    InvalidPlayerCount(usize),
    #[error("unknown player {0}")]
    UnknownPlayer(PlayerId),
    #[error("game already completed")]
    GameFinished,
    #[error("turn limit of {0} reached without a winner")]
    TurnLimitReached(u32),
    #[error(transparent)]
    Hand(#[from] HandError),
    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// The resumable rules engine.
///
/// A session offers the legal moves for whoever must act, accepts exactly one
/// of them through [`GameSession::simulate`], and answers with the next legal
/// set. Everything it owns is plain data, so [`GameSession::branch`] is a deep
/// copy that search agents can roll forward independently.
#[derive(Debug, Clone)]
pub struct GameSession {
    config: GameConfig,
    pub(crate) board: Board,
    pub(crate) bank: Bank,
    /// Seats in turn order.
    pub(crate) players: Vec<Player>,
    phase: GamePhase,
    pub(crate) turn_idx: usize,
    pre_game_step: usize,
    pre_game_settlement: Option<NodeId>,
    throw_idx: Option<usize>,
    throw_target: usize,
    free_roads_left: u8,
    pub(crate) dev_used_this_turn: bool,
    pub(crate) dev_bought_this_turn: Hand,
    num_turns_played: u32,
    vp_earned_this_phase: i32,
    last_roll: Option<(u8, u8)>,
    possible_moves: Vec<Move>,
    rng: StdRng,
}

impl GameSession {
    /// Seats the roster and rolls for turn order: highest sum first, ties
    /// keep roster order.
    pub fn new(players: Vec<Player>, config: GameConfig) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players.len()) {
            return Err(GameError::InvalidPlayerCount(players.len()));
        }
        let mut rng = StdRng::seed_from_u64(config.seed);
        let board = Board::new(&mut rng);

        let mut rolled: Vec<(u8, Player)> = players
            .into_iter()
            .map(|player| {
                let sum = rng.gen_range(1..=6) + rng.gen_range(1..=6);
                debug!("{} rolled {sum} for turn order", player.name());
                (sum, player)
            })
            .collect();
        rolled.sort_by_key(|(sum, _)| Reverse(*sum));
        let players: Vec<Player> = rolled.into_iter().map(|(_, p)| p).collect();
        info!(
            "turn order: {}",
            players
                .iter()
                .map(Player::name)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            config,
            board,
            bank: Bank::standard(),
            players,
            phase: GamePhase::Start,
            turn_idx: 0,
            pre_game_step: 0,
            pre_game_settlement: None,
            throw_idx: None,
            throw_target: 0,
            free_roads_left: 0,
            dev_used_this_turn: false,
            dev_bought_this_turn: Hand::empty(),
            num_turns_played: 0,
            vp_earned_this_phase: 0,
            last_roll: None,
            possible_moves: Vec::new(),
            rng,
        })
    }

    /// Leaves the `Start` phase and offers the first pre-game settlements.
    /// Calling it again later just returns the current legal set.
    pub fn start(&mut self) -> &[Move] {
        if self.phase == GamePhase::Start {
            self.begin_pre_game_step();
        }
        &self.possible_moves
    }

    /// Applies one offered move and returns the moves legal next.
    ///
    /// The move must equal a member of the last offered set; anything else is
    /// rejected without touching the state.
    pub fn simulate(&mut self, mv: Move) -> Result<&[Move], GameError> {
        if self.phase == GamePhase::GameOver {
            return Err(GameError::GameFinished);
        }
        if !self.possible_moves.contains(&mv) {
            return Err(GameError::IllegalMoveSubmitted {
                player: mv.player(),
                description: mv.to_string(),
            });
        }
        trace!("[{}] {mv}", self.phase);

        let actor = self.acting_index();
        let vp_before = self.players[actor].victory_points() as i32;
        match self.phase {
            GamePhase::PreGameSettlement => self.pre_game_settlement(mv)?,
            GamePhase::PreGameRoad => self.pre_game_road(mv)?,
            GamePhase::RobberThrow => self.robber_throw(mv)?,
            GamePhase::RobberPlace => self.robber_place(mv)?,
            GamePhase::MakeMove => self.make_move(mv)?,
            GamePhase::RoadBuilding => self.road_building(mv)?,
            GamePhase::Start | GamePhase::GameOver => {}
        }
        self.vp_earned_this_phase = self.players[actor].victory_points() as i32 - vp_before;

        if self.phase != GamePhase::GameOver && self.is_game_over() {
            self.finish();
        }
        Ok(&self.possible_moves)
    }

    /// Deep copy with its own dice stream.
    pub fn branch(&self, seed: u64) -> Self {
        let mut copy = self.clone();
        copy.rng = StdRng::seed_from_u64(seed);
        copy
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    /// Players in turn order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .iter()
            .find(|p| p.id() == id)
            .ok_or(GameError::UnknownPlayer(id))
    }

    pub(crate) fn index_of(&self, id: PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == id)
    }

    pub fn opponents(&self, id: PlayerId) -> impl Iterator<Item = &Player> + '_ {
        self.players.iter().filter(move |p| p.id() != id)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Owner of the current turn (or pre-game placement).
    pub fn current_player(&self) -> PlayerId {
        self.players[self.turn_idx].id()
    }

    /// The player who must choose next. Differs from the turn owner only
    /// while someone is discarding after a 7.
    pub fn acting_player(&self) -> PlayerId {
        self.players[self.acting_index()].id()
    }

    fn acting_index(&self) -> usize {
        match (self.phase, self.throw_idx) {
            (GamePhase::RobberThrow, Some(idx)) => idx,
            _ => self.turn_idx,
        }
    }

    pub fn possible_moves(&self) -> &[Move] {
        &self.possible_moves
    }

    /// Legal moves as seen by a simulating player. When someone else acts,
    /// their development plays are hidden, except the forced robber move.
    pub fn possible_sim_moves(&self, simulating: PlayerId) -> Vec<Move> {
        if self.acting_player() == simulating {
            return self.possible_moves.clone();
        }
        self.possible_moves
            .iter()
            .filter(|m| m.development().is_none())
            .copied()
            .collect()
    }

    pub fn num_turns_played(&self) -> u32 {
        self.num_turns_played
    }

    pub fn vp_earned_this_phase(&self) -> i32 {
        self.vp_earned_this_phase
    }

    pub fn last_roll(&self) -> Option<(u8, u8)> {
        self.last_roll
    }

    pub fn dev_used_this_turn(&self) -> bool {
        self.dev_used_this_turn
    }

    pub fn longest_road_player(&self) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.has_longest_road())
            .map(Player::id)
    }

    pub fn longest_road_length(&self) -> usize {
        self.players
            .iter()
            .map(|p| self.board.longest_road_length(p))
            .max()
            .unwrap_or(0)
    }

    pub fn largest_army_player(&self) -> Option<PlayerId> {
        self.players
            .iter()
            .find(|p| p.has_largest_army())
            .map(Player::id)
    }

    pub fn largest_army_size(&self) -> usize {
        self.players
            .iter()
            .map(Player::army_size)
            .max()
            .unwrap_or(0)
    }

    pub fn is_game_over(&self) -> bool {
        self.players
            .iter()
            .any(|p| p.victory_points() >= self.config.vps_to_win)
    }

    /// Highest victory points once the game is over; exact ties go to the
    /// player earliest in turn order.
    pub fn winner(&self) -> Option<PlayerId> {
        if !self.is_game_over() {
            return None;
        }
        self.players
            .iter()
            .min_by_key(|p| Reverse(p.victory_points()))
            .map(Player::id)
    }

    fn finish(&mut self) {
        self.phase = GamePhase::GameOver;
        self.possible_moves.clear();
        if let Some(winner) = self.winner().and_then(|id| self.player(id).ok()) {
            info!(
                "game over after {} turns: {} wins with {} VP",
                self.num_turns_played,
                winner.name(),
                winner.victory_points()
            );
        }
    }

    // ---- pre-game ----

    /// Pre-game steps run 0..n in round one and n-1..0 in round two.
    fn pre_game_seat(&self, step: usize) -> Option<usize> {
        let n = self.players.len();
        match step {
            s if s < n => Some(s),
            s if s < 2 * n => Some(2 * n - 1 - s),
            _ => None,
        }
    }

    fn is_second_round(&self) -> bool {
        self.pre_game_step >= self.players.len()
    }

    fn begin_pre_game_step(&mut self) {
        match self.pre_game_seat(self.pre_game_step) {
            Some(seat) => {
                self.turn_idx = seat;
                self.phase = GamePhase::PreGameSettlement;
                self.possible_moves = self.pre_game_settlement_moves(seat);
            }
            None => {
                self.turn_idx = 0;
                self.begin_turn();
            }
        }
    }

    fn pre_game_settlement(&mut self, mv: Move) -> Result<(), GameError> {
        let Move::Build {
            placement: Placement::Settlement(node),
            ..
        } = mv
        else {
            return Ok(());
        };
        let idx = self.turn_idx;
        self.place(idx, Placement::Settlement(node));
        self.pre_game_settlement = Some(node);

        self.phase = GamePhase::PreGameRoad;
        self.possible_moves = self.pre_game_road_moves(idx, node);
        if self.possible_moves.is_empty() {
            self.end_pre_game_placement(idx)?;
        }
        Ok(())
    }

    fn pre_game_road(&mut self, mv: Move) -> Result<(), GameError> {
        let Move::Build {
            placement: Placement::Road(edge),
            ..
        } = mv
        else {
            return Ok(());
        };
        let idx = self.turn_idx;
        self.place(idx, Placement::Road(edge));
        self.end_pre_game_placement(idx)
    }

    fn end_pre_game_placement(&mut self, idx: usize) -> Result<(), GameError> {
        if self.is_second_round() {
            if let Some(node) = self.pre_game_settlement {
                let starting = self.board.resource_distribution_by_node(node);
                self.bank.dispense(&starting)?;
                self.players[idx].receive_cards(&starting);
                debug!(
                    "{} starts with {starting} from {node}",
                    self.players[idx].name()
                );
            }
        }
        self.pre_game_settlement = None;
        self.pre_game_step += 1;
        self.begin_pre_game_step();
        Ok(())
    }

    // ---- main game ----

    fn roll_dice(&mut self) -> (u8, u8) {
        let roll = (self.rng.gen_range(1..=6), self.rng.gen_range(1..=6));
        self.last_roll = Some(roll);
        roll
    }

    fn begin_turn(&mut self) {
        self.dev_used_this_turn = false;
        self.dev_bought_this_turn = Hand::empty();
        self.num_turns_played += 1;
        self.free_roads_left = 0;

        let (a, b) = self.roll_dice();
        let sum = a + b;
        debug!(
            "turn {}: {} rolled {a}+{b}={sum}",
            self.num_turns_played,
            self.players[self.turn_idx].name()
        );

        if sum == ROBBER_DICE_VALUE {
            self.begin_throw_from(0);
            return;
        }
        for (owner, wanted) in self.board.resource_distribution(sum) {
            let supplied = self.bank.supply(&wanted);
            if let Some(idx) = self.index_of(owner) {
                self.players[idx].receive_cards(&supplied);
                debug!("{} collects {supplied}", self.players[idx].name());
            }
        }
        self.enter_make_move();
    }

    /// Finds the next over-limit hand at or after `seat`, or hands the turn
    /// owner the robber.
    fn begin_throw_from(&mut self, seat: usize) {
        let next = (seat..self.players.len())
            .find(|&idx| self.players[idx].resource_hand_size() > MAX_CARDS_IN_HAND);
        match next {
            Some(idx) => {
                let size = self.players[idx].resource_hand_size();
                self.throw_idx = Some(idx);
                self.throw_target = size - size / 2;
                self.phase = GamePhase::RobberThrow;
                self.possible_moves = self.throw_moves(idx);
                debug!(
                    "{} holds {size} cards and must throw down to {}",
                    self.players[idx].name(),
                    self.throw_target
                );
            }
            None => {
                self.throw_idx = None;
                self.phase = GamePhase::RobberPlace;
                self.possible_moves = self.knight_moves(self.turn_idx, true);
            }
        }
    }

    fn robber_throw(&mut self, mv: Move) -> Result<(), GameError> {
        let (Move::Throw { cards, .. }, Some(idx)) = (mv, self.throw_idx) else {
            return Ok(());
        };
        self.players[idx].throw_cards(&cards)?;
        self.bank.receive(&cards);
        if self.players[idx].resource_hand_size() > self.throw_target {
            self.possible_moves = self.throw_moves(idx);
        } else {
            self.begin_throw_from(idx + 1);
        }
        Ok(())
    }

    fn robber_place(&mut self, mv: Move) -> Result<(), GameError> {
        if let Move::UseKnight { tile, victim, .. } = mv {
            self.robber_protocol(self.turn_idx, tile, victim)?;
        }
        self.enter_make_move();
        Ok(())
    }

    fn enter_make_move(&mut self) {
        self.phase = GamePhase::MakeMove;
        self.possible_moves = self.main_moves(self.turn_idx);
    }

    fn make_move(&mut self, mv: Move) -> Result<(), GameError> {
        self.apply(mv)?;
        if matches!(mv, Move::Pass { .. }) {
            if !self.is_game_over() {
                self.turn_idx = (self.turn_idx + 1) % self.players.len();
                self.begin_turn();
            }
        } else if self.phase == GamePhase::RoadBuilding {
            self.offer_free_road();
        } else {
            self.possible_moves = self.main_moves(self.turn_idx);
        }
        Ok(())
    }

    fn road_building(&mut self, mv: Move) -> Result<(), GameError> {
        if let Move::Build {
            placement: placement @ Placement::Road(_),
            ..
        } = mv
        {
            self.place(self.turn_idx, placement);
            self.update_longest_road(self.turn_idx);
            self.free_roads_left = self.free_roads_left.saturating_sub(1);
        }
        self.offer_free_road();
        Ok(())
    }

    /// Stays in the Road Building sub-phase while roads remain to place and
    /// somewhere to place them.
    fn offer_free_road(&mut self) {
        if self.free_roads_left > 0 {
            let roads = self.free_road_moves(self.turn_idx);
            if !roads.is_empty() {
                self.phase = GamePhase::RoadBuilding;
                self.possible_moves = roads;
                return;
            }
        }
        self.free_roads_left = 0;
        self.enter_make_move();
    }

    // ---- move application ----

    fn apply(&mut self, mv: Move) -> Result<(), GameError> {
        let idx = self.turn_idx;
        match mv {
            Move::Pass { .. } => {}
            Move::BuyDevelopment { .. } => {
                self.players[idx].throw_cards(&COST_DEVELOPMENT)?;
                self.bank.receive(&COST_DEVELOPMENT);
                let card = self.bank.draw_development(&mut self.rng)?;
                self.players[idx].receive_cards(&Hand::of(card, 1));
                self.dev_bought_this_turn.add(card, 1);
                debug!("{} bought {card}", self.players[idx].name());
            }
            Move::UseKnight {
                tile,
                victim,
                robber_activated,
                ..
            } => {
                if !robber_activated {
                    self.players[idx].use_development(DevelopmentCard::Knight)?;
                    self.dev_used_this_turn = true;
                    self.update_largest_army(idx);
                }
                self.robber_protocol(idx, tile, victim)?;
            }
            Move::UseMonopoly { resource, .. } => {
                self.players[idx].use_development(DevelopmentCard::Monopoly)?;
                self.dev_used_this_turn = true;
                let gained = self.monopolize(idx, resource);
                debug!(
                    "{} monopolizes {resource}: {gained}",
                    self.players[idx].name()
                );
            }
            Move::UseYearOfPlenty { resources, .. } => {
                self.players[idx].use_development(DevelopmentCard::YearOfPlenty)?;
                self.dev_used_this_turn = true;
                let taken: Hand = resources.into_iter().map(Resource::card).collect();
                self.bank.dispense(&taken)?;
                self.players[idx].receive_cards(&taken);
            }
            Move::UseRoadBuilding { .. } => {
                self.players[idx].use_development(DevelopmentCard::RoadBuilding)?;
                self.dev_used_this_turn = true;
                self.free_roads_left = ROAD_BUILDING_NUM_ROADS;
                self.phase = GamePhase::RoadBuilding;
            }
            Move::Build {
                placement, free, ..
            } => {
                if !free {
                    let cost = placement.cost();
                    self.players[idx].throw_cards(&cost)?;
                    self.bank.receive(&cost);
                }
                self.place(idx, placement);
                if let Placement::Road(_) = placement {
                    self.update_longest_road(idx);
                }
            }
            Move::Trade { gives, gets, .. } => {
                self.players[idx].throw_cards(&gives)?;
                self.bank.receive(&gives);
                self.bank.dispense(&gets)?;
                self.players[idx].receive_cards(&gets);
            }
            Move::Throw { .. } => {}
        }
        Ok(())
    }

    fn place(&mut self, idx: usize, placement: Placement) {
        let player = &mut self.players[idx];
        match placement {
            Placement::Settlement(node) => player.add_settlement(node),
            Placement::City(node) => player.add_city(node),
            Placement::Road(edge) => player.add_road(edge),
        }
        self.board.build(Buildable::new(player.id(), placement));
        debug!(
            "{} built {} at {:#04x}",
            player.name(),
            placement.kind(),
            placement.coord()
        );
    }

    fn monopolize(&mut self, idx: usize, resource: Resource) -> Hand {
        let mut gained = Hand::empty();
        for (other, player) in self.players.iter_mut().enumerate() {
            if other != idx {
                gained.insert(&player.resources_mut().remove_by_type(resource));
            }
        }
        self.players[idx].receive_cards(&gained);
        gained
    }

    /// Moves the robber and steals one random card from the victim, if any.
    fn robber_protocol(
        &mut self,
        idx: usize,
        tile: TileId,
        victim: Option<PlayerId>,
    ) -> Result<(), GameError> {
        self.board.move_robber_to(tile);
        let Some(victim) = victim else {
            debug!("robber moved to {tile}, nobody robbed");
            return Ok(());
        };
        let victim_idx = self
            .index_of(victim)
            .ok_or(GameError::UnknownPlayer(victim))?;
        if self.players[victim_idx].resource_hand().is_empty() {
            debug!("robber moved to {tile}, {victim} had nothing to steal");
            return Ok(());
        }
        let card = self.players[victim_idx]
            .resources_mut()
            .remove_random_card(&mut self.rng)?;
        self.players[idx].receive_cards(&Hand::of(card, 1));
        debug!(
            "robber moved to {tile}, {} stole {card} from {}",
            self.players[idx].name(),
            self.players[victim_idx].name()
        );
        Ok(())
    }

    fn update_longest_road(&mut self, idx: usize) {
        let length = self.board.longest_road_length(&self.players[idx]);
        match self.players.iter().position(Player::has_longest_road) {
            Some(holder) if holder != idx => {
                let held = self.board.longest_road_length(&self.players[holder]);
                if length > held {
                    self.players[holder].set_longest_road(false);
                    self.players[idx].set_longest_road(true);
                    debug!(
                        "{} takes longest road ({length} > {held})",
                        self.players[idx].name()
                    );
                }
            }
            Some(_) => {}
            None if length >= MIN_LONGEST_ROAD => {
                self.players[idx].set_longest_road(true);
                debug!("{} earns longest road ({length})", self.players[idx].name());
            }
            None => {}
        }
    }

    fn update_largest_army(&mut self, idx: usize) {
        let size = self.players[idx].army_size();
        match self.players.iter().position(Player::has_largest_army) {
            Some(holder) if holder != idx => {
                let held = self.players[holder].army_size();
                if size > held {
                    self.players[holder].set_largest_army(false);
                    self.players[idx].set_largest_army(true);
                    debug!(
                        "{} takes largest army ({size} > {held})",
                        self.players[idx].name()
                    );
                }
            }
            Some(_) => {}
            None if size >= MIN_LARGEST_ARMY => {
                self.players[idx].set_largest_army(true);
                debug!("{} earns largest army ({size})", self.players[idx].name());
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::{EdgeId, legal_edges, legal_nodes};
    use crate::game::players::{MAX_ROADS, RosterBuilder, VP_LONGEST_ROAD};
    use crate::types::Card;
    use pretty_assertions::assert_eq;

    fn roster(n: usize) -> Vec<Player> {
        let mut builder = RosterBuilder::new();
        for _ in 0..n {
            builder.add(None).unwrap();
        }
        builder.build()
    }

    fn session(n: usize, seed: u64) -> GameSession {
        let config = GameConfig {
            seed,
            ..GameConfig::default()
        };
        GameSession::new(roster(n), config).unwrap()
    }

    /// A road path over `len` distinct edges whose nodes avoid `blocked`.
    fn road_path(start: NodeId, len: usize, blocked: &[NodeId]) -> Option<Vec<EdgeId>> {
        fn extend(path: &mut Vec<NodeId>, len: usize, blocked: &[NodeId]) -> bool {
            if path.len() == len + 1 {
                return true;
            }
            let Some(&last) = path.last() else {
                return false;
            };
            for &next in last.neighbors() {
                if path.contains(&next) || blocked.contains(&next) {
                    continue;
                }
                path.push(next);
                if extend(path, len, blocked) {
                    return true;
                }
                path.pop();
            }
            false
        }
        if blocked.contains(&start) {
            return None;
        }
        let mut nodes = vec![start];
        if !extend(&mut nodes, len, blocked) {
            return None;
        }
        let edges = nodes
            .windows(2)
            .map(|pair| {
                *pair[0]
                    .edges()
                    .iter()
                    .find(|e| e.touches(pair[1]))
                    .unwrap()
            })
            .collect();
        Some(edges)
    }

    fn lay_roads(game: &mut GameSession, idx: usize, roads: &[EdgeId]) {
        for &edge in roads {
            game.place(idx, Placement::Road(edge));
            game.update_longest_road(idx);
        }
    }

    /// Advances a finished pre-game to the turn owner's main phase.
    fn reach_make_move(game: &mut GameSession) {
        while game.phase() != GamePhase::MakeMove {
            let mv = game.possible_moves()[0];
            game.simulate(mv).unwrap();
        }
    }

    fn play_road_building(game: &mut GameSession) {
        let idx = game.turn_idx;
        game.players[idx].receive_cards(&Hand::of(DevelopmentCard::RoadBuilding, 1));
        game.enter_make_move();
        let card = Move::UseRoadBuilding {
            player: game.current_player(),
        };
        assert!(game.possible_moves().contains(&card));
        game.simulate(card).unwrap();
    }

    /// Plays the pre-game by always taking the first offered move.
    fn finish_pre_game(game: &mut GameSession) {
        let mut moves = game.start().to_vec();
        while matches!(
            game.phase(),
            GamePhase::PreGameSettlement | GamePhase::PreGameRoad
        ) {
            moves = game.simulate(moves[0]).unwrap().to_vec();
        }
    }

    #[test]
    fn rejects_bad_player_counts() {
        let config = GameConfig::default();
        assert_eq!(
            GameSession::new(roster(2), config.clone()).unwrap_err(),
            GameError::InvalidPlayerCount(2)
        );
        assert!(GameSession::new(roster(5), config).is_err());
    }

    #[test]
    fn pre_game_is_snake_ordered() {
        let mut game = session(3, 1);
        let order: Vec<PlayerId> = game.players().iter().map(Player::id).collect();
        let mut seats = Vec::new();
        let mut moves = game.start().to_vec();
        while game.phase() == GamePhase::PreGameSettlement {
            seats.push(game.current_player());
            moves = game.simulate(moves[0]).unwrap().to_vec();
            assert_eq!(game.phase(), GamePhase::PreGameRoad);
            moves = game.simulate(moves[0]).unwrap().to_vec();
        }
        assert_eq!(
            seats,
            vec![order[0], order[1], order[2], order[2], order[1], order[0]]
        );
        assert_eq!(game.num_turns_played(), 1);
        assert_eq!(game.current_player(), order[0]);
    }

    #[test]
    fn starting_resources_come_from_the_deck() {
        let mut game = session(3, 5);
        finish_pre_game(&mut game);
        let held: usize = game.players().iter().map(Player::resource_hand_size).sum();
        let taken = Hand::resource_deck().size() - game.bank().resources().size();
        // The first main-game roll may already have paid out.
        assert_eq!(held, taken);
        for player in game.players() {
            assert_eq!(player.num_settlements(), 2);
            assert_eq!(player.num_roads(), 2);
        }
    }

    #[test]
    fn off_list_moves_are_rejected_without_mutation() {
        let mut game = session(3, 2);
        game.start();
        let before = game.players().to_vec();
        let bogus = Move::Pass {
            player: game.current_player(),
        };
        assert!(matches!(
            game.simulate(bogus),
            Err(GameError::IllegalMoveSubmitted { .. })
        ));
        assert_eq!(game.players(), &before[..]);
        assert_eq!(game.phase(), GamePhase::PreGameSettlement);
    }

    #[test]
    fn pass_is_always_offered_in_make_move() {
        for seed in 0..10 {
            let mut game = session(4, seed);
            finish_pre_game(&mut game);
            while game.phase() != GamePhase::MakeMove {
                let mv = game.possible_moves()[0];
                game.simulate(mv).unwrap();
            }
            let pass = Move::Pass {
                player: game.current_player(),
            };
            assert!(game.possible_moves().contains(&pass));
        }
    }

    #[test]
    fn sim_moves_hide_opponent_development_plays() {
        let mut game = session(3, 9);
        finish_pre_game(&mut game);
        let me = game.current_player();
        let idx = game.index_of(me).unwrap();
        game.players[idx].receive_cards(&Hand::of(DevelopmentCard::Monopoly, 1));
        game.enter_make_move();
        let other = game.opponents(me).next().unwrap().id();
        assert!(
            game.possible_sim_moves(me)
                .iter()
                .any(|m| matches!(m, Move::UseMonopoly { .. }))
        );
        assert!(
            game.possible_sim_moves(other)
                .iter()
                .all(|m| m.development().is_none())
        );
    }

    #[test]
    fn branch_is_independent() {
        let mut game = session(3, 4);
        finish_pre_game(&mut game);
        let snapshot = game.players().to_vec();
        let mut copy = game.branch(77);
        let mv = copy.possible_moves()[0];
        copy.simulate(mv).unwrap();
        copy.players[0].receive_cards(&Hand::of(Card::Ore, 3));
        assert_eq!(game.players(), &snapshot[..]);
    }

    #[test]
    fn monopoly_drains_opponents() {
        let mut game = session(3, 12);
        finish_pre_game(&mut game);
        for player in game.players.iter_mut() {
            *player.resources_mut() = Hand::of(Resource::Wheat, 2);
        }
        let idx = game.turn_idx;
        game.monopolize(idx, Resource::Wheat);
        assert_eq!(game.players[idx].resource_hand().count(Resource::Wheat), 6);
        let others: usize = game
            .players
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != idx)
            .map(|(_, p)| p.resource_hand_size())
            .sum();
        assert_eq!(others, 0);
    }

    #[test]
    fn army_title_transfers_only_on_strict_improvement() {
        let mut game = session(3, 3);
        finish_pre_game(&mut game);
        let knights = |game: &mut GameSession, idx: usize, n: u8| {
            game.players[idx].receive_cards(&Hand::of(DevelopmentCard::Knight, n));
            for _ in 0..n {
                game.players[idx]
                    .use_development(DevelopmentCard::Knight)
                    .unwrap();
            }
            game.update_largest_army(idx);
        };
        knights(&mut game, 0, 2);
        assert_eq!(game.largest_army_player(), None);
        knights(&mut game, 0, 1);
        assert_eq!(game.largest_army_player(), Some(game.players[0].id()));
        knights(&mut game, 1, 3);
        assert_eq!(game.largest_army_player(), Some(game.players[0].id()));
        knights(&mut game, 1, 1);
        assert_eq!(game.largest_army_player(), Some(game.players[1].id()));
        assert!(!game.players[0].has_largest_army());
        assert_eq!(game.largest_army_size(), 4);
    }

    #[test]
    fn road_title_starts_at_five() {
        let mut game = session(3, 5);
        let path = legal_nodes()
            .iter()
            .find_map(|&n| road_path(n, MIN_LONGEST_ROAD, &[]))
            .unwrap();
        lay_roads(&mut game, 0, &path[..MIN_LONGEST_ROAD - 1]);
        assert_eq!(game.longest_road_player(), None);
        assert_eq!(game.players[0].victory_points(), 0);
        lay_roads(&mut game, 0, &path[MIN_LONGEST_ROAD - 1..]);
        assert_eq!(game.longest_road_player(), Some(game.players[0].id()));
        assert_eq!(game.players[0].victory_points(), VP_LONGEST_ROAD);
    }

    #[test]
    fn road_title_moves_only_to_a_strictly_longer_road() {
        let mut game = session(3, 5);
        let holder = legal_nodes()
            .iter()
            .find_map(|&n| road_path(n, MIN_LONGEST_ROAD, &[]))
            .unwrap();
        let taken: Vec<NodeId> = holder.iter().flat_map(|e| e.nodes()).collect();
        let rival = legal_nodes()
            .iter()
            .find_map(|&n| road_path(n, MIN_LONGEST_ROAD + 1, &taken))
            .unwrap();
        lay_roads(&mut game, 0, &holder);
        assert_eq!(game.longest_road_player(), Some(game.players[0].id()));

        lay_roads(&mut game, 1, &rival[..MIN_LONGEST_ROAD]);
        assert_eq!(game.longest_road_player(), Some(game.players[0].id()));
        assert_eq!(game.players[1].victory_points(), 0);

        lay_roads(&mut game, 1, &rival[MIN_LONGEST_ROAD..]);
        assert_eq!(game.longest_road_player(), Some(game.players[1].id()));
        assert_eq!(game.players[1].victory_points(), VP_LONGEST_ROAD);
        assert_eq!(game.players[0].victory_points(), 0);
        assert_eq!(game.longest_road_length(), MIN_LONGEST_ROAD + 1);
    }

    #[test]
    fn road_building_places_two_free_roads() {
        let mut game = session(3, 14);
        finish_pre_game(&mut game);
        reach_make_move(&mut game);
        let idx = game.turn_idx;
        let me = game.current_player();
        let hand = *game.players[idx].resource_hand();
        let roads = game.players[idx].num_roads();

        play_road_building(&mut game);
        for placed in 1..=2 {
            assert_eq!(game.phase(), GamePhase::RoadBuilding);
            assert!(!game.possible_moves().is_empty());
            assert!(game.possible_moves().iter().all(|m| matches!(
                m,
                Move::Build {
                    placement: Placement::Road(_),
                    free: true,
                    ..
                }
            ) && m.player() == me));
            let mv = game.possible_moves()[0];
            game.simulate(mv).unwrap();
            assert_eq!(game.players[idx].num_roads(), roads + placed);
        }
        assert_eq!(game.phase(), GamePhase::MakeMove);
        assert_eq!(game.players[idx].resource_hand(), &hand);
        assert!(game.dev_used_this_turn());
        assert_eq!(game.players[idx].used_dev_hand().count(DevelopmentCard::RoadBuilding), 1);
    }

    #[test]
    fn road_building_ends_early_without_road_supply() {
        let mut game = session(3, 14);
        finish_pre_game(&mut game);
        reach_make_move(&mut game);
        let idx = game.turn_idx;
        let spare: Vec<EdgeId> = legal_edges()
            .iter()
            .copied()
            .filter(|e| game.board().edge(*e).is_none())
            .collect();
        let missing = MAX_ROADS - 1 - game.players[idx].num_roads();
        for &edge in spare.iter().rev().take(missing) {
            game.place(idx, Placement::Road(edge));
        }
        assert_eq!(game.players[idx].num_roads(), MAX_ROADS - 1);

        play_road_building(&mut game);
        assert_eq!(game.phase(), GamePhase::RoadBuilding);
        let mv = game.possible_moves()[0];
        game.simulate(mv).unwrap();
        assert_eq!(game.players[idx].num_roads(), MAX_ROADS);
        assert_eq!(game.phase(), GamePhase::MakeMove);
        assert!(
            game.possible_moves()
                .iter()
                .all(|m| m.building_kind() != Some(crate::types::BuildingKind::Road))
        );
    }
}
