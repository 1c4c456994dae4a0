//! Legal move generation. The session is the only gatekeeper: applying a move
//! assumes it came from one of these lists.

use itertools::Itertools;
use smallvec::SmallVec;

use crate::board::{
    BANK_TRADE_RATIO, GENERIC_HARBOR_RATIO, Placement, SPECIAL_HARBOR_RATIO, dice_probability,
};
use crate::coords::{EdgeId, NodeId, TileId, legal_nodes};
use crate::game::action::Move;
use crate::game::hand::{COST_CITY, COST_DEVELOPMENT, COST_ROAD, COST_SETTLEMENT, Hand};
use crate::game::players::{MAX_CITIES, MAX_ROADS, MAX_SETTLEMENTS, PlayerId};
use crate::game::state::GameSession;
use crate::types::{DevelopmentCard, Harbor, Resource};

const BUILDABLE_WEIGHT: f64 = 0.6;
const ALMOST_BUILDABLE_WEIGHT: f64 = 0.3;

impl GameSession {
    pub(crate) fn pre_game_settlement_moves(&self, idx: usize) -> Vec<Move> {
        let player = self.players[idx].id();
        legal_nodes()
            .iter()
            .filter(|n| self.board.is_settleable(**n))
            .map(|&node| Move::Build {
                player,
                placement: Placement::Settlement(node),
                free: true,
            })
            .collect()
    }

    pub(crate) fn pre_game_road_moves(&self, idx: usize, settlement: NodeId) -> Vec<Move> {
        let player = self.players[idx].id();
        settlement
            .edges()
            .iter()
            .filter(|e| self.board.edge(**e).is_none())
            .map(|&edge| Move::Build {
                player,
                placement: Placement::Road(edge),
                free: true,
            })
            .collect()
    }

    /// One single-card throw per distinct resource held.
    pub(crate) fn throw_moves(&self, idx: usize) -> Vec<Move> {
        let player = &self.players[idx];
        player
            .resource_hand()
            .resource_kinds()
            .map(|r| Move::Throw {
                player: player.id(),
                cards: Hand::of(r, 1),
            })
            .collect()
    }

    /// Robber targets: every non-desert tile other than the robber's, paired
    /// with each opponent building on it, or with no victim when none does.
    pub(crate) fn knight_moves(&self, idx: usize, robber_activated: bool) -> Vec<Move> {
        let player = self.players[idx].id();
        let robber = self.board.robber_tile();
        let mut moves = Vec::new();
        for tile in self.board.tiles() {
            if tile.id() == robber || tile.is_desert() {
                continue;
            }
            let victims = self.victims_on(tile.id(), player);
            if victims.is_empty() {
                moves.push(Move::UseKnight {
                    player,
                    tile: tile.id(),
                    victim: None,
                    robber_activated,
                });
            }
            for victim in victims {
                moves.push(Move::UseKnight {
                    player,
                    tile: tile.id(),
                    victim: Some(victim),
                    robber_activated,
                });
            }
        }
        moves
    }

    fn victims_on(&self, tile: TileId, player: PlayerId) -> SmallVec<[PlayerId; 3]> {
        let mut victims = SmallVec::new();
        for node in tile.nodes() {
            if let Some(owner) = self.board.owner_at(*node) {
                if owner != player && !victims.contains(&owner) {
                    victims.push(owner);
                }
            }
        }
        victims
    }

    /// Held, not VP, and not only bought this turn.
    pub(crate) fn can_play(&self, idx: usize, card: DevelopmentCard) -> bool {
        card != DevelopmentCard::VictoryPoint
            && !self.dev_used_this_turn
            && self.players[idx].dev_hand().count(card) > self.dev_bought_this_turn.count(card)
    }

    pub(crate) fn main_moves(&self, idx: usize) -> Vec<Move> {
        let player = &self.players[idx];
        let id = player.id();
        let hand = player.resource_hand();
        let mut moves = vec![Move::Pass { player: id }];

        if hand.contains(&COST_DEVELOPMENT) && self.bank.has_development() {
            moves.push(Move::BuyDevelopment { player: id });
        }

        for card in DevelopmentCard::ALL {
            if !self.can_play(idx, card) {
                continue;
            }
            match card {
                DevelopmentCard::Knight => moves.extend(self.knight_moves(idx, false)),
                DevelopmentCard::Monopoly => {
                    moves.extend(
                        Resource::ALL
                            .into_iter()
                            .map(|resource| Move::UseMonopoly {
                                player: id,
                                resource,
                            }),
                    );
                }
                DevelopmentCard::YearOfPlenty => {
                    for (a, b) in Resource::ALL.into_iter().tuple_combinations() {
                        if self.bank.available(a) > 0 && self.bank.available(b) > 0 {
                            moves.push(Move::UseYearOfPlenty {
                                player: id,
                                resources: [a, b],
                            });
                        }
                    }
                }
                DevelopmentCard::RoadBuilding => {
                    moves.push(Move::UseRoadBuilding { player: id });
                }
                DevelopmentCard::VictoryPoint => {}
            }
        }

        if hand.contains(&COST_SETTLEMENT) && player.num_settlements() < MAX_SETTLEMENTS {
            moves.extend(self.buildable_nodes(idx).into_iter().map(|node| Move::Build {
                player: id,
                placement: Placement::Settlement(node),
                free: false,
            }));
        }

        if hand.contains(&COST_CITY) && player.num_cities() < MAX_CITIES {
            moves.extend(player.settlements().iter().map(|&node| Move::Build {
                player: id,
                placement: Placement::City(node),
                free: false,
            }));
        }

        if hand.contains(&COST_ROAD) && player.num_roads() < MAX_ROADS {
            moves.extend(self.buildable_edges(idx).into_iter().map(|edge| Move::Build {
                player: id,
                placement: Placement::Road(edge),
                free: false,
            }));
        }

        moves.extend(self.trade_moves(idx));
        moves
    }

    pub(crate) fn free_road_moves(&self, idx: usize) -> Vec<Move> {
        let player = &self.players[idx];
        if player.num_roads() >= MAX_ROADS {
            return Vec::new();
        }
        self.buildable_edges(idx)
            .into_iter()
            .map(|edge| Move::Build {
                player: player.id(),
                placement: Placement::Road(edge),
                free: true,
            })
            .collect()
    }

    /// Bank 4:1, generic harbor 3:1 and resource harbor 2:1 trades, each for
    /// one card of a different kind the bank still holds.
    fn trade_moves(&self, idx: usize) -> Vec<Move> {
        let player = &self.players[idx];
        let hand = player.resource_hand();
        let mut offers: Vec<Hand> = Resource::ALL
            .into_iter()
            .filter(|r| hand.count(*r) >= BANK_TRADE_RATIO)
            .map(|r| Hand::of(r, BANK_TRADE_RATIO))
            .collect();
        if player.has_generic_harbor() {
            offers.extend(
                Resource::ALL
                    .into_iter()
                    .filter(|r| hand.count(*r) >= GENERIC_HARBOR_RATIO)
                    .map(|r| Hand::of(r, GENERIC_HARBOR_RATIO)),
            );
        }
        for harbor in player.harbor_kinds() {
            if let Harbor::Special(r) = harbor {
                if hand.count(r) >= SPECIAL_HARBOR_RATIO {
                    offers.push(Hand::of(r, SPECIAL_HARBOR_RATIO));
                }
            }
        }

        let mut moves = Vec::new();
        for gives in offers {
            let Some(given) = gives.resource_kinds().next() else {
                continue;
            };
            for wanted in self.bank.available_resources().filter(|r| *r != given) {
                moves.push(Move::Trade {
                    player: player.id(),
                    gives,
                    gets: Hand::of(wanted, 1),
                });
            }
        }
        moves
    }

    /// Free road endpoints that pass the distance rule.
    pub(crate) fn buildable_nodes(&self, idx: usize) -> Vec<NodeId> {
        self.road_endpoints(idx)
            .into_iter()
            .filter(|n| self.board.is_settleable(*n))
            .collect()
    }

    /// Free edges touching the player's network, excluding their own roads.
    pub(crate) fn buildable_edges(&self, idx: usize) -> Vec<EdgeId> {
        let player = &self.players[idx];
        let mut network = self.road_endpoints(idx);
        network.extend(player.buildings());
        network
            .into_iter()
            .flat_map(|n| n.edges().iter().copied())
            .filter(|e| self.board.edge(*e).is_none())
            .sorted_unstable()
            .dedup()
            .collect()
    }

    fn road_endpoints(&self, idx: usize) -> Vec<NodeId> {
        self.players[idx]
            .roads()
            .iter()
            .flat_map(|e| e.nodes())
            .sorted_unstable()
            .dedup()
            .collect()
    }

    /// Board potential around the player's road network: tiles next to
    /// settleable endpoints weigh 0.6, tiles next to nodes one step beyond
    /// the network weigh 0.3.
    pub fn potential_probability_score(&self, player: PlayerId) -> f64 {
        let Some(idx) = self.index_of(player) else {
            return 0.0;
        };
        let endpoints = self.road_endpoints(idx);
        let almost: Vec<NodeId> = endpoints
            .iter()
            .flat_map(|n| n.neighbors().iter().copied())
            .filter(|n| self.board.is_settleable(*n) && !endpoints.contains(n))
            .sorted_unstable()
            .dedup()
            .collect();

        let around = |nodes: &[NodeId]| -> f64 {
            nodes
                .iter()
                .flat_map(|n| n.tiles().iter())
                .map(|t| self.board.tile(*t).token())
                .filter(|token| *token > 0)
                .map(dice_probability)
                .sum()
        };
        BUILDABLE_WEIGHT * around(&self.buildable_nodes(idx)) + ALMOST_BUILDABLE_WEIGHT * around(&almost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::players::{Player, RosterBuilder};
    use crate::game::state::{GameConfig, GamePhase};
    use crate::types::Card;

    fn ready_session(seed: u64) -> GameSession {
        let mut roster = RosterBuilder::new();
        for _ in 0..3 {
            roster.add(None).unwrap();
        }
        let config = GameConfig {
            seed,
            ..GameConfig::default()
        };
        let mut game = GameSession::new(roster.build(), config).unwrap();
        let mut moves = game.start().to_vec();
        while matches!(
            game.phase(),
            GamePhase::PreGameSettlement | GamePhase::PreGameRoad
        ) {
            moves = game.simulate(moves[0]).unwrap().to_vec();
        }
        game
    }

    fn set_hand(game: &mut GameSession, idx: usize, hand: Hand) {
        *game.players[idx].resources_mut() = hand;
    }

    #[test]
    fn generated_builds_and_trades_are_affordable() {
        for seed in 0..8 {
            let mut game = ready_session(seed);
            let idx = game.turn_idx;
            set_hand(
                &mut game,
                idx,
                Hand::of(Resource::Brick, 2)
                    .with(Card::Forest, 1)
                    .with(Card::Ore, 4),
            );
            let hand = *game.players[idx].resource_hand();
            for mv in game.main_moves(idx) {
                match mv {
                    Move::Build {
                        placement, free, ..
                    } => {
                        assert!(!free);
                        assert!(hand.contains(&placement.cost()));
                    }
                    Move::Trade { gives, .. } => assert!(hand.contains(&gives)),
                    _ => {}
                }
            }
        }
    }

    /// A seated session before any placement, so nobody owns a harbor.
    fn unbuilt_session(seed: u64) -> GameSession {
        let mut roster = RosterBuilder::new();
        for _ in 0..3 {
            roster.add(None).unwrap();
        }
        let config = GameConfig {
            seed,
            ..GameConfig::default()
        };
        GameSession::new(roster.build(), config).unwrap()
    }

    fn trades(game: &GameSession, idx: usize) -> Vec<(Hand, Hand)> {
        game.main_moves(idx)
            .into_iter()
            .filter_map(|m| match m {
                Move::Trade { gives, gets, .. } => Some((gives, gets)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn four_of_a_kind_offers_one_bank_trade_per_other_resource() {
        let mut game = unbuilt_session(21);
        assert!(game.players[0].harbors().is_empty());
        set_hand(&mut game, 0, Hand::of(Resource::Sheep, 4));
        let offered = trades(&game, 0);
        assert_eq!(offered.len(), 4);
        for (gives, gets) in &offered {
            assert_eq!(*gives, Hand::of(Resource::Sheep, 4));
            assert_eq!(gets.size(), 1);
            assert_eq!(gets.count(Resource::Sheep), 0);
        }
    }

    #[test]
    fn exhausted_bank_kind_is_not_offered() {
        let mut game = unbuilt_session(21);
        set_hand(&mut game, 0, Hand::of(Resource::Sheep, 4));
        game.bank.dispense(&Hand::of(Resource::Ore, 19)).unwrap();
        assert_eq!(game.bank().available(Resource::Ore), 0);
        let offered = trades(&game, 0);
        assert_eq!(offered.len(), 3);
        assert!(offered.iter().all(|(_, gets)| gets.count(Resource::Ore) == 0));
    }

    #[test]
    fn knight_moves_cover_every_eligible_tile() {
        let game = ready_session(2);
        let idx = game.turn_idx;
        let moves = game.knight_moves(idx, true);
        let tiles: Vec<TileId> = moves
            .iter()
            .filter_map(|m| match m {
                Move::UseKnight { tile, .. } => Some(*tile),
                _ => None,
            })
            .dedup()
            .collect();
        assert_eq!(tiles.len(), 18);
        assert!(!tiles.contains(&game.board().robber_tile()));
        let me = game.players[idx].id();
        assert!(moves.iter().all(|m| match m {
            Move::UseKnight { victim, .. } => *victim != Some(me),
            _ => false,
        }));
    }

    #[test]
    fn development_cards_bought_this_turn_wait() {
        let mut game = ready_session(6);
        let idx = game.turn_idx;
        game.players[idx].receive_cards(&Hand::of(DevelopmentCard::Monopoly, 1));
        game.dev_bought_this_turn.add(DevelopmentCard::Monopoly, 1);
        assert!(!game.can_play(idx, DevelopmentCard::Monopoly));
        game.players[idx].receive_cards(&Hand::of(DevelopmentCard::Monopoly, 1));
        assert!(game.can_play(idx, DevelopmentCard::Monopoly));
        game.dev_used_this_turn = true;
        assert!(!game.can_play(idx, DevelopmentCard::Monopoly));
        game.players[idx].receive_cards(&Hand::of(DevelopmentCard::VictoryPoint, 1));
        assert!(!game.can_play(idx, DevelopmentCard::VictoryPoint));
    }

    #[test]
    fn year_of_plenty_offers_distinct_pairs() {
        let mut game = ready_session(8);
        let idx = game.turn_idx;
        game.players[idx].receive_cards(&Hand::of(DevelopmentCard::YearOfPlenty, 1));
        let pairs: Vec<[Resource; 2]> = game
            .main_moves(idx)
            .into_iter()
            .filter_map(|m| match m {
                Move::UseYearOfPlenty { resources, .. } => Some(resources),
                _ => None,
            })
            .collect();
        assert_eq!(pairs.len(), 10);
        assert!(pairs.iter().all(|[a, b]| a != b));
    }

    #[test]
    fn potential_score_is_non_negative_after_setup() {
        let game = ready_session(13);
        for player in game.players() {
            assert!(game.potential_probability_score(player.id()) >= 0.0);
        }
        let stranger: Vec<Player> = {
            let mut roster = RosterBuilder::new();
            for _ in 0..5 {
                roster.add(None).unwrap();
            }
            roster.build()
        };
        assert_eq!(game.potential_probability_score(stranger[4].id()), 0.0);
    }
}
