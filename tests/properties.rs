use catan_sim::game::Bank;
use catan_sim::{Board, Card, Hand};
use proptest::prelude::*;
use rand::{SeedableRng, rngs::StdRng};

fn hand() -> impl Strategy<Value = Hand> {
    prop::collection::vec((0..Card::COUNT, 0u8..6), 0..12).prop_map(|entries| {
        entries.into_iter().fold(Hand::empty(), |mut hand, (idx, n)| {
            hand.add(Card::ALL[idx], n);
            hand
        })
    })
}

proptest! {
    #[test]
    fn insert_then_remove_restores(a in hand(), b in hand()) {
        let mut merged = a;
        merged.insert(&b);
        prop_assert_eq!(merged.size(), a.size() + b.size());
        prop_assert!(merged.contains(&b));
        merged.remove(&b).unwrap();
        prop_assert_eq!(merged, a);
    }

    #[test]
    fn containment_matches_per_tag_counts(a in hand(), b in hand()) {
        let expected = Card::ALL.iter().all(|c| a.count(*c) >= b.count(*c));
        prop_assert_eq!(a.contains(&b), expected);
        prop_assert_eq!(a == b, a.contains(&b) && b.contains(&a));
    }

    #[test]
    fn failed_remove_leaves_hand_untouched(a in hand(), b in hand()) {
        let mut target = a;
        match target.remove(&b) {
            Ok(()) => prop_assert_eq!(target.size(), a.size() - b.size()),
            Err(_) => prop_assert_eq!(target, a),
        }
    }

    #[test]
    fn remove_as_much_takes_what_both_hold(a in hand(), b in hand()) {
        let mut target = a;
        let taken = target.remove_as_much(&b);
        prop_assert!(a.contains(&taken));
        prop_assert!(b.contains(&taken));
        target.insert(&taken);
        prop_assert_eq!(target, a);
    }

    #[test]
    fn bank_supply_conserves_cards(wanted in hand()) {
        let mut bank = Bank::standard();
        let before = bank.resources().size();
        let handed = bank.supply(&wanted.resources());
        prop_assert!(wanted.contains(&handed));
        prop_assert_eq!(bank.resources().size() + handed.size(), before);
        bank.receive(&handed);
        prop_assert_eq!(bank, Bank::standard());
    }

    #[test]
    fn every_shuffle_keeps_the_token_set(seed in any::<u64>()) {
        let board = Board::new(&mut StdRng::seed_from_u64(seed));
        let mut tokens: Vec<u8> = board
            .tiles()
            .iter()
            .filter(|t| !t.is_desert())
            .map(|t| t.token())
            .collect();
        tokens.sort_unstable();
        prop_assert_eq!(
            tokens,
            vec![2, 3, 3, 4, 4, 5, 5, 6, 6, 8, 8, 9, 9, 10, 10, 11, 11, 12]
        );
        prop_assert!(board.tile(board.robber_tile()).is_desert());
        prop_assert_eq!(board.tiles().iter().filter(|t| t.has_robber()).count(), 1);
    }
}
