use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::types::{Card, CardClass, DevelopmentCard, Resource};

/// A multiset of cards keyed by [`Card`] tag.
///
/// Counts live in a flat array so cloning a hand is a plain copy. Two hands
/// compare equal exactly when each contains the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hand {
    counts: [u8; Card::COUNT],
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandError {
    #[error("resource shortfall: have {held} {card}, need {requested}")]
    ResourceShortfall { card: Card, held: u8, requested: u8 },
    #[error("cannot draw a card from an empty hand")]
    EmptyHand,
}

impl Hand {
    pub const fn empty() -> Self {
        Self {
            counts: [0; Card::COUNT],
        }
    }

    /// Builder used for the cost constants.
    pub const fn with(mut self, card: Card, amount: u8) -> Self {
        self.counts[card.index()] += amount;
        self
    }

    pub fn of(card: impl Into<Card>, amount: u8) -> Self {
        Self::empty().with(card.into(), amount)
    }

    /// The full 19-per-resource bank deck.
    pub fn resource_deck() -> Self {
        Resource::ALL
            .into_iter()
            .fold(Self::empty(), |hand, r| hand.with(r.card(), 19))
    }

    /// The 25-card development deck.
    pub fn development_deck() -> Self {
        DevelopmentCard::ALL
            .into_iter()
            .fold(Self::empty(), |hand, d| hand.with(d.card(), d.deck_count()))
    }

    pub fn count(&self, card: impl Into<Card>) -> u8 {
        self.counts[card.into().index()]
    }

    pub fn size(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    pub fn add(&mut self, card: impl Into<Card>, amount: u8) {
        let idx = card.into().index();
        self.counts[idx] = self.counts[idx].saturating_add(amount);
    }

    pub fn insert(&mut self, other: &Hand) {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
    }

    /// Removes every card of `other`, or nothing at all if any tag falls short.
    pub fn remove(&mut self, other: &Hand) -> Result<(), HandError> {
        if let Some(card) = self.first_shortfall(other) {
            return Err(HandError::ResourceShortfall {
                card,
                held: self.count(card),
                requested: other.count(card),
            });
        }
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts.iter()) {
            *mine -= *theirs;
        }
        Ok(())
    }

    /// Removes up to `other` from each tag and returns what was actually taken.
    pub fn remove_as_much(&mut self, other: &Hand) -> Hand {
        let mut removed = Hand::empty();
        for (idx, wanted) in other.counts.iter().enumerate() {
            let taken = (*wanted).min(self.counts[idx]);
            self.counts[idx] -= taken;
            removed.counts[idx] = taken;
        }
        removed
    }

    pub fn remove_by_type(&mut self, card: impl Into<Card>) -> Hand {
        let card = card.into();
        let taken = std::mem::take(&mut self.counts[card.index()]);
        Hand::of(card, taken)
    }

    pub fn contains(&self, other: &Hand) -> bool {
        self.first_shortfall(other).is_none()
    }

    fn first_shortfall(&self, other: &Hand) -> Option<Card> {
        Card::ALL
            .into_iter()
            .find(|card| self.counts[card.index()] < other.counts[card.index()])
    }

    /// Takes one card instance uniformly at random.
    pub fn remove_random_card<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Card, HandError> {
        let size = self.size();
        if size == 0 {
            return Err(HandError::EmptyHand);
        }
        let mut pick = rng.gen_range(0..size);
        for card in Card::ALL {
            let held = self.counts[card.index()] as usize;
            if pick < held {
                self.counts[card.index()] -= 1;
                return Ok(card);
            }
            pick -= held;
        }
        Err(HandError::EmptyHand)
    }

    pub fn cards_of_type(&self, card: impl Into<Card>) -> Hand {
        let card = card.into();
        Hand::of(card, self.count(card))
    }

    pub fn cards_of_class(&self, class: CardClass) -> Hand {
        let mut filtered = Hand::empty();
        for card in Card::ALL.into_iter().filter(|c| c.class() == class) {
            filtered.counts[card.index()] = self.counts[card.index()];
        }
        filtered
    }

    pub fn resources(&self) -> Hand {
        self.cards_of_class(CardClass::Resource)
    }

    pub fn developments(&self) -> Hand {
        self.cards_of_class(CardClass::Development)
    }

    /// Distinct tags held, with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (Card, u8)> + '_ {
        Card::ALL
            .into_iter()
            .map(|card| (card, self.counts[card.index()]))
            .filter(|(_, count)| *count > 0)
    }

    /// Distinct resource kinds held.
    pub fn resource_kinds(&self) -> impl Iterator<Item = Resource> + '_ {
        Resource::ALL
            .into_iter()
            .filter(|r| self.counts[r.card().index()] > 0)
    }

    /// One item per card instance.
    pub fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.iter()
            .flat_map(|(card, count)| std::iter::repeat(card).take(count as usize))
    }
}

impl FromIterator<Card> for Hand {
    fn from_iter<I: IntoIterator<Item = Card>>(iter: I) -> Self {
        let mut hand = Hand::empty();
        for card in iter {
            hand.add(card, 1);
        }
        hand
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        let parts: Vec<String> = self
            .iter()
            .map(|(card, amount)| format!("{amount}x{card}"))
            .collect();
        write!(f, "{}", parts.join(", "))
    }
}

pub const COST_ROAD: Hand = Hand::empty().with(Card::Brick, 1).with(Card::Forest, 1);
pub const COST_SETTLEMENT: Hand = Hand::empty()
    .with(Card::Brick, 1)
    .with(Card::Forest, 1)
    .with(Card::Sheep, 1)
    .with(Card::Wheat, 1);
pub const COST_CITY: Hand = Hand::empty().with(Card::Wheat, 2).with(Card::Ore, 3);
pub const COST_DEVELOPMENT: Hand = Hand::empty()
    .with(Card::Ore, 1)
    .with(Card::Sheep, 1)
    .with(Card::Wheat, 1);
