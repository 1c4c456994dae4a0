use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::hand::{Hand, HandError};
use crate::types::{DevelopmentCard, Resource};

/// The two draw piles: resource cards and development cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    resources: Hand,
    developments: Hand,
}

impl Default for Bank {
    fn default() -> Self {
        Self::standard()
    }
}

impl Bank {
    pub fn standard() -> Self {
        Self {
            resources: Hand::resource_deck(),
            developments: Hand::development_deck(),
        }
    }

    pub fn resources(&self) -> &Hand {
        &self.resources
    }

    pub fn developments(&self) -> &Hand {
        &self.developments
    }

    pub fn receive(&mut self, cards: &Hand) {
        self.resources.insert(cards);
    }

    pub fn dispense(&mut self, cards: &Hand) -> Result<(), HandError> {
        self.resources.remove(cards)
    }

    /// Hands out what the pile can cover and drops the rest.
    pub fn supply(&mut self, wanted: &Hand) -> Hand {
        self.resources.remove_as_much(wanted)
    }

    pub fn draw_development<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<DevelopmentCard, HandError> {
        let card = self.developments.remove_random_card(rng)?;
        card.development().ok_or(HandError::EmptyHand)
    }

    pub fn has_development(&self) -> bool {
        !self.developments.is_empty()
    }

    pub fn available(&self, resource: Resource) -> u8 {
        self.resources.count(resource)
    }

    pub fn available_resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.resources.resource_kinds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn supply_never_overdraws() {
        let mut bank = Bank::standard();
        let got = bank.supply(&Hand::of(Resource::Ore, 25));
        assert_eq!(got, Hand::of(Resource::Ore, 19));
        assert_eq!(bank.available(Resource::Ore), 0);
        assert!(!bank.available_resources().any(|r| r == Resource::Ore));
        assert!(bank.dispense(&Hand::of(Resource::Ore, 1)).is_err());
    }

    #[test]
    fn development_deck_drains_to_empty() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut bank = Bank::standard();
        let mut drawn = Hand::empty();
        while bank.has_development() {
            drawn.add(bank.draw_development(&mut rng).unwrap(), 1);
        }
        assert_eq!(drawn, Hand::development_deck());
        assert_eq!(bank.draw_development(&mut rng), Err(HandError::EmptyHand));
    }
}
