use crate::model::card::{Card, join_values};
use core::fmt;
use thiserror::Error;

/// Cards held between turns.
pub const HAND_SIZE: usize = 4;
/// Cards held while a drawn card is waiting to be discarded.
pub const MAX_HAND_SIZE: usize = HAND_SIZE + 1;

/// Hand invariant violations. These indicate a sequencing bug in the caller,
/// never a recoverable game condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandError {
    #[error("hand already holds the maximum of five cards")]
    Full,
    #[error("hand is empty")]
    Empty,
    #[error("index {index} is out of range for a hand of {len} cards")]
    OutOfRange { index: usize, len: usize },
    #[error("card {card} is not in the hand")]
    Missing { card: Card },
}

/// A player's cards, in the order they were received. The order is never
/// sorted because it drives both the discard choice and the logged output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Self {
            cards: Vec::with_capacity(MAX_HAND_SIZE),
        }
    }

    pub fn with_cards(cards: Vec<Card>) -> Result<Self, HandError> {
        if cards.len() > MAX_HAND_SIZE {
            return Err(HandError::Full);
        }
        Ok(Self { cards })
    }

    pub fn add(&mut self, card: Card) -> Result<(), HandError> {
        if self.cards.len() >= MAX_HAND_SIZE {
            return Err(HandError::Full);
        }
        self.cards.push(card);
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) -> Result<Card, HandError> {
        if self.cards.is_empty() {
            return Err(HandError::Empty);
        }
        if index >= self.cards.len() {
            return Err(HandError::OutOfRange {
                index,
                len: self.cards.len(),
            });
        }
        Ok(self.cards.remove(index))
    }

    /// Removes the first card equal to `card`.
    pub fn remove(&mut self, card: Card) -> Result<Card, HandError> {
        let index = self.position(card).ok_or(HandError::Missing { card })?;
        self.remove_at(index)
    }

    /// Picks the card to give away: the leftmost card that is not of the
    /// preferred value, or the first card when every card is preferred.
    pub fn select_discard(&self, preferred_value: u32) -> Result<Card, HandError> {
        let first = self.cards.first().copied().ok_or(HandError::Empty)?;
        Ok(self
            .cards
            .iter()
            .copied()
            .find(|card| !card.matches(preferred_value))
            .unwrap_or(first))
    }

    /// Four cards of one denomination. A five card hand never wins.
    pub fn is_winning(&self) -> bool {
        match self.cards.split_first() {
            Some((first, rest)) if self.cards.len() == HAND_SIZE => {
                rest.iter().all(|card| card == first)
            }
            _ => false,
        }
    }

    pub fn position(&self, card: Card) -> Option<usize> {
        self.cards.iter().position(|&c| c == card)
    }

    pub fn values(&self) -> Vec<u32> {
        self.cards.iter().map(|card| card.value()).collect()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&join_values(&self.cards))
    }
}
