use core::fmt;
use serde::{Deserialize, Serialize};

/// A single card. Cards carry nothing but their denomination, so two cards
/// with the same value are interchangeable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Card {
    value: u32,
}

impl Card {
    pub const fn new(value: u32) -> Self {
        Self { value }
    }

    pub const fn value(self) -> u32 {
        self.value
    }

    pub const fn matches(self, value: u32) -> bool {
        self.value == value
    }
}

impl From<u32> for Card {
    fn from(value: u32) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Renders cards as space separated values, e.g. `1 3 3 7`.
pub fn join_values(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|card| card.value().to_string())
        .collect::<Vec<_>>()
        .join(" ")
}
