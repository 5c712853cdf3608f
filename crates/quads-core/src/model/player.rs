use core::fmt;
use serde::{Deserialize, Serialize};

/// One-based player number. Player `p` sits at ring position `p - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(u32);

impl PlayerId {
    pub const fn from_index(index: usize) -> Self {
        Self(index as u32 + 1)
    }

    /// Returns `None` for zero, which is not a valid player number.
    pub const fn new(number: u32) -> Option<Self> {
        if number == 0 { None } else { Some(Self(number)) }
    }

    pub const fn number(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// The denomination this player collects.
    pub const fn preferred_value(self) -> u32 {
        self.0
    }

    /// Deck this player draws from.
    pub const fn source_deck(self) -> DeckId {
        DeckId::from_index(self.index())
    }

    /// Deck this player discards into, wrapping at the end of the ring.
    pub const fn sink_deck(self, players: usize) -> DeckId {
        DeckId::from_index((self.index() + 1) % players)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ring position of a deck. Stored zero-based, displayed one-based.
///
/// The derived ordering is the global lock order: whenever two decks are
/// held at once, the lower id is locked first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "u32", try_from = "u32")]
pub struct DeckId(usize);

impl DeckId {
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    pub const fn number(self) -> u32 {
        self.0 as u32 + 1
    }
}

impl From<DeckId> for u32 {
    fn from(id: DeckId) -> Self {
        id.number()
    }
}

impl TryFrom<u32> for DeckId {
    type Error = &'static str;

    fn try_from(number: u32) -> Result<Self, Self::Error> {
        if number == 0 {
            Err("deck numbers start at 1")
        } else {
            Ok(Self(number as usize - 1))
        }
    }
}

impl fmt::Display for DeckId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::{DeckId, PlayerId};

    #[test]
    fn index_roundtrip() {
        for index in 0..6 {
            let player = PlayerId::from_index(index);
            assert_eq!(player.index(), index);
            assert_eq!(player.number(), index as u32 + 1);
        }
        assert_eq!(PlayerId::new(0), None);
    }

    #[test]
    fn ring_wraps_to_first_deck() {
        let last = PlayerId::from_index(3);
        assert_eq!(last.source_deck(), DeckId::from_index(3));
        assert_eq!(last.sink_deck(4), DeckId::from_index(0));
        assert_eq!(last.sink_deck(4).to_string(), "1");
    }

    #[test]
    fn single_player_draws_and_discards_on_one_deck() {
        let only = PlayerId::from_index(0);
        assert_eq!(only.source_deck(), only.sink_deck(1));
    }

    #[test]
    fn preferred_value_is_player_number() {
        assert_eq!(PlayerId::from_index(2).preferred_value(), 3);
    }
}
