use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::{HAND_SIZE, Hand, HandError};
use crate::model::player::{DeckId, PlayerId};
use thiserror::Error;

/// Cards in the pack per player: four dealt to the hand, four to the decks.
pub const CARDS_PER_PLAYER: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("number of players must be greater than 0")]
    NoPlayers,
    #[error("pack holds {actual} cards; {players} players need {expected}")]
    PackSize {
        players: usize,
        expected: usize,
        actual: usize,
    },
    #[error("dealing failed: {0}")]
    Hand(#[from] HandError),
}

/// Hands and decks at the start of a game, before any turn.
#[derive(Debug)]
pub struct Table {
    pub hands: Vec<Hand>,
    pub decks: Vec<Deck>,
}

impl Table {
    pub fn players(&self) -> usize {
        self.hands.len()
    }

    /// Cards currently held anywhere on the table.
    pub fn card_count(&self) -> usize {
        self.hands.iter().map(Hand::len).sum::<usize>()
            + self.decks.iter().map(Deck::len).sum::<usize>()
    }
}

/// Deals `pack` round-robin: the first `4n` cards go to the hands one at a
/// time in player order, the rest go to the decks the same way.
pub fn setup(pack: &[Card], players: usize) -> Result<Table, SetupError> {
    if players == 0 {
        return Err(SetupError::NoPlayers);
    }
    let expected = players * CARDS_PER_PLAYER;
    if pack.len() != expected {
        return Err(SetupError::PackSize {
            players,
            expected,
            actual: pack.len(),
        });
    }

    let (dealt, rest) = pack.split_at(players * HAND_SIZE);

    let mut hands: Vec<Hand> = (0..players).map(|_| Hand::new()).collect();
    for (position, card) in dealt.iter().enumerate() {
        hands[position % players].add(*card)?;
    }

    let decks = (0..players)
        .map(|index| {
            let cards = rest.iter().skip(index).step_by(players).copied();
            Deck::with_cards(DeckId::from_index(index), cards)
        })
        .collect();

    Ok(Table { hands, decks })
}

/// Lowest numbered player whose dealt hand is already four of a kind.
pub fn check_immediate_winner(hands: &[Hand]) -> Option<PlayerId> {
    hands
        .iter()
        .position(Hand::is_winning)
        .map(PlayerId::from_index)
}
