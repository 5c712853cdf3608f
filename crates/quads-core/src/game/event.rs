//! Structured records of everything a player or deck reports. `Display`
//! renders the exact output line for each record.

use crate::model::card::{Card, join_values};
use crate::model::player::{DeckId, PlayerId};
use core::fmt;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum PlayerEvent {
    InitialHand {
        player: PlayerId,
        hand: Vec<Card>,
    },
    Draw {
        player: PlayerId,
        card: Card,
        deck: DeckId,
    },
    Discard {
        player: PlayerId,
        card: Card,
        deck: DeckId,
    },
    CurrentHand {
        player: PlayerId,
        hand: Vec<Card>,
    },
    Wins {
        player: PlayerId,
    },
    Informed {
        player: PlayerId,
        winner: PlayerId,
    },
    FinalHand {
        player: PlayerId,
        hand: Vec<Card>,
    },
    Exits {
        player: PlayerId,
    },
}

impl PlayerEvent {
    pub fn player(&self) -> PlayerId {
        match self {
            PlayerEvent::InitialHand { player, .. }
            | PlayerEvent::Draw { player, .. }
            | PlayerEvent::Discard { player, .. }
            | PlayerEvent::CurrentHand { player, .. }
            | PlayerEvent::Wins { player }
            | PlayerEvent::Informed { player, .. }
            | PlayerEvent::FinalHand { player, .. }
            | PlayerEvent::Exits { player } => *player,
        }
    }
}

impl fmt::Display for PlayerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerEvent::InitialHand { player, hand } => {
                write!(f, "player {player} initial hand {}", join_values(hand))
            }
            PlayerEvent::Draw { player, card, deck } => {
                write!(f, "player {player} draws a {card} from deck {deck}")
            }
            PlayerEvent::Discard { player, card, deck } => {
                write!(f, "player {player} discards a {card} to deck {deck}")
            }
            PlayerEvent::CurrentHand { player, hand } => {
                write!(f, "player {player} current hand is {}", join_values(hand))
            }
            PlayerEvent::Wins { player } => write!(f, "player {player} wins"),
            PlayerEvent::Informed { player, winner } => write!(
                f,
                "player {winner} has informed player {player} that player {winner} has won"
            ),
            PlayerEvent::FinalHand { player, hand } => {
                write!(f, "player {player} final hand: {}", join_values(hand))
            }
            PlayerEvent::Exits { player } => write!(f, "player {player} exits"),
        }
    }
}

/// Final contents of one deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeckReport {
    pub deck: DeckId,
    pub cards: Vec<Card>,
}

impl fmt::Display for DeckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "deck{} contents:", self.deck)?;
        for card in &self.cards {
            write!(f, " {card}")?;
        }
        Ok(())
    }
}
