use crate::model::card::Card;
use crate::model::player::DeckId;
use parking_lot::{Mutex, MutexGuard};
use std::collections::VecDeque;

/// What a turn may do with one deck: draw from the front, discard to the
/// back, and look at the contents. Test doubles implement this directly.
pub trait CardPile {
    fn id(&self) -> DeckId;
    /// Takes the front card, or `None` when the pile is empty. Never waits.
    fn draw(&mut self) -> Option<Card>;
    fn discard(&mut self, card: Card);
    /// Returns a card just drawn to the front, undoing the draw.
    fn put_back(&mut self, card: Card);
    fn snapshot(&self) -> Vec<Card>;
}

/// The two piles a single turn works on, already held exclusively.
pub trait TurnDecks {
    fn source(&mut self) -> &mut dyn CardPile;
    fn sink(&mut self) -> &mut dyn CardPile;
}

/// Unsynchronised FIFO of cards with a ring position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pile {
    id: DeckId,
    cards: VecDeque<Card>,
}

impl Pile {
    pub fn new(id: DeckId) -> Self {
        Self {
            id,
            cards: VecDeque::new(),
        }
    }

    pub fn with_cards(id: DeckId, cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            id,
            cards: cards.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl CardPile for Pile {
    fn id(&self) -> DeckId {
        self.id
    }

    fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    fn discard(&mut self, card: Card) {
        self.cards.push_back(card);
    }

    fn put_back(&mut self, card: Card) {
        self.cards.push_front(card);
    }

    fn snapshot(&self) -> Vec<Card> {
        self.cards.iter().copied().collect()
    }
}

impl TurnDecks for (Pile, Pile) {
    fn source(&mut self) -> &mut dyn CardPile {
        &mut self.0
    }

    fn sink(&mut self) -> &mut dyn CardPile {
        &mut self.1
    }
}

/// A pile shared between two neighbouring players.
#[derive(Debug)]
pub struct Deck {
    id: DeckId,
    pile: Mutex<Pile>,
}

impl Deck {
    pub fn new(id: DeckId) -> Self {
        Self {
            id,
            pile: Mutex::new(Pile::new(id)),
        }
    }

    pub fn with_cards(id: DeckId, cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            id,
            pile: Mutex::new(Pile::with_cards(id, cards)),
        }
    }

    pub fn id(&self) -> DeckId {
        self.id
    }

    pub fn add_card(&self, card: Card) {
        self.pile.lock().discard(card);
    }

    pub fn try_draw(&self) -> Option<Card> {
        self.pile.lock().draw()
    }

    pub fn len(&self) -> usize {
        self.pile.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.pile.lock().is_empty()
    }

    /// Contents front to back, taken under the lock.
    pub fn snapshot(&self) -> Vec<Card> {
        self.pile.lock().snapshot()
    }

    pub fn lock(&self) -> MutexGuard<'_, Pile> {
        self.pile.lock()
    }
}

/// Exclusive hold on a player's source and sink deck for one turn.
///
/// Locks are always taken in ascending [`DeckId`] order, whichever deck is
/// the source. When both are the same deck (a one player ring) it is locked
/// once.
pub struct RingLock<'a> {
    first: MutexGuard<'a, Pile>,
    second: Option<MutexGuard<'a, Pile>>,
    source_is_first: bool,
}

impl<'a> RingLock<'a> {
    pub fn acquire(source: &'a Deck, sink: &'a Deck) -> Self {
        if source.id() == sink.id() {
            return Self {
                first: source.lock(),
                second: None,
                source_is_first: true,
            };
        }

        let source_is_first = source.id() < sink.id();
        let (low, high) = if source_is_first {
            (source, sink)
        } else {
            (sink, source)
        };
        let first = low.lock();
        let second = high.lock();
        Self {
            first,
            second: Some(second),
            source_is_first,
        }
    }

    fn pick(&mut self, want_source: bool) -> &mut Pile {
        match self.second.as_mut() {
            Some(second) if want_source != self.source_is_first => &mut **second,
            _ => &mut *self.first,
        }
    }
}

impl TurnDecks for RingLock<'_> {
    fn source(&mut self) -> &mut dyn CardPile {
        self.pick(true)
    }

    fn sink(&mut self) -> &mut dyn CardPile {
        self.pick(false)
    }
}
