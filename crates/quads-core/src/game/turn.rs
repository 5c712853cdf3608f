use crate::model::card::Card;
use crate::model::deck::TurnDecks;
use crate::model::hand::{Hand, HandError};
use crate::model::player::DeckId;

/// What happened during one completed draw and discard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRecord {
    pub drawn: Card,
    pub source: DeckId,
    pub discarded: Card,
    pub sink: DeckId,
    pub hand: Vec<Card>,
}

/// Draws from the source deck, discards according to the hand's discard
/// policy and pushes the discard onto the sink deck.
///
/// Returns `Ok(None)` without touching anything when the source is empty;
/// the caller is expected to release its locks before retrying.
pub fn play_turn<D>(
    hand: &mut Hand,
    decks: &mut D,
    preferred_value: u32,
) -> Result<Option<TurnRecord>, HandError>
where
    D: TurnDecks + ?Sized,
{
    let source = decks.source().id();
    let Some(drawn) = decks.source().draw() else {
        return Ok(None);
    };

    if let Err(err) = hand.add(drawn) {
        decks.source().put_back(drawn);
        return Err(err);
    }

    let chosen = hand.select_discard(preferred_value)?;
    // The chosen card came out of this hand a moment ago; if it is somehow
    // gone, give back the card just drawn instead.
    let discarded = match hand.remove(chosen) {
        Ok(card) => card,
        Err(HandError::Missing { .. }) => hand.remove(drawn)?,
        Err(err) => return Err(err),
    };

    let sink = decks.sink();
    sink.discard(discarded);

    Ok(Some(TurnRecord {
        drawn,
        source,
        discarded,
        sink: sink.id(),
        hand: hand.cards().to_vec(),
    }))
}
