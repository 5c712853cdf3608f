use crate::model::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};

const PENDING: u32 = 0;
const HALTED: u32 = u32::MAX;

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "player")]
pub enum Outcome {
    Winner(PlayerId),
    /// Stopped without a winner: an agent failed or hit its turn limit.
    Halted,
}

impl Outcome {
    pub fn winner(self) -> Option<PlayerId> {
        match self {
            Outcome::Winner(id) => Some(id),
            Outcome::Halted => None,
        }
    }
}

/// Set-once stop flag shared by every agent of one game.
///
/// The first successful [`claim_win`](Self::claim_win) or
/// [`halt`](Self::halt) settles the outcome; it never changes afterwards.
#[derive(Debug, Default)]
pub struct TerminationSignal {
    state: AtomicU32,
}

impl TerminationSignal {
    pub fn new() -> Self {
        Self {
            state: AtomicU32::new(PENDING),
        }
    }

    /// Records `player` as the winner if nobody settled the game first.
    /// On failure returns the outcome that was already recorded.
    pub fn claim_win(&self, player: PlayerId) -> Result<(), Outcome> {
        self.settle(player.number())
            .map(|_| ())
            .map_err(decode_settled)
    }

    /// Stops the game without a winner. Returns `false` if already settled.
    pub fn halt(&self) -> bool {
        self.settle(HALTED).is_ok()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        decode(self.state.load(Ordering::Acquire))
    }

    pub fn is_set(&self) -> bool {
        self.state.load(Ordering::Acquire) != PENDING
    }

    fn settle(&self, value: u32) -> Result<u32, u32> {
        self.state
            .compare_exchange(PENDING, value, Ordering::AcqRel, Ordering::Acquire)
    }
}

fn decode(raw: u32) -> Option<Outcome> {
    match raw {
        PENDING => None,
        HALTED => Some(Outcome::Halted),
        number => PlayerId::new(number).map(Outcome::Winner),
    }
}

fn decode_settled(raw: u32) -> Outcome {
    decode(raw).unwrap_or(Outcome::Halted)
}
