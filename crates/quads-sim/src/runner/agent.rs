use std::thread;
use std::time::Duration;

use quads_core::game::event::PlayerEvent;
use quads_core::game::signal::{Outcome, TerminationSignal};
use quads_core::game::turn::{TurnRecord, play_turn};
use quads_core::model::deck::{Deck, RingLock};
use quads_core::model::hand::{Hand, HandError};
use quads_core::model::player::PlayerId;
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event, info_span, warn};

use crate::store::PlayerLog;

/// Pacing knobs for a player agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub backoff: Duration,
    pub turn_delay: Duration,
    pub max_turns: Option<u64>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            backoff: Duration::from_millis(1),
            turn_delay: Duration::ZERO,
            max_turns: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "winner")]
pub enum AgentState {
    Starting,
    Playing,
    Won,
    NotifiedLoss(PlayerId),
    /// The game stopped without a winner.
    Halted,
    Exited,
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("player {player} broke a hand invariant: {source}")]
    Hand {
        player: PlayerId,
        #[source]
        source: HandError,
    },
}

/// What an agent leaves behind once it has exited.
#[derive(Debug, Clone)]
pub struct AgentReport {
    pub player: PlayerId,
    /// `Won`, `NotifiedLoss` or `Halted`.
    pub ended: AgentState,
    pub turns: u64,
    pub final_hand: Hand,
    pub log_failures: usize,
}

/// One player's turn loop. Owns its hand and its log, borrows the two decks
/// it sits between.
pub struct PlayerAgent<'a> {
    player: PlayerId,
    hand: Hand,
    source: &'a Deck,
    sink: &'a Deck,
    signal: &'a TerminationSignal,
    log: Box<dyn PlayerLog>,
    settings: AgentSettings,
    state: AgentState,
    ended: AgentState,
    turns: u64,
    log_failures: usize,
}

impl<'a> PlayerAgent<'a> {
    pub fn new(
        player: PlayerId,
        hand: Hand,
        source: &'a Deck,
        sink: &'a Deck,
        signal: &'a TerminationSignal,
        log: Box<dyn PlayerLog>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            player,
            hand,
            source,
            sink,
            signal,
            log,
            settings,
            state: AgentState::Starting,
            ended: AgentState::Starting,
            turns: 0,
            log_failures: 0,
        }
    }

    /// Runs the state machine until `Exited`. A hand invariant violation
    /// halts the whole game so the other agents still stop.
    pub fn run(mut self) -> Result<AgentReport, AgentError> {
        let _halt = HaltOnPanic(self.signal);
        let span = info_span!("player", id = self.player.number());
        let _entered = span.enter();

        while self.state != AgentState::Exited {
            let next = match self.step() {
                Ok(next) => next,
                Err(err) => {
                    self.signal.halt();
                    event!(
                        target: "quads_sim::game",
                        Level::ERROR,
                        player = self.player.number(),
                        error = %err,
                        "agent failed"
                    );
                    if let Err(close_err) = self.log.close() {
                        warn!(player = self.player.number(), error = %close_err, "failed to close player log");
                    }
                    return Err(err);
                }
            };
            self.state = next;
        }

        Ok(AgentReport {
            player: self.player,
            ended: self.ended,
            turns: self.turns,
            final_hand: self.hand,
            log_failures: self.log_failures,
        })
    }

    fn step(&mut self) -> Result<AgentState, AgentError> {
        match self.state {
            AgentState::Starting => Ok(self.start()),
            AgentState::Playing => self.take_turn(),
            AgentState::Won | AgentState::Halted => {
                self.finish();
                Ok(AgentState::Exited)
            }
            AgentState::NotifiedLoss(winner) => {
                self.record(PlayerEvent::Informed {
                    player: self.player,
                    winner,
                });
                self.finish();
                Ok(AgentState::Exited)
            }
            AgentState::Exited => Ok(AgentState::Exited),
        }
    }

    fn start(&mut self) -> AgentState {
        self.record(PlayerEvent::InitialHand {
            player: self.player,
            hand: self.hand.cards().to_vec(),
        });
        if self.hand.is_winning() {
            return self.declare_win();
        }
        AgentState::Playing
    }

    fn take_turn(&mut self) -> Result<AgentState, AgentError> {
        if let Some(outcome) = self.signal.outcome() {
            return Ok(self.settled(outcome));
        }

        if self
            .settings
            .max_turns
            .is_some_and(|limit| self.turns >= limit)
        {
            if self.signal.halt() {
                event!(
                    target: "quads_sim::game",
                    Level::WARN,
                    player = self.player.number(),
                    turns = self.turns,
                    "turn limit reached, halting game"
                );
            }
            // Either we halted or someone settled first; next turn reads it.
            return Ok(AgentState::Playing);
        }

        let (record, claim) = {
            let mut decks = RingLock::acquire(self.source, self.sink);
            let played = play_turn(&mut self.hand, &mut decks, self.player.preferred_value())
                .map_err(|source| AgentError::Hand {
                    player: self.player,
                    source,
                })?;
            let Some(record) = played else {
                drop(decks);
                thread::sleep(self.settings.backoff);
                return Ok(AgentState::Playing);
            };
            let claim = self
                .hand
                .is_winning()
                .then(|| self.signal.claim_win(self.player));
            (record, claim)
        };

        self.turns += 1;
        self.log_turn(record);

        match claim {
            None => {
                if !self.settings.turn_delay.is_zero() {
                    thread::sleep(self.settings.turn_delay);
                }
                Ok(AgentState::Playing)
            }
            Some(Ok(())) => Ok(self.won()),
            Some(Err(outcome)) => Ok(self.settled(outcome)),
        }
    }

    fn log_turn(&mut self, record: TurnRecord) {
        event!(
            target: "quads_sim::turn",
            Level::DEBUG,
            player = self.player.number(),
            turn = self.turns,
            drawn = record.drawn.value(),
            source = record.source.number(),
            discarded = record.discarded.value(),
            sink = record.sink.number(),
        );
        self.record(PlayerEvent::Draw {
            player: self.player,
            card: record.drawn,
            deck: record.source,
        });
        self.record(PlayerEvent::Discard {
            player: self.player,
            card: record.discarded,
            deck: record.sink,
        });
        self.record(PlayerEvent::CurrentHand {
            player: self.player,
            hand: record.hand,
        });
    }

    fn declare_win(&mut self) -> AgentState {
        match self.signal.claim_win(self.player) {
            Ok(()) => self.won(),
            Err(outcome) => self.settled(outcome),
        }
    }

    fn won(&mut self) -> AgentState {
        event!(
            target: "quads_sim::game",
            Level::INFO,
            player = self.player.number(),
            turns = self.turns,
            hand = %self.hand,
            "player wins"
        );
        self.record(PlayerEvent::Wins {
            player: self.player,
        });
        self.ended = AgentState::Won;
        AgentState::Won
    }

    fn settled(&mut self, outcome: Outcome) -> AgentState {
        let next = match outcome {
            Outcome::Winner(winner) if winner == self.player => AgentState::Won,
            Outcome::Winner(winner) => AgentState::NotifiedLoss(winner),
            Outcome::Halted => AgentState::Halted,
        };
        self.ended = next;
        next
    }

    fn finish(&mut self) {
        self.record(PlayerEvent::FinalHand {
            player: self.player,
            hand: self.hand.cards().to_vec(),
        });
        self.record(PlayerEvent::Exits {
            player: self.player,
        });
        if let Err(err) = self.log.close() {
            self.log_failures += 1;
            warn!(player = self.player.number(), error = %err, "failed to close player log");
        }
    }

    fn record(&mut self, event: PlayerEvent) {
        if let Err(err) = self.log.record(&event) {
            self.log_failures += 1;
            warn!(
                player = self.player.number(),
                error = %err,
                line = %event,
                "failed to write player log line"
            );
        }
    }
}

/// Halts the game if the agent thread unwinds, so its neighbours are not
/// left waiting on a deck nobody feeds.
struct HaltOnPanic<'a>(&'a TerminationSignal);

impl Drop for HaltOnPanic<'_> {
    fn drop(&mut self) {
        if thread::panicking() {
            self.0.halt();
        }
    }
}
