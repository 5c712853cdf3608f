mod agent;

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::thread;
use std::time::Instant;

use quads_core::game::event::{DeckReport, PlayerEvent};
use quads_core::game::setup::{
    CARDS_PER_PLAYER, SetupError, Table, check_immediate_winner, setup,
};
use quads_core::game::signal::{Outcome, TerminationSignal};
use quads_core::model::card::Card;
use quads_core::model::deck::Deck;
use quads_core::model::hand::Hand;
use quads_core::model::player::PlayerId;
use quads_core::pack::{self, PackError};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event, warn};

use crate::config::GameConfig;
use crate::store::{OutputStore, PlayerLog};

pub use agent::{AgentError, AgentReport, AgentSettings, AgentState, PlayerAgent};

/// Deals a pack, runs one agent thread per player and writes the final deck
/// contents once every agent has exited.
pub struct GameRunner {
    players: usize,
    pack: Vec<Card>,
    settings: AgentSettings,
    store: Box<dyn OutputStore>,
}

/// Everything a finished game reports.
#[derive(Debug, Clone, Serialize)]
pub struct GameSummary {
    pub players: usize,
    pub outcome: Outcome,
    /// The winner was dealt four of a kind and no turn was played.
    pub immediate: bool,
    pub seats: Vec<SeatSummary>,
    pub decks: Vec<DeckReport>,
    pub log_failures: usize,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeatSummary {
    pub player: PlayerId,
    pub ended: AgentState,
    pub turns: u64,
    pub final_hand: Vec<Card>,
    pub log_failures: usize,
}

impl GameSummary {
    pub fn winner(&self) -> Option<PlayerId> {
        self.outcome.winner()
    }

    pub fn total_turns(&self) -> u64 {
        self.seats.iter().map(|seat| seat.turns).sum()
    }

    pub fn write_json(&self, path: &Path) -> Result<(), RunnerError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let mut writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl GameRunner {
    /// Build a runner from a validated configuration, loading the pack it
    /// names.
    pub fn from_config(
        config: &GameConfig,
        store: Box<dyn OutputStore>,
    ) -> Result<Self, RunnerError> {
        let values = pack::load(&config.pack, config.players)?;
        Self::new(config.players, &values, config.agent.settings(), store)
    }

    pub fn new(
        players: usize,
        values: &[u32],
        settings: AgentSettings,
        store: Box<dyn OutputStore>,
    ) -> Result<Self, RunnerError> {
        if players == 0 {
            return Err(SetupError::NoPlayers.into());
        }
        let expected = players * CARDS_PER_PLAYER;
        if values.len() != expected {
            return Err(SetupError::PackSize {
                players,
                expected,
                actual: values.len(),
            }
            .into());
        }

        Ok(Self {
            players,
            pack: pack::to_cards(values),
            settings,
            store,
        })
    }

    pub fn players(&self) -> usize {
        self.players
    }

    /// Plays one game to completion.
    pub fn run(&self) -> Result<GameSummary, RunnerError> {
        let started = Instant::now();
        let Table { hands, decks } = setup(&self.pack, self.players)?;

        // Every log is opened before any agent exists, so a bad output
        // location fails the game with nothing started.
        let logs = (0..self.players)
            .map(|index| self.store.open_player(PlayerId::from_index(index)))
            .collect::<io::Result<Vec<_>>>()?;

        let signal = TerminationSignal::new();
        let immediate = check_immediate_winner(&hands);
        let reports = match immediate {
            Some(winner) => {
                // Nothing else can have settled a signal created above.
                if let Err(outcome) = signal.claim_win(winner) {
                    return Err(RunnerError::Settled { outcome });
                }
                event!(
                    target: "quads_sim::game",
                    Level::INFO,
                    player = winner.number(),
                    "dealt hand already wins; no turns played"
                );
                replay_immediate_win(winner, hands, logs)
            }
            None => self.play(hands, logs, &decks, &signal)?,
        };

        let mut log_failures: usize = reports.iter().map(|report| report.log_failures).sum();
        let mut deck_reports = Vec::with_capacity(decks.len());
        for deck in &decks {
            let report = DeckReport {
                deck: deck.id(),
                cards: deck.snapshot(),
            };
            if let Err(err) = self.store.write_deck(&report) {
                log_failures += 1;
                warn!(deck = deck.id().number(), error = %err, "failed to write deck output");
            }
            deck_reports.push(report);
        }

        let expected = self.players * CARDS_PER_PLAYER;
        let actual = reports
            .iter()
            .map(|report| report.final_hand.len())
            .sum::<usize>()
            + deck_reports
                .iter()
                .map(|report| report.cards.len())
                .sum::<usize>();
        if actual != expected {
            return Err(RunnerError::Conservation { expected, actual });
        }

        let outcome = signal.outcome().unwrap_or(Outcome::Halted);
        let summary = GameSummary {
            players: self.players,
            outcome,
            immediate: immediate.is_some(),
            seats: reports
                .into_iter()
                .map(|report| SeatSummary {
                    player: report.player,
                    ended: report.ended,
                    turns: report.turns,
                    final_hand: report.final_hand.cards().to_vec(),
                    log_failures: report.log_failures,
                })
                .collect(),
            decks: deck_reports,
            log_failures,
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        };

        event!(
            target: "quads_sim::game",
            Level::INFO,
            players = self.players,
            winner = summary.winner().map(PlayerId::number),
            turns = summary.total_turns(),
            elapsed_ms = summary.elapsed_ms,
            "game over"
        );

        Ok(summary)
    }

    fn play(
        &self,
        hands: Vec<Hand>,
        logs: Vec<Box<dyn PlayerLog>>,
        decks: &[Deck],
        signal: &TerminationSignal,
    ) -> Result<Vec<AgentReport>, RunnerError> {
        let players = self.players;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(players);
            let mut spawn_error = None;

            for (index, (hand, log)) in hands.into_iter().zip(logs).enumerate() {
                let player = PlayerId::from_index(index);
                let agent = PlayerAgent::new(
                    player,
                    hand,
                    &decks[player.source_deck().index()],
                    &decks[player.sink_deck(players).index()],
                    signal,
                    log,
                    self.settings.clone(),
                );
                let spawned = thread::Builder::new()
                    .name(format!("player-{player}"))
                    .spawn_scoped(scope, move || agent.run());
                match spawned {
                    Ok(handle) => handles.push((player, handle)),
                    Err(source) => {
                        signal.halt();
                        spawn_error = Some(RunnerError::Spawn { player, source });
                        break;
                    }
                }
            }

            // Join everyone before reporting anything, so a failed agent
            // never leaves another one running.
            let mut reports = Vec::with_capacity(handles.len());
            let mut failure = spawn_error;
            for (player, handle) in handles {
                match handle.join() {
                    Ok(Ok(report)) => reports.push(report),
                    Ok(Err(err)) => {
                        failure.get_or_insert(RunnerError::Agent(err));
                    }
                    Err(_) => {
                        failure.get_or_insert(RunnerError::AgentPanicked { player });
                    }
                }
            }

            match failure {
                Some(err) => Err(err),
                None => Ok(reports),
            }
        })
    }
}

/// Writes the logs a game ends with when somebody was dealt four of a kind.
/// Nobody takes a turn, so every final hand equals the dealt one.
fn replay_immediate_win(
    winner: PlayerId,
    hands: Vec<Hand>,
    logs: Vec<Box<dyn PlayerLog>>,
) -> Vec<AgentReport> {
    hands
        .into_iter()
        .zip(logs)
        .enumerate()
        .map(|(index, (hand, mut log))| {
            let player = PlayerId::from_index(index);
            let mut events = vec![PlayerEvent::InitialHand {
                player,
                hand: hand.cards().to_vec(),
            }];
            let ended = if player == winner {
                events.push(PlayerEvent::Wins { player });
                AgentState::Won
            } else {
                events.push(PlayerEvent::Informed { player, winner });
                AgentState::NotifiedLoss(winner)
            };
            events.push(PlayerEvent::FinalHand {
                player,
                hand: hand.cards().to_vec(),
            });
            events.push(PlayerEvent::Exits { player });

            let mut log_failures = 0;
            for event in &events {
                if let Err(err) = log.record(event) {
                    log_failures += 1;
                    warn!(player = player.number(), error = %err, "failed to write player log line");
                }
            }
            if let Err(err) = log.close() {
                log_failures += 1;
                warn!(player = player.number(), error = %err, "failed to close player log");
            }

            AgentReport {
                player,
                ended,
                turns: 0,
                final_hand: hand,
                log_failures,
            }
        })
        .collect()
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("invalid pack: {0}")]
    Pack(#[from] PackError),
    #[error("invalid table: {0}")]
    Setup(#[from] SetupError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
    #[error("failed to serialize summary: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("could not start thread for player {player}: {source}")]
    Spawn {
        player: PlayerId,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("player {player} panicked")]
    AgentPanicked { player: PlayerId },
    #[error("game was already settled as {outcome:?} before the dealt winner claimed it")]
    Settled { outcome: Outcome },
    #[error("expected {expected} cards on the table after the game but found {actual}")]
    Conservation { expected: usize, actual: usize },
}
