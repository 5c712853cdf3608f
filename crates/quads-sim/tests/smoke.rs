use std::fs;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use quads_core::game::event::{DeckReport, PlayerEvent};
use quads_core::game::signal::Outcome;
use quads_core::model::player::PlayerId;
use quads_core::pack;
use quads_sim::config::GameConfig;
use quads_sim::runner::{AgentSettings, AgentState, GameRunner, GameSummary};
use quads_sim::store::{FileStore, MemoryStore, OutputStore, PlayerLog};
use tempfile::tempdir;

fn settings() -> AgentSettings {
    AgentSettings {
        max_turns: Some(200_000),
        ..AgentSettings::default()
    }
}

fn count_cards(line: &str, prefix: &str) -> usize {
    line.strip_prefix(prefix)
        .map(|rest| rest.split_whitespace().count())
        .unwrap_or_else(|| panic!("line {line:?} does not start with {prefix:?}"))
}

/// Checks the per-player file shape and returns the number of cards the
/// player ended with.
fn check_player_log(lines: &[String], player: PlayerId, summary: &GameSummary) -> usize {
    let n = player.number();
    assert!(lines.len() >= 3, "player {n} log too short: {lines:?}");
    assert!(lines[0].starts_with(&format!("player {n} initial hand ")));
    assert_eq!(lines.last().unwrap(), &format!("player {n} exits"));

    let final_line = &lines[lines.len() - 2];
    let final_prefix = format!("player {n} final hand: ");
    let final_cards = count_cards(final_line, &final_prefix);
    assert_eq!(final_cards, 4);

    let winner = summary.winner().expect("game has a winner");
    let informed = format!("player {winner} has informed player {n} that player {winner} has won");
    let wins = format!("player {n} wins");
    if player == winner {
        assert_eq!(lines[lines.len() - 3], wins);
        assert!(!lines.iter().any(|line| line.contains("has informed")));
        let hand = final_line.trim_start_matches(&final_prefix);
        let values: Vec<_> = hand.split_whitespace().collect();
        assert!(values.iter().all(|v| *v == values[0]));
    } else {
        assert_eq!(lines[lines.len() - 3], informed);
        assert_eq!(lines.iter().filter(|l| **l == informed).count(), 1);
        assert!(!lines.contains(&wins));
    }

    // Turn lines come in draw / discard / current hand triples.
    let turns = &lines[1..lines.len() - 3];
    assert_eq!(turns.len() % 3, 0, "player {n} turn lines: {turns:?}");
    for triple in turns.chunks(3) {
        assert!(triple[0].starts_with(&format!("player {n} draws a ")));
        assert!(triple[1].starts_with(&format!("player {n} discards a ")));
        assert!(triple[2].starts_with(&format!("player {n} current hand is ")));
    }
    final_cards
}

#[test]
fn four_player_game_produces_complete_consistent_logs() {
    let players = 4;
    let store = MemoryStore::new();
    let values = pack::generate(players, 2024);
    let runner = GameRunner::new(players, &values, settings(), Box::new(store.clone()))
        .expect("runner created");

    let summary = runner.run().expect("game completes");

    assert!(matches!(summary.outcome, Outcome::Winner(_)));
    assert_eq!(summary.seats.len(), players);
    assert_eq!(summary.log_failures, 0);

    let mut held = 0;
    for seat in &summary.seats {
        let lines = store.player_lines(seat.player);
        held += check_player_log(&lines, seat.player, &summary);
        if !summary.immediate {
            assert_eq!(lines.len() as u64, 1 + seat.turns * 3 + 3);
        }
        match seat.ended {
            AgentState::Won => assert_eq!(Some(seat.player), summary.winner()),
            AgentState::NotifiedLoss(winner) => assert_eq!(Some(winner), summary.winner()),
            other => panic!("unexpected end state {other:?}"),
        }
    }

    let mut in_decks = 0;
    for deck in &summary.decks {
        let line = store.deck_line(deck.deck).expect("deck written");
        assert_eq!(line, deck.to_string());
        in_decks += count_cards(&line, &format!("deck{} contents:", deck.deck));
    }
    assert_eq!(held + in_decks, players * 8);
}

#[test]
fn repeated_games_always_terminate_with_one_winner() {
    for (players, seed) in [(2, 1), (3, 5), (5, 11), (6, 3), (8, 42)] {
        let store = MemoryStore::new();
        let values = pack::generate(players, seed);
        let summary = GameRunner::new(players, &values, settings(), Box::new(store.clone()))
            .expect("runner created")
            .run()
            .expect("game completes");

        let winner = summary.winner().expect("winnable pack produces a winner");
        let winners = summary
            .seats
            .iter()
            .filter(|seat| seat.ended == AgentState::Won)
            .count();
        assert_eq!(winners, 1, "{players} players, seed {seed}");
        assert_eq!(
            summary.seats[winner.index()].final_hand.len(),
            4,
            "winner keeps four cards"
        );
        let cards: usize = summary.seats.iter().map(|s| s.final_hand.len()).sum::<usize>()
            + summary.decks.iter().map(|d| d.cards.len()).sum::<usize>();
        assert_eq!(cards, players * 8);
    }
}

#[test]
fn single_player_with_matching_pack_wins_immediately() {
    let store = MemoryStore::new();
    let summary = GameRunner::new(1, &[1; 8], settings(), Box::new(store.clone()))
        .expect("runner created")
        .run()
        .expect("game completes");

    assert!(summary.immediate);
    assert_eq!(summary.winner(), Some(PlayerId::from_index(0)));
    assert_eq!(
        store.player_lines(PlayerId::from_index(0)),
        vec![
            "player 1 initial hand 1 1 1 1",
            "player 1 wins",
            "player 1 final hand: 1 1 1 1",
            "player 1 exits",
        ]
    );
    assert_eq!(
        store.lines("deck1_output.txt"),
        vec!["deck1 contents: 1 1 1 1"]
    );
}

#[test]
fn unwinnable_pack_halts_at_turn_limit() {
    let store = MemoryStore::new();
    // Denominations 10..=17 once each per player: nobody can ever hold four.
    let values: Vec<u32> = (0..16).map(|v| v % 8 + 10).collect();
    let settings = AgentSettings {
        max_turns: Some(50),
        ..AgentSettings::default()
    };
    let summary = GameRunner::new(2, &values, settings, Box::new(store.clone()))
        .expect("runner created")
        .run()
        .expect("game completes");

    assert_eq!(summary.outcome, Outcome::Halted);
    assert!(summary.seats.iter().all(|s| s.ended == AgentState::Halted));
    for seat in &summary.seats {
        let lines = store.player_lines(seat.player);
        assert!(!lines.iter().any(|l| l.contains("wins") || l.contains("informed")));
        assert_eq!(
            lines.last().map(String::as_str),
            Some(format!("player {} exits", seat.player).as_str())
        );
    }
}

/// Store whose player logs reject every other line.
#[derive(Clone, Default)]
struct FlakyStore {
    inner: MemoryStore,
    failures: Arc<AtomicUsize>,
}

struct FlakyLog {
    inner: Box<dyn PlayerLog>,
    calls: usize,
    failures: Arc<AtomicUsize>,
}

impl PlayerLog for FlakyLog {
    fn record(&mut self, event: &PlayerEvent) -> io::Result<()> {
        self.calls += 1;
        if self.calls % 2 == 0 {
            self.failures.fetch_add(1, Ordering::SeqCst);
            return Err(io::Error::other("disk full"));
        }
        self.inner.record(event)
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.close()
    }
}

impl OutputStore for FlakyStore {
    fn open_player(&self, player: PlayerId) -> io::Result<Box<dyn PlayerLog>> {
        Ok(Box::new(FlakyLog {
            inner: self.inner.open_player(player)?,
            calls: 0,
            failures: Arc::clone(&self.failures),
        }))
    }

    fn write_deck(&self, report: &DeckReport) -> io::Result<()> {
        self.inner.write_deck(report)
    }
}

#[test]
fn failing_log_lines_do_not_stop_the_game() {
    let store = FlakyStore::default();
    let values = pack::generate(3, 77);
    let summary = GameRunner::new(3, &values, settings(), Box::new(store.clone()))
        .expect("runner created")
        .run()
        .expect("game completes despite log failures");

    assert!(summary.winner().is_some());
    assert!(summary.log_failures > 0);
    assert_eq!(summary.log_failures, store.failures.load(Ordering::SeqCst));
    assert_eq!(store.inner.file_names().len(), 6);
}

#[test]
fn file_store_game_writes_all_files_and_summary() {
    let dir = tempdir().expect("temp dir");
    let pack_path = dir.path().join("pack.txt");
    pack::write(&pack_path, &pack::generate(3, 8)).expect("pack written");

    let mut config = GameConfig::new(3, &pack_path);
    config.outputs.dir = dir.path().join("out").display().to_string();
    config.agent.max_turns = Some(200_000);
    config.validate().expect("config validates");
    let outputs = config.resolved_outputs();

    let store = FileStore::new(&outputs.dir).expect("output dir");
    let runner = GameRunner::from_config(&config, Box::new(store)).expect("runner created");
    let summary = runner.run().expect("game completes");

    for index in 0..3 {
        let player = PlayerId::from_index(index);
        let text = fs::read_to_string(outputs.dir.join(format!("player{player}_output.txt")))
            .expect("player file");
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        check_player_log(&lines, player, &summary);

        let deck = fs::read_to_string(outputs.dir.join(format!("deck{}_output.txt", index + 1)))
            .expect("deck file");
        assert!(deck.starts_with(&format!("deck{} contents:", index + 1)));
    }

    let summary_path = dir.path().join("summary.json");
    summary.write_json(&summary_path).expect("summary written");
    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&summary_path).unwrap()).expect("valid json");
    assert_eq!(json["players"], 3);
    assert_eq!(json["outcome"]["kind"], "winner");
    assert_eq!(
        json["outcome"]["player"].as_u64(),
        summary.winner().map(|p| u64::from(p.number()))
    );
    assert_eq!(json["seats"].as_array().map(Vec::len), Some(3));
}

#[test]
fn pack_problems_surface_before_any_output() {
    let dir = tempdir().expect("temp dir");
    let pack_path = dir.path().join("bad.txt");
    fs::write(&pack_path, "1\n2\n-4\n").expect("pack written");

    let store = MemoryStore::new();
    let config = GameConfig::new(1, &pack_path);
    let err = GameRunner::from_config(&config, Box::new(store.clone()))
        .err()
        .expect("negative card rejected");

    assert_eq!(err.to_string(), "invalid pack: line 3 is negative (-4)");
    assert!(store.file_names().is_empty());
}
