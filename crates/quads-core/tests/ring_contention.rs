use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use quads_core::game::setup::{check_immediate_winner, setup};
use quads_core::game::signal::{Outcome, TerminationSignal};
use quads_core::game::turn::play_turn;
use quads_core::model::deck::RingLock;
use quads_core::model::player::PlayerId;
use quads_core::pack;

const TURNS_PER_PLAYER: usize = 2_000;

/// Every player hammers its two decks with the winner check disabled until
/// the ring as a whole has played enough turns. With locks taken in ring
/// order this must neither deadlock nor lose a card.
#[test]
fn ring_of_players_never_deadlocks_or_loses_cards() {
    for players in [2usize, 3, 5, 8] {
        let values: Vec<u32> = (0..players as u32 * 8).map(|v| v % 7 + 10).collect();
        let table = setup(&pack::to_cards(&values), players).expect("valid pack");
        let decks = Arc::new(table.decks);
        let played = Arc::new(AtomicUsize::new(0));
        let target = players * TURNS_PER_PLAYER;

        let handles: Vec<_> = table
            .hands
            .into_iter()
            .enumerate()
            .map(|(index, mut hand)| {
                let decks = Arc::clone(&decks);
                let played = Arc::clone(&played);
                thread::spawn(move || {
                    let player = PlayerId::from_index(index);
                    let source = &decks[player.source_deck().index()];
                    let sink = &decks[player.sink_deck(players).index()];
                    while played.load(Ordering::Relaxed) < target {
                        let mut lock = RingLock::acquire(source, sink);
                        let turn = play_turn(&mut hand, &mut lock, player.preferred_value())
                            .expect("hand invariant");
                        drop(lock);
                        if turn.is_some() {
                            played.fetch_add(1, Ordering::Relaxed);
                        } else {
                            thread::yield_now();
                        }
                    }
                    hand
                })
            })
            .collect();

        let hands: Vec<_> = handles
            .into_iter()
            .map(|h| h.join().expect("player thread"))
            .collect();

        let total = hands.iter().map(|h| h.len()).sum::<usize>()
            + decks.iter().map(|d| d.len()).sum::<usize>();
        assert_eq!(total, players * 8, "{players} players");
        assert!(hands.iter().all(|h| h.len() == 4));
    }
}

#[test]
fn winner_signal_is_claimed_once_under_contention() {
    let players = 4;
    let values = pack::generate(players, 99);
    let table = setup(&pack::to_cards(&values), players).expect("valid pack");
    if check_immediate_winner(&table.hands).is_some() {
        return;
    }
    let decks = Arc::new(table.decks);
    let signal = Arc::new(TerminationSignal::new());

    let handles: Vec<_> = table
        .hands
        .into_iter()
        .enumerate()
        .map(|(index, mut hand)| {
            let decks = Arc::clone(&decks);
            let signal = Arc::clone(&signal);
            thread::spawn(move || {
                let player = PlayerId::from_index(index);
                let source = &decks[player.source_deck().index()];
                let sink = &decks[player.sink_deck(players).index()];
                let mut claimed = false;
                while !signal.is_set() {
                    let mut lock = RingLock::acquire(source, sink);
                    let played = play_turn(&mut hand, &mut lock, player.preferred_value())
                        .expect("hand invariant");
                    if played.is_some() && hand.is_winning() {
                        claimed = signal.claim_win(player).is_ok();
                    }
                    drop(lock);
                    if played.is_none() {
                        thread::yield_now();
                    }
                }
                (player, claimed, hand)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("player thread"))
        .collect();

    let claimers: Vec<_> = results.iter().filter(|(_, claimed, _)| *claimed).collect();
    assert_eq!(claimers.len(), 1);
    let (winner, _, hand) = claimers[0];
    assert!(hand.is_winning());
    assert_eq!(signal.outcome(), Some(Outcome::Winner(*winner)));
}
