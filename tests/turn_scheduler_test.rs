//! Tests for turn rotation, idle termination and timeout tickets.

use chrono::Utc;
use strictly_grams::{ConnId, GameError, Phase, Removal, TurnScheduler, TurnStep};

fn scheduler_with(players: u64) -> TurnScheduler {
    let mut turns = TurnScheduler::new(3, Utc::now());
    for id in 1..=players {
        turns.add_player(ConnId(id));
    }
    turns
}

fn next_player(step: TurnStep) -> ConnId {
    match step {
        TurnStep::Next { player, .. } => player,
        TurnStep::Ended => panic!("Expected another turn, game ended"),
    }
}

#[test]
fn test_start_requires_two_players() {
    let mut turns = scheduler_with(1);
    assert_eq!(
        turns.start(Utc::now()),
        Err(GameError::InsufficientPlayers { count: 1 })
    );
    assert_eq!(turns.phase(), Phase::WaitingToStart);
}

#[test]
fn test_start_twice_fails() {
    let mut turns = scheduler_with(2);
    turns.start(Utc::now()).expect("Start failed");
    assert_eq!(turns.start(Utc::now()), Err(GameError::AlreadyStarted));
}

#[test]
fn test_rotation_wraps_around() {
    let mut turns = scheduler_with(3);
    let now = Utc::now();
    assert_eq!(next_player(turns.start(now).expect("Start failed")), ConnId(1));
    assert_eq!(next_player(turns.advance(true, now).expect("Advance failed")), ConnId(2));
    assert_eq!(next_player(turns.advance(true, now).expect("Advance failed")), ConnId(3));
    assert_eq!(next_player(turns.advance(true, now).expect("Advance failed")), ConnId(1));
    assert_eq!(turns.current_index(), 0);
}

#[test]
fn test_idle_rounds_end_game() {
    let mut turns = scheduler_with(2);
    let now = Utc::now();
    turns.start(now).expect("Start failed");
    assert_eq!(turns.idle_limit(), 6);

    for _ in 0..5 {
        next_player(turns.advance(false, now).expect("Advance failed"));
    }
    assert_eq!(turns.idle_turns(), 5);
    assert_eq!(turns.advance(false, now), Ok(TurnStep::Ended));
    assert_eq!(turns.phase(), Phase::Ended);
    assert_eq!(turns.advance(true, now), Err(GameError::GameNotActive));
}

#[test]
fn test_action_resets_idle_counter() {
    let mut turns = scheduler_with(2);
    let now = Utc::now();
    turns.start(now).expect("Start failed");
    for _ in 0..5 {
        turns.advance(false, now).expect("Advance failed");
    }
    turns.advance(true, now).expect("Advance failed");
    assert_eq!(turns.idle_turns(), 0);
    for _ in 0..5 {
        next_player(turns.advance(false, now).expect("Advance failed"));
    }
    assert_eq!(turns.phase(), Phase::InProgress);
}

#[test]
fn test_old_ticket_goes_stale() {
    let mut turns = scheduler_with(2);
    let now = Utc::now();
    turns.start(now).expect("Start failed");
    let first = turns.ticket();
    assert!(turns.is_live(first));

    turns.advance(true, now).expect("Advance failed");
    turns.advance(true, now).expect("Advance failed");
    // Same player and index as the first turn, but a later generation.
    assert_eq!(turns.ticket().turn_index, first.turn_index);
    assert!(!turns.is_live(first));
    assert!(turns.is_live(turns.ticket()));
}

#[test]
fn test_ticket_from_another_scheduler_is_never_live() {
    let now = Utc::now();
    let mut ended = scheduler_with(2);
    ended.start(now).expect("Start failed");
    let old = ended.ticket();

    let mut fresh = scheduler_with(2);
    fresh.start(now).expect("Start failed");
    let current = fresh.ticket();
    // Same generation, index and start time; only the epoch tells them apart.
    assert_eq!(old.generation, current.generation);
    assert_eq!(old.turn_index, current.turn_index);
    assert_eq!(old.started_at, current.started_at);
    assert_ne!(ended.epoch(), fresh.epoch());
    assert!(!fresh.is_live(old));
    assert!(fresh.is_live(current));
}

#[test]
fn test_finished_scheduler_has_no_live_tickets() {
    let mut turns = scheduler_with(2);
    turns.start(Utc::now()).expect("Start failed");
    let ticket = turns.ticket();
    assert!(turns.finish());
    assert!(!turns.finish());
    assert!(!turns.is_live(ticket));
}

#[test]
fn test_remove_before_current_shifts_index() {
    let mut turns = scheduler_with(3);
    let now = Utc::now();
    turns.start(now).expect("Start failed");
    turns.advance(true, now).expect("Advance failed");
    turns.advance(true, now).expect("Advance failed");
    assert_eq!(turns.current_player(), Some(ConnId(3)));
    let ticket = turns.ticket();

    assert_eq!(turns.remove_player(ConnId(1), now), Removal::Quiet);
    assert_eq!(turns.current_index(), 1);
    assert_eq!(turns.current_player(), Some(ConnId(3)));
    assert!(turns.is_live(ticket));
}

#[test]
fn test_remove_current_passes_turn() {
    let mut turns = scheduler_with(3);
    let now = Utc::now();
    turns.start(now).expect("Start failed");
    let ticket = turns.ticket();

    match turns.remove_player(ConnId(1), now) {
        Removal::TurnPassed { player, ticket: next } => {
            assert_eq!(player, ConnId(2));
            assert_ne!(next, ticket);
        }
        other => panic!("Expected turn to pass, got {other:?}"),
    }
    assert!(!turns.is_live(ticket));
    assert_eq!(turns.order(), &[ConnId(2), ConnId(3)]);
}

#[test]
fn test_remove_last_in_order_wraps_to_first() {
    let mut turns = scheduler_with(3);
    let now = Utc::now();
    turns.start(now).expect("Start failed");
    turns.advance(true, now).expect("Advance failed");
    turns.advance(true, now).expect("Advance failed");

    match turns.remove_player(ConnId(3), now) {
        Removal::TurnPassed { player, .. } => assert_eq!(player, ConnId(1)),
        other => panic!("Expected turn to pass, got {other:?}"),
    }
    assert_eq!(turns.current_index(), 0);
}

#[test]
fn test_attrition_below_two_ends_game() {
    let mut turns = scheduler_with(2);
    let now = Utc::now();
    turns.start(now).expect("Start failed");
    assert_eq!(turns.remove_player(ConnId(2), now), Removal::Ended);
    assert_eq!(turns.phase(), Phase::Ended);
}

#[test]
fn test_remove_unknown_player_is_absent() {
    let mut turns = scheduler_with(2);
    assert_eq!(turns.remove_player(ConnId(9), Utc::now()), Removal::Absent);
    assert_eq!(turns.order().len(), 2);
}

#[test]
fn test_remove_while_waiting_is_quiet() {
    let mut turns = scheduler_with(2);
    assert_eq!(turns.remove_player(ConnId(1), Utc::now()), Removal::Quiet);
    assert_eq!(turns.phase(), Phase::WaitingToStart);
    assert_eq!(turns.order(), &[ConnId(2)]);
}
