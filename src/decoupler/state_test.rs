use std::time::Duration;

use tokio::time::Instant;

use super::*;
use crate::ProducerError;
use crate::ProtocolViolation;

fn schedule_of(t: Transition) -> (u64, Duration) {
    match t {
        Transition::Schedule { cycle, delay } => (cycle, delay),
        other => panic!("expected Schedule, got {:?}", other),
    }
}

/// Drives `cycle` through read and dispatch.
fn deliver(
    state: &mut DecouplerState,
    cycle: u64,
    now: Instant,
) -> CycleSnapshot {
    let snapshot = state.begin_cycle(cycle, now).expect("cycle should start");
    assert!(state.mark_dispatched(cycle));
    snapshot
}

#[test]
fn test_first_signal_while_idle_schedules_immediately() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();

    let (cycle, delay) = schedule_of(state.signal(Signal::Value, now));
    assert_eq!(cycle, 1);
    assert_eq!(delay, Duration::ZERO);
    assert_eq!(state.phase(), Phase::Scheduled { cycle: 1 });
}

#[test]
fn test_signals_while_busy_never_schedule() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));

    for _ in 0..10 {
        assert_eq!(state.signal(Signal::Value, now), Transition::Coalesced);
    }
    deliver(&mut state, 1, now);
    assert_eq!(state.signal(Signal::Value, now), Transition::Coalesced);
    assert!(state.event_while_busy());
}

#[test]
fn test_ready_reschedules_only_when_something_happened() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));
    deliver(&mut state, 1, now);

    assert_eq!(state.ready(1, now), Ok(Transition::Idle));
    assert_eq!(state.phase(), Phase::Idle);

    schedule_of(state.signal(Signal::Value, now));
    deliver(&mut state, 2, now);
    state.signal(Signal::Value, now);
    let (cycle, _) = schedule_of(state.ready(2, now).unwrap());
    assert_eq!(cycle, 3);
}

#[test]
fn test_signal_before_read_is_covered_by_that_read() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));
    // coalesced while still scheduled
    state.signal(Signal::WriteSucceeded, now);

    let snapshot = deliver(&mut state, 1, now);
    assert!(snapshot.types.contains(&EventType::Value));
    assert!(snapshot.types.contains(&EventType::WriteSucceeded));
    assert!(!state.event_while_busy());
    assert_eq!(state.ready(1, now), Ok(Transition::Idle));
}

#[test]
fn test_connection_change_is_recorded_only_on_transition() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();

    // already disconnected: nothing changes, but a cycle is still attempted
    schedule_of(state.signal(Signal::ReadConnection(false), now));
    let snapshot = deliver(&mut state, 1, now);
    assert!(snapshot.types.is_empty());
    state.ready(1, now).unwrap();

    schedule_of(state.signal(Signal::ReadConnection(true), now));
    let snapshot = deliver(&mut state, 2, now);
    assert!(snapshot.types.contains(&EventType::ReadConnection));
    assert!(snapshot.read_connected);
    assert!(!snapshot.write_connected);
}

#[test]
fn test_errors_travel_with_snapshot_once() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    let err = ProducerError::ReadFailed("boom".into());

    schedule_of(state.signal(Signal::ReadException(err.clone()), now));
    state.signal(Signal::WriteFailed(ProducerError::WriteFailed("nope".into())), now);
    let snapshot = deliver(&mut state, 1, now);
    assert_eq!(snapshot.read_error, Some(err));
    assert_eq!(
        snapshot.write_error,
        Some(ProducerError::WriteFailed("nope".into()))
    );
    assert!(snapshot.types.contains(&EventType::ReadException));
    assert!(snapshot.types.contains(&EventType::WriteFailed));
    state.ready(1, now).unwrap();

    schedule_of(state.signal(Signal::Value, now));
    let snapshot = deliver(&mut state, 2, now);
    assert_eq!(snapshot.read_error, None);
    assert_eq!(snapshot.write_error, None);
}

#[test]
fn test_rate_cap_defers_next_cycle() {
    let period = Duration::from_millis(100);
    let mut state = DecouplerState::new(Some(period));
    let t0 = Instant::now();

    let (_, delay) = schedule_of(state.signal(Signal::Value, t0));
    assert_eq!(delay, Duration::ZERO);
    deliver(&mut state, 1, t0);
    state.ready(1, t0 + Duration::from_millis(5)).unwrap();

    let (cycle, delay) = schedule_of(state.signal(Signal::Value, t0 + Duration::from_millis(30)));
    assert_eq!(cycle, 2);
    assert_eq!(delay, Duration::from_millis(70));

    deliver(&mut state, 2, t0 + Duration::from_millis(100));
    state.ready(2, t0 + Duration::from_millis(101)).unwrap();
    let (_, delay) = schedule_of(state.signal(Signal::Value, t0 + Duration::from_millis(500)));
    assert_eq!(delay, Duration::ZERO);
}

#[test]
fn test_skipped_cycle_does_not_restart_rate_cap_window() {
    let period = Duration::from_millis(100);
    let mut state = DecouplerState::new(Some(period));
    let t0 = Instant::now();

    schedule_of(state.signal(Signal::Value, t0));
    deliver(&mut state, 1, t0);
    state.signal(Signal::Value, t0 + Duration::from_millis(1));
    let (cycle, delay) = schedule_of(state.ready(1, t0 + Duration::from_millis(2)).unwrap());
    assert_eq!(cycle, 2);
    assert_eq!(delay, Duration::from_millis(98));

    // cycle 2 finds the batch already drained
    state.begin_cycle(2, t0 + Duration::from_millis(100)).unwrap();
    assert_eq!(state.skip_cycle(2, t0 + Duration::from_millis(100)), Transition::Idle);

    let (cycle, delay) = schedule_of(state.signal(Signal::Value, t0 + Duration::from_millis(150)));
    assert_eq!(cycle, 3);
    assert_eq!(delay, Duration::ZERO);
}

#[test]
fn test_ready_while_idle_is_violation() {
    let mut state = DecouplerState::new(None);
    assert_eq!(
        state.ready(1, Instant::now()),
        Err(ProtocolViolation::ReadyWhileIdle { cycle: 1 })
    );
}

#[test]
fn test_ready_before_dispatch_is_violation() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));
    assert_eq!(
        state.ready(1, now),
        Err(ProtocolViolation::NotDispatched { cycle: 1 })
    );

    state.begin_cycle(1, now).unwrap();
    assert_eq!(
        state.ready(1, now),
        Err(ProtocolViolation::NotDispatched { cycle: 1 })
    );
}

#[test]
fn test_ready_for_wrong_cycle_is_violation() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));
    deliver(&mut state, 1, now);

    assert_eq!(
        state.ready(7, now),
        Err(ProtocolViolation::CycleMismatch {
            expected: 1,
            received: 7
        })
    );
}

#[test]
fn test_skip_cycle_returns_to_idle_or_reschedules() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));
    state.begin_cycle(1, now).unwrap();
    assert_eq!(state.skip_cycle(1, now), Transition::Idle);

    schedule_of(state.signal(Signal::Value, now));
    state.begin_cycle(2, now).unwrap();
    state.signal(Signal::Value, now);
    let (cycle, _) = schedule_of(state.skip_cycle(2, now));
    assert_eq!(cycle, 3);
}

#[test]
fn test_pause_holds_and_resume_schedules() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    state.pause();

    assert_eq!(state.signal(Signal::Value, now), Transition::Held);
    assert_eq!(state.signal(Signal::Value, now), Transition::Held);
    assert_eq!(state.phase(), Phase::Idle);

    let (cycle, _) = schedule_of(state.resume(now));
    assert_eq!(cycle, 1);
    let snapshot = deliver(&mut state, 1, now);
    assert!(snapshot.types.contains(&EventType::Value));
}

#[test]
fn test_pause_during_cycle_defers_coalesced_work_to_resume() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));
    deliver(&mut state, 1, now);
    state.signal(Signal::Value, now);
    state.pause();

    assert_eq!(state.ready(1, now), Ok(Transition::Idle));
    schedule_of(state.resume(now));
}

#[test]
fn test_resume_without_pending_work_stays_idle() {
    let mut state = DecouplerState::new(None);
    state.pause();
    assert_eq!(state.resume(Instant::now()), Transition::Idle);
}

#[test]
fn test_close_ignores_signals_and_lets_in_flight_finish() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));
    deliver(&mut state, 1, now);
    state.signal(Signal::Value, now);

    assert!(state.close());
    assert!(!state.close());
    assert_eq!(state.signal(Signal::Value, now), Transition::Ignored);
    assert_eq!(state.ready(1, now), Ok(Transition::Ignored));
    assert_eq!(state.phase(), Phase::Idle);
}

#[test]
fn test_close_drops_scheduled_cycle() {
    let mut state = DecouplerState::new(None);
    let now = Instant::now();
    schedule_of(state.signal(Signal::Value, now));
    state.close();

    assert!(state.begin_cycle(1, now).is_none());
    assert_eq!(state.resume(now), Transition::Ignored);
}
