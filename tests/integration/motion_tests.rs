//! End-to-end scenarios for the safe-move state machine.
//!
//! These run the full attempt loop against the mock hardware and the
//! virtual clock: settle delays, sampling cadence, unwind pulses, and
//! retries all execute exactly as on target, just without wall time.

use std::sync::Arc;

use coopdoor::config::MotionConfig;
use coopdoor::drivers::motor::Direction;
use coopdoor::motion::supervisor::{UNWIND_PULSES, SETTLE_DELAY_MS};
use coopdoor::motion::{DoorState, MotionStatus, MotionSupervisor, MoveOutcome};

use crate::mock_hw::{MockClock, MockHardware, MotorCall, RecordingSink};

fn make_supervisor() -> (MotionSupervisor, Arc<MotionStatus>) {
    let status = Arc::new(MotionStatus::new());
    (MotionSupervisor::new(Arc::clone(&status)), status)
}

fn config(threshold: u32, idle: u32, timeout_ms: u32, retry_limit: u8) -> MotionConfig {
    MotionConfig {
        current_threshold: threshold,
        move_timeout_open_ms: timeout_ms,
        move_timeout_close_ms: timeout_ms,
        current_idle_threshold: idle,
        retry_limit,
    }
}

// ── Scenario A: steady nominal current ⇒ clean completion ────

#[test]
fn steady_current_below_idle_threshold_completes_without_retries() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    hw.script_current(50.0, 64);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let cfg = config(900, 60, 40_000, 3);
    let report = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

    assert_eq!(report.outcome, MoveOutcome::Complete);
    assert_eq!(report.retries_used, 0);
    assert_eq!(status.door_state(), DoorState::Open);
    assert_eq!(status.door_state().wire_name(), "open");
    assert_eq!(hw.drive_calls(), vec![Direction::Open]);
    assert!(hw.motor_stopped());
    assert!(!status.is_busy());
}

#[test]
fn end_of_travel_current_collapse_completes_with_default_config() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    // Nominal running current, then the freewheel collapse at the stop.
    hw.script_current(50.0, 12).script_current(2.0, 12);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let report = sup.safe_move(
        Direction::Close,
        &MotionConfig::default(),
        &mut hw,
        &clock,
        &mut sink,
    );

    assert_eq!(report.outcome, MoveOutcome::Complete);
    assert_eq!(status.door_state(), DoorState::Closed);
    assert_eq!(report.retries_used, 0);
}

// ── Scenario B: obstruction ⇒ stop + 3 reversal pulses ───────

#[test]
fn obstruction_stops_motor_and_unwinds_three_pulses() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    hw.script_current(950.0, 64);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let cfg = config(900, 5, 40_000, 0);
    let report = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

    assert_eq!(report.outcome, MoveOutcome::Blocked);
    assert_eq!(status.door_state(), DoorState::OpenBlocked);
    assert_eq!(status.door_state().wire_name(), "openblocked");

    // One forward drive, then exactly three reversal pulses.
    let drives = hw.drive_calls();
    assert_eq!(drives.len(), 1 + UNWIND_PULSES as usize);
    assert_eq!(drives[0], Direction::Open);
    assert!(drives[1..].iter().all(|d| *d == Direction::Close));

    assert_eq!(sink.obstruction_count(), 1);
    assert!(hw.motor_stopped());
    assert!(!status.is_busy());
    assert!(report.highest_avg_ma >= 900.0);
}

#[test]
fn obstruction_then_clear_retries_once_and_completes() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    // First attempt: jammed.  Second attempt: jam cleared by the unwind,
    // current collapses at end of travel.
    hw.script_current(950.0, 7).script_current(2.0, 16);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let cfg = config(900, 5, 40_000, 3);
    let report = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

    assert_eq!(report.outcome, MoveOutcome::Complete);
    assert_eq!(report.retries_used, 1);
    assert_eq!(status.door_state(), DoorState::Open);
    assert_eq!(sink.obstruction_count(), 1);
    assert!((report.highest_avg_ma - 950.0).abs() < 1e-3);

    // Open, 3 reversals, then the retry's open.
    assert_eq!(
        hw.drive_calls(),
        vec![
            Direction::Open,
            Direction::Close,
            Direction::Close,
            Direction::Close,
            Direction::Open,
        ]
    );
}

// ── Scenario C: retries exhausted ⇒ terminal blocked state ───

#[test]
fn consecutive_obstructions_exhaust_retries_and_stay_blocked() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    hw.script_current(950.0, 256);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let cfg = config(900, 5, 40_000, 3);
    let report = sup.safe_move(Direction::Close, &cfg, &mut hw, &clock, &mut sink);

    assert_eq!(report.outcome, MoveOutcome::Blocked);
    assert_eq!(report.retries_used, 3);
    assert_eq!(status.door_state(), DoorState::CloseBlocked);

    // retry_limit + 1 attempts, each with its 3-pulse unwind.
    let drives = hw.drive_calls();
    let forward = drives.iter().filter(|d| **d == Direction::Close).count();
    let reverse = drives.iter().filter(|d| **d == Direction::Open).count();
    assert_eq!(forward, 4);
    assert_eq!(reverse, 4 * UNWIND_PULSES as usize);
    assert_eq!(sink.obstruction_count(), 4);

    // Never claim success that didn't happen; motor stopped, flag clear.
    assert!(hw.motor_stopped());
    assert!(!status.is_busy());
}

// ── Silent timeout ⇒ honest TimedOut terminal state ──────────

#[test]
fn attempt_timeout_reports_timed_out_not_success() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    // Current sits between idle and jam thresholds forever.
    hw.script_current(50.0, 64);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    // Timeout admits fewer samples than the window needs to classify.
    let cfg = config(900, 5, SETTLE_DELAY_MS + 500, 0);
    let report = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

    assert_eq!(report.outcome, MoveOutcome::TimedOut);
    assert_eq!(status.door_state(), DoorState::TimedOut);
    assert_eq!(status.door_state().wire_name(), "timedout");
    assert!(hw.motor_stopped());
    assert!(!status.is_busy());
}

#[test]
fn timeout_consumes_retries_like_an_obstruction() {
    let (mut sup, _status) = make_supervisor();
    let mut hw = MockHardware::new();
    hw.script_current(50.0, 256);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let cfg = config(900, 5, SETTLE_DELAY_MS + 500, 2);
    let report = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

    assert_eq!(report.outcome, MoveOutcome::TimedOut);
    assert_eq!(report.retries_used, 2);
    assert_eq!(hw.drive_calls().len(), 3);
}

// ── Sensor failure ⇒ conservative sentinel behaviour ─────────

#[test]
fn dead_sensor_reads_as_sentinel_and_trips_low_threshold() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    hw.script_current(0.0, 64);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    // Sentinel (500) sits above this threshold: a dead sensor must read
    // as "possibly jammed", never as a clean completion.
    let cfg = config(400, 5, 40_000, 0);
    let report = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

    assert_eq!(report.outcome, MoveOutcome::Blocked);
    assert_eq!(status.door_state(), DoorState::OpenBlocked);
    assert!((report.highest_avg_ma - 500.0).abs() < 1e-3);
}

#[test]
fn dead_sensor_never_classifies_as_idle_completion() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    hw.script_current(-1.0, 64);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    // Idle threshold generous, jam threshold above the sentinel: the
    // sentinel keeps the average at 500, so neither classifier fires.
    let cfg = config(900, 60, SETTLE_DELAY_MS + 2_000, 0);
    let report = sup.safe_move(Direction::Close, &cfg, &mut hw, &clock, &mut sink);

    assert_eq!(report.outcome, MoveOutcome::TimedOut);
    assert_ne!(status.door_state(), DoorState::Closed);
}

// ── Busy fail-fast ───────────────────────────────────────────

#[test]
fn safe_move_fails_fast_when_busy() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    assert!(status.try_claim());
    let report = sup.safe_move(
        Direction::Open,
        &MotionConfig::default(),
        &mut hw,
        &clock,
        &mut sink,
    );

    assert_eq!(report.outcome, MoveOutcome::Busy);
    assert!(hw.calls.is_empty(), "busy reject must not touch the motor");
    assert!(status.is_busy(), "foreign claim must survive the reject");
}

// ── Observability ────────────────────────────────────────────

#[test]
fn move_publishes_windowed_average_for_current_queries() {
    let (mut sup, status) = make_supervisor();
    let mut hw = MockHardware::new();
    hw.script_current(50.0, 64);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let cfg = config(900, 60, 40_000, 0);
    let _ = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

    assert!((status.last_current_ma() - 50.0).abs() < 1e-3);
}

#[test]
fn state_transitions_are_emitted_in_order() {
    use coopdoor::app::events::AppEvent;

    let (mut sup, _status) = make_supervisor();
    let mut hw = MockHardware::new();
    hw.script_current(50.0, 64);
    let clock = MockClock::new();
    let mut sink = RecordingSink::new();

    let cfg = config(900, 60, 40_000, 0);
    let _ = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

    let transitions: Vec<(DoorState, DoorState)> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::DoorStateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        vec![
            (DoorState::Unknown, DoorState::Opening),
            (DoorState::Opening, DoorState::Open),
        ]
    );
}

// ── Bridge-level invariant under the whole scenario set ──────

#[test]
fn cleanup_always_runs_regardless_of_outcome() {
    for (script, threshold, timeout, retries) in [
        (50.0, 900, 40_000, 3u8),               // completes (idle 60 below)
        (950.0, 900, 40_000, 2),                // blocked
        (50.0, 900, SETTLE_DELAY_MS + 300, 1),  // timed out
    ] {
        let (mut sup, status) = make_supervisor();
        let mut hw = MockHardware::new();
        hw.script_current(script, 512);
        let clock = MockClock::new();
        let mut sink = RecordingSink::new();

        let cfg = config(threshold, 60, timeout, retries);
        let _ = sup.safe_move(Direction::Open, &cfg, &mut hw, &clock, &mut sink);

        assert_eq!(hw.calls.last(), Some(&MotorCall::Stop));
        assert!(!status.is_busy());
    }
}
