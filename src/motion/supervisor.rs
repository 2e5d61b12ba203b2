//! The safe-move state machine.
//!
//! One move = up to `retry_limit + 1` drive attempts.  Each attempt:
//!
//! ```text
//!  drive ──▶ settle 1 s ──▶ sample @ ≥10 ms inside a 110 ms poll loop
//!                │                        │
//!                │            avg < idle ─┼─▶ Complete (door settled)
//!                │            avg > jam  ─┼─▶ stop, unwind ×3, Blocked
//!                │            deadline   ─┴─▶ TimedOut (silent)
//! ```
//!
//! Blocked and TimedOut attempts consume a retry and re-drive; Complete
//! ends the move.  The cleanup path (motor stop + busy release) is a
//! straight-line epilogue every exit flows through — there is no early
//! return between the first `drive` and the final `stop_motor`.
//!
//! The outer 110 ms sleep bounds CPU/UART contention and keeps the move
//! task yielding well inside the watchdog period; the 10 ms sample
//! cadence is measured against the last-sample timestamp, so it is
//! independent of the poll cadence.

use std::sync::Arc;

use log::{info, warn};

use crate::app::events::{AppEvent, MoveReport};
use crate::app::ports::{CurrentSensePort, EventSink, MotorPort, TimePort};
use crate::config::MotionConfig;
use crate::drivers::motor::Direction;

use super::window::CurrentWindow;
use super::{DoorState, MotionStatus, MoveOutcome};

/// Pause after `drive` before sampling starts, so the startup current
/// transient never enters the window.
pub const SETTLE_DELAY_MS: u32 = 1_000;

/// Outer poll-loop sleep.
pub const POLL_INTERVAL_MS: u32 = 110;

/// Minimum spacing between current samples.
pub const SAMPLE_INTERVAL_MS: u64 = 10;

/// Pause between stopping on an obstruction and the first unwind pulse.
pub const UNWIND_PAUSE_MS: u32 = 500;

/// Duration of one reverse pulse in the unwind sequence.
pub const UNWIND_DRIVE_MS: u32 = 2_000;

/// Rest between unwind pulses.
pub const UNWIND_REST_MS: u32 = 1_000;

/// Reverse pulses per obstruction.
pub const UNWIND_PULSES: u32 = 3;

/// Classification of a single drive attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttemptResult {
    Complete,
    Obstructed,
    TimedOut,
}

/// Owns the door-state cell and runs `safe_move` with exclusive access to
/// the motor and current sensor for the duration of each move.
pub struct MotionSupervisor {
    status: Arc<MotionStatus>,
}

impl MotionSupervisor {
    pub fn new(status: Arc<MotionStatus>) -> Self {
        Self { status }
    }

    pub fn status(&self) -> &MotionStatus {
        &self.status
    }

    /// Claim the busy flag and run a full move.
    ///
    /// Fails fast with a [`MoveOutcome::Busy`] report — without touching
    /// the motor — if another move is in flight.
    pub fn safe_move(
        &mut self,
        action: Direction,
        config: &MotionConfig,
        hw: &mut (impl MotorPort + CurrentSensePort),
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> MoveReport {
        if !self.status.try_claim() {
            return MoveReport {
                action,
                outcome: MoveOutcome::Busy,
                retries_used: 0,
                highest_avg_ma: 0.0,
            };
        }
        self.safe_move_claimed(action, config, hw, clock, sink)
    }

    /// Run a full move with the busy flag already claimed by the caller
    /// (the command engine claims before handing off to the worker, so a
    /// second movement command observes `busy` with no race window).
    ///
    /// Always stops the motor and releases the busy flag before returning.
    pub fn safe_move_claimed(
        &mut self,
        action: Direction,
        config: &MotionConfig,
        hw: &mut (impl MotorPort + CurrentSensePort),
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> MoveReport {
        // Config snapshot semantics: `config` was cloned by the caller at
        // dispatch; field reads below see one consistent set of values.
        let timeout_ms = u64::from(config.timeout_ms(action));
        let idle_threshold = config.current_idle_threshold as f32;
        let jam_threshold = config.current_threshold as f32;

        sink.emit(&AppEvent::MoveStarted { action });
        self.set_state(DoorState::moving(action), sink);

        let mut retries: u8 = 0;
        let mut highest_avg_ma: f32 = 0.0;
        let mut result;

        loop {
            sink.emit(&AppEvent::AttemptStarted {
                action,
                attempt: retries,
            });
            info!(
                "move {}: attempt {}/{} (timeout {} ms)",
                action.wire_name(),
                retries + 1,
                config.retry_limit + 1,
                timeout_ms
            );

            result = self.run_attempt(
                action,
                timeout_ms,
                idle_threshold,
                jam_threshold,
                &mut highest_avg_ma,
                hw,
                clock,
                sink,
            );

            if result == AttemptResult::Complete {
                info!("move {} complete", action.wire_name());
                break;
            }
            if retries >= config.retry_limit {
                break;
            }
            retries += 1;
            info!(
                "move {}: retry {} after {:?}",
                action.wire_name(),
                retries,
                result
            );
        }

        // Cleanup: runs on every exit from the attempt loop.
        hw.stop_motor();
        let outcome = match result {
            AttemptResult::Complete => MoveOutcome::Complete,
            AttemptResult::Obstructed => MoveOutcome::Blocked,
            AttemptResult::TimedOut => {
                // Honest terminal state: retries spent, no classification
                // ever fired.  Never report open/closed that didn't happen.
                self.set_state(DoorState::TimedOut, sink);
                MoveOutcome::TimedOut
            }
        };
        self.status.release();

        let report = MoveReport {
            action,
            outcome,
            retries_used: retries,
            highest_avg_ma,
        };
        sink.emit(&AppEvent::MoveFinished(report));
        report
    }

    /// One drive attempt: drive, settle, sample until classified or timed out.
    #[allow(clippy::too_many_arguments)]
    fn run_attempt(
        &mut self,
        action: Direction,
        timeout_ms: u64,
        idle_threshold: f32,
        jam_threshold: f32,
        highest_avg_ma: &mut f32,
        hw: &mut (impl MotorPort + CurrentSensePort),
        clock: &impl TimePort,
        sink: &mut impl EventSink,
    ) -> AttemptResult {
        hw.drive(action);
        let attempt_start = clock.now_ms();

        clock.sleep_ms(SETTLE_DELAY_MS);

        let mut window = CurrentWindow::new();
        let mut last_sample_at = clock.now_ms();

        while clock.now_ms().saturating_sub(attempt_start) < timeout_ms {
            clock.sleep_ms(POLL_INTERVAL_MS);

            let now = clock.now_ms();
            if now.saturating_sub(last_sample_at) < SAMPLE_INTERVAL_MS {
                continue;
            }
            last_sample_at = now;

            let Some(avg) = window.push(hw.read_ma()) else {
                continue;
            };
            self.status.publish_current(avg);
            if avg > *highest_avg_ma {
                *highest_avg_ma = avg;
            }

            if avg < idle_threshold {
                // End of travel: motor stalled out against the stop and
                // freewheel current collapsed.
                self.set_state(DoorState::settled(action), sink);
                return AttemptResult::Complete;
            }

            if avg > jam_threshold {
                warn!(
                    "move {}: obstruction at {:.1} mA (threshold {:.0})",
                    action.wire_name(),
                    avg,
                    jam_threshold
                );
                sink.emit(&AppEvent::ObstructionDetected { action, avg_ma: avg });
                self.unwind(action, hw, clock);
                self.set_state(DoorState::blocked(action), sink);
                return AttemptResult::Obstructed;
            }
        }

        AttemptResult::TimedOut
    }

    /// Back-off sequence after an obstruction: stop, pause, then three
    /// reverse pulses to relieve the mechanical binding.  The follow-up
    /// attempt re-drives the original direction.
    fn unwind(
        &mut self,
        action: Direction,
        hw: &mut impl MotorPort,
        clock: &impl TimePort,
    ) {
        hw.stop_motor();
        clock.sleep_ms(UNWIND_PAUSE_MS);
        for _ in 0..UNWIND_PULSES {
            hw.drive(action.opposite());
            clock.sleep_ms(UNWIND_DRIVE_MS);
            hw.stop_motor();
            clock.sleep_ms(UNWIND_REST_MS);
        }
    }

    fn set_state(&self, to: DoorState, sink: &mut impl EventSink) {
        let from = self.status.door_state();
        if from != to {
            self.status.set_door_state(to);
            sink.emit(&AppEvent::DoorStateChanged { from, to });
        }
    }
}
