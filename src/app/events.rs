//! Outbound application events.
//!
//! The motion supervisor and command engine emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them — log to serial, surface on the
//! network node's status page, record in tests.

use crate::drivers::motor::Direction;
use crate::motion::{DoorState, MoveOutcome};

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The firmware finished booting (carries the loaded-config marker).
    Started,

    /// A movement operation was accepted and is starting.
    MoveStarted { action: Direction },

    /// One drive attempt inside a move began (`attempt` counts from 0).
    AttemptStarted { action: Direction, attempt: u8 },

    /// The sampling window crossed the obstruction threshold.
    ObstructionDetected { action: Direction, avg_ma: f32 },

    /// The door state changed.
    DoorStateChanged { from: DoorState, to: DoorState },

    /// A movement operation finished (any outcome).
    MoveFinished(MoveReport),

    /// A config field was updated over the link and persisted.
    ConfigUpdated { key: &'static str, value: u32 },
}

/// Summary of one complete `safe_move` operation.
#[derive(Debug, Clone, Copy)]
pub struct MoveReport {
    pub action: Direction,
    pub outcome: MoveOutcome,
    /// Retries consumed (0 = first attempt succeeded).
    pub retries_used: u8,
    /// Highest windowed average observed across all attempts (mA).
    pub highest_avg_ma: f32,
}
