//! Motion configuration parameters
//!
//! All tunable parameters for door movement and obstruction detection.
//! Values can be overridden over the command link and persist in NVS.

use serde::{Deserialize, Serialize};

/// Tunable movement parameters.
///
/// The motion supervisor snapshots this struct at the start of each move;
/// updates arriving mid-move apply from the next move onward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Moving-average current (mA) above which the door is jammed.
    pub current_threshold: u32,
    /// Per-attempt deadline for an `open` move (milliseconds).
    pub move_timeout_open_ms: u32,
    /// Per-attempt deadline for a `close` move (milliseconds).
    pub move_timeout_close_ms: u32,
    /// Moving-average current (mA) below which the motor has reached
    /// end-of-travel and stalled out against the stop.
    pub current_idle_threshold: u32,
    /// Additional attempts after the first before giving up.
    pub retry_limit: u8,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            current_threshold: 900,
            move_timeout_open_ms: 40_000,
            move_timeout_close_ms: 40_000,
            current_idle_threshold: 5,
            retry_limit: 3,
        }
    }
}

impl MotionConfig {
    /// Per-attempt deadline for the given direction.
    pub fn timeout_ms(&self, dir: crate::drivers::motor::Direction) -> u32 {
        match dir {
            crate::drivers::motor::Direction::Open => self.move_timeout_open_ms,
            crate::drivers::motor::Direction::Close => self.move_timeout_close_ms,
        }
    }
}
