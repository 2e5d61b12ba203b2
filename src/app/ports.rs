//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ MotionSupervisor / CommandEngine (domain)
//! ```
//!
//! Driven adapters (motor driver, current sensor, NVS store, event sinks)
//! implement these traits.  The domain core consumes them via generics, so
//! it never touches hardware directly.
//!
//! ## Safety notes
//!
//! - **MotorPort** implementations must guarantee that at most one direction
//!   is ever energised; `stop_motor()` must be idempotent and unconditional.
//! - **CurrentSensePort** returns `0.0` for "no usable reading" — callers
//!   substitute a conservative sentinel, never treat it as zero current.

use crate::config::MotionConfig;
use crate::drivers::motor::Direction;

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → H-bridge)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to command the door motor.
pub trait MotorPort {
    /// Energise the bridge in the given direction at the fixed drive duty.
    fn drive(&mut self, direction: Direction);

    /// De-energise the bridge: both duties to zero, both enables released.
    fn stop_motor(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: instantaneous motor current in milliamps.
///
/// A bus failure yields `0.0`, not an error — the sampling loop substitutes
/// its stall sentinel for any reading at or below zero.
pub trait CurrentSensePort {
    fn read_ma(&mut self) -> f32;
}

// ───────────────────────────────────────────────────────────────
// Time port (monotonic clock + cooperative delay)
// ───────────────────────────────────────────────────────────────

/// Monotonic time source and delay provider for the sampling loops.
///
/// Injected so the supervisor's fixed cadences (settle delay, poll
/// interval, unwind pulses) run against a mock clock in tests.
pub trait TimePort {
    /// Milliseconds since boot, monotonic.
    fn now_ms(&self) -> u64;

    /// Block the calling task for `ms` milliseconds, yielding to the
    /// scheduler (FreeRTOS delay on target, virtual advance in tests).
    fn sleep_ms(&self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / link partner)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, status
/// page on the network node, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Movement handoff port (command engine → movement worker)
// ───────────────────────────────────────────────────────────────

/// Hands a movement request to the single movement worker.
///
/// The engine claims the busy flag *before* dispatching, so an accepted
/// dispatch is guaranteed exclusive.  Returns `false` if the handoff
/// channel is unavailable (the engine then releases its claim).
pub trait MoveDispatcher {
    fn dispatch(&mut self, action: Direction) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the motion configuration.
///
/// Implementations MUST rewrite the full record on every save — partial
/// updates would let a power loss mix old and new thresholds.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ConfigError::NotFound`] on first boot.
    fn load(&self) -> Result<MotionConfig, ConfigError>;

    /// Persist the full configuration record.
    fn save(&self, config: &MotionConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
