//! Door motion subsystem — state model and the safe-move supervisor.
//!
//! [`DoorState`] and the busy flag live in [`MotionStatus`], an atomic
//! cell shared between the movement worker (sole writer during a move)
//! and the command task (reader, plus writer for idle `stop`).  The
//! supervisor itself is in [`supervisor`]; the worker-thread plumbing is
//! in [`worker`].

pub mod supervisor;
pub mod window;
pub mod worker;

pub use supervisor::MotionSupervisor;

use core::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, Ordering};

use crate::drivers::motor::Direction;

// ---------------------------------------------------------------------------
// Door state
// ---------------------------------------------------------------------------

/// Where the door is (or was last known to be).
///
/// Mutated only by the motion supervisor during a move, and by an idle
/// `stop` command (which forces `Unknown`).  `TimedOut` is the honest
/// terminal state for a move that exhausted its retries without either an
/// idle-current completion or an obstruction classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DoorState {
    Unknown = 0,
    Opening = 1,
    Closing = 2,
    Open = 3,
    Closed = 4,
    OpenBlocked = 5,
    CloseBlocked = 6,
    TimedOut = 7,
}

impl DoorState {
    /// The token sent in `status` replies.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Opening => "opening",
            Self::Closing => "closing",
            Self::Open => "open",
            Self::Closed => "closed",
            Self::OpenBlocked => "openblocked",
            Self::CloseBlocked => "closeblocked",
            Self::TimedOut => "timedout",
        }
    }

    /// The in-motion state for a commanded direction.
    pub fn moving(action: Direction) -> Self {
        match action {
            Direction::Open => Self::Opening,
            Direction::Close => Self::Closing,
        }
    }

    /// The settled (success) state for a commanded direction.
    pub fn settled(action: Direction) -> Self {
        match action {
            Direction::Open => Self::Open,
            Direction::Close => Self::Closed,
        }
    }

    /// The blocked state for a commanded direction.
    pub fn blocked(action: Direction) -> Self {
        match action {
            Direction::Open => Self::OpenBlocked,
            Direction::Close => Self::CloseBlocked,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Opening,
            2 => Self::Closing,
            3 => Self::Open,
            4 => Self::Closed,
            5 => Self::OpenBlocked,
            6 => Self::CloseBlocked,
            7 => Self::TimedOut,
            _ => Self::Unknown,
        }
    }
}

// ---------------------------------------------------------------------------
// Move outcome
// ---------------------------------------------------------------------------

/// Terminal classification of one full `safe_move` operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Idle-current classification fired — the door reached end of travel.
    Complete,
    /// Retry budget exhausted on obstructions.
    Blocked,
    /// Retry budget exhausted on silent per-attempt timeouts.
    TimedOut,
    /// Another move already held the busy flag; nothing was driven.
    Busy,
}

// ---------------------------------------------------------------------------
// Shared status cell
// ---------------------------------------------------------------------------

/// Lock-free status shared between the movement worker and the command task.
///
/// The busy flag is the single mutual-exclusion marker for the whole
/// motor/sensor pair: it is claimed (CAS) before a move is handed off and
/// released only after the cleanup path has stopped the motor.
pub struct MotionStatus {
    door_state: AtomicU8,
    busy: AtomicBool,
    /// Latest published current value, f32 bits.  Written by the sampling
    /// loop (windowed average) and by idle `current` reads (instantaneous).
    last_current_ma: AtomicU32,
}

impl Default for MotionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionStatus {
    pub fn new() -> Self {
        Self {
            door_state: AtomicU8::new(DoorState::Unknown as u8),
            busy: AtomicBool::new(false),
            last_current_ma: AtomicU32::new(0f32.to_bits()),
        }
    }

    pub fn door_state(&self) -> DoorState {
        DoorState::from_u8(self.door_state.load(Ordering::Acquire))
    }

    pub fn set_door_state(&self, state: DoorState) {
        self.door_state.store(state as u8, Ordering::Release);
    }

    /// True while a move holds exclusive access to motor + sensor.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Claim the busy flag.  Returns `false` if a move is already in flight.
    pub fn try_claim(&self) -> bool {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Release the busy flag after the cleanup path has run.
    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn publish_current(&self, ma: f32) {
        self.last_current_ma.store(ma.to_bits(), Ordering::Release);
    }

    pub fn last_current_ma(&self) -> f32 {
        f32::from_bits(self.last_current_ma.load(Ordering::Acquire))
    }
}
