//! Door motor driver (BTS7960 dual half-bridge).
//!
//! Two LEDC PWM channels (IN1 = open direction, IN2 = close direction)
//! plus two enable lines (L_EN, R_EN) that gate the bridge halves.
//!
//! ## Safety contract
//!
//! At most one direction carries duty at any time, and the enables are
//! asserted only *after* the duty registers are set — asserting first
//! would put a transient full-duty glitch on the bridge.  `stop()` always
//! zeroes both duties and releases both enables, whatever the prior state.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM and GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

/// Fixed drive level, ~50% of the 10-bit LEDC range.
pub const DRIVE_DUTY: u16 = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Open,
    Close,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Self::Open => Self::Close,
            Self::Close => Self::Open,
        }
    }

    /// The token used on the wire for this direction.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Close => "close",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeState {
    Stopped,
    Driving(Direction),
}

pub struct MotorDriver {
    state: BridgeState,
    /// Mirror of the two duty registers (IN1, IN2).
    duty: (u16, u16),
    /// Mirror of the two enable lines (L_EN, R_EN).
    enabled: (bool, bool),
}

impl MotorDriver {
    pub fn new() -> Self {
        Self {
            state: BridgeState::Stopped,
            duty: (0, 0),
            enabled: (false, false),
        }
    }

    /// Energise the bridge in `direction`: duty on one channel, zero on
    /// the other, then both enables asserted.
    pub fn drive(&mut self, direction: Direction) {
        let (in1, in2) = match direction {
            Direction::Open => (DRIVE_DUTY, 0),
            Direction::Close => (0, DRIVE_DUTY),
        };

        self.set_duty_hw(in1, in2);
        self.set_enable_hw(true);

        self.duty = (in1, in2);
        self.enabled = (true, true);
        self.state = BridgeState::Driving(direction);
    }

    /// De-energise the bridge: duties to zero, then enables released.
    pub fn stop(&mut self) {
        self.set_duty_hw(0, 0);
        self.set_enable_hw(false);

        self.duty = (0, 0);
        self.enabled = (false, false);
        self.state = BridgeState::Stopped;
    }

    fn set_duty_hw(&self, in1: u16, in2: u16) {
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR_IN1, in1);
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR_IN2, in2);
    }

    fn set_enable_hw(&self, on: bool) {
        hw_init::gpio_write(pins::MOTOR_L_EN_GPIO, on);
        hw_init::gpio_write(pins::MOTOR_R_EN_GPIO, on);
    }

    pub fn state(&self) -> BridgeState {
        self.state
    }

    pub fn duty(&self) -> (u16, u16) {
        self.duty
    }

    pub fn enables(&self) -> (bool, bool) {
        self.enabled
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, BridgeState::Stopped)
    }
}
