//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the motor driver and the current sensor, exposing them through
//! [`MotorPort`] and [`CurrentSensePort`].  This is the only module in
//! the system that hands actual hardware to the domain.  On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.
//!
//! The whole adapter sits behind one mutex: the movement worker holds
//! the guard for the duration of a move, which is exactly the exclusive
//! access window the busy flag advertises.

use crate::app::ports::{CurrentSensePort, MotorPort};
use crate::drivers::motor::{Direction, MotorDriver};
use crate::sensors::CurrentSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    motor: MotorDriver,
    current: CurrentSensor,
}

impl HardwareAdapter {
    pub fn new(motor: MotorDriver, current: CurrentSensor) -> Self {
        Self { motor, current }
    }

    pub fn motor(&self) -> &MotorDriver {
        &self.motor
    }
}

impl MotorPort for HardwareAdapter {
    fn drive(&mut self, direction: Direction) {
        self.motor.drive(direction);
    }

    fn stop_motor(&mut self) {
        self.motor.stop();
    }
}

impl CurrentSensePort for HardwareAdapter {
    fn read_ma(&mut self) -> f32 {
        self.current.read_ma()
    }
}
