//! INA219 high-side current monitor driver.
//!
//! Reads the calibrated current register over I²C and converts to
//! milliamps.  Any bus failure yields `0.0` — the sampling loop treats
//! non-positive readings as "no usable reading" and substitutes its
//! conservative sentinel, so a flaky bus can never masquerade as
//! end-of-travel idle current.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: real register reads via the hw_init I²C helpers.
//! On host/test: reads from a static atomic cell for injection.

use core::sync::atomic::{AtomicU32, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
#[cfg(target_os = "espidf")]
use crate::pins;

static SIM_CURRENT_MA: AtomicU32 = AtomicU32::new(0);

/// Inject a reading for host-side tests and simulation.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_current_ma(ma: f32) {
    SIM_CURRENT_MA.store(ma.to_bits(), Ordering::Relaxed);
}

/// INA219 register map (subset).
#[cfg(target_os = "espidf")]
const REG_CALIBRATION: u8 = 0x05;
#[cfg(target_os = "espidf")]
const REG_CURRENT: u8 = 0x04;

/// Calibration for a 0.1 Ω shunt, ±3.2 A range: current LSB = 0.1 mA.
#[cfg(target_os = "espidf")]
const CALIBRATION_VALUE: u16 = 4096;
#[cfg(target_os = "espidf")]
const CURRENT_LSB_MA: f32 = 0.1;

pub struct CurrentSensor {
    #[cfg(target_os = "espidf")]
    calibrated: bool,
}

impl Default for CurrentSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl CurrentSensor {
    pub fn new() -> Self {
        #[cfg(target_os = "espidf")]
        {
            let calibrated =
                hw_init::i2c_write_reg_u16(pins::INA219_ADDR, REG_CALIBRATION, CALIBRATION_VALUE)
                    .is_ok();
            if !calibrated {
                log::warn!("INA219: calibration write failed, readings will be 0");
            }
            Self { calibrated }
        }

        #[cfg(not(target_os = "espidf"))]
        Self {}
    }

    /// Instantaneous motor current in mA, or `0.0` on any bus failure.
    #[cfg(target_os = "espidf")]
    pub fn read_ma(&mut self) -> f32 {
        if !self.calibrated {
            // Retry once per read; the INA219 may have been power-cycled.
            self.calibrated =
                hw_init::i2c_write_reg_u16(pins::INA219_ADDR, REG_CALIBRATION, CALIBRATION_VALUE)
                    .is_ok();
            if !self.calibrated {
                return 0.0;
            }
        }
        match hw_init::i2c_read_reg_u16(pins::INA219_ADDR, REG_CURRENT) {
            Ok(raw) => f32::from(raw as i16) * CURRENT_LSB_MA,
            Err(rc) => {
                log::warn!("INA219: current read failed (rc={rc})");
                0.0
            }
        }
    }

    /// Instantaneous motor current in mA from the injected sim cell.
    #[cfg(not(target_os = "espidf"))]
    pub fn read_ma(&mut self) -> f32 {
        f32::from_bits(SIM_CURRENT_MA.load(Ordering::Relaxed))
    }
}
