//! ESP32 time adapter.
//!
//! Implements [`TimePort`](crate::app::ports::TimePort) for both targets:
//!
//! - **`target_os = "espidf"`** — `esp_timer_get_time()` for monotonic
//!   now, `std::thread::sleep` (a FreeRTOS delay that yields the task)
//!   for the fixed cadences.
//! - **`not(target_os = "espidf")`** — `std::time::Instant` and a real
//!   sleep, for host-side runs.  Tests use their own virtual clock.

use crate::app::ports::TimePort;

/// Monotonic clock + delay provider for the ESP32-S3 platform.
#[derive(Clone)]
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }
}

impl TimePort for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn now_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep_ms(&self, ms: u32) {
        std::thread::sleep(core::time::Duration::from_millis(u64::from(ms)));
    }
}
