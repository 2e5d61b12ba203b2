//! CoopDoor Motor-Node Firmware — Main Entry Point
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  HardwareAdapter    LogEventSink   NvsConfigStore   LinkUart │
//! │  (Motor+Current)    (EventSink)    (ConfigPort)     (bytes)  │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ─────────────────       │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │  CommandEngine ──busy claim──▶ MotionSupervisor    │      │
//! │  │  (main task, 50 ms poll)       (worker thread)     │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The main task runs the command loop and feeds the watchdog; the
//! movement worker owns the hardware mutex for the duration of each
//! move.  Any unhandled panic aborts into a device reset — state after
//! an unmodeled failure cannot be trusted, so nothing tries to recover.
#![deny(unused_must_use)]

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use log::{info, warn};

use coopdoor::adapters::hardware::HardwareAdapter;
use coopdoor::adapters::log_sink::LogEventSink;
use coopdoor::adapters::nvs::NvsConfigStore;
use coopdoor::adapters::time::Esp32TimeAdapter;
use coopdoor::app::events::AppEvent;
use coopdoor::app::ports::{ConfigPort, EventSink, MotorPort};
use coopdoor::config::MotionConfig;
use coopdoor::drivers::hw_init;
use coopdoor::drivers::motor::MotorDriver;
use coopdoor::drivers::watchdog::Watchdog;
use coopdoor::link::engine::CommandEngine;
use coopdoor::link::io_task;
use coopdoor::link::uart::LinkUart;
use coopdoor::motion::{worker, MotionStatus};
use coopdoor::sensors::CurrentSensor;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("CoopDoor motor node v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Peripheral init failure is critical — log and halt.
        // The watchdog reset takes it from here.
        log::error!("HAL init failed: {} — halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }
    // Subscribes the main task: the command loop below must keep feeding.
    let watchdog = Watchdog::new();

    // ── 3. Config from NVS (or defaults) ──────────────────────
    let store = NvsConfigStore::new()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .context("NVS init failed")?;
    let config = match store.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS: {:?}", cfg);
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            MotionConfig::default()
        }
    };

    // ── 4. Shared state + hardware ────────────────────────────
    let status = Arc::new(MotionStatus::new());
    let config = Arc::new(Mutex::new(config));
    let hw = Arc::new(Mutex::new(HardwareAdapter::new(
        MotorDriver::new(),
        CurrentSensor::new(),
    )));

    // Known-safe power-on state: bridge released before any task starts.
    hw.lock().expect("hardware mutex poisoned").stop_motor();

    // ── 5. Movement worker ────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let _worker = worker::spawn(
        Arc::clone(&status),
        Arc::clone(&hw),
        Arc::clone(&config),
        clock,
    );

    // ── 6. Command loop (never returns) ───────────────────────
    let engine = CommandEngine::new(config, store, status);
    LogEventSink::new().emit(&AppEvent::Started);

    io_task::run(LinkUart::new(), engine, hw, watchdog)
}
