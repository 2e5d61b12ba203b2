//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to the debug UART / USB-CDC in
//! production).  These are the immediate move-progress lines; the final
//! protocol reply for a move still travels over the command link only.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => {
                info!("START | motor node up");
            }
            AppEvent::MoveStarted { action } => {
                info!("MOVE  | {} requested", action.wire_name());
            }
            AppEvent::AttemptStarted { action, attempt } => {
                info!("MOVE  | {} attempt {}", action.wire_name(), attempt + 1);
            }
            AppEvent::ObstructionDetected { action, avg_ma } => {
                info!(
                    "JAM   | {} obstructed at {:.1} mA",
                    action.wire_name(),
                    avg_ma
                );
            }
            AppEvent::DoorStateChanged { from, to } => {
                info!("STATE | {} -> {}", from.wire_name(), to.wire_name());
            }
            AppEvent::MoveFinished(report) => {
                info!(
                    "MOVE  | {} finished: {:?} | retries={} | peak={:.1} mA",
                    report.action.wire_name(),
                    report.outcome,
                    report.retries_used,
                    report.highest_avg_ma,
                );
            }
            AppEvent::ConfigUpdated { key, value } => {
                info!("CONF  | {} = {}", key, value);
            }
        }
    }
}
