//! Command engine — dispatches decoded command lines to the domain.
//!
//! **Transport-decoupled**: the engine does not own a UART.  Callers feed
//! trimmed lines via [`CommandEngine::handle_line`] and receive the reply
//! text (without terminator); the I/O task bridges the transport.
//!
//! Movement commands are asynchronous: the engine claims the busy flag,
//! hands the request to the movement worker, and replies `ack`
//! immediately — the partner observes the outcome later via `status`.
//! Everything else replies synchronously.  The hardware mutex is only
//! locked here when the busy flag is clear, so the engine never waits
//! behind a move in progress.

use core::fmt::Write as _;
use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::app::commands::{Command, ConfigKey};
use crate::app::events::AppEvent;
use crate::app::ports::{ConfigPort, CurrentSensePort, EventSink, MotorPort, MoveDispatcher};
use crate::config::MotionConfig;
use crate::drivers::motor::Direction;
use crate::motion::{DoorState, MotionStatus};

/// Reply text, excluding the `\n` terminator the I/O task appends.
pub type Reply = heapless::String<192>;

fn reply(text: &str) -> Reply {
    let mut r = Reply::new();
    // Static reply tokens all fit the reply buffer.
    let _ = r.push_str(text);
    r
}

pub struct CommandEngine<S: ConfigPort> {
    config: Arc<Mutex<MotionConfig>>,
    store: S,
    status: Arc<MotionStatus>,
}

impl<S: ConfigPort> CommandEngine<S> {
    pub fn new(config: Arc<Mutex<MotionConfig>>, store: S, status: Arc<MotionStatus>) -> Self {
        Self {
            config,
            store,
            status,
        }
    }

    /// Handle one trimmed command line and produce the reply.
    pub fn handle_line(
        &mut self,
        line: &str,
        hw: &Mutex<impl MotorPort + CurrentSensePort>,
        dispatcher: &mut impl MoveDispatcher,
        sink: &mut impl EventSink,
    ) -> Reply {
        match Command::parse(line) {
            Command::Open => self.handle_move(Direction::Open, dispatcher),
            Command::Close => self.handle_move(Direction::Close, dispatcher),
            Command::Stop => self.handle_stop(hw, sink),
            Command::Status => reply(self.status.door_state().wire_name()),
            Command::Current => self.handle_current(hw),
            Command::Config => self.handle_config(),
            Command::Log => reply("logged"),
            Command::Set(key, value) => self.handle_set(key, value, sink),
            Command::SetInvalid(key) => {
                let mut r = Reply::new();
                let _ = write!(r, "invalid {}", key.wire_name());
                r
            }
            Command::Unknown => reply("unknown"),
        }
    }

    /// Claim-then-dispatch keeps the busy window closed: a second movement
    /// command arriving before the worker even wakes still observes `busy`.
    fn handle_move(&mut self, action: Direction, dispatcher: &mut impl MoveDispatcher) -> Reply {
        if !self.status.try_claim() {
            return reply("busy");
        }
        if dispatcher.dispatch(action) {
            info!("move {} dispatched", action.wire_name());
            reply("ack")
        } else {
            warn!("move {}: worker channel unavailable", action.wire_name());
            self.status.release();
            reply("busy")
        }
    }

    /// Synchronous stop.  Rejected while a move holds the hardware — there
    /// is no cancellation path mid-attempt, and driving the bridge from
    /// two tasks would break the exclusive-direction invariant.
    fn handle_stop(
        &mut self,
        hw: &Mutex<impl MotorPort + CurrentSensePort>,
        sink: &mut impl EventSink,
    ) -> Reply {
        if self.status.is_busy() {
            return reply("busy");
        }
        let mut guard = hw.lock().expect("hardware mutex poisoned");
        guard.stop_motor();
        drop(guard);

        let from = self.status.door_state();
        if from != DoorState::Unknown {
            self.status.set_door_state(DoorState::Unknown);
            sink.emit(&AppEvent::DoorStateChanged {
                from,
                to: DoorState::Unknown,
            });
        }
        reply("ack")
    }

    /// Latest current reading.  During a move this is the sampling loop's
    /// published windowed average; when idle, a fresh instantaneous read.
    fn handle_current(&mut self, hw: &Mutex<impl MotorPort + CurrentSensePort>) -> Reply {
        let ma = if self.status.is_busy() {
            self.status.last_current_ma()
        } else {
            let mut guard = hw.lock().expect("hardware mutex poisoned");
            let ma = guard.read_ma();
            drop(guard);
            self.status.publish_current(ma);
            ma
        };
        let mut r = Reply::new();
        let _ = write!(r, "{:.1}", ma);
        r
    }

    fn handle_config(&mut self) -> Reply {
        let snapshot = self.config.lock().expect("config mutex poisoned").clone();
        let mut r = Reply::new();
        if let Ok(json) = serde_json::to_string(&snapshot) {
            if r.push_str(&json).is_ok() {
                return r;
            }
        }
        reply("unknown")
    }

    fn handle_set(&mut self, key: ConfigKey, value: u32, sink: &mut impl EventSink) -> Reply {
        let snapshot = {
            let mut cfg = self.config.lock().expect("config mutex poisoned");
            match key {
                ConfigKey::Threshold => cfg.current_threshold = value,
                ConfigKey::TimeoutOpen => cfg.move_timeout_open_ms = value,
                ConfigKey::TimeoutClose => cfg.move_timeout_close_ms = value,
            }
            cfg.clone()
        };

        // Full-record rewrite on every accepted update.  The RAM config is
        // already live; a failed persist self-heals on the next write.
        if let Err(e) = self.store.save(&snapshot) {
            warn!("config persist failed: {e}");
        }
        sink.emit(&AppEvent::ConfigUpdated {
            key: key.wire_name(),
            value,
        });
        info!("config: {} = {}", key.wire_name(), value);

        let mut r = Reply::new();
        let _ = write!(r, "{} updated", key.wire_name());
        r
    }
}
