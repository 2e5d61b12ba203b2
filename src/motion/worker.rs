//! Movement worker thread and the command→worker handoff channel.
//!
//! Exactly one worker exists.  It blocks on a depth-1 `embassy-sync`
//! channel; the command engine claims the busy flag *before* enqueueing,
//! so the channel can never hold a request while a move is running and a
//! second movement command is rejected with `busy`, never queued.
//!
//! The worker holds the hardware mutex guard for the whole move — the
//! command task only locks for idle `stop`/`current`, gated on the busy
//! flag, so the lock is never contended in practice.

use std::sync::{Arc, Mutex};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::adapters::log_sink::LogEventSink;
use crate::app::ports::{CurrentSensePort, MotorPort, MoveDispatcher, TimePort};
use crate::config::MotionConfig;
use crate::drivers::motor::Direction;
use crate::drivers::task_pin::{self, Core};

use super::{MotionStatus, MotionSupervisor};

/// A movement request accepted by the command engine.
pub struct MoveRequest {
    pub action: Direction,
}

/// Depth 1: the engine's busy-flag claim guarantees at most one request
/// is ever outstanding.
pub static MOVE_CHANNEL: Channel<CriticalSectionRawMutex, MoveRequest, 1> = Channel::new();

/// Production [`MoveDispatcher`]: hands requests to the worker thread.
pub struct ChannelDispatcher;

impl MoveDispatcher for ChannelDispatcher {
    fn dispatch(&mut self, action: Direction) -> bool {
        MOVE_CHANNEL.try_send(MoveRequest { action }).is_ok()
    }
}

/// Spawn the movement worker.
///
/// `config` is snapshotted at the start of each move; updates arriving
/// mid-move apply from the next move onward.
pub fn spawn<H, C>(
    status: Arc<MotionStatus>,
    hw: Arc<Mutex<H>>,
    config: Arc<Mutex<MotionConfig>>,
    clock: C,
) -> std::thread::JoinHandle<()>
where
    H: MotorPort + CurrentSensePort + Send + 'static,
    C: TimePort + Send + 'static,
{
    task_pin::spawn_on_core(Core::App, 5, 8, "door-move\0", move || {
        let mut supervisor = MotionSupervisor::new(status);
        let mut sink = LogEventSink::new();
        loop {
            let req = futures_lite::future::block_on(MOVE_CHANNEL.receive());
            let snapshot = config.lock().expect("config mutex poisoned").clone();
            let mut guard = hw.lock().expect("hardware mutex poisoned");
            let _report =
                supervisor.safe_move_claimed(req.action, &snapshot, &mut *guard, &clock, &mut sink);
        }
    })
}
