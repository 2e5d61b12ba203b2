//! Command-link I/O task — the node's outer loop.
//!
//! A single async task polls the UART every 50 ms via an
//! `async-io-mini` reactor timer, feeds the watchdog on every tick,
//! decodes complete lines, dispatches them through the
//! [`CommandEngine`], and writes the reply.  Movement never runs here —
//! the engine hands `open`/`close` to the worker thread and replies
//! immediately, so the loop (and the watchdog) stays live through
//! moves lasting tens of seconds.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────┐
//!  │  Command task (TWDT-subscribed)                      │
//!  │  block_on(executor.run(..))                          │
//!  │   └─ command_loop: 50ms ⏱ → feed wdt → read UART    │
//!  │        → LineDecoder → CommandEngine → write reply   │
//!  └──────────────────────────────────────────────────────┘
//! ```

use core::time::Duration;
use std::sync::{Arc, Mutex};

use log::{info, warn};

use crate::adapters::log_sink::LogEventSink;
use crate::app::ports::{ConfigPort, CurrentSensePort, MotorPort};
use crate::drivers::watchdog::Watchdog;
use crate::motion::worker::ChannelDispatcher;

use super::codec::LineDecoder;
use super::engine::CommandEngine;
use super::uart::{LinkTransport, LinkUart};

/// Poll cadence for the link and the watchdog feed.
pub const POLL_INTERVAL_MS: u64 = 50;

const READ_BUF_SIZE: usize = 256;

async fn command_loop<S, H>(
    mut uart: LinkUart,
    mut engine: CommandEngine<S>,
    hw: Arc<Mutex<H>>,
    watchdog: Watchdog,
) where
    S: ConfigPort,
    H: MotorPort + CurrentSensePort,
{
    let mut decoder = LineDecoder::new();
    let mut dispatcher = ChannelDispatcher;
    let mut sink = LogEventSink::new();
    let mut read_buf = [0u8; READ_BUF_SIZE];

    loop {
        watchdog.feed();

        loop {
            let n = uart.read(&mut read_buf);
            if n == 0 {
                break;
            }
            // Collect lines first: the decoder borrow must end before the
            // engine (which may also log) runs.
            let mut lines: heapless::Vec<super::codec::Line, 4> = heapless::Vec::new();
            decoder.feed(&read_buf[..n], |line| {
                let mut owned = super::codec::Line::new();
                let _ = owned.push_str(line);
                if lines.push(owned).is_err() {
                    warn!("link: line burst overflow, dropping");
                }
            });
            for line in &lines {
                let reply = engine.handle_line(line, &hw, &mut dispatcher, &mut sink);
                if uart.write_line(&reply).is_err() {
                    warn!("link: reply write failed");
                }
            }
        }

        async_io_mini::Timer::after(Duration::from_millis(POLL_INTERVAL_MS)).await;
    }
}

/// Entry point for the command-loop task.  Sets up the executor and
/// drives the command loop via the `async-io-mini` reactor.  Never
/// returns — on the target the watchdog is the only way out.
pub fn run<S, H>(
    uart: LinkUart,
    engine: CommandEngine<S>,
    hw: Arc<Mutex<H>>,
    watchdog: Watchdog,
) -> !
where
    S: ConfigPort + 'static,
    H: MotorPort + CurrentSensePort + 'static,
{
    let executor: edge_executor::LocalExecutor<'_, 4> = edge_executor::LocalExecutor::new();

    executor
        .spawn(command_loop(uart, engine, hw, watchdog))
        .detach();

    info!("link I/O task started ({} ms poll)", POLL_INTERVAL_MS);

    futures_lite::future::block_on(executor.run(core::future::pending::<()>()));
    unreachable!("command loop terminated")
}
