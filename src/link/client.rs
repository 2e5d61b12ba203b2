//! Sender half of the command protocol.
//!
//! The network node drives the door through this exchange: write
//! `<cmd>\n`, then read one reply line within a bounded deadline.  An
//! empty or undecodable reply retries the *whole* exchange — as an
//! explicit bounded loop, never recursion — up to [`MAX_ATTEMPTS`]
//! times before surfacing an error.
//!
//! Lives in this crate so the protocol's two halves share one codec and
//! one set of timing constants, and so integration tests can exercise a
//! full client↔engine round trip.

use log::warn;

use crate::app::ports::TimePort;
use crate::error::LinkError;

use super::codec::{Line, LineDecoder};
use super::uart::LinkTransport;

/// Reply deadline per attempt.
pub const REPLY_DEADLINE_MS: u64 = 1_000;

/// Whole-exchange attempts before giving up.
pub const MAX_ATTEMPTS: u32 = 3;

/// Grace after the write before polling for the reply (lets the
/// half-duplex partner turn the line around).
pub const POST_WRITE_DELAY_MS: u32 = 200;

/// Poll interval while waiting for reply bytes.
pub const READ_POLL_MS: u32 = 50;

/// Command client over any [`LinkTransport`].
pub struct LinkClient<T: LinkTransport, C: TimePort> {
    transport: T,
    clock: C,
}

impl<T: LinkTransport, C: TimePort> LinkClient<T, C> {
    pub fn new(transport: T, clock: C) -> Self {
        Self { transport, clock }
    }

    /// Send `cmd` and return the reply line.
    ///
    /// Retries the full write-then-read exchange on timeout or garbage,
    /// bounded at [`MAX_ATTEMPTS`].
    pub fn exchange(&mut self, cmd: &str) -> Result<Line, LinkError> {
        for attempt in 1..=MAX_ATTEMPTS {
            match self.try_exchange(cmd) {
                Some(reply) => return Ok(reply),
                None => {
                    warn!("link client: '{cmd}' attempt {attempt}/{MAX_ATTEMPTS} got no reply");
                }
            }
        }
        Err(LinkError::RetriesExhausted)
    }

    /// One write-then-read attempt.  `None` on write failure, deadline
    /// expiry, or an empty/garbage reply line.
    fn try_exchange(&mut self, cmd: &str) -> Option<Line> {
        if self.transport.write(cmd.as_bytes()).is_err()
            || self.transport.write(b"\n").is_err()
        {
            return None;
        }
        self.clock.sleep_ms(POST_WRITE_DELAY_MS);

        let deadline = self.clock.now_ms().saturating_add(REPLY_DEADLINE_MS);
        let mut decoder = LineDecoder::new();
        let mut buf = [0u8; 128];

        while self.clock.now_ms() < deadline {
            let n = self.transport.read(&mut buf);
            if n == 0 {
                self.clock.sleep_ms(READ_POLL_MS);
                continue;
            }
            for &byte in &buf[..n] {
                if let Some(line) = decoder.feed_byte(byte) {
                    if line.is_empty() {
                        // Garbage reply: abandon this attempt.
                        return None;
                    }
                    return Some(line);
                }
            }
        }
        None
    }
}
