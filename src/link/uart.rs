//! Link UART transport.
//!
//! Thin byte-stream wrapper over the ESP-IDF UART driver installed by
//! `hw_init`.  Reads are non-blocking (the I/O task owns the cadence);
//! writes push the whole reply into the driver's TX ring.
//!
//! On host targets the same type is backed by a pair of in-memory
//! buffers with injection hooks, so the full poll-decode-dispatch-reply
//! path runs in integration tests.

use crate::error::LinkError;

/// Byte-stream transport for the half-duplex command link.
///
/// Implemented by [`LinkUart`] in production and by in-memory doubles in
/// tests; the [`client`](super::client) is generic over it as well.
pub trait LinkTransport {
    /// Non-blocking read; returns the number of bytes placed in `buf`
    /// (0 when nothing is pending).
    fn read(&mut self, buf: &mut [u8]) -> usize;

    /// Queue `data` for transmission.
    fn write(&mut self, data: &[u8]) -> Result<(), LinkError>;
}

pub struct LinkUart {
    _private: (),
}

impl Default for LinkUart {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkUart {
    /// Requires `hw_init::init_peripherals()` to have installed the driver.
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Write `text` followed by the protocol's line terminator.
    pub fn write_line(&mut self, text: &str) -> Result<(), LinkError> {
        self.write(text.as_bytes())?;
        self.write(b"\n")
    }
}

#[cfg(target_os = "espidf")]
impl LinkTransport for LinkUart {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        use crate::drivers::hw_init::LINK_UART_PORT;
        // SAFETY: driver installed once in hw_init before the I/O task
        // spawns; timeout 0 makes this a non-blocking FIFO drain.
        let n = unsafe {
            esp_idf_svc::sys::uart_read_bytes(
                LINK_UART_PORT,
                buf.as_mut_ptr().cast(),
                buf.len() as u32,
                0,
            )
        };
        if n > 0 { n as usize } else { 0 }
    }

    fn write(&mut self, data: &[u8]) -> Result<(), LinkError> {
        use crate::drivers::hw_init::LINK_UART_PORT;
        // SAFETY: same driver handle as read; uart_write_bytes copies the
        // buffer into the TX ring before returning.
        let n = unsafe {
            esp_idf_svc::sys::uart_write_bytes(
                LINK_UART_PORT,
                data.as_ptr().cast(),
                data.len(),
            )
        };
        if n == data.len() as i32 {
            Ok(())
        } else {
            Err(LinkError::WriteFailed)
        }
    }
}

// ── Host simulation backend ──────────────────────────────────

#[cfg(not(target_os = "espidf"))]
mod sim {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    pub static RX: Mutex<VecDeque<u8>> = Mutex::new(VecDeque::new());
    pub static TX: Mutex<Vec<u8>> = Mutex::new(Vec::new());
}

/// Inject inbound bytes (as if sent by the network node).
#[cfg(not(target_os = "espidf"))]
pub fn sim_push_rx(data: &[u8]) {
    sim::RX.lock().expect("sim RX poisoned").extend(data);
}

/// Drain everything the firmware has transmitted so far.
#[cfg(not(target_os = "espidf"))]
pub fn sim_take_tx() -> Vec<u8> {
    core::mem::take(&mut *sim::TX.lock().expect("sim TX poisoned"))
}

#[cfg(not(target_os = "espidf"))]
impl LinkTransport for LinkUart {
    fn read(&mut self, buf: &mut [u8]) -> usize {
        let mut rx = sim::RX.lock().expect("sim RX poisoned");
        let mut n = 0;
        while n < buf.len() {
            match rx.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        n
    }

    fn write(&mut self, data: &[u8]) -> Result<(), LinkError> {
        sim::TX
            .lock()
            .expect("sim TX poisoned")
            .extend_from_slice(data);
        Ok(())
    }
}
