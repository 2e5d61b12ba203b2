//! Newline line decoder.
//!
//! Accumulates incoming bytes and yields complete, trimmed lines.  This
//! handles partial reads gracefully — a single UART read may return part
//! of a line, or a line plus the start of the next one.
//!
//! A line longer than the buffer is discarded up to its terminator and
//! surfaced as an empty line, so the engine still produces the `unknown`
//! reply the protocol promises for unparseable input instead of leaving
//! the partner to time out.

/// Maximum accepted line length (commands are short ASCII tokens).
pub const MAX_LINE_LEN: usize = 128;

/// A decoded command line, trimmed of whitespace and `\r`.
pub type Line = heapless::String<MAX_LINE_LEN>;

/// Streaming line decoder.
pub struct LineDecoder {
    buf: heapless::Vec<u8, MAX_LINE_LEN>,
    overflowed: bool,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            buf: heapless::Vec::new(),
            overflowed: false,
        }
    }

    /// Feed one byte.  Returns a complete line when `\n` arrives.
    pub fn feed_byte(&mut self, byte: u8) -> Option<Line> {
        if byte == b'\n' {
            let line = if self.overflowed {
                Line::new()
            } else {
                trimmed_line(&self.buf)
            };
            self.buf.clear();
            self.overflowed = false;
            return Some(line);
        }

        if self.buf.push(byte).is_err() {
            self.overflowed = true;
        }
        None
    }

    /// Feed a chunk, invoking `on_line` for every completed line.
    pub fn feed(&mut self, data: &[u8], mut on_line: impl FnMut(&str)) {
        for &byte in data {
            if let Some(line) = self.feed_byte(byte) {
                on_line(&line);
            }
        }
    }

    /// Drop any partially accumulated line (e.g. after a link reset).
    pub fn reset(&mut self) {
        self.buf.clear();
        self.overflowed = false;
    }
}

fn trimmed_line(buf: &[u8]) -> Line {
    let mut line = Line::new();
    if let Ok(text) = core::str::from_utf8(buf) {
        // Cannot overflow: trimming only shrinks the buffered bytes.
        let _ = line.push_str(text.trim());
    }
    line
}
