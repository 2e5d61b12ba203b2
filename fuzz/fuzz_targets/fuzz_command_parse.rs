//! Fuzz target: `Command::parse`
//!
//! Any UTF-8 line must parse to *some* command without panicking — the
//! protocol promises a reply for every input.
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use coopdoor::app::commands::Command;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = core::str::from_utf8(data) {
        let _ = Command::parse(line.trim());
    }
});
