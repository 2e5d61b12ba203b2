//! Serial command link to the network node.
//!
//! Half-duplex, newline-delimited ASCII: one command per line in, one
//! reply per line out, within a bounded window (the partner applies a
//! ~1 s read deadline and retries the whole exchange up to 3 times).
//!
//! | Module     | Role                                              |
//! |------------|---------------------------------------------------|
//! | [`codec`]  | byte stream → trimmed command lines               |
//! | [`engine`] | command dispatch → reply (transport-decoupled)    |
//! | [`io_task`]| 50 ms UART poll loop, watchdog feed, reply write  |
//! | [`uart`]   | UART transport (esp driver / host loopback)       |
//! | [`client`] | sender half — used by the partner-facing tooling  |

pub mod client;
pub mod codec;
pub mod engine;
pub mod io_task;
pub mod uart;
