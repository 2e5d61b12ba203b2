//! Application core — pure domain logic, zero I/O.
//!
//! This module contains the business rules for the CoopDoor motor node:
//! the wire command set, the structured events the core emits, and the
//! port traits behind which all hardware lives.  Everything here is fully
//! testable on the host without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
