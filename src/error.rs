//! Error types for fieldlink
//!
//! # Error Recovery Strategies
//!
//! The kernel is expected to run for the length of a match without restart,
//! so nothing here aborts the process:
//!
//! - **`Io`**: socket bind or send/receive failure. Bind errors leave the
//!   affected peer link offline (an advisory is published on the message
//!   topic); send errors are logged and the loop continues. Link status is
//!   owned by the watchdogs, never by transport errors.
//!
//! - **`InvalidPacket`**: a malformed inbound datagram. The packet is
//!   dropped without feeding the watchdog or touching the station state.
//!
//! - **`AddressLookup`**: the peer hostname did not resolve (common while
//!   the robot's mDNS name is still propagating). The send is skipped and
//!   resolution is retried on the next cycle.
//!
//! - **`Config`**: the configuration file is invalid. Fix and restart.

use thiserror::Error;

/// Errors that can occur in fieldlink
///
/// See module-level documentation for recovery strategies.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid packet: {0}")]
    InvalidPacket(String),

    #[error("Address lookup failed: {0}")]
    AddressLookup(String),
}

pub type Result<T> = std::result::Result<T, Error>;
