//! fieldlink - Driver Station protocol kernel for FRC-style robot control
//!
//! This library implements the client side of the field-robotics control
//! protocol family: periodic UDP links to the Field Management System, the
//! radio bridge, and the robot controller, each with its own watchdog, in
//! front of a thread-safe station state with typed change events.
//!
//! The graphical shell, the OS joystick capture, and the log viewer are
//! hosts built on top of this crate; see [`DriverStation`] for the surface
//! they consume.

mod comms;

pub mod config;
pub mod error;
pub mod events;
pub mod joystick;
pub mod protocol;
pub mod state;
pub mod station;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use events::{Event, Topic};
pub use protocol::Era;
pub use station::DriverStation;
pub use types::{Alliance, ControlMode, Peer, Position};
