//! Protocol descriptors — the pluggable per-era encoding contract
//!
//! A [`Protocol`] value describes everything era-specific about talking to
//! the field: peer addresses derived from the team number, packet
//! construction and parsing for each peer, watchdog reset hooks, send
//! cadences, joystick capability limits, and the four UDP socket specs.
//!
//! Packet counters and the one-shot action latches (reboot, restart code,
//! send time data) live on the descriptor instance, never in process
//! globals: installing a new descriptor starts from a clean slate.

use crate::error::Result;
use crate::joystick::JoystickSet;
use crate::state::StationState;
use crate::transport::SocketLayout;
use crate::types::Peer;
use std::fmt;
use std::str::FromStr;

mod frc2014;
mod frc2015;
mod frc2016;
mod frc2020;

pub use frc2014::Frc2014;
pub use frc2015::Frc2015;
pub use frc2016::Frc2016;
pub use frc2020::Frc2020;

/// Send cadences in milliseconds; 0 disables the peer's task entirely
#[derive(Debug, Clone, Copy)]
pub struct Timing {
    pub fms_interval_ms: u64,
    pub radio_interval_ms: u64,
    pub robot_interval_ms: u64,
}

impl Timing {
    pub fn interval_ms(&self, peer: Peer) -> u64 {
        match peer {
            Peer::Fms => self.fms_interval_ms,
            Peer::Radio => self.radio_interval_ms,
            Peer::Robot => self.robot_interval_ms,
        }
    }
}

/// How much joystick geometry an era can put on the wire
#[derive(Debug, Clone, Copy)]
pub struct JoystickLimits {
    pub max_joysticks: usize,
    pub max_axes: usize,
    pub max_buttons: usize,
    pub max_hats: usize,
}

/// One era of the Driver Station protocol family
///
/// Constructors return owned byte buffers; parsers return `Err` for any
/// datagram that should be dropped without feeding the peer's watchdog.
/// All methods that read station state take it explicitly — the descriptor
/// holds no reference to the store.
pub trait Protocol: Send {
    fn era(&self) -> Era;

    // Addresses (empty string = unknown, learned from ingress)
    fn fms_address(&self, state: &StationState) -> String;
    fn radio_address(&self, state: &StationState) -> String;
    fn robot_address(&self, state: &StationState) -> String;

    // Packet constructors
    fn create_fms_packet(&mut self, state: &StationState) -> Vec<u8>;
    fn create_radio_packet(&mut self, state: &StationState) -> Vec<u8>;
    fn create_robot_packet(&mut self, state: &StationState, joysticks: &JoystickSet) -> Vec<u8>;

    // Packet parsers
    fn read_fms_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()>;
    fn read_radio_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()>;
    fn read_robot_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()>;

    // Watchdog reset hooks
    fn reset_fms(&mut self, state: &StationState);
    fn reset_radio(&mut self, state: &StationState);
    fn reset_robot(&mut self, state: &StationState);

    // Action latches, consumed by subsequent robot packets
    fn reboot_robot(&mut self);
    fn restart_robot_code(&mut self);

    fn timing(&self) -> Timing;
    fn joystick_limits(&self) -> JoystickLimits;
    fn sockets(&self) -> SocketLayout;

    // === Peer-generic dispatch used by the scheduler ===

    fn address(&self, peer: Peer, state: &StationState) -> String {
        match peer {
            Peer::Fms => self.fms_address(state),
            Peer::Radio => self.radio_address(state),
            Peer::Robot => self.robot_address(state),
        }
    }

    fn create_packet(
        &mut self,
        peer: Peer,
        state: &StationState,
        joysticks: &JoystickSet,
    ) -> Vec<u8> {
        match peer {
            Peer::Fms => self.create_fms_packet(state),
            Peer::Radio => self.create_radio_packet(state),
            Peer::Robot => self.create_robot_packet(state, joysticks),
        }
    }

    fn read_packet(&mut self, peer: Peer, state: &StationState, data: &[u8]) -> Result<()> {
        match peer {
            Peer::Fms => self.read_fms_packet(state, data),
            Peer::Radio => self.read_radio_packet(state, data),
            Peer::Robot => self.read_robot_packet(state, data),
        }
    }

    fn reset(&mut self, peer: Peer, state: &StationState) {
        match peer {
            Peer::Fms => self.reset_fms(state),
            Peer::Radio => self.reset_radio(state),
            Peer::Robot => self.reset_robot(state),
        }
    }
}

/// Supported protocol eras
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Era {
    Frc2014,
    Frc2015,
    Frc2016,
    Frc2020,
}

impl Era {
    /// Build a fresh descriptor for this era (counters and latches cleared)
    pub fn descriptor(self) -> Box<dyn Protocol> {
        match self {
            Era::Frc2014 => Box::new(Frc2014::new()),
            Era::Frc2015 => Box::new(Frc2015::new()),
            Era::Frc2016 => Box::new(Frc2016::new()),
            Era::Frc2020 => Box::new(Frc2020::new()),
        }
    }
}

impl FromStr for Era {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "2014" => Ok(Era::Frc2014),
            "2015" => Ok(Era::Frc2015),
            "2016" => Ok(Era::Frc2016),
            "2020" => Ok(Era::Frc2020),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Era::Frc2014 => write!(f, "FRC 2014"),
            Era::Frc2015 => write!(f, "FRC 2015"),
            Era::Frc2016 => write!(f, "FRC 2016"),
            Era::Frc2020 => write!(f, "FRC 2020"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_era_parse() {
        assert_eq!("2015".parse::<Era>().unwrap(), Era::Frc2015);
        assert_eq!("2020".parse::<Era>().unwrap(), Era::Frc2020);
        assert!("2017".parse::<Era>().is_err());
    }

    #[test]
    fn test_descriptor_factory() {
        for era in [Era::Frc2014, Era::Frc2015, Era::Frc2016, Era::Frc2020] {
            assert_eq!(era.descriptor().era(), era);
        }
    }
}
