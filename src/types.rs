//! Shared plain-data types for station state and peer links.

use std::fmt;

/// Match alliance color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alliance {
    Red,
    Blue,
}

/// Team position within the alliance (stations 1-3)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    P1,
    P2,
    P3,
}

/// Robot control mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Teleoperated,
    Autonomous,
    Test,
}

/// The three remote peers a Driver Station talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peer {
    Fms,
    Radio,
    Robot,
}

impl fmt::Display for Alliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alliance::Red => write!(f, "Red"),
            Alliance::Blue => write!(f, "Blue"),
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::P1 => write!(f, "1"),
            Position::P2 => write!(f, "2"),
            Position::P3 => write!(f, "3"),
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMode::Teleoperated => write!(f, "Teleoperated"),
            ControlMode::Autonomous => write!(f, "Autonomous"),
            ControlMode::Test => write!(f, "Test"),
        }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Peer::Fms => write!(f, "FMS"),
            Peer::Radio => write!(f, "radio"),
            Peer::Robot => write!(f, "robot"),
        }
    }
}
