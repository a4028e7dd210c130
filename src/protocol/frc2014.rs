//! FRC 2014 protocol implementation
//!
//! The cRIO-era encoding, and the odd one out in the family: both
//! directions use fixed 1024-byte frames with a trailing CRC32, the
//! station is sent as ASCII alliance/position characters, and battery
//! voltage is reported as packed BCD digits ("12.34" arrives as
//! `0x12 0x34`). The e-stop is signalled inverted — a flag that is *set*
//! while operation is normal.
//!
//! The cRIO offered no user-code restart request; only a full reboot.

use super::frc2015::{station_alliance, station_position, ten_te_am};
use super::{Era, JoystickLimits, Protocol, Timing};
use crate::error::{Error, Result};
use crate::joystick::JoystickSet;
use crate::state::StationState;
use crate::transport::{SocketLayout, SocketSpec};
use crate::types::{Alliance, ControlMode, Position};

/// Full frame size in both directions
const FRAME_SIZE: usize = 1024;

/*
 * Control byte flags
 */
const MODE_TEST: u8 = 0x02;
const MODE_TELEOPERATED: u8 = 0x04;
const MODE_AUTONOMOUS: u8 = 0x10;
const FLAG_FMS_ATTACHED: u8 = 0x08;
const FLAG_ENABLED: u8 = 0x20;
/// Set while operation is NORMAL; its absence means emergency stop
const FLAG_ESTOP_OFF: u8 = 0x40;
const FLAG_REBOOT: u8 = 0x80;

/*
 * Robot ingress
 */
const STATUS_HAS_CODE: u8 = 0x20;

/*
 * ASCII station bytes
 */
const ALLIANCE_RED: u8 = b'R';
const ALLIANCE_BLUE: u8 = b'B';

/// CRC32 (IEEE) over a frame with its checksum field zeroed
fn crc32(data: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            let mask = (crc & 1).wrapping_neg();
            crc = (crc >> 1) ^ (0xEDB8_8320 & mask);
        }
    }
    !crc
}

/// Two packed BCD digits to their decimal value
fn bcd(byte: u8) -> f64 {
    f64::from(byte >> 4) * 10.0 + f64::from(byte & 0x0F)
}

pub struct Frc2014 {
    sent_fms_packets: u32,
    sent_robot_packets: u32,
    reboot: bool,
}

impl Default for Frc2014 {
    fn default() -> Self {
        Self::new()
    }
}

impl Frc2014 {
    pub fn new() -> Self {
        Self {
            sent_fms_packets: 0,
            sent_robot_packets: 0,
            reboot: false,
        }
    }

    fn control_code(&self, state: &StationState) -> u8 {
        let mut code = match state.control_mode() {
            ControlMode::Teleoperated => MODE_TELEOPERATED,
            ControlMode::Autonomous => MODE_AUTONOMOUS,
            ControlMode::Test => MODE_TEST,
        };

        if !state.emergency_stopped() {
            code |= FLAG_ESTOP_OFF;
        }
        if state.fms_comms() {
            code |= FLAG_FMS_ATTACHED;
        }
        if state.enabled() {
            code |= FLAG_ENABLED;
        }
        if self.reboot && state.robot_comms() {
            code |= FLAG_REBOOT;
        }

        code
    }

    fn alliance_byte(alliance: Alliance) -> u8 {
        match alliance {
            Alliance::Red => ALLIANCE_RED,
            Alliance::Blue => ALLIANCE_BLUE,
        }
    }

    fn position_byte(position: Position) -> u8 {
        match position {
            Position::P1 => b'1',
            Position::P2 => b'2',
            Position::P3 => b'3',
        }
    }
}

impl Protocol for Frc2014 {
    fn era(&self) -> Era {
        Era::Frc2014
    }

    fn fms_address(&self, _state: &StationState) -> String {
        String::new()
    }

    fn radio_address(&self, state: &StationState) -> String {
        ten_te_am(state.team_number(), 1)
    }

    fn robot_address(&self, state: &StationState) -> String {
        ten_te_am(state.team_number(), 2)
    }

    fn create_fms_packet(&mut self, state: &StationState) -> Vec<u8> {
        // Same 8-byte frame as the later eras, with this era's control byte
        let mut data = vec![0u8; 8];

        data[0..2].copy_from_slice(&(self.sent_fms_packets as u16).to_be_bytes());
        data[3] = self.control_code(state);
        data[4..6].copy_from_slice(&state.team_number().to_be_bytes());

        let voltage = state.robot_voltage();
        data[6] = voltage.trunc() as u8;
        data[7] = ((voltage.fract()) * 100.0).round() as u8;

        self.sent_fms_packets = self.sent_fms_packets.wrapping_add(1);
        data
    }

    fn create_radio_packet(&mut self, _state: &StationState) -> Vec<u8> {
        Vec::new()
    }

    fn create_robot_packet(&mut self, state: &StationState, joysticks: &JoystickSet) -> Vec<u8> {
        let mut data = vec![0u8; FRAME_SIZE];

        data[0..2].copy_from_slice(&(self.sent_robot_packets as u16).to_be_bytes());
        data[2] = self.control_code(state);
        data[3] = 0x00; // digital inputs, unused by this client
        data[4..6].copy_from_slice(&state.team_number().to_be_bytes());
        data[6] = Self::alliance_byte(state.alliance());
        data[7] = Self::position_byte(state.position());

        // Four joystick slots of 6 axes + 16 button flags each, packed
        // back to back; unplugged slots stay neutral
        let limits = self.joystick_limits();
        let sticks = joysticks.snapshot();
        let mut pos = 8;
        for slot in 0..limits.max_joysticks {
            let stick = sticks.get(slot);

            for axis in 0..limits.max_axes {
                let value = stick
                    .and_then(|s| s.axes.get(axis).copied())
                    .unwrap_or(0.0);
                data[pos] = (value * 127.0) as i8 as u8;
                pos += 1;
            }

            let mut flags: u16 = 0;
            if let Some(stick) = stick {
                for (bit, &pressed) in stick.buttons.iter().take(limits.max_buttons).enumerate() {
                    if pressed {
                        flags |= 1 << bit;
                    }
                }
            }
            data[pos..pos + 2].copy_from_slice(&flags.to_be_bytes());
            pos += 2;
        }

        let crc = crc32(&data);
        data[FRAME_SIZE - 4..].copy_from_slice(&crc.to_be_bytes());

        self.sent_robot_packets = self.sent_robot_packets.wrapping_add(1);
        data
    }

    fn read_fms_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()> {
        if data.len() < 8 {
            return Err(Error::InvalidPacket(format!(
                "FMS packet too short ({} bytes)",
                data.len()
            )));
        }

        let control = data[3];
        let station = data[5];

        state.set_control_mode(if control & MODE_AUTONOMOUS != 0 {
            ControlMode::Autonomous
        } else if control & MODE_TEST != 0 {
            ControlMode::Test
        } else {
            ControlMode::Teleoperated
        });
        state.set_enabled(control & FLAG_ENABLED != 0);
        state.set_alliance(station_alliance(station));
        state.set_position(station_position(station));

        Ok(())
    }

    fn read_radio_packet(&mut self, _state: &StationState, _data: &[u8]) -> Result<()> {
        Err(Error::InvalidPacket(
            "radio packets carry no application data in 2014".to_string(),
        ))
    }

    fn read_robot_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()> {
        if data.len() < 8 {
            return Err(Error::InvalidPacket(format!(
                "robot packet too short ({} bytes)",
                data.len()
            )));
        }

        let control = data[0];
        let status = data[3];

        state.set_robot_code(status & STATUS_HAS_CODE != 0);

        // Normal-operation flag absent = the cRIO is e-stopped
        if control & FLAG_ESTOP_OFF == 0 {
            state.engage_emergency_stop();
        }

        state.set_robot_voltage(bcd(data[1]) + bcd(data[2]) / 100.0);

        Ok(())
    }

    fn reset_fms(&mut self, _state: &StationState) {}

    fn reset_radio(&mut self, _state: &StationState) {}

    fn reset_robot(&mut self, _state: &StationState) {
        self.reboot = false;
    }

    fn reboot_robot(&mut self) {
        self.reboot = true;
    }

    /// The cRIO has no user-code restart request; a full reboot is the
    /// only recourse, so this warns and leaves the wire untouched
    fn restart_robot_code(&mut self) {
        log::warn!("Robot code restart is not part of the 2014 protocol");
    }

    fn timing(&self) -> Timing {
        Timing {
            fms_interval_ms: 500,
            radio_interval_ms: 0,
            robot_interval_ms: 20,
        }
    }

    fn joystick_limits(&self) -> JoystickLimits {
        JoystickLimits {
            max_joysticks: 4,
            max_axes: 6,
            max_buttons: 10,
            max_hats: 0,
        }
    }

    fn sockets(&self) -> SocketLayout {
        SocketLayout {
            fms: SocketSpec::udp(1120, 1160),
            radio: SocketSpec::disabled(),
            robot: SocketSpec::udp(1150, 1110),
            netconsole: SocketSpec::udp(6666, 6668),
        }
    }
}
