//! FRC 2015 protocol implementation
//!
//! The roboRIO-era encoding. All multi-byte fields are big-endian; packets
//! are bare UDP payloads with no framing beyond the datagram.
//!
//! Outgoing FMS packet (8 bytes):
//!
//! ```text
//! [counter u16] [DS version] [control] [team u16] [voltage int] [voltage frac]
//! ```
//!
//! Outgoing robot packet (6 bytes + payload):
//!
//! ```text
//! [counter u16] [0x01] [control] [request] [station] [payload...]
//! ```
//!
//! where the payload is the date/timezone block when the robot has asked
//! for the time, joystick blocks once the link is established (after the
//! first five packets), and empty otherwise.
//!
//! The voltage codec is asymmetric on purpose: the encoder stores the
//! fractional part as two decimal digits (×100) while the decoder divides
//! by 255. Robot-side firmware implements the same pair, so this is part
//! of the wire contract and must not be normalized.

use super::{Era, JoystickLimits, Protocol, Timing};
use crate::error::{Error, Result};
use crate::joystick::{Joystick, JoystickSet};
use crate::state::StationState;
use crate::transport::{SocketLayout, SocketSpec};
use crate::types::{Alliance, ControlMode, Position};
use chrono::{Datelike, Local, Timelike};

/*
 * Control byte flags
 */
const MODE_TEST: u8 = 0x01;
const MODE_AUTONOMOUS: u8 = 0x02;
const FLAG_ENABLED: u8 = 0x04;
const FLAG_FMS_ATTACHED: u8 = 0x08;
const FLAG_EMERGENCY_STOP: u8 = 0x80;

/*
 * Extra flags carried in the FMS-bound control byte
 */
const FMS_RADIO_PING: u8 = 0x10;
const FMS_ROBOT_PING: u8 = 0x08;
const FMS_ROBOT_COMMS: u8 = 0x20;
const FMS_DS_VERSION: u8 = 0x00;

/*
 * Request byte values (robot-bound)
 */
const REQUEST_NORMAL: u8 = 0x80;
const REQUEST_REBOOT: u8 = 0x08;
const REQUEST_RESTART_CODE: u8 = 0x04;
const REQUEST_UNCONNECTED: u8 = 0x00;

/*
 * Robot ingress
 */
const REQUEST_TIME: u8 = 0x01;
const STATUS_HAS_CODE: u8 = 0x20;
const RTAG_DISK: u8 = 0x04;
const RTAG_CPU: u8 = 0x05;
const RTAG_RAM: u8 = 0x06;
const RTAG_CAN: u8 = 0x0E;

/*
 * Section tags
 */
const TAG_GENERAL: u8 = 0x01;
const TAG_JOYSTICK: u8 = 0x0C;
const TAG_DATE: u8 = 0x0F;
const TAG_TIMEZONE: u8 = 0x10;

/*
 * Station bytes (alliance x position)
 */
const STATION_RED_1: u8 = 0x00;
const STATION_RED_2: u8 = 0x01;
const STATION_RED_3: u8 = 0x02;
const STATION_BLUE_1: u8 = 0x03;
const STATION_BLUE_2: u8 = 0x04;
const STATION_BLUE_3: u8 = 0x05;

/// Decode the battery voltage from its integer/fraction bytes
pub(super) fn decode_voltage(upper: u8, lower: u8) -> f64 {
    f64::from(upper) + f64::from(lower) / 255.0
}

/// Encode the battery voltage into integer/fraction bytes
pub(super) fn encode_voltage(voltage: f64) -> (u8, u8) {
    let clamped = voltage.clamp(0.0, 255.0);
    let upper = clamped.trunc();
    let lower = ((clamped - upper) * 100.0).round();
    (upper as u8, lower as u8)
}

/// Pack alliance and position into the station byte
pub(super) fn station_code(alliance: Alliance, position: Position) -> u8 {
    match (alliance, position) {
        (Alliance::Red, Position::P1) => STATION_RED_1,
        (Alliance::Red, Position::P2) => STATION_RED_2,
        (Alliance::Red, Position::P3) => STATION_RED_3,
        (Alliance::Blue, Position::P1) => STATION_BLUE_1,
        (Alliance::Blue, Position::P2) => STATION_BLUE_2,
        (Alliance::Blue, Position::P3) => STATION_BLUE_3,
    }
}

/// Alliance half of a received station byte (red on anything unknown)
pub(super) fn station_alliance(byte: u8) -> Alliance {
    match byte {
        STATION_BLUE_1 | STATION_BLUE_2 | STATION_BLUE_3 => Alliance::Blue,
        _ => Alliance::Red,
    }
}

/// Position half of a received station byte (1 on anything unknown)
pub(super) fn station_position(byte: u8) -> Position {
    match byte {
        STATION_RED_2 | STATION_BLUE_2 => Position::P2,
        STATION_RED_3 | STATION_BLUE_3 => Position::P3,
        _ => Position::P1,
    }
}

/// `10.TE.AM.host` address for the given team number
pub(super) fn ten_te_am(team: u16, host: u8) -> String {
    format!("10.{}.{}.{}", team / 100, team % 100, host)
}

/// Mode bits shared by the robot- and FMS-bound control bytes
fn mode_bits(mode: ControlMode) -> u8 {
    match mode {
        ControlMode::Teleoperated => 0x00,
        ControlMode::Autonomous => MODE_AUTONOMOUS,
        ControlMode::Test => MODE_TEST,
    }
}

/// Control mode from a received control byte; the teleoperated bit pattern
/// is zero, so it is the default when no other mode bit is present
fn mode_from_bits(control: u8) -> ControlMode {
    if control & MODE_AUTONOMOUS != 0 {
        ControlMode::Autonomous
    } else if control & MODE_TEST != 0 {
        ControlMode::Test
    } else {
        ControlMode::Teleoperated
    }
}

/// The 2015 protocol descriptor
///
/// Packet counters and action latches live here; a fresh instance (as
/// built on every install) starts them all cleared.
pub struct Frc2015 {
    sent_fms_packets: u32,
    sent_robot_packets: u32,
    send_time_data: bool,
    reboot: bool,
    restart_code: bool,
}

impl Default for Frc2015 {
    fn default() -> Self {
        Self::new()
    }
}

impl Frc2015 {
    pub fn new() -> Self {
        Self {
            sent_fms_packets: 0,
            sent_robot_packets: 0,
            send_time_data: false,
            reboot: false,
            restart_code: false,
        }
    }

    /// Control byte sent to the robot: mode, enabled, FMS attached, e-stop
    fn control_code(state: &StationState) -> u8 {
        let mut code = mode_bits(state.control_mode());

        if state.fms_comms() {
            code |= FLAG_FMS_ATTACHED;
        }
        if state.emergency_stopped() {
            code |= FLAG_EMERGENCY_STOP;
        }
        if state.enabled() {
            code |= FLAG_ENABLED;
        }

        code
    }

    /// Control byte sent to the FMS: like the robot's, plus radio/robot
    /// link flags instead of the FMS-attached bit
    fn fms_control_code(state: &StationState) -> u8 {
        let mut code = mode_bits(state.control_mode());

        if state.emergency_stopped() {
            code |= FLAG_EMERGENCY_STOP;
        }
        if state.enabled() {
            code |= FLAG_ENABLED;
        }
        if state.radio_comms() {
            code |= FMS_RADIO_PING;
        }
        if state.robot_comms() {
            code |= FMS_ROBOT_COMMS | FMS_ROBOT_PING;
        }

        code
    }

    /// Request byte: normal operation, or reboot / code-restart while the
    /// latch is set; the unconnected value signals a resync
    fn request_code(&self, state: &StationState) -> u8 {
        if state.robot_comms() {
            if self.reboot {
                REQUEST_REBOOT
            } else if self.restart_code {
                REQUEST_RESTART_CODE
            } else {
                REQUEST_NORMAL
            }
        } else {
            REQUEST_UNCONNECTED
        }
    }

    /// Append the date/time and timezone blocks the robot asked for
    fn append_time_data(data: &mut Vec<u8>) {
        let now = Local::now();
        let tz = now.format("%Z").to_string();
        let tz_bytes = tz.as_bytes();

        data.reserve(12 + tz_bytes.len());
        data.push(0x0B);
        data.push(TAG_DATE);
        data.push(0x00);
        data.push(0x00);
        data.push(now.second() as u8);
        data.push(now.minute() as u8);
        data.push(now.hour() as u8);
        data.push(now.ordinal0() as u8);
        data.push(now.month0() as u8);
        data.push((now.year() - 1900) as u8);
        data.push(tz_bytes.len() as u8);
        data.push(TAG_TIMEZONE);
        data.extend_from_slice(tz_bytes);
    }

    /// Append one joystick block per attached stick, in enumeration order,
    /// truncated to the era's capability limits
    fn append_joystick_data(data: &mut Vec<u8>, sticks: &[Joystick], limits: JoystickLimits) {
        for stick in sticks.iter().take(limits.max_joysticks) {
            let axes = &stick.axes[..stick.axes.len().min(limits.max_axes)];
            let buttons = &stick.buttons[..stick.buttons.len().min(limits.max_buttons)];
            let hats = &stick.hats[..stick.hats.len().min(limits.max_hats)];

            // Block size, counting the size byte itself
            data.push((6 + axes.len() + 2 * hats.len()) as u8);
            data.push(TAG_JOYSTICK);

            for &axis in axes {
                data.push((axis * 127.0) as i8 as u8);
            }

            let mut flags: u16 = 0;
            for (bit, &pressed) in buttons.iter().enumerate() {
                if pressed {
                    flags |= 1 << bit;
                }
            }
            data.push(buttons.len() as u8);
            data.extend_from_slice(&flags.to_be_bytes());

            data.push(hats.len() as u8);
            for &hat in hats {
                data.extend_from_slice(&hat.to_be_bytes());
            }
        }
    }

    /// CPU/RAM/disk/CAN telemetry from the extended section of a robot
    /// packet; unknown tags and truncated sections are ignored
    fn read_extended(state: &StationState, data: &[u8], offset: usize) {
        let Some(&tag) = data.get(offset + 1) else {
            return;
        };

        let update = |index: usize, apply: &dyn Fn(u8)| match data.get(index) {
            Some(&value) => apply(value),
            None => log::debug!("Truncated extended section (tag 0x{:02X})", tag),
        };

        match tag {
            RTAG_CPU => update(offset + 3, &|v| state.set_cpu_usage(v)),
            RTAG_RAM => update(offset + 4, &|v| state.set_ram_usage(v)),
            RTAG_DISK => update(offset + 4, &|v| state.set_disk_usage(v)),
            RTAG_CAN => update(offset + 10, &|v| state.set_can_utilization(v)),
            _ => log::trace!("Ignoring unknown extended tag 0x{:02X}", tag),
        }
    }
}

impl Protocol for Frc2015 {
    fn era(&self) -> Era {
        Era::Frc2015
    }

    /// Unknown until the first FMS datagram arrives; the transport learns
    /// the address from the packet source
    fn fms_address(&self, _state: &StationState) -> String {
        String::new()
    }

    fn radio_address(&self, state: &StationState) -> String {
        ten_te_am(state.team_number(), 1)
    }

    fn robot_address(&self, state: &StationState) -> String {
        format!("roboRIO-{}.local", state.team_number())
    }

    fn create_fms_packet(&mut self, state: &StationState) -> Vec<u8> {
        let mut data = vec![0u8; 8];
        let (upper, lower) = encode_voltage(state.robot_voltage());

        data[0..2].copy_from_slice(&(self.sent_fms_packets as u16).to_be_bytes());
        data[2] = FMS_DS_VERSION;
        data[3] = Self::fms_control_code(state);
        data[4..6].copy_from_slice(&state.team_number().to_be_bytes());
        data[6] = upper;
        data[7] = lower;

        self.sent_fms_packets = self.sent_fms_packets.wrapping_add(1);
        data
    }

    /// The 2015 protocol has nothing to say to the radio
    fn create_radio_packet(&mut self, _state: &StationState) -> Vec<u8> {
        Vec::new()
    }

    fn create_robot_packet(&mut self, state: &StationState, joysticks: &JoystickSet) -> Vec<u8> {
        let mut data = Vec::with_capacity(8);

        data.extend_from_slice(&(self.sent_robot_packets as u16).to_be_bytes());
        data.push(TAG_GENERAL);
        data.push(Self::control_code(state));
        data.push(self.request_code(state));
        data.push(station_code(state.alliance(), state.position()));

        if self.send_time_data {
            Self::append_time_data(&mut data);
        } else if self.sent_robot_packets > 5 {
            Self::append_joystick_data(&mut data, &joysticks.snapshot(), self.joystick_limits());
        }

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

        state.set_control_mode(mode_from_bits(control));
        state.set_enabled(control & FLAG_ENABLED != 0);
        state.set_alliance(station_alliance(station));
        state.set_position(station_position(station));

        Ok(())
    }

    /// The DS does not interact with the radio at the application layer
    fn read_radio_packet(&mut self, _state: &StationState, _data: &[u8]) -> Result<()> {
        Err(Error::InvalidPacket(
            "radio packets carry no application data in 2015".to_string(),
        ))
    }

    fn read_robot_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()> {
        if data.len() < 8 {
            return Err(Error::InvalidPacket(format!(
                "robot packet too short ({} bytes)",
                data.len()
            )));
        }

        let control = data[3];
        let status = data[4];
        let request = data[7];

        state.set_robot_code(status & STATUS_HAS_CODE != 0);

        // The e-stop is sticky; ingress can only engage it
        if control & FLAG_EMERGENCY_STOP != 0 {
            state.engage_emergency_stop();
        }

        self.send_time_data = request == REQUEST_TIME;

        state.set_robot_voltage(decode_voltage(data[5], data[6]));

        if data.len() > 9 {
            Self::read_extended(state, data, 8);
        }

        Ok(())
    }

    fn reset_fms(&mut self, _state: &StationState) {}

    fn reset_radio(&mut self, _state: &StationState) {}

    /// Robot link lost: pending one-shot requests no longer apply
    fn reset_robot(&mut self, _state: &StationState) {
        self.reboot = false;
        self.restart_code = false;
        self.send_time_data = false;
    }

    fn reboot_robot(&mut self) {
        self.reboot = true;
    }

    fn restart_robot_code(&mut self) {
        self.restart_code = true;
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
            max_joysticks: 6,
            max_axes: 6,
            max_buttons: 10,
            max_hats: 1,
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Peer;
    use std::sync::Arc;

    fn state() -> Arc<StationState> {
        StationState::shared()
    }

    fn joysticks(state: &Arc<StationState>) -> JoystickSet {
        JoystickSet::new(Arc::clone(state))
    }

    /// Robot link up and user code present, so the enable gate passes
    fn connected(state: &StationState) {
        state.set_peer_comms(Peer::Robot, true);
        state.set_robot_code(true);
    }

    #[test]
    fn test_voltage_encode_literals() {
        assert_eq!(encode_voltage(12.34), (0x0C, 0x22));
        assert_eq!(encode_voltage(0.0), (0x00, 0x00));
        assert_eq!(encode_voltage(25.55), (0x19, 0x37)); // 55 = 0x37
    }

    #[test]
    fn test_voltage_decode_formula() {
        assert_eq!(decode_voltage(0x0C, 0x00), 12.0);
        assert!((decode_voltage(12, 255) - 13.0).abs() < 1e-9);
        assert!((decode_voltage(12, 34) - (12.0 + 34.0 / 255.0)).abs() < 1e-9);
    }

    #[test]
    fn test_station_code_round_trip() {
        for byte in 0x00..=0x05u8 {
            assert_eq!(
                station_code(station_alliance(byte), station_position(byte)),
                byte
            );
        }
    }

    #[test]
    fn test_addresses() {
        let state = state();
        state.set_team_number(1234);
        let proto = Frc2015::new();

        assert_eq!(proto.fms_address(&state), "");
        assert_eq!(proto.radio_address(&state), "10.12.34.1");
        assert_eq!(proto.robot_address(&state), "roboRIO-1234.local");
    }

    #[test]
    fn test_fms_packet_teleop_disabled() {
        // Teleop, disabled, no links, team 1234, 12.34 V
        let state = state();
        state.set_team_number(1234);
        state.set_robot_voltage(12.34);

        let mut proto = Frc2015::new();
        let packet = proto.create_fms_packet(&state);

        assert_eq!(packet, vec![0x00, 0x00, 0x00, 0x00, 0x04, 0xD2, 0x0C, 0x22]);

        // Counter bumps by exactly one per packet
        let packet = proto.create_fms_packet(&state);
        assert_eq!(&packet[0..2], &[0x00, 0x01]);
    }

    #[test]
    fn test_fms_control_code_links() {
        let state = state();
        connected(&state);
        state.set_peer_comms(Peer::Radio, true);
        state.set_control_mode(ControlMode::Test);

        let code = Frc2015::fms_control_code(&state);
        assert_eq!(
            code,
            MODE_TEST | FMS_RADIO_PING | FMS_ROBOT_PING | FMS_ROBOT_COMMS
        );
    }

    #[test]
    fn test_robot_packet_autonomous_enabled() {
        // Autonomous + enabled, station Red 2, packet #6, no joysticks
        let state = state();
        connected(&state);
        state.set_control_mode(ControlMode::Autonomous);
        state.set_enabled(true);
        state.set_position(Position::P2);

        let mut proto = Frc2015::new();
        proto.sent_robot_packets = 6;

        let packet = proto.create_robot_packet(&state, &joysticks(&state));
        assert_eq!(packet, vec![0x00, 0x06, 0x01, 0x06, 0x80, 0x01]);
    }

    #[test]
    fn test_robot_packet_payload_empty_first_five() {
        let state = state();
        let js = joysticks(&state);
        js.add(2, 2, 0);

        let mut proto = Frc2015::new();
        for _ in 0..6 {
            // Packets 0-5 never carry joystick data
            assert_eq!(proto.create_robot_packet(&state, &js).len(), 6);
        }
        // Packet #6 does
        assert!(proto.create_robot_packet(&state, &js).len() > 6);
    }

    #[test]
    fn test_joystick_block_layout() {
        // 2 axes, 3 buttons (0 and 2 pressed), 1 hat at 90 degrees
        let state = state();
        let js = joysticks(&state);
        js.add(2, 3, 1);
        js.set_axis(0, 0, 0.5);
        js.set_axis(0, 1, -1.0);
        js.set_button(0, 0, true);
        js.set_button(0, 2, true);
        js.set_hat(0, 0, 90);

        let mut proto = Frc2015::new();
        proto.sent_robot_packets = 10;
        let packet = proto.create_robot_packet(&state, &js);

        let block = &packet[6..];
        assert_eq!(block.len(), 10);
        assert_eq!(block[0], 10); // size: 6 + 2 axes + 2 hat bytes
        assert_eq!(block[1], TAG_JOYSTICK);
        assert_eq!(block[2], 63); // 0.5 * 127
        assert_eq!(block[3], 0x81); // -1.0 * 127 = -127 as u8
        assert_eq!(block[4], 3); // button count
        assert_eq!(block[5], 0x00); // flags hi
        assert_eq!(block[6], 0x05); // flags lo: bits 0 and 2
        assert_eq!(block[7], 1); // hat count
        assert_eq!(&block[8..10], &90i16.to_be_bytes());
    }

    #[test]
    fn test_joystick_data_respects_limits() {
        let state = state();
        let js = joysticks(&state);
        // More geometry than the era supports
        for _ in 0..8 {
            js.add(8, 12, 2);
        }

        let mut proto = Frc2015::new();
        proto.sent_robot_packets = 10;
        let packet = proto.create_robot_packet(&state, &js);

        // 6 sticks max, each 6 axes / 10 buttons / 1 hat:
        // block = 6 + 6 + 2 = 14 bytes
        assert_eq!(packet.len(), 6 + 6 * 14);
        assert_eq!(packet[6], 14);
    }

    #[test]
    fn test_time_data_requested() {
        let state = state();
        let js = joysticks(&state);
        js.add(2, 2, 0);

        let mut proto = Frc2015::new();
        proto.sent_robot_packets = 10;
        proto.send_time_data = true;

        let packet = proto.create_robot_packet(&state, &js);

        // Date block replaces joystick data entirely
        assert_eq!(packet[6], 0x0B);
        assert_eq!(packet[7], TAG_DATE);
        let tz_len = packet[16] as usize;
        assert_eq!(packet[17], TAG_TIMEZONE);
        assert_eq!(packet.len(), 18 + tz_len);
    }

    #[test]
    fn test_request_code_reboot_latch() {
        let state = state();
        connected(&state);

        let mut proto = Frc2015::new();
        assert_eq!(proto.request_code(&state), REQUEST_NORMAL);

        proto.reboot_robot();
        assert_eq!(proto.request_code(&state), REQUEST_REBOOT);

        // Watchdog reset clears the latch
        proto.reset_robot(&state);
        assert_eq!(proto.request_code(&state), REQUEST_NORMAL);

        proto.restart_robot_code();
        assert_eq!(proto.request_code(&state), REQUEST_RESTART_CODE);
    }

    #[test]
    fn test_request_code_unconnected() {
        let state = state();
        let mut proto = Frc2015::new();
        proto.reboot_robot();
        // No robot comms: the latch does not apply yet
        assert_eq!(proto.request_code(&state), REQUEST_UNCONNECTED);
    }

    #[test]
    fn test_read_robot_packet() {
        let state = state();
        let mut proto = Frc2015::new();

        // has-code status, 12 + 34/255 V, time requested
        let data = [0x00, 0x00, 0x01, 0x00, 0x20, 12, 34, 0x01];
        proto.read_robot_packet(&state, &data).unwrap();

        assert!(state.robot_has_code());
        assert!(!state.emergency_stopped());
        assert!(proto.send_time_data);
        assert_eq!(state.robot_voltage(), 12.13);

        // Next packet without the time request clears the flag
        let data = [0x00, 0x01, 0x01, 0x00, 0x20, 12, 34, 0x80];
        proto.read_robot_packet(&state, &data).unwrap();
        assert!(!proto.send_time_data);
    }

    #[test]
    fn test_read_robot_packet_estop_sticky() {
        let state = state();
        let mut proto = Frc2015::new();

        let stopped = [0x00, 0x00, 0x01, 0x80, 0x20, 12, 0, 0x80];
        proto.read_robot_packet(&state, &stopped).unwrap();
        assert!(state.emergency_stopped());

        // A later packet without the bit does not release it
        let normal = [0x00, 0x01, 0x01, 0x00, 0x20, 12, 0, 0x80];
        proto.read_robot_packet(&state, &normal).unwrap();
        assert!(state.emergency_stopped());
    }

    #[test]
    fn test_read_robot_packet_extended_cpu() {
        let state = state();
        let mut proto = Frc2015::new();

        let data = [
            0x00, 0x00, 0x01, 0x00, // counter, tag, control
            0x00, 0x00, 0x00, 0x00, // status, voltage, request
            0x0E, 0x05, 0x00, 0x4B, // extended: size, CPU tag, pad, 75%
            0x00, 0x00,
        ];
        proto.read_robot_packet(&state, &data).unwrap();
        assert_eq!(state.cpu_usage(), 75);
    }

    #[test]
    fn test_read_robot_packet_extended_other_tags() {
        let state = state();
        let mut proto = Frc2015::new();

        let mut ram = vec![0u8; 14];
        ram[9] = RTAG_RAM;
        ram[12] = 42;
        proto.read_robot_packet(&state, &ram).unwrap();
        assert_eq!(state.ram_usage(), 42);

        let mut can = vec![0u8; 20];
        can[9] = RTAG_CAN;
        can[18] = 66;
        proto.read_robot_packet(&state, &can).unwrap();
        assert_eq!(state.can_utilization(), 66);
    }

    #[test]
    fn test_read_robot_packet_too_short() {
        let state = state();
        let mut proto = Frc2015::new();
        assert!(proto
            .read_robot_packet(&state, &[0x00, 0x00, 0x01, 0x00])
            .is_err());
        // Nothing was applied
        assert!(!state.robot_has_code());
    }

    #[test]
    fn test_read_fms_packet() {
        // Control 0x06 (autonomous + enabled), station Blue 2
        let state = state();
        connected(&state);

        let mut proto = Frc2015::new();
        let data = [0x00, 0x00, 0x00, 0x06, 0x00, 0x04, 0x00, 0x00];
        proto.read_fms_packet(&state, &data).unwrap();

        assert_eq!(state.control_mode(), ControlMode::Autonomous);
        assert!(state.enabled());
        assert_eq!(state.alliance(), Alliance::Blue);
        assert_eq!(state.position(), Position::P2);
    }

    #[test]
    fn test_read_fms_packet_enable_gated() {
        // Without robot comms the FMS enable request is coerced to false
        let state = state();
        let mut proto = Frc2015::new();
        let data = [0x00, 0x00, 0x00, 0x06, 0x00, 0x04, 0x00, 0x00];
        proto.read_fms_packet(&state, &data).unwrap();
        assert!(!state.enabled());
    }

    #[test]
    fn test_read_fms_packet_teleop_default() {
        let state = state();
        let mut proto = Frc2015::new();
        state.set_control_mode(ControlMode::Test);

        let data = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        proto.read_fms_packet(&state, &data).unwrap();
        assert_eq!(state.control_mode(), ControlMode::Teleoperated);
    }

    #[test]
    fn test_loopback_fms_state_convergence() {
        // A DS reading its own FMS packet converges station and mode
        let sender = state();
        connected(&sender);
        sender.set_team_number(1234);
        sender.set_control_mode(ControlMode::Autonomous);
        sender.set_enabled(true);
        sender.set_alliance(Alliance::Blue);
        sender.set_position(Position::P3);

        let mut proto = Frc2015::new();
        let mut packet = proto.create_fms_packet(&sender);
        // The FMS echoes the station assignment in byte 5
        packet[5] = station_code(sender.alliance(), sender.position());

        let receiver = state();
        connected(&receiver);
        proto.read_fms_packet(&receiver, &packet).unwrap();

        assert_eq!(receiver.control_mode(), ControlMode::Autonomous);
        assert!(receiver.enabled());
        assert_eq!(receiver.alliance(), Alliance::Blue);
        assert_eq!(receiver.position(), Position::P3);
    }
}
