//! FRC 2016 protocol implementation
//!
//! Wire-compatible with the 2015 encoding; the control system renamed the
//! robot's mDNS address to `roboRIO-<team>-FRC.local` for this season.

use super::{Era, Frc2015, JoystickLimits, Protocol, Timing};
use crate::error::Result;
use crate::joystick::JoystickSet;
use crate::state::StationState;
use crate::transport::SocketLayout;

pub struct Frc2016 {
    inner: Frc2015,
}

impl Default for Frc2016 {
    fn default() -> Self {
        Self::new()
    }
}

impl Frc2016 {
    pub fn new() -> Self {
        Self {
            inner: Frc2015::new(),
        }
    }
}

impl Protocol for Frc2016 {
    fn era(&self) -> Era {
        Era::Frc2016
    }

    fn fms_address(&self, state: &StationState) -> String {
        self.inner.fms_address(state)
    }

    fn radio_address(&self, state: &StationState) -> String {
        self.inner.radio_address(state)
    }

    fn robot_address(&self, state: &StationState) -> String {
        format!("roboRIO-{}-FRC.local", state.team_number())
    }

    fn create_fms_packet(&mut self, state: &StationState) -> Vec<u8> {
        self.inner.create_fms_packet(state)
    }

    fn create_radio_packet(&mut self, state: &StationState) -> Vec<u8> {
        self.inner.create_radio_packet(state)
    }

    fn create_robot_packet(&mut self, state: &StationState, joysticks: &JoystickSet) -> Vec<u8> {
        self.inner.create_robot_packet(state, joysticks)
    }

    fn read_fms_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()> {
        self.inner.read_fms_packet(state, data)
    }

    fn read_radio_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()> {
        self.inner.read_radio_packet(state, data)
    }

    fn read_robot_packet(&mut self, state: &StationState, data: &[u8]) -> Result<()> {
        self.inner.read_robot_packet(state, data)
    }

    fn reset_fms(&mut self, state: &StationState) {
        self.inner.reset_fms(state)
    }

    fn reset_radio(&mut self, state: &StationState) {
        self.inner.reset_radio(state)
    }

    fn reset_robot(&mut self, state: &StationState) {
        self.inner.reset_robot(state)
    }

    fn reboot_robot(&mut self) {
        self.inner.reboot_robot()
    }

    fn restart_robot_code(&mut self) {
        self.inner.restart_robot_code()
    }

    fn timing(&self) -> Timing {
        self.inner.timing()
    }

    fn joystick_limits(&self) -> JoystickLimits {
        self.inner.joystick_limits()
    }

    fn sockets(&self) -> SocketLayout {
        self.inner.sockets()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_robot_address() {
        let state = StationState::new();
        state.set_team_number(254);
        let proto = Frc2016::new();
        assert_eq!(proto.robot_address(&state), "roboRIO-254-FRC.local");
        assert_eq!(proto.radio_address(&state), "10.2.54.1");
    }

    #[test]
    fn test_wire_format_matches_2015() {
        let state = StationState::new();
        state.set_team_number(1234);
        state.set_robot_voltage(12.34);

        let mut p2016 = Frc2016::new();
        let mut p2015 = Frc2015::new();
        assert_eq!(
            p2016.create_fms_packet(&state),
            p2015.create_fms_packet(&state)
        );
    }
}
