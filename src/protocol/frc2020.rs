//! FRC 2020 protocol implementation
//!
//! Wire-compatible with the 2015 encoding. Fields in this era hand every
//! robot a static `10.TE.AM.2` address, which is far more reliable than
//! mDNS on congested event networks, so the robot address no longer goes
//! through the resolver at all.

use super::{Era, Frc2015, JoystickLimits, Protocol, Timing};
use super::frc2015::ten_te_am;
use crate::error::Result;
use crate::joystick::JoystickSet;
use crate::state::StationState;
use crate::transport::SocketLayout;

pub struct Frc2020 {
    inner: Frc2015,
}

impl Default for Frc2020 {
    fn default() -> Self {
        Self::new()
    }
}

impl Frc2020 {
    pub fn new() -> Self {
        Self {
            inner: Frc2015::new(),
        }
    }
}

impl Protocol for Frc2020 {
    fn era(&self) -> Era {
        Era::Frc2020
    }

    fn fms_address(&self, state: &StationState) -> String {
        self.inner.fms_address(state)
    }

    fn radio_address(&self, state: &StationState) -> String {
        self.inner.radio_address(state)
    }

    fn robot_address(&self, state: &StationState) -> String {
        ten_te_am(state.team_number(), 2)
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
    fn test_robot_address_is_static() {
        let state = StationState::new();
        state.set_team_number(1234);
        let proto = Frc2020::new();
        assert_eq!(proto.robot_address(&state), "10.12.34.2");
    }
}
