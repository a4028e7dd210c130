//! DriverStation — the public operation surface
//!
//! An explicitly constructed context owning the station state, the
//! joystick registry, and the peer link scheduler. UIs talk to this type
//! only; protocol code never reaches outside it.
//!
//! ```no_run
//! use fieldlink::{Config, DriverStation, Topic};
//!
//! # fn main() -> fieldlink::Result<()> {
//! let mut ds = DriverStation::new(Config::load("fieldlink.toml")?);
//!
//! ds.subscribe(Topic::Voltage, |event| {
//!     println!("voltage: {:?}", event);
//! });
//!
//! ds.set_team_number(1234);
//! ds.switch_to_teleoperated();
//! ds.set_enabled(true); // refused until the robot link is up
//! # Ok(())
//! # }
//! ```

use crate::comms::Comms;
use crate::config::Config;
use crate::events::{Event, Topic};
use crate::joystick::JoystickSet;
use crate::protocol::Era;
use crate::state::StationState;
use crate::types::{Alliance, ControlMode, Peer, Position};
use crossbeam_channel::Receiver;
use std::sync::Arc;

pub struct DriverStation {
    state: Arc<StationState>,
    joysticks: Arc<JoystickSet>,
    comms: Comms,
}

impl DriverStation {
    /// Build a station from configuration and start the configured
    /// protocol's tasks
    ///
    /// Socket bind failures are advisories, not errors: the station runs
    /// and the affected peer stays disconnected.
    pub fn new(config: Config) -> Self {
        let state = StationState::shared();
        let joysticks = Arc::new(JoystickSet::new(Arc::clone(&state)));

        if config.station.team_number != 0 {
            state.set_team_number(config.station.team_number);
        }
        if !config.network.fms_address.is_empty() {
            state.set_custom_address(Peer::Fms, config.network.fms_address.clone());
        }
        if !config.network.radio_address.is_empty() {
            state.set_custom_address(Peer::Radio, config.network.radio_address.clone());
        }
        if !config.network.robot_address.is_empty() {
            state.set_custom_address(Peer::Robot, config.network.robot_address.clone());
        }

        let era = config.era().unwrap_or(Era::Frc2020);
        let comms = Comms::start(Arc::clone(&state), Arc::clone(&joysticks), era);

        Self {
            state,
            joysticks,
            comms,
        }
    }

    // === Protocol ===

    pub fn era(&self) -> Era {
        self.comms.era()
    }

    /// Swap the active protocol era
    ///
    /// All tasks of the old era stop before the new descriptor starts, and
    /// packet counters and pending one-shot requests are cleared.
    pub fn set_protocol(&mut self, era: Era) {
        self.comms.install(era);
    }

    // === Configuration writes ===

    pub fn set_team_number(&self, team: u16) {
        self.state.set_team_number(team);
    }

    pub fn set_alliance(&self, alliance: Alliance) {
        self.state.set_alliance(alliance);
    }

    pub fn set_position(&self, position: Position) {
        self.state.set_position(position);
    }

    pub fn set_control_mode(&self, mode: ControlMode) {
        self.state.set_control_mode(mode);
    }

    /// Request the enabled state; see [`StationState::set_enabled`] for
    /// the gating rules
    pub fn set_enabled(&self, enabled: bool) {
        self.state.set_enabled(enabled);
    }

    pub fn switch_to_teleoperated(&self) {
        self.set_control_mode(ControlMode::Teleoperated);
    }

    pub fn switch_to_autonomous(&self) {
        self.set_control_mode(ControlMode::Autonomous);
    }

    pub fn switch_to_test(&self) {
        self.set_control_mode(ControlMode::Test);
    }

    /// Engage the sticky emergency stop
    pub fn emergency_stop(&self) {
        self.state.engage_emergency_stop();
    }

    /// Release a previously engaged emergency stop
    pub fn clear_emergency_stop(&self) {
        self.state.clear_emergency_stop();
    }

    /// Override one peer's address (empty = derive from the team number)
    pub fn set_custom_address(&self, peer: Peer, address: impl Into<String>) {
        self.state.set_custom_address(peer, address);
    }

    // === One-shot robot requests ===

    /// Ask the robot controller to reboot; carried in robot packets until
    /// the robot link resets
    pub fn request_reboot(&self) {
        self.comms.request_reboot();
    }

    /// Ask the robot controller to restart the user code process
    pub fn request_restart_code(&self) {
        self.comms.request_restart_code();
    }

    // === Subscriptions ===

    /// Register a callback for one topic
    ///
    /// Callbacks run synchronously on the mutating thread: keep them
    /// short, and route any protocol-touching reaction (reboot requests,
    /// protocol swaps) through [`DriverStation::events`] instead.
    pub fn subscribe<F>(&self, topic: Topic, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.state.subscribe(topic, callback);
    }

    /// Open a channel receiving every published event
    pub fn events(&self) -> Receiver<Event> {
        self.state.watch()
    }

    // === Read accessors ===

    pub fn team_number(&self) -> u16 {
        self.state.team_number()
    }

    pub fn alliance(&self) -> Alliance {
        self.state.alliance()
    }

    pub fn position(&self) -> Position {
        self.state.position()
    }

    pub fn control_mode(&self) -> ControlMode {
        self.state.control_mode()
    }

    pub fn enabled(&self) -> bool {
        self.state.enabled()
    }

    pub fn emergency_stopped(&self) -> bool {
        self.state.emergency_stopped()
    }

    pub fn robot_voltage(&self) -> f64 {
        self.state.robot_voltage()
    }

    pub fn robot_has_code(&self) -> bool {
        self.state.robot_has_code()
    }

    pub fn fms_connected(&self) -> bool {
        self.state.fms_comms()
    }

    pub fn radio_connected(&self) -> bool {
        self.state.radio_comms()
    }

    pub fn robot_connected(&self) -> bool {
        self.state.robot_comms()
    }

    pub fn robot_cpu_usage(&self) -> u8 {
        self.state.cpu_usage()
    }

    pub fn robot_ram_usage(&self) -> u8 {
        self.state.ram_usage()
    }

    pub fn robot_disk_usage(&self) -> u8 {
        self.state.disk_usage()
    }

    pub fn can_utilization(&self) -> u8 {
        self.state.can_utilization()
    }

    /// Human-readable status line ("Teleoperated Enabled", "No Robot
    /// Communication", ...)
    pub fn status(&self) -> String {
        self.state.status_text()
    }

    /// The joystick registry fed by the host's input layer
    pub fn joysticks(&self) -> &Arc<JoystickSet> {
        &self.joysticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // These construct a full station, which binds the era's real UDP
    // ports; bind failures are tolerated by design, so the tests stay
    // meaningful on machines where the ports are busy.

    #[test]
    fn test_station_lifecycle() {
        let mut ds = DriverStation::new(Config::default());
        assert_eq!(ds.era(), Era::Frc2020);

        ds.set_team_number(1234);
        assert_eq!(ds.team_number(), 1234);

        ds.switch_to_autonomous();
        assert_eq!(ds.control_mode(), ControlMode::Autonomous);

        // No robot link: enable refused, e-stop sticky
        ds.set_enabled(true);
        assert!(!ds.enabled());

        ds.emergency_stop();
        assert!(ds.emergency_stopped());
        ds.clear_emergency_stop();
        assert!(!ds.emergency_stopped());

        ds.set_protocol(Era::Frc2015);
        assert_eq!(ds.era(), Era::Frc2015);

        assert_eq!(ds.status(), "No Robot Communication");
    }

    #[test]
    fn test_event_channel() {
        let ds = DriverStation::new(Config::default());
        let rx = ds.events();

        ds.set_alliance(Alliance::Blue);
        let event = rx
            .recv_timeout(std::time::Duration::from_secs(1))
            .expect("expected a station event");
        assert!(matches!(event, Event::StationChanged { .. }));
    }
}
