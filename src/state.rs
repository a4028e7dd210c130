//! Station state — the authoritative model shared by the UI and the
//! protocol code
//!
//! Every field lives behind one mutex. Setters compare against the stored
//! value, mutate, and publish typed events *after* the lock is released, so
//! subscribers observe a consistent store and may read back any field.
//!
//! Three rules are enforced here rather than in callers:
//!
//! - the robot may only be enabled while it is connected, has user code,
//!   and is not emergency-stopped; other enable requests are coerced to
//!   `false` and answered with an advisory message;
//! - the emergency stop is sticky: both the UI and robot ingress can engage
//!   it, but only the explicit [`StationState::clear_emergency_stop`]
//!   operation releases it;
//! - the reported battery voltage is rounded to two decimals before it is
//!   stored or compared.

use crate::config::MAX_TEAM_NUMBER;
use crate::events::{Event, EventBus, Topic};
use crate::types::{Alliance, ControlMode, Peer, Position};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Inner {
    team_number: u16,
    alliance: Alliance,
    position: Position,
    control_mode: ControlMode,
    enabled: bool,
    emergency_stopped: bool,
    robot_voltage: f64,
    robot_has_code: bool,
    fms_comms: bool,
    radio_comms: bool,
    robot_comms: bool,
    cpu_usage: u8,
    ram_usage: u8,
    disk_usage: u8,
    can_utilization: u8,
    custom_fms_address: String,
    custom_radio_address: String,
    custom_robot_address: String,
    last_status: String,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            team_number: 0,
            alliance: Alliance::Red,
            position: Position::P1,
            control_mode: ControlMode::Teleoperated,
            enabled: false,
            emergency_stopped: false,
            robot_voltage: 0.0,
            robot_has_code: false,
            fms_comms: false,
            radio_comms: false,
            robot_comms: false,
            cpu_usage: 0,
            ram_usage: 0,
            disk_usage: 0,
            can_utilization: 0,
            custom_fms_address: String::new(),
            custom_radio_address: String::new(),
            custom_robot_address: String::new(),
            last_status: String::new(),
        }
    }
}

impl Inner {
    /// Human-readable status line shown by DS frontends
    fn status_text(&self) -> String {
        if self.emergency_stopped {
            "Emergency Stopped".to_string()
        } else if !self.robot_comms {
            "No Robot Communication".to_string()
        } else if !self.robot_has_code {
            "No Robot Code".to_string()
        } else {
            format!(
                "{} {}",
                self.control_mode,
                if self.enabled { "Enabled" } else { "Disabled" }
            )
        }
    }

    /// Append a StatusChanged event if the derived status moved
    fn refresh_status(&mut self, events: &mut Vec<Event>) {
        let status = self.status_text();
        if status != self.last_status {
            self.last_status = status.clone();
            events.push(Event::StatusChanged(status));
        }
    }
}

/// Thread-safe station state with change notification
pub struct StationState {
    inner: Mutex<Inner>,
    bus: EventBus,
}

impl Default for StationState {
    fn default() -> Self {
        Self::new()
    }
}

impl StationState {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            bus: EventBus::new(),
        }
    }

    /// Shared handle, as used by the comms threads
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // === Subscriptions ===

    pub fn subscribe<F>(&self, topic: Topic, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.bus.subscribe(topic, callback);
    }

    pub fn watch(&self) -> crossbeam_channel::Receiver<Event> {
        self.bus.watch()
    }

    /// Publish an advisory or netconsole line on the message topic
    pub fn publish_message(&self, text: impl Into<String>) {
        self.bus.publish(Event::Message(text.into()));
    }

    fn publish_all(&self, events: Vec<Event>) {
        for event in events {
            self.bus.publish(event);
        }
    }

    // === Identity ===

    pub fn team_number(&self) -> u16 {
        self.inner.lock().team_number
    }

    /// Set the team number
    ///
    /// Out-of-range values (0 or above 25599) are refused with an advisory
    /// message and leave the store untouched.
    pub fn set_team_number(&self, team: u16) {
        if team == 0 || team > MAX_TEAM_NUMBER {
            log::warn!("Refusing team number {} (valid: 1-{})", team, MAX_TEAM_NUMBER);
            self.publish_message(format!(
                "Invalid team number {} (valid range 1-{})",
                team, MAX_TEAM_NUMBER
            ));
            return;
        }

        let changed = {
            let mut inner = self.inner.lock();
            if inner.team_number == team {
                false
            } else {
                inner.team_number = team;
                true
            }
        };

        if changed {
            log::info!("Team number set to {}", team);
            self.bus.publish(Event::TeamNumberChanged(team));
        }
    }

    // === Alliance & position ===

    pub fn alliance(&self) -> Alliance {
        self.inner.lock().alliance
    }

    pub fn position(&self) -> Position {
        self.inner.lock().position
    }

    pub fn set_alliance(&self, alliance: Alliance) {
        let events = {
            let mut inner = self.inner.lock();
            if inner.alliance == alliance {
                Vec::new()
            } else {
                inner.alliance = alliance;
                vec![Event::StationChanged {
                    alliance,
                    position: inner.position,
                }]
            }
        };
        self.publish_all(events);
    }

    pub fn set_position(&self, position: Position) {
        let events = {
            let mut inner = self.inner.lock();
            if inner.position == position {
                Vec::new()
            } else {
                inner.position = position;
                vec![Event::StationChanged {
                    alliance: inner.alliance,
                    position,
                }]
            }
        };
        self.publish_all(events);
    }

    // === Control mode & enabled ===

    pub fn control_mode(&self) -> ControlMode {
        self.inner.lock().control_mode
    }

    pub fn set_control_mode(&self, mode: ControlMode) {
        let events = {
            let mut inner = self.inner.lock();
            if inner.control_mode == mode {
                Vec::new()
            } else {
                inner.control_mode = mode;
                let mut events = vec![Event::ModeChanged(mode)];
                inner.refresh_status(&mut events);
                events
            }
        };
        self.publish_all(events);
    }

    pub fn enabled(&self) -> bool {
        self.inner.lock().enabled
    }

    /// Request the robot enabled state
    ///
    /// Enabling requires robot communications, user code, and no emergency
    /// stop. A refused request still emits `EnabledChanged(false)` so a UI
    /// checkbox snaps back, plus an advisory on the message topic.
    pub fn set_enabled(&self, enable: bool) {
        let mut refusal: Option<&'static str> = None;

        let events = {
            let mut inner = self.inner.lock();

            let target = if enable {
                if inner.emergency_stopped {
                    refusal = Some("robot is emergency stopped");
                    false
                } else if !inner.robot_comms {
                    refusal = Some("no robot communications");
                    false
                } else if !inner.robot_has_code {
                    refusal = Some("robot has no user code");
                    false
                } else {
                    true
                }
            } else {
                false
            };

            let mut events = Vec::new();
            if inner.enabled != target {
                inner.enabled = target;
                events.push(Event::EnabledChanged(target));
                inner.refresh_status(&mut events);
            } else if enable && !target {
                // Unchanged, but the caller asked for true: echo the refusal
                events.push(Event::EnabledChanged(false));
            }
            events
        };

        self.publish_all(events);

        if let Some(reason) = refusal {
            log::warn!("Cannot enable robot: {}", reason);
            self.publish_message(format!("Cannot enable robot: {}", reason));
        }
    }

    // === Emergency stop ===

    pub fn emergency_stopped(&self) -> bool {
        self.inner.lock().emergency_stopped
    }

    /// Engage the emergency stop (sticky) and force the robot disabled
    pub fn engage_emergency_stop(&self) {
        let events = {
            let mut inner = self.inner.lock();
            if inner.emergency_stopped {
                Vec::new()
            } else {
                inner.emergency_stopped = true;
                let mut events = vec![Event::EmergencyStopChanged(true)];
                if inner.enabled {
                    inner.enabled = false;
                    events.push(Event::EnabledChanged(false));
                }
                inner.refresh_status(&mut events);
                events
            }
        };

        if !events.is_empty() {
            log::warn!("Emergency stop engaged");
        }
        self.publish_all(events);
    }

    /// Release a previously engaged emergency stop
    pub fn clear_emergency_stop(&self) {
        let events = {
            let mut inner = self.inner.lock();
            if !inner.emergency_stopped {
                Vec::new()
            } else {
                inner.emergency_stopped = false;
                let mut events = vec![Event::EmergencyStopChanged(false)];
                inner.refresh_status(&mut events);
                events
            }
        };
        self.publish_all(events);
    }

    // === Robot feedback ===

    pub fn robot_voltage(&self) -> f64 {
        self.inner.lock().robot_voltage
    }

    pub fn set_robot_voltage(&self, voltage: f64) {
        let rounded = (voltage * 100.0).round() / 100.0;
        let events = {
            let mut inner = self.inner.lock();
            if (inner.robot_voltage - rounded).abs() < f64::EPSILON {
                Vec::new()
            } else {
                inner.robot_voltage = rounded;
                vec![Event::VoltageChanged(rounded)]
            }
        };
        self.publish_all(events);
    }

    pub fn robot_has_code(&self) -> bool {
        self.inner.lock().robot_has_code
    }

    pub fn set_robot_code(&self, has_code: bool) {
        let events = {
            let mut inner = self.inner.lock();
            if inner.robot_has_code == has_code {
                Vec::new()
            } else {
                inner.robot_has_code = has_code;
                let mut events = vec![Event::RobotCodeChanged(has_code)];
                inner.refresh_status(&mut events);
                events
            }
        };
        self.publish_all(events);
    }

    // === Link status (owned by the watchdogs) ===

    pub fn fms_comms(&self) -> bool {
        self.inner.lock().fms_comms
    }

    pub fn radio_comms(&self) -> bool {
        self.inner.lock().radio_comms
    }

    pub fn robot_comms(&self) -> bool {
        self.inner.lock().robot_comms
    }

    pub fn set_peer_comms(&self, peer: Peer, connected: bool) {
        let events = {
            let mut inner = self.inner.lock();
            let slot = match peer {
                Peer::Fms => &mut inner.fms_comms,
                Peer::Radio => &mut inner.radio_comms,
                Peer::Robot => &mut inner.robot_comms,
            };
            if *slot == connected {
                Vec::new()
            } else {
                *slot = connected;
                let mut events = vec![Event::CommsChanged { peer, connected }];
                if peer == Peer::Robot {
                    // Losing the robot always drops back to disabled
                    if !connected && inner.enabled {
                        inner.enabled = false;
                        events.push(Event::EnabledChanged(false));
                    }
                    inner.refresh_status(&mut events);
                }
                events
            }
        };

        self.publish_all(events);
    }

    // === Robot telemetry (extended ingress tags) ===

    pub fn cpu_usage(&self) -> u8 {
        self.inner.lock().cpu_usage
    }

    pub fn ram_usage(&self) -> u8 {
        self.inner.lock().ram_usage
    }

    pub fn disk_usage(&self) -> u8 {
        self.inner.lock().disk_usage
    }

    pub fn can_utilization(&self) -> u8 {
        self.inner.lock().can_utilization
    }

    pub fn set_cpu_usage(&self, pct: u8) {
        let changed = {
            let mut inner = self.inner.lock();
            std::mem::replace(&mut inner.cpu_usage, pct) != pct
        };
        if changed {
            self.bus.publish(Event::CpuUsageChanged(pct));
        }
    }

    pub fn set_ram_usage(&self, pct: u8) {
        let changed = {
            let mut inner = self.inner.lock();
            std::mem::replace(&mut inner.ram_usage, pct) != pct
        };
        if changed {
            self.bus.publish(Event::RamUsageChanged(pct));
        }
    }

    pub fn set_disk_usage(&self, pct: u8) {
        let changed = {
            let mut inner = self.inner.lock();
            std::mem::replace(&mut inner.disk_usage, pct) != pct
        };
        if changed {
            self.bus.publish(Event::DiskUsageChanged(pct));
        }
    }

    pub fn set_can_utilization(&self, pct: u8) {
        let changed = {
            let mut inner = self.inner.lock();
            std::mem::replace(&mut inner.can_utilization, pct) != pct
        };
        if changed {
            self.bus.publish(Event::CanUtilizationChanged(pct));
        }
    }

    // === Address overrides ===

    pub fn custom_address(&self, peer: Peer) -> String {
        let inner = self.inner.lock();
        match peer {
            Peer::Fms => inner.custom_fms_address.clone(),
            Peer::Radio => inner.custom_radio_address.clone(),
            Peer::Robot => inner.custom_robot_address.clone(),
        }
    }

    /// Set a manual address override for one peer (empty = derive from the
    /// team number as usual)
    pub fn set_custom_address(&self, peer: Peer, address: impl Into<String>) {
        let address = address.into();
        let mut inner = self.inner.lock();
        match peer {
            Peer::Fms => inner.custom_fms_address = address,
            Peer::Radio => inner.custom_radio_address = address,
            Peer::Robot => inner.custom_robot_address = address,
        }
    }

    // === Derived ===

    pub fn status_text(&self) -> String {
        self.inner.lock().status_text()
    }

    /// Publish a joystick count change on behalf of the registry
    pub(crate) fn publish_joystick_count(&self, count: usize) {
        self.bus.publish(Event::JoystickCountChanged(count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_state() -> StationState {
        let state = StationState::new();
        state.set_peer_comms(Peer::Robot, true);
        state.set_robot_code(true);
        state
    }

    #[test]
    fn test_enable_gate_refuses_without_comms() {
        let state = StationState::new();
        state.set_enabled(true);
        assert!(!state.enabled());
    }

    #[test]
    fn test_enable_gate_refusal_is_announced() {
        let state = StationState::new();
        let rx = state.watch();

        state.set_enabled(true);

        let events: Vec<Event> = rx.try_iter().collect();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::EnabledChanged(false))));
        assert!(events.iter().any(|e| matches!(e, Event::Message(_))));
    }

    #[test]
    fn test_enable_gate_passes_when_healthy() {
        let state = connected_state();
        state.set_enabled(true);
        assert!(state.enabled());
    }

    #[test]
    fn test_enable_gate_refuses_while_estopped() {
        let state = connected_state();
        state.engage_emergency_stop();
        state.set_enabled(true);
        assert!(!state.enabled());
    }

    #[test]
    fn test_emergency_stop_is_sticky_and_disables() {
        let state = connected_state();
        state.set_enabled(true);
        assert!(state.enabled());

        state.engage_emergency_stop();
        assert!(state.emergency_stopped());
        assert!(!state.enabled());

        // Engaging twice is a no-op; still stopped until the explicit clear
        state.engage_emergency_stop();
        assert!(state.emergency_stopped());

        state.clear_emergency_stop();
        assert!(!state.emergency_stopped());
    }

    #[test]
    fn test_robot_comms_loss_disables() {
        let state = connected_state();
        state.set_enabled(true);

        state.set_peer_comms(Peer::Robot, false);
        assert!(!state.enabled());
        assert_eq!(state.status_text(), "No Robot Communication");
    }

    #[test]
    fn test_voltage_rounded_to_two_decimals() {
        let state = StationState::new();
        state.set_robot_voltage(12.0 + 34.0 / 255.0);
        assert_eq!(state.robot_voltage(), 12.13);
    }

    #[test]
    fn test_unchanged_set_publishes_nothing() {
        let state = StationState::new();
        state.set_control_mode(ControlMode::Autonomous);

        let rx = state.watch();
        state.set_control_mode(ControlMode::Autonomous);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_team_number_validation() {
        let state = StationState::new();
        state.set_team_number(1234);
        assert_eq!(state.team_number(), 1234);

        state.set_team_number(0);
        assert_eq!(state.team_number(), 1234);

        state.set_team_number(30000);
        assert_eq!(state.team_number(), 1234);
    }

    #[test]
    fn test_team_number_change_published() {
        let state = StationState::new();
        let rx = state.watch();

        state.set_team_number(1234);
        state.set_team_number(1234); // unchanged: no second event
        state.set_team_number(0); // refused: advisory only

        let events: Vec<Event> = rx.try_iter().collect();
        assert!(matches!(events[0], Event::TeamNumberChanged(1234)));
        assert!(!events[1..]
            .iter()
            .any(|e| matches!(e, Event::TeamNumberChanged(_))));
    }

    #[test]
    fn test_status_text_transitions() {
        let state = StationState::new();
        assert_eq!(state.status_text(), "No Robot Communication");

        state.set_peer_comms(Peer::Robot, true);
        assert_eq!(state.status_text(), "No Robot Code");

        state.set_robot_code(true);
        assert_eq!(state.status_text(), "Teleoperated Disabled");

        state.set_enabled(true);
        assert_eq!(state.status_text(), "Teleoperated Enabled");

        state.engage_emergency_stop();
        assert_eq!(state.status_text(), "Emergency Stopped");
    }
}
