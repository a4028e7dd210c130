//! Joystick registry
//!
//! The OS input layer (SDL, gilrs, a test harness...) registers attached
//! joysticks here and pushes axis/button/hat values as they change; the
//! robot packet encoder takes a snapshot each cycle. The registry itself
//! accepts any reasonable geometry — the active protocol's limits are
//! applied at encode time, where excess sticks, axes, buttons and hats are
//! simply not put on the wire.
//!
//! Hat values are angles in degrees (0-359), with -1 meaning centered.

use crate::state::StationState;
use parking_lot::Mutex;
use std::sync::Arc;

/// Upper bounds on registered geometry, to bound snapshot sizes.
/// Protocol limits are usually far below these.
const MAX_AXES: usize = 12;
const MAX_BUTTONS: usize = 32;
const MAX_HATS: usize = 4;

/// One attached joystick's current values
#[derive(Debug, Clone, Default)]
pub struct Joystick {
    pub axes: Vec<f32>,
    pub buttons: Vec<bool>,
    pub hats: Vec<i16>,
}

impl Joystick {
    fn with_geometry(axes: usize, buttons: usize, hats: usize) -> Self {
        Self {
            axes: vec![0.0; axes.min(MAX_AXES)],
            buttons: vec![false; buttons.min(MAX_BUTTONS)],
            hats: vec![-1; hats.min(MAX_HATS)],
        }
    }
}

/// Shared registry of attached joysticks
pub struct JoystickSet {
    sticks: Mutex<Vec<Joystick>>,
    state: Arc<StationState>,
}

impl JoystickSet {
    pub fn new(state: Arc<StationState>) -> Self {
        Self {
            sticks: Mutex::new(Vec::new()),
            state,
        }
    }

    /// Register a joystick; returns its index
    pub fn add(&self, axes: usize, buttons: usize, hats: usize) -> usize {
        let count = {
            let mut sticks = self.sticks.lock();
            sticks.push(Joystick::with_geometry(axes, buttons, hats));
            sticks.len()
        };
        log::info!(
            "Joystick {} registered ({} axes, {} buttons, {} hats)",
            count - 1,
            axes.min(MAX_AXES),
            buttons.min(MAX_BUTTONS),
            hats.min(MAX_HATS)
        );
        self.state.publish_joystick_count(count);
        count - 1
    }

    /// Drop every registered joystick (e.g. on input backend restart)
    pub fn remove_all(&self) {
        let had_any = {
            let mut sticks = self.sticks.lock();
            let had_any = !sticks.is_empty();
            sticks.clear();
            had_any
        };
        if had_any {
            self.state.publish_joystick_count(0);
        }
    }

    pub fn count(&self) -> usize {
        self.sticks.lock().len()
    }

    /// Update one axis, clamped to [-1, 1]; unknown indices are ignored
    pub fn set_axis(&self, stick: usize, axis: usize, value: f32) {
        let mut sticks = self.sticks.lock();
        if let Some(slot) = sticks.get_mut(stick).and_then(|s| s.axes.get_mut(axis)) {
            *slot = value.clamp(-1.0, 1.0);
        } else {
            log::debug!("Ignoring axis update for unknown stick {}/axis {}", stick, axis);
        }
    }

    /// Update one button; unknown indices are ignored
    pub fn set_button(&self, stick: usize, button: usize, pressed: bool) {
        let mut sticks = self.sticks.lock();
        if let Some(slot) = sticks
            .get_mut(stick)
            .and_then(|s| s.buttons.get_mut(button))
        {
            *slot = pressed;
        } else {
            log::debug!(
                "Ignoring button update for unknown stick {}/button {}",
                stick,
                button
            );
        }
    }

    /// Update one hat angle in degrees (-1 = centered)
    pub fn set_hat(&self, stick: usize, hat: usize, angle: i16) {
        let mut sticks = self.sticks.lock();
        if let Some(slot) = sticks.get_mut(stick).and_then(|s| s.hats.get_mut(hat)) {
            *slot = angle;
        } else {
            log::debug!("Ignoring hat update for unknown stick {}/hat {}", stick, hat);
        }
    }

    /// Copy of every registered joystick, in registration order
    pub fn snapshot(&self) -> Vec<Joystick> {
        self.sticks.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> JoystickSet {
        JoystickSet::new(StationState::shared())
    }

    #[test]
    fn test_add_and_snapshot() {
        let js = set();
        assert_eq!(js.add(2, 4, 1), 0);
        assert_eq!(js.add(6, 10, 0), 1);
        assert_eq!(js.count(), 2);

        let snap = js.snapshot();
        assert_eq!(snap[0].axes.len(), 2);
        assert_eq!(snap[0].buttons.len(), 4);
        assert_eq!(snap[0].hats, vec![-1]);
        assert_eq!(snap[1].hats.len(), 0);
    }

    #[test]
    fn test_axis_clamped() {
        let js = set();
        js.add(2, 0, 0);
        js.set_axis(0, 0, 3.5);
        js.set_axis(0, 1, -2.0);
        let snap = js.snapshot();
        assert_eq!(snap[0].axes, vec![1.0, -1.0]);
    }

    #[test]
    fn test_unknown_indices_ignored() {
        let js = set();
        js.add(1, 1, 1);
        js.set_axis(5, 0, 1.0);
        js.set_button(0, 9, true);
        js.set_hat(0, 2, 90);

        let snap = js.snapshot();
        assert_eq!(snap[0].axes, vec![0.0]);
        assert_eq!(snap[0].buttons, vec![false]);
        assert_eq!(snap[0].hats, vec![-1]);
    }

    #[test]
    fn test_count_event_published() {
        let state = StationState::shared();
        let rx = state.watch();
        let js = JoystickSet::new(Arc::clone(&state));

        js.add(1, 1, 0);
        js.remove_all();

        let events: Vec<_> = rx.try_iter().collect();
        assert!(matches!(
            events[0],
            crate::events::Event::JoystickCountChanged(1)
        ));
        assert!(matches!(
            events[1],
            crate::events::Event::JoystickCountChanged(0)
        ));
    }

    #[test]
    fn test_geometry_capped() {
        let js = set();
        js.add(50, 99, 9);
        let snap = js.snapshot();
        assert_eq!(snap[0].axes.len(), MAX_AXES);
        assert_eq!(snap[0].buttons.len(), MAX_BUTTONS);
        assert_eq!(snap[0].hats.len(), MAX_HATS);
    }
}
