//! Typed change events published by the station state
//!
//! Two delivery mechanisms are supported:
//!
//! - **Callbacks** registered per [`Topic`], invoked synchronously on the
//!   thread that performed the mutation, after the state lock has been
//!   released. Callbacks must be quick, must not re-enter the setter of the
//!   field they observe, and must not call operations that touch the active
//!   protocol (`request_reboot` and friends) — use a channel watcher for
//!   that.
//! - **Channel watchers** — an unbounded channel carrying every event, for
//!   UI event loops that prefer polling.

use crate::types::{Alliance, ControlMode, Peer, Position};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

/// Event topics, corresponding to groups of station-state fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    TeamNumber,
    Enabled,
    Mode,
    Station,
    EmergencyStop,
    Voltage,
    RobotCode,
    Comms,
    Telemetry,
    Joysticks,
    Message,
    Status,
}

/// A single observed change
#[derive(Debug, Clone)]
pub enum Event {
    TeamNumberChanged(u16),
    EnabledChanged(bool),
    ModeChanged(ControlMode),
    StationChanged {
        alliance: Alliance,
        position: Position,
    },
    EmergencyStopChanged(bool),
    VoltageChanged(f64),
    RobotCodeChanged(bool),
    CommsChanged {
        peer: Peer,
        connected: bool,
    },
    CpuUsageChanged(u8),
    RamUsageChanged(u8),
    DiskUsageChanged(u8),
    CanUtilizationChanged(u8),
    JoystickCountChanged(usize),
    /// Advisory or netconsole line, forwarded verbatim
    Message(String),
    /// Derived human-readable station status
    StatusChanged(String),
}

impl Event {
    /// The topic this event is published under
    pub fn topic(&self) -> Topic {
        match self {
            Event::TeamNumberChanged(_) => Topic::TeamNumber,
            Event::EnabledChanged(_) => Topic::Enabled,
            Event::ModeChanged(_) => Topic::Mode,
            Event::StationChanged { .. } => Topic::Station,
            Event::EmergencyStopChanged(_) => Topic::EmergencyStop,
            Event::VoltageChanged(_) => Topic::Voltage,
            Event::RobotCodeChanged(_) => Topic::RobotCode,
            Event::CommsChanged { .. } => Topic::Comms,
            Event::CpuUsageChanged(_)
            | Event::RamUsageChanged(_)
            | Event::DiskUsageChanged(_)
            | Event::CanUtilizationChanged(_) => Topic::Telemetry,
            Event::JoystickCountChanged(_) => Topic::Joysticks,
            Event::Message(_) => Topic::Message,
            Event::StatusChanged(_) => Topic::Status,
        }
    }
}

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Subscription registry and event fan-out
#[derive(Default)]
pub struct EventBus {
    callbacks: Mutex<Vec<(Topic, Callback)>>,
    watchers: Mutex<Vec<Sender<Event>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback for one topic
    pub fn subscribe<F>(&self, topic: Topic, callback: F)
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.callbacks.lock().push((topic, Arc::new(callback)));
    }

    /// Open a channel receiving every published event
    pub fn watch(&self) -> Receiver<Event> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.watchers.lock().push(tx);
        rx
    }

    /// Deliver an event to all matching subscribers
    ///
    /// The subscriber list lock is dropped before any callback runs, so a
    /// callback may itself subscribe.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();

        let matching: Vec<Callback> = self
            .callbacks
            .lock()
            .iter()
            .filter(|(t, _)| *t == topic)
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for cb in matching {
            cb(&event);
        }

        // Drop watchers whose receiving side has gone away
        self.watchers
            .lock()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_callback_topic_filter() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let h = Arc::clone(&hits);
        bus.subscribe(Topic::Voltage, move |_| {
            h.fetch_add(1, Ordering::Relaxed);
        });

        bus.publish(Event::VoltageChanged(12.5));
        bus.publish(Event::EnabledChanged(true));
        bus.publish(Event::VoltageChanged(11.9));

        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_watcher_receives_everything() {
        let bus = EventBus::new();
        let rx = bus.watch();

        bus.publish(Event::EnabledChanged(true));
        bus.publish(Event::Message("hello".to_string()));

        assert!(matches!(rx.try_recv().unwrap(), Event::EnabledChanged(true)));
        assert!(matches!(rx.try_recv().unwrap(), Event::Message(_)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_disconnected_watcher_pruned() {
        let bus = EventBus::new();
        let rx = bus.watch();
        drop(rx);

        // Must not error or grow the watcher list
        bus.publish(Event::EnabledChanged(false));
        assert!(bus.watchers.lock().is_empty());
    }
}
