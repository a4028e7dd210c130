//! Peer link scheduler and watchdogs
//!
//! Each enabled peer (FMS, radio, robot) gets two named threads: a send
//! loop pacing the protocol's cadence, and a receive loop parsing ingress.
//! A successful parse feeds the peer's watchdog; the send loop checks the
//! watchdog between cycles and, on expiry, drops the peer's comms flag and
//! invokes the protocol's reset hook. Each cycle edge runs as one critical
//! section under the shared protocol lock — expiry check, reset hook, and
//! packet construction on the send side; parse, watchdog feed, and the
//! comms-flag raise on the receive side — so a send and a receive on the
//! same peer are mutually exclusive with respect to the watchdog state,
//! the packet counters, and the action latches. The lock is only ever held
//! for in-memory work, never across a socket call, so one peer cannot
//! starve another's cadence.
//!
//! Installing a protocol tears down every task of the old one (signal,
//! then join) before the new descriptor is swapped in, so no out-of-era
//! packet is ever emitted.

use crate::joystick::JoystickSet;
use crate::protocol::{Era, Protocol};
use crate::state::StationState;
use crate::transport::{Datagram, UdpLink};
use crate::types::Peer;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Watchdogs expire after this many missed send intervals
const WATCHDOG_PERIODS: u32 = 3;

/// Receive buffer size; the largest frame in the family is the 2014 era's
/// 1024-byte packet, netconsole lines get the rest of the headroom
const RECV_BUFFER_SIZE: usize = 4096;

/// Edge-triggered peer watchdog
///
/// Starts idle (expired) so the reset hook never fires before the peer has
/// been heard from at least once.
pub(crate) struct Watchdog {
    timeout: Duration,
    last_feed: Instant,
    expired: bool,
}

impl Watchdog {
    pub(crate) fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            last_feed: Instant::now(),
            expired: true,
        }
    }

    /// Rearm; returns true on the rising edge (first feed since expiry)
    pub(crate) fn feed(&mut self) -> bool {
        self.last_feed = Instant::now();
        let rose = self.expired;
        self.expired = false;
        rose
    }

    /// Returns true exactly once per expiry edge
    pub(crate) fn check_expired(&mut self) -> bool {
        if !self.expired && self.last_feed.elapsed() >= self.timeout {
            self.expired = true;
            true
        } else {
            false
        }
    }
}

/// Handles of one peer's send/receive threads
pub(crate) struct PeerTask {
    shutdown: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

impl PeerTask {
    fn stop(mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::error!("Peer task thread panicked");
            }
        }
    }
}

/// The three peer links plus the netconsole listener
pub(crate) struct Comms {
    state: Arc<StationState>,
    joysticks: Arc<JoystickSet>,
    protocol: Arc<Mutex<Box<dyn Protocol>>>,
    era: Era,
    tasks: Vec<PeerTask>,
}

impl Comms {
    /// Install the given era and start its tasks
    pub(crate) fn start(state: Arc<StationState>, joysticks: Arc<JoystickSet>, era: Era) -> Self {
        let mut comms = Self {
            state,
            joysticks,
            protocol: Arc::new(Mutex::new(era.descriptor())),
            era,
            tasks: Vec::new(),
        };
        comms.spawn_all();
        log::info!("Protocol installed: {}", era);
        comms
    }

    pub(crate) fn era(&self) -> Era {
        self.era
    }

    /// Swap the active protocol: stop every task of the old descriptor,
    /// install a fresh one (counters and latches cleared by construction),
    /// then start the new tasks
    pub(crate) fn install(&mut self, era: Era) {
        log::info!("Switching protocol: {} -> {}", self.era, era);

        for task in self.tasks.drain(..) {
            task.stop();
        }

        *self.protocol.lock() = era.descriptor();
        self.era = era;

        // Link status is meaningless across eras
        for peer in [Peer::Fms, Peer::Radio, Peer::Robot] {
            self.state.set_peer_comms(peer, false);
        }

        self.spawn_all();
        log::info!("Protocol installed: {}", era);
    }

    pub(crate) fn request_reboot(&self) {
        log::info!("Robot reboot requested");
        self.protocol.lock().reboot_robot();
    }

    pub(crate) fn request_restart_code(&self) {
        log::info!("Robot code restart requested");
        self.protocol.lock().restart_robot_code();
    }

    fn spawn_all(&mut self) {
        let (timing, sockets) = {
            let proto = self.protocol.lock();
            (proto.timing(), proto.sockets())
        };

        for peer in [Peer::Fms, Peer::Radio, Peer::Robot] {
            let interval_ms = timing.interval_ms(peer);
            let spec = match peer {
                Peer::Fms => sockets.fms,
                Peer::Radio => sockets.radio,
                Peer::Robot => sockets.robot,
            };

            if interval_ms == 0 || spec.disabled {
                log::debug!("{}: link disabled by protocol", peer);
                continue;
            }

            match UdpLink::open(&spec) {
                Ok(link) => {
                    self.tasks.push(spawn_peer_task(
                        peer,
                        Duration::from_millis(interval_ms),
                        Arc::new(link),
                        Arc::clone(&self.protocol),
                        Arc::clone(&self.state),
                        Arc::clone(&self.joysticks),
                    ));
                }
                Err(e) => {
                    log::error!("{}: failed to open link: {}", peer, e);
                    self.state
                        .publish_message(format!("Failed to open {} link: {}", peer, e));
                }
            }
        }

        if !sockets.netconsole.disabled {
            match UdpLink::open(&sockets.netconsole) {
                Ok(link) => {
                    self.tasks
                        .push(spawn_netconsole_task(Arc::new(link), Arc::clone(&self.state)));
                }
                Err(e) => {
                    log::error!("netconsole: failed to open link: {}", e);
                    self.state
                        .publish_message(format!("Failed to open netconsole link: {}", e));
                }
            }
        }
    }
}

impl Drop for Comms {
    fn drop(&mut self) {
        for task in self.tasks.drain(..) {
            task.stop();
        }
    }
}

/// Spawn the send and receive threads for one peer link
pub(crate) fn spawn_peer_task(
    peer: Peer,
    interval: Duration,
    link: Arc<dyn Datagram>,
    protocol: Arc<Mutex<Box<dyn Protocol>>>,
    state: Arc<StationState>,
    joysticks: Arc<JoystickSet>,
) -> PeerTask {
    let shutdown = Arc::new(AtomicBool::new(false));
    let watchdog = Arc::new(Mutex::new(Watchdog::new(interval * WATCHDOG_PERIODS)));

    let send_handle = {
        let shutdown = Arc::clone(&shutdown);
        let watchdog = Arc::clone(&watchdog);
        let link = Arc::clone(&link);
        let protocol = Arc::clone(&protocol);
        let state = Arc::clone(&state);

        thread::Builder::new()
            .name(format!("{}-send", peer))
            .spawn(move || {
                send_loop(peer, interval, link, protocol, state, joysticks, watchdog, shutdown)
            })
            .expect("Failed to spawn send thread")
    };

    let recv_handle = {
        let shutdown = Arc::clone(&shutdown);

        thread::Builder::new()
            .name(format!("{}-recv", peer))
            .spawn(move || recv_loop(peer, link, protocol, state, watchdog, shutdown))
            .expect("Failed to spawn receive thread")
    };

    PeerTask {
        shutdown,
        handles: vec![send_handle, recv_handle],
    }
}

#[allow(clippy::too_many_arguments)]
fn send_loop(
    peer: Peer,
    interval: Duration,
    link: Arc<dyn Datagram>,
    protocol: Arc<Mutex<Box<dyn Protocol>>>,
    state: Arc<StationState>,
    joysticks: Arc<JoystickSet>,
    watchdog: Arc<Mutex<Watchdog>>,
    shutdown: Arc<AtomicBool>,
) {
    log::info!("{}: send loop started ({:?} interval)", peer, interval);

    let mut send_failures = 0u32;

    loop {
        let cycle_start = Instant::now();

        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        // ===== 1. WATCHDOG CHECK + PACKET CONSTRUCTION =====
        // One critical section: a concurrent parse on this peer can never
        // slip between the expiry edge and the reset hook, so a fed
        // watchdog is always observed before the latches are cleared.
        let (payload, host) = {
            let mut proto = protocol.lock();

            if watchdog.lock().check_expired() {
                log::warn!("{}: watchdog expired, link lost", peer);
                state.set_peer_comms(peer, false);
                proto.reset(peer, &state);
            }

            let custom = state.custom_address(peer);
            let host = if custom.is_empty() {
                proto.address(peer, &state)
            } else {
                custom
            };
            (proto.create_packet(peer, &state, &joysticks), host)
        };

        // ===== 2. SEND =====
        if !payload.is_empty() {
            match link.send_to(&host, &payload) {
                Ok(()) => {
                    if send_failures > 0 {
                        log::info!("{}: sends recovered after {} failures", peer, send_failures);
                        send_failures = 0;
                    }
                }
                Err(e) => {
                    send_failures += 1;
                    // First failure at warn, then throttled: mDNS lookups
                    // fail every cycle until the robot boots
                    if send_failures == 1 || send_failures % 250 == 0 {
                        log::warn!("{}: send error ({} so far): {}", peer, send_failures, e);
                    } else {
                        log::trace!("{}: send error: {}", peer, e);
                    }
                }
            }
        }

        // ===== 3. MAINTAIN INTERVAL =====
        let elapsed = cycle_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        } else {
            log::warn!(
                "{}: cycle overrun: {:?} (target: {:?})",
                peer,
                elapsed,
                interval
            );
        }
    }

    log::info!("{}: send loop stopped", peer);
}

fn recv_loop(
    peer: Peer,
    link: Arc<dyn Datagram>,
    protocol: Arc<Mutex<Box<dyn Protocol>>>,
    state: Arc<StationState>,
    watchdog: Arc<Mutex<Watchdog>>,
    shutdown: Arc<AtomicBool>,
) {
    log::debug!("{}: receive loop started", peer);

    let mut buffer = [0u8; RECV_BUFFER_SIZE];

    while !shutdown.load(Ordering::Relaxed) {
        match link.recv(&mut buffer) {
            Ok(Some(n)) => {
                // Parse, watchdog feed, and the comms-flag raise form one
                // critical section, mirroring the expiry path in the send
                // loop
                let mut proto = protocol.lock();
                match proto.read_packet(peer, &state, &buffer[..n]) {
                    Ok(()) => {
                        if watchdog.lock().feed() {
                            log::info!("{}: link established", peer);
                        }
                        state.set_peer_comms(peer, true);
                    }
                    Err(e) => {
                        // Malformed ingress: drop, do not feed the watchdog
                        log::debug!("{}: dropped packet: {}", peer, e);
                    }
                }
            }
            Ok(None) => {
                // Timeout; back off briefly so mock transports don't spin
                thread::sleep(Duration::from_millis(2));
            }
            Err(e) => {
                log::error!("{}: receive error: {}", peer, e);
                thread::sleep(Duration::from_millis(10));
            }
        }
    }

    log::debug!("{}: receive loop stopped", peer);
}

/// Spawn the netconsole listener: inbound datagrams are newline-delimited
/// human-readable text, forwarded verbatim to the message topic
pub(crate) fn spawn_netconsole_task(link: Arc<dyn Datagram>, state: Arc<StationState>) -> PeerTask {
    let shutdown = Arc::new(AtomicBool::new(false));

    let handle = {
        let shutdown = Arc::clone(&shutdown);

        thread::Builder::new()
            .name("netconsole".to_string())
            .spawn(move || {
                log::debug!("netconsole: listener started");
                let mut buffer = [0u8; RECV_BUFFER_SIZE];

                while !shutdown.load(Ordering::Relaxed) {
                    match link.recv(&mut buffer) {
                        Ok(Some(n)) => {
                            let text = String::from_utf8_lossy(&buffer[..n]);
                            for line in text.lines().filter(|l| !l.is_empty()) {
                                state.publish_message(line);
                            }
                        }
                        Ok(None) => {
                            thread::sleep(Duration::from_millis(2));
                        }
                        Err(e) => {
                            log::error!("netconsole: receive error: {}", e);
                            thread::sleep(Duration::from_millis(10));
                        }
                    }
                }

                log::debug!("netconsole: listener stopped");
            })
            .expect("Failed to spawn netconsole thread")
    };

    PeerTask {
        shutdown,
        handles: vec![handle],
    }
}
