//! UDP transport implementation

use super::{Datagram, SocketSpec};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

/// Receive timeout, so the receive threads can poll their shutdown flag
const RECV_TIMEOUT: Duration = Duration::from_millis(100);

/// UDP link to one peer
pub struct UdpLink {
    socket: UdpSocket,
    output_port: u16,
    /// Source of the most recent inbound datagram; used as the send target
    /// when no host is configured (how the FMS address is learned)
    learned_peer: Mutex<Option<IpAddr>>,
    /// Hostname resolution cache; `.local` robot names go through the
    /// system resolver and are worth caching between 20 ms cycles
    resolved: Mutex<HashMap<String, SocketAddr>>,
}

impl UdpLink {
    /// Bind the link's input port on all interfaces
    pub fn open(spec: &SocketSpec) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", spec.input_port))?;
        socket.set_read_timeout(Some(RECV_TIMEOUT))?;

        log::info!(
            "Opened UDP link: in port {}, out port {}",
            spec.input_port,
            spec.output_port
        );

        Ok(Self {
            socket,
            output_port: spec.output_port,
            learned_peer: Mutex::new(None),
            resolved: Mutex::new(HashMap::new()),
        })
    }

    fn resolve(&self, host: &str) -> Result<SocketAddr> {
        if let Some(addr) = self.resolved.lock().get(host) {
            return Ok(*addr);
        }

        let addr = (host, self.output_port)
            .to_socket_addrs()
            .map_err(|e| Error::AddressLookup(format!("{}: {}", host, e)))?
            .next()
            .ok_or_else(|| Error::AddressLookup(format!("{}: no addresses", host)))?;

        self.resolved.lock().insert(host.to_string(), addr);
        Ok(addr)
    }
}

impl Datagram for UdpLink {
    fn send_to(&self, host: &str, data: &[u8]) -> Result<()> {
        let target = if host.is_empty() {
            // Peer address not configured; use the learned source, if any
            match *self.learned_peer.lock() {
                Some(ip) => SocketAddr::new(ip, self.output_port),
                None => return Ok(()),
            }
        } else {
            self.resolve(host)?
        };

        if let Err(e) = self.socket.send_to(data, target) {
            // A failed send may mean a stale resolution; retry fresh next time
            self.resolved.lock().remove(host);
            return Err(e.into());
        }
        Ok(())
    }

    fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.socket.recv_from(buf) {
            Ok((n, src)) => {
                *self.learned_peer.lock() = Some(src.ip());
                Ok(Some(n))
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
