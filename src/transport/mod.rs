//! Datagram transport layer
//!
//! Each peer link owns one UDP socket described by a [`SocketSpec`]: bound
//! on the input port for ingress, sending to the peer host on the output
//! port. The [`Datagram`] trait is the seam that lets the scheduler run
//! against an in-memory transport in tests.

use crate::error::Result;

mod udp;
pub use udp::UdpLink;

mod mock;
pub use mock::MockLink;

/// UDP socket description for one peer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SocketSpec {
    /// Local port we receive the peer's datagrams on
    pub input_port: u16,
    /// Remote port we address the peer's datagrams to
    pub output_port: u16,
    /// When set, no socket is bound for this peer at all
    pub disabled: bool,
}

impl SocketSpec {
    pub const fn udp(input_port: u16, output_port: u16) -> Self {
        Self {
            input_port,
            output_port,
            disabled: false,
        }
    }

    pub const fn disabled() -> Self {
        Self {
            input_port: 0,
            output_port: 0,
            disabled: true,
        }
    }
}

/// The four sockets a protocol era defines
#[derive(Debug, Clone, Copy)]
pub struct SocketLayout {
    pub fms: SocketSpec,
    pub radio: SocketSpec,
    pub robot: SocketSpec,
    pub netconsole: SocketSpec,
}

/// Bidirectional datagram channel to one peer
///
/// `send_to` with an empty host falls back to the transport's learned peer
/// address (the source of the most recent inbound datagram); if neither is
/// known the send is silently skipped. `recv` returns `Ok(None)` on
/// timeout so callers can poll their shutdown flag.
pub trait Datagram: Send + Sync {
    fn send_to(&self, host: &str, data: &[u8]) -> Result<()>;

    fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>>;
}
