//! Mock transport for testing

use super::Datagram;
use crate::error::Result;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// In-memory datagram channel for unit testing the scheduler
#[derive(Clone, Default)]
pub struct MockLink {
    inner: Arc<MockLinkInner>,
}

#[derive(Default)]
struct MockLinkInner {
    inbound: Mutex<VecDeque<Vec<u8>>>,
    sent: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockLink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a datagram to be returned by the next `recv`
    pub fn inject(&self, data: &[u8]) {
        self.inner.inbound.lock().push_back(data.to_vec());
    }

    /// All datagrams sent so far, with their target hosts
    pub fn sent(&self) -> Vec<(String, Vec<u8>)> {
        self.inner.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.inner.sent.lock().len()
    }

    pub fn clear_sent(&self) {
        self.inner.sent.lock().clear();
    }
}

impl Datagram for MockLink {
    fn send_to(&self, host: &str, data: &[u8]) -> Result<()> {
        self.inner.sent.lock().push((host.to_string(), data.to_vec()));
        Ok(())
    }

    fn recv(&self, buf: &mut [u8]) -> Result<Option<usize>> {
        match self.inner.inbound.lock().pop_front() {
            Some(datagram) => {
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);
                Ok(Some(n))
            }
            None => Ok(None),
        }
    }
}
