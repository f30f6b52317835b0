//! In-memory radio bus connecting mock nodes.
//!
//! Every node attached to a [`MockRadioBus`] gets a [`MockRadio`] endpoint.
//! Frames are delivered immediately into the destination's inbox, unless the
//! destination is not attached or the link between the two nodes has been
//! cut, in which case the frame silently vanishes. This is the loss model of
//! the real radio: the sender never learns about it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use swinggate_core::MacAddress;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::traits::RadioTransport;
use crate::types::Datagram;
use crate::{HardwareError, Result};

#[derive(Debug, Default)]
struct BusState {
    inboxes: HashMap<MacAddress, mpsc::UnboundedSender<Datagram>>,
    cut_links: HashSet<(MacAddress, MacAddress)>,
    log: Vec<(MacAddress, MacAddress, Bytes)>,
    dropped: usize,
}

/// Shared medium of the mock radio network.
///
/// # Examples
///
/// ```
/// use swinggate_hardware::mock::MockRadioBus;
/// use swinggate_hardware::traits::RadioTransport;
///
/// # #[tokio::main] async fn main() -> swinggate_hardware::Result<()> {
/// let bus = MockRadioBus::new();
/// let reader_mac = "84:0d:8e:ae:59:66".parse()?;
/// let runner_mac = "1c:69:20:ce:fa:24".parse()?;
///
/// let mut reader = bus.attach(reader_mac);
/// let mut runner = bus.attach(runner_mac);
///
/// reader.add_peer(runner_mac)?;
/// reader.send(runner_mac, &[0x01])?;
///
/// let frame = runner.recv().await?;
/// assert_eq!(frame.from, reader_mac);
/// assert_eq!(&frame.payload[..], &[0x01]);
/// # Ok(()) }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockRadioBus {
    state: Arc<Mutex<BusState>>,
}

impl MockRadioBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a node. Attaching an address again replaces the previous node's inbox.
    pub fn attach(&self, address: MacAddress) -> MockRadio {
        let (tx, rx) = mpsc::unbounded_channel();
        lock(&self.state).inboxes.insert(address, tx);
        debug!(%address, "Radio node attached");
        MockRadio {
            address,
            peers: HashSet::new(),
            inbox: rx,
            bus: self.clone(),
        }
    }

    /// Cut or restore the link from `from` to `to`. Links are one-way.
    pub fn set_link(&self, from: MacAddress, to: MacAddress, up: bool) {
        let mut state = lock(&self.state);
        if up {
            state.cut_links.remove(&(from, to));
        } else {
            state.cut_links.insert((from, to));
        }
    }

    /// Cut or restore the links in both directions between two nodes.
    pub fn set_link_both(&self, a: MacAddress, b: MacAddress, up: bool) {
        self.set_link(a, b, up);
        self.set_link(b, a, up);
    }

    /// Every delivered frame as `(from, to, payload)`, oldest first.
    pub fn delivered(&self) -> Vec<(MacAddress, MacAddress, Bytes)> {
        lock(&self.state).log.clone()
    }

    /// Number of frames that were lost.
    pub fn dropped(&self) -> usize {
        lock(&self.state).dropped
    }

    fn deliver(&self, from: MacAddress, to: MacAddress, payload: &[u8]) {
        let mut state = lock(&self.state);
        if state.cut_links.contains(&(from, to)) {
            state.dropped += 1;
            trace!(%from, %to, "Frame lost on cut link");
            return;
        }

        let payload = Bytes::copy_from_slice(payload);
        let delivered = state
            .inboxes
            .get(&to)
            .is_some_and(|inbox| inbox.send(Datagram::new(from, payload.clone())).is_ok());

        if delivered {
            state.log.push((from, to, payload));
        } else {
            state.dropped += 1;
            trace!(%from, %to, "Frame lost, no receiver");
        }
    }
}

/// One node's endpoint on a [`MockRadioBus`].
#[derive(Debug)]
pub struct MockRadio {
    address: MacAddress,
    peers: HashSet<MacAddress>,
    inbox: mpsc::UnboundedReceiver<Datagram>,
    bus: MockRadioBus,
}

impl MockRadio {
    pub fn peers(&self) -> impl Iterator<Item = &MacAddress> {
        self.peers.iter()
    }
}

impl RadioTransport for MockRadio {
    fn address(&self) -> MacAddress {
        self.address
    }

    fn add_peer(&mut self, peer: MacAddress) -> Result<()> {
        self.peers.insert(peer);
        Ok(())
    }

    fn send(&mut self, peer: MacAddress, payload: &[u8]) -> Result<()> {
        if !self.peers.contains(&peer) {
            return Err(HardwareError::unknown_peer(peer));
        }
        self.bus.deliver(self.address, peer, payload);
        Ok(())
    }

    async fn recv(&mut self) -> Result<Datagram> {
        self.inbox
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(format!("radio {}", self.address)))
    }

    fn try_recv(&mut self) -> Result<Option<Datagram>> {
        match self.inbox.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(mpsc::error::TryRecvError::Empty) => Ok(None),
            Err(mpsc::error::TryRecvError::Disconnected) => Err(HardwareError::disconnected(
                format!("radio {}", self.address),
            )),
        }
    }
}

fn lock(state: &Mutex<BusState>) -> MutexGuard<'_, BusState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
