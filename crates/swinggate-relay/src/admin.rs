//! Admin node: decides whether a scanned card may pass.
//!
//! The admin answers every card scan with a decision frame sent back to the
//! node it came from (normally the runner), and on a grant sends an open
//! request straight to the gate controller.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use swinggate_core::{CardUid, MacAddress};
use swinggate_hardware::{Datagram, RadioTransport};
use swinggate_protocol::RelayFrame;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Access decision for a scanned card.
pub trait AccessPolicy: Send + Sync {
    fn is_allowed(&self, uid: &CardUid) -> bool;
}

/// Cards allowed through, everything else is denied.
///
/// ```
/// use swinggate_core::CardUid;
/// use swinggate_relay::{AccessPolicy, AllowList};
///
/// let badge: CardUid = "0x04ABCDEF".parse().unwrap();
/// let list = AllowList::new([badge.clone()]);
/// assert!(list.is_allowed(&badge));
/// assert!(!list.is_allowed(&"0xDEADBEEF".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowList {
    cards: HashSet<CardUid>,
}

impl AllowList {
    pub fn new(cards: impl IntoIterator<Item = CardUid>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }

    /// Load a JSON allow list: `{"cards": ["0x04ABCDEF", ...]}`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::ConfigParse`
    /// for malformed JSON or UIDs.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(swinggate_core::Error::from)?;
        let list: AllowList = serde_json::from_str(&content).map_err(swinggate_core::Error::from)?;
        debug!(path = %path.as_ref().display(), cards = list.len(), "Allow list loaded");
        Ok(list)
    }

    pub fn insert(&mut self, uid: CardUid) -> bool {
        self.cards.insert(uid)
    }

    pub fn remove(&mut self, uid: &CardUid) -> bool {
        self.cards.remove(uid)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl AccessPolicy for AllowList {
    fn is_allowed(&self, uid: &CardUid) -> bool {
        self.cards.contains(uid)
    }
}

/// Outcome of handling one frame at the admin node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Granted,
    Denied,
}

/// Admin/decision node.
#[derive(Debug)]
pub struct AdminNode<P> {
    policy: P,
    controller: MacAddress,
    granted: u64,
    denied: u64,
}

impl<P: AccessPolicy> AdminNode<P> {
    pub fn new(policy: P, controller: MacAddress) -> Self {
        Self {
            policy,
            controller,
            granted: 0,
            denied: 0,
        }
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn granted(&self) -> u64 {
        self.granted
    }

    pub fn denied(&self) -> u64 {
        self.denied
    }

    /// Handle one received frame.
    ///
    /// Returns the decision taken, or `None` if the frame was not a card scan.
    /// Malformed frames are logged and ignored.
    ///
    /// # Errors
    ///
    /// Returns the radio's error if the sender cannot be registered as a peer.
    pub fn handle<T: RadioTransport>(
        &mut self,
        radio: &mut T,
        datagram: &Datagram,
    ) -> Result<Option<Decision>> {
        let uid = match RelayFrame::decode(&datagram.payload) {
            Ok(RelayFrame::CardScan(uid)) => uid,
            Ok(frame) => {
                debug!(from = %datagram.from, %frame, "Ignoring frame");
                return Ok(None);
            }
            Err(e) => {
                warn!(from = %datagram.from, error = %e, "Malformed frame");
                return Ok(None);
            }
        };

        let decision = if self.policy.is_allowed(&uid) {
            self.granted += 1;
            info!(%uid, "Access granted");
            Decision::Granted
        } else {
            self.denied += 1;
            info!(%uid, "Access denied");
            Decision::Denied
        };

        let reply = match decision {
            Decision::Granted => RelayFrame::AccessGranted,
            Decision::Denied => RelayFrame::AccessDenied,
        };
        radio.add_peer(datagram.from)?;
        if let Err(e) = radio.send(datagram.from, &reply.encode()) {
            warn!(to = %datagram.from, error = %e, "Failed to send decision");
        }

        if decision == Decision::Granted {
            if let Err(e) = radio.send(self.controller, &RelayFrame::OpenRequest.encode()) {
                warn!(controller = %self.controller, error = %e, "Failed to send open request");
            }
        }

        Ok(Some(decision))
    }

    /// Answer card scans until the radio shuts down.
    ///
    /// # Errors
    ///
    /// Returns the radio's error once it can no longer receive.
    pub async fn run<T: RadioTransport>(&mut self, mut radio: T) -> Result<()> {
        radio.add_peer(self.controller)?;
        info!(address = %radio.address(), controller = %self.controller, "Admin node started");

        loop {
            let datagram = radio.recv().await?;
            self.handle(&mut radio, &datagram)?;
            while let Some(datagram) = radio.try_recv()? {
                self.handle(&mut radio, &datagram)?;
            }
        }
    }
}
