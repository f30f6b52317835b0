//! Runner node: the hub between reader stations and the admin node.
//!
//! The runner is stateless. It forwards frames verbatim and never looks at
//! their content:
//!
//! ```text
//! reader 1 ┐                 ┌──▶ admin
//! reader 2 ├──▶ runner ──────┤
//! reader n ┘         ▲       │
//!                    └───────┘ admin replies go to every reader
//! ```
//!
//! Frames from any other address are dropped.

use swinggate_core::{MacAddress, RelayConfig};
use swinggate_hardware::{Datagram, RadioTransport};
use tracing::{debug, info, warn};

use crate::error::{RelayError, Result};

#[derive(Debug, Clone)]
pub struct Runner {
    admin: MacAddress,
    readers: Vec<MacAddress>,
}

impl Runner {
    /// # Errors
    ///
    /// Returns `RelayError::NoRoute` if no reader is known or the admin
    /// address is also listed as a reader.
    pub fn new(admin: MacAddress, readers: Vec<MacAddress>) -> Result<Self> {
        if readers.is_empty() {
            return Err(RelayError::no_route("runner needs at least one reader"));
        }
        if readers.contains(&admin) {
            return Err(RelayError::no_route(format!(
                "admin {admin} is also listed as a reader"
            )));
        }
        Ok(Self { admin, readers })
    }

    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        Self::new(config.admin, config.readers.clone())
    }

    pub fn admin(&self) -> MacAddress {
        self.admin
    }

    pub fn readers(&self) -> &[MacAddress] {
        &self.readers
    }

    /// Destinations of a frame received from `from`.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::UnknownSender` for a sender that is neither a
    /// known reader nor the admin.
    pub fn route(&self, from: MacAddress) -> Result<Vec<MacAddress>> {
        if from == self.admin {
            Ok(self.readers.clone())
        } else if self.readers.contains(&from) {
            Ok(vec![self.admin])
        } else {
            Err(RelayError::UnknownSender { peer: from })
        }
    }

    /// Register the admin and every reader as peers of `radio`.
    ///
    /// # Errors
    ///
    /// Returns the radio's error if a peer is refused.
    pub fn register<T: RadioTransport>(&self, radio: &mut T) -> Result<()> {
        radio.add_peer(self.admin)?;
        for reader in &self.readers {
            radio.add_peer(*reader)?;
        }
        Ok(())
    }

    /// Forward one datagram. Returns the number of frames sent.
    ///
    /// Send failures are logged and skipped; a lost frame is indistinguishable
    /// from a frame lost in the air.
    pub fn forward<T: RadioTransport>(&self, radio: &mut T, datagram: &Datagram) -> usize {
        let destinations = match self.route(datagram.from) {
            Ok(destinations) => destinations,
            Err(e) => {
                warn!(error = %e, "Dropping frame");
                return 0;
            }
        };

        let mut sent = 0;
        for to in destinations {
            match radio.send(to, &datagram.payload) {
                Ok(()) => {
                    debug!(from = %datagram.from, %to, len = datagram.payload.len(), "Frame forwarded");
                    sent += 1;
                }
                Err(e) => warn!(%to, error = %e, "Failed to forward frame"),
            }
        }
        sent
    }

    /// Register peers, then forward frames until the radio shuts down.
    ///
    /// Every wake-up drains all buffered frames before waiting again.
    ///
    /// # Errors
    ///
    /// Returns the radio's error once it can no longer receive.
    pub async fn run<T: RadioTransport>(&self, mut radio: T) -> Result<()> {
        self.register(&mut radio)?;
        info!(address = %radio.address(), admin = %self.admin, readers = self.readers.len(), "Runner started");

        loop {
            let datagram = radio.recv().await?;
            self.forward(&mut radio, &datagram);
            while let Some(datagram) = radio.try_recv()? {
                self.forward(&mut radio, &datagram);
            }
        }
    }
}
