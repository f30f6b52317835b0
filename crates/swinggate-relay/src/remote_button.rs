//! Remote push button: a node that asks the gate to open over the radio.
//!
//! The button is debounced with the same window as the controller's own open
//! button, and every accepted press sends one open request frame straight to
//! the controller. Nothing is acknowledged; a lost frame means pressing again.

use swinggate_core::MacAddress;
use swinggate_core::constants::BUTTON_DEBOUNCE_MS;
use swinggate_hardware::{DebouncedInput, InputLine, RadioTransport};
use swinggate_protocol::RelayFrame;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::Result;

#[derive(Debug)]
pub struct RemoteButton<L: InputLine, T> {
    input: DebouncedInput<L>,
    presses: mpsc::UnboundedReceiver<()>,
    radio: T,
    controller: MacAddress,
}

impl<L, T> RemoteButton<L, T>
where
    L: InputLine,
    T: RadioTransport,
{
    /// # Errors
    ///
    /// Returns the radio's error if the controller cannot be added as a peer.
    pub fn new(line: L, mut radio: T, controller: MacAddress) -> Result<Self> {
        radio.add_peer(controller)?;
        let (tx, presses) = mpsc::unbounded_channel();
        let input = DebouncedInput::new(
            line,
            move || {
                let _ = tx.send(());
            },
            BUTTON_DEBOUNCE_MS,
        );
        Ok(Self {
            input,
            presses,
            radio,
            controller,
        })
    }

    pub fn controller(&self) -> MacAddress {
        self.controller
    }

    /// Watch the button and send an open request per accepted press.
    ///
    /// # Errors
    ///
    /// Returns the line's error once the button can no longer be read.
    pub async fn run(self) -> Result<()> {
        let Self {
            input,
            mut presses,
            mut radio,
            controller,
        } = self;
        info!(address = %radio.address(), %controller, window_ms = input.window_ms(), "Remote button started");

        let watcher = input.watch();
        tokio::pin!(watcher);
        loop {
            tokio::select! {
                result = &mut watcher => return result.map_err(Into::into),
                Some(()) = presses.recv() => request_open(&mut radio, controller),
            }
        }
    }
}

/// Send failures are logged only; the radio never retries.
fn request_open<T: RadioTransport>(radio: &mut T, controller: MacAddress) {
    match radio.send(controller, &RelayFrame::OpenRequest.encode()) {
        Ok(()) => info!(%controller, "Open request sent"),
        Err(e) => warn!(%controller, error = %e, "Failed to send open request"),
    }
}
