//! Hardware device trait definitions.
//!
//! These traits are the contract between the gate logic and the physical
//! world: digital input and output lines, a monotonic millisecond clock, the
//! RFID chip of a reader station, its status display and the point-to-point
//! radio. Mock
//! implementations live in [`mock`](crate::mock).
//!
//! Methods that the runtime awaits from spawned tasks return
//! `impl Future + Send` rather than using `async fn`, so that generic code can
//! move them onto the Tokio executor. Implementations may still be written
//! with `async fn`.

use std::future::Future;
use std::time::Duration;

use swinggate_core::{CardUid, InputId, MacAddress};

use crate::error::Result;
use crate::types::Datagram;

/// A digital input line that raises edge interrupts.
///
/// "Asserted" hides the electrical polarity: an active-low push button and an
/// active-high reed contact both report `true` while triggered.
///
/// # Examples
///
/// ```
/// use swinggate_hardware::mock::MockInput;
/// use swinggate_hardware::traits::InputLine;
/// use swinggate_core::InputId;
///
/// # #[tokio::main] async fn main() -> swinggate_hardware::Result<()> {
/// let (line, handle) = MockInput::new(InputId::OpenButton);
/// handle.assert_line();
///
/// line.next_edge().await?;
/// assert!(line.is_asserted());
/// # Ok(()) }
/// ```
pub trait InputLine: Send + Sync {
    /// Which input this line is wired to.
    fn id(&self) -> InputId;

    /// Sample the current level.
    fn is_asserted(&self) -> bool;

    /// Wait for the next raw edge towards the asserted level.
    ///
    /// Raw edges are not debounced; contact bounce produces several of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is disconnected.
    fn next_edge(&self) -> impl Future<Output = Result<()>> + Send;
}

/// A digital output line (relay coil, lamp driver).
pub trait OutputLine: Send + Sync {
    /// Drive the line high (`true`) or low (`false`).
    ///
    /// # Errors
    ///
    /// Returns an error if the line cannot be driven.
    fn set_level(&mut self, high: bool) -> impl Future<Output = Result<()>> + Send;

    /// Level the line was last driven to.
    fn level(&self) -> bool;
}

/// Monotonic millisecond clock.
///
/// The counter wraps around at `u32::MAX`; compare readings with
/// `wrapping_sub`, never with `<`.
pub trait MonotonicClock: Send + Sync {
    fn now_ms(&self) -> u32;
}

/// RFID/NFC chip driver of a reader station.
pub trait RfidReader: Send + Sync {
    /// Probe the field for a card.
    ///
    /// Returns `true` if a card answered the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the chip does not respond.
    fn request_card(&mut self) -> impl Future<Output = Result<bool>> + Send;

    /// Run anti-collision and read the UID of the card in the field.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::CardReadError` if no card could be read.
    fn read_uid(&mut self) -> impl Future<Output = Result<CardUid>> + Send;
}

/// Small text display of a reader station.
pub trait StatusDisplay: Send + Sync {
    /// Clear the display and show `lines` top to bottom.
    ///
    /// # Errors
    ///
    /// Returns an error if the text cannot be rendered.
    fn show(&mut self, lines: &[&str]) -> Result<()>;
}

/// Connectionless point-to-point radio.
///
/// Delivery is best-effort: frames may be lost or reordered, and nothing is
/// acknowledged. Frames to a peer must be preceded by [`add_peer`](Self::add_peer).
pub trait RadioTransport: Send + Sync {
    /// Address of this node.
    fn address(&self) -> MacAddress;

    /// Register a peer. Registering a known peer again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio refuses the peer.
    fn add_peer(&mut self, peer: MacAddress) -> Result<()>;

    /// Queue `payload` for `peer`.
    ///
    /// Success only means the frame left this node.
    ///
    /// # Errors
    ///
    /// Returns `HardwareError::UnknownPeer` if `peer` was never added.
    fn send(&mut self, peer: MacAddress, payload: &[u8]) -> Result<()>;

    /// Wait for the next received frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio is shut down.
    fn recv(&mut self) -> impl Future<Output = Result<Datagram>> + Send;

    /// Take a buffered frame without waiting.
    ///
    /// # Errors
    ///
    /// Returns an error if the radio is shut down.
    fn try_recv(&mut self) -> Result<Option<Datagram>>;

    /// Wait at most `timeout` for the next frame. `None` means the wait timed out.
    ///
    /// # Errors
    ///
    /// Same as [`recv`](Self::recv).
    fn recv_timeout(
        &mut self,
        timeout: Duration,
    ) -> impl Future<Output = Result<Option<Datagram>>> + Send {
        async move {
            match tokio::time::timeout(timeout, self.recv()).await {
                Ok(frame) => frame.map(Some),
                Err(_) => Ok(None),
            }
        }
    }
}
