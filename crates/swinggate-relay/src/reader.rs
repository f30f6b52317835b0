//! Reader station: scans a card and shows the admin's decision.
//!
//! One scan cycle:
//!
//! 1. show "Please scan / your card." and poll the RFID chip,
//! 2. show the scanned UID and send a card scan frame to the runner,
//! 3. wait a bounded time for the decision and show it.
//!
//! There is no automatic retry. A lost request or a lost reply both end in
//! "No response from Admin Board." and the card holder scans again.

use std::time::Duration;

use swinggate_core::constants::DEFAULT_RESPONSE_TIMEOUT_MS;
use swinggate_core::{CardUid, MacAddress};
use swinggate_hardware::{RadioTransport, RfidReader, StatusDisplay};
use swinggate_protocol::RelayFrame;
use tracing::{debug, info, trace, warn};

use crate::error::Result;

const PROMPT: &[&str] = &["Please scan", "your card."];
const GRANTED: &[&str] = &["Access granted"];
const DENIED: &[&str] = &["Access denied"];
const NO_RESPONSE: &[&str] = &["No response from", "Admin Board.", "Try again."];
const UNEXPECTED: &[&str] = &["Unexpected response", "from Admin Board."];

/// Result of one scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    Granted,
    Denied,
    /// No frame arrived before the response timeout.
    NoResponse,
    /// A frame arrived that is not a decision.
    Unexpected,
}

impl ScanOutcome {
    fn screen(self) -> &'static [&'static str] {
        match self {
            ScanOutcome::Granted => GRANTED,
            ScanOutcome::Denied => DENIED,
            ScanOutcome::NoResponse => NO_RESPONSE,
            ScanOutcome::Unexpected => UNEXPECTED,
        }
    }
}

/// A reader station with its RFID chip, display and radio.
#[derive(Debug)]
pub struct ReaderNode<R, D, T> {
    rfid: R,
    display: D,
    radio: T,
    runner: MacAddress,
    controller: Option<MacAddress>,
    response_timeout: Duration,
    poll_interval: Duration,
    hold: Duration,
}

impl<R, D, T> ReaderNode<R, D, T>
where
    R: RfidReader,
    D: StatusDisplay,
    T: RadioTransport,
{
    /// # Errors
    ///
    /// Returns the radio's error if the runner cannot be added as a peer.
    pub fn new(rfid: R, display: D, mut radio: T, runner: MacAddress) -> Result<Self> {
        radio.add_peer(runner)?;
        Ok(Self {
            rfid,
            display,
            radio,
            runner,
            controller: None,
            response_timeout: Duration::from_millis(DEFAULT_RESPONSE_TIMEOUT_MS),
            poll_interval: Duration::from_millis(100),
            hold: Duration::from_secs(2),
        })
    }

    /// Also send the open request to the controller on a grant.
    ///
    /// Used by readers mounted inside the gate, which talk to the controller
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns the radio's error if the controller cannot be added as a peer.
    pub fn with_controller(mut self, controller: MacAddress) -> Result<Self> {
        self.radio.add_peer(controller)?;
        self.controller = Some(controller);
        Ok(self)
    }

    pub fn with_response_timeout(mut self, timeout: Duration) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// How long the scanned UID and the decision stay on screen.
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub fn address(&self) -> MacAddress {
        self.radio.address()
    }

    /// Poll the chip until a card's UID has been read.
    ///
    /// Failed reads (card pulled away mid anti-collision) are logged and
    /// polling continues.
    ///
    /// # Errors
    ///
    /// Returns the error of a chip that stops responding to requests.
    pub async fn wait_for_card(&mut self) -> Result<CardUid> {
        loop {
            if self.rfid.request_card().await? {
                match self.rfid.read_uid().await {
                    Ok(uid) => return Ok(uid),
                    Err(e) => debug!(error = %e, "Card read failed, retrying"),
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Send a card scan and wait for the admin's decision.
    ///
    /// Frames already buffered from earlier exchanges are discarded first, so
    /// a late reply to a previous scan is not taken for this one.
    ///
    /// # Errors
    ///
    /// Returns the radio's error if it shuts down.
    pub async fn request_access(&mut self, uid: &CardUid) -> Result<ScanOutcome> {
        while let Some(stale) = self.radio.try_recv()? {
            trace!(from = %stale.from, "Discarding stale frame");
        }

        let frame = RelayFrame::CardScan(uid.clone());
        if let Err(e) = self.radio.send(self.runner, &frame.encode()) {
            warn!(runner = %self.runner, error = %e, "Failed to send card scan");
        }

        let outcome = match self.radio.recv_timeout(self.response_timeout).await? {
            None => ScanOutcome::NoResponse,
            Some(reply) => match RelayFrame::decode(&reply.payload) {
                Ok(RelayFrame::AccessGranted) => ScanOutcome::Granted,
                Ok(RelayFrame::AccessDenied) => ScanOutcome::Denied,
                Ok(other) => {
                    warn!(from = %reply.from, frame = %other, "Unexpected response");
                    ScanOutcome::Unexpected
                }
                Err(e) => {
                    warn!(from = %reply.from, error = %e, "Malformed response");
                    ScanOutcome::Unexpected
                }
            },
        };

        if outcome == ScanOutcome::Granted {
            if let Some(controller) = self.controller {
                if let Err(e) = self.radio.send(controller, &RelayFrame::OpenRequest.encode()) {
                    warn!(%controller, error = %e, "Failed to send open request");
                }
            }
        }
        Ok(outcome)
    }

    /// Run one full scan cycle and return its outcome.
    ///
    /// # Errors
    ///
    /// Returns the error of a chip or radio that stopped working.
    pub async fn scan_once(&mut self) -> Result<ScanOutcome> {
        self.show(PROMPT);
        let uid = self.wait_for_card().await?;
        info!(%uid, "Card scanned");

        let uid_text = uid.to_string();
        self.show(&["Scanned:", &uid_text, "Checking..."]);
        tokio::time::sleep(self.hold).await;

        let outcome = self.request_access(&uid).await?;
        info!(%uid, ?outcome, "Scan finished");
        self.show(outcome.screen());
        tokio::time::sleep(self.hold).await;
        Ok(outcome)
    }

    /// Scan cards forever.
    ///
    /// # Errors
    ///
    /// Returns the error of a chip or radio that stopped working.
    pub async fn run(&mut self) -> Result<()> {
        info!(address = %self.radio.address(), runner = %self.runner, "Reader started");
        loop {
            self.scan_once().await?;
        }
    }

    fn show(&mut self, lines: &[&str]) {
        if let Err(e) = self.display.show(lines) {
            warn!(error = %e, "Display update failed");
        }
    }
}
