//! Relay nodes carrying remote open requests to the gate controller.
//!
//! ```text
//! ReaderNode ──CardScan──▶ Runner ──CardScan──▶ AdminNode ──OpenRequest──▶ controller
//!      ▲                     │  ▲                   │
//!      └──Granted/Denied─────┘  └──Granted/Denied───┘
//! ```
//!
//! A [`RemoteButton`] sends open requests to the controller directly,
//! without going through the admin.
//!
//! The radio is best-effort: nothing is acknowledged or retried. A reader
//! that hears nothing within its response timeout tells the card holder to
//! try again.
//!
//! All nodes are generic over [`RadioTransport`](swinggate_hardware::RadioTransport),
//! so they run unchanged on the in-memory
//! [`MockRadioBus`](swinggate_hardware::mock::MockRadioBus).

pub mod admin;
pub mod error;
pub mod reader;
pub mod remote_button;
pub mod runner;

pub use admin::{AccessPolicy, AdminNode, AllowList, Decision};
pub use error::{RelayError, Result};
pub use reader::{ReaderNode, ScanOutcome};
pub use remote_button::RemoteButton;
pub use runner::Runner;
