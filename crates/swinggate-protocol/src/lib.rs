//! Byte-exact codec for the gate relay radio protocol.
//!
//! Frames have no header, length field or checksum. The radio transport
//! delimits frames, and the first byte selects the command:
//!
//! | Bytes          | Frame                                  |
//! |----------------|----------------------------------------|
//! | `01`           | [`RelayFrame::OpenRequest`]            |
//! | `A1 ‖ UID`     | [`RelayFrame::CardScan`] (4-10 byte UID) |
//! | `A2`           | [`RelayFrame::AccessGranted`]          |
//! | `A3`           | [`RelayFrame::AccessDenied`]           |

pub mod commands;
pub mod frame;

pub use commands::CommandCode;
pub use frame::RelayFrame;
