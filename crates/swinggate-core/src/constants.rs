//! Core constants for the swing gate controller and its relay protocol.
//!
//! This module centralizes every timing, debounce window and wire code used
//! across the workspace. Runtime configuration ([`GateConfig`](crate::GateConfig))
//! defaults to these values; the protocol codes are fixed and must not change
//! without updating every node on the radio bus.
//!
//! # Relay Frame Layout
//!
//! Frames carry no header, length field or checksum. The radio transport
//! delimits frames, so the first byte is always the command code:
//!
//! ```text
//! 0x01               open request (controller)
//! 0xA1 <UID bytes>   card scan (reader -> admin)
//! 0xA2               access granted (admin -> reader)
//! 0xA3               access denied (admin -> reader)
//! ```
//!
//! # Usage
//!
//! ```
//! use swinggate_core::constants::*;
//! use std::time::Duration;
//!
//! let keep_open = Duration::from_millis(KEEP_OPEN_TIME_MS);
//! assert_eq!(keep_open.as_secs(), 15);
//! assert_ne!(CODE_ACCESS_GRANTED, CODE_ACCESS_DENIED);
//! ```

// ============================================================================
// Gate Timings
// ============================================================================

/// Time both leaves stay open before the close sequence starts (ms).
///
/// Restarted by repeated open requests and by the break-beam sensor while
/// the leaves are open.
pub const KEEP_OPEN_TIME_MS: u64 = 15_000;

/// Open-loop close duration of leaf 1 (ms).
///
/// There is no closed-position sensor, so a leaf is considered closed once
/// its motor has run for this long. Calibrated on the installed hardware.
pub const LEAF_1_CLOSE_TIME_MS: u64 = 11_000;

/// Open-loop close duration of leaf 2 (ms).
///
/// Longer than leaf 1 because this leaf swings through a wider arc.
pub const LEAF_2_CLOSE_TIME_MS: u64 = 12_300;

/// Half period of the status lamp blink (ms).
pub const LAMP_BLINK_PERIOD_MS: u64 = 500;

// ============================================================================
// Debounce Windows
// ============================================================================

/// Debounce window of the open-gate push button (ms).
pub const BUTTON_DEBOUNCE_MS: u32 = 500;

/// Debounce window of each leaf's open-position sensor (ms).
///
/// Reed contacts chatter for a long time while the leaf settles against
/// its stop, hence the wide window.
pub const OPEN_SENSOR_DEBOUNCE_MS: u32 = 3_000;

/// Debounce window of the break-beam sensor (ms).
pub const BREAK_BEAM_DEBOUNCE_MS: u32 = 800;

/// Settle delay before a raw edge is re-sampled (ms).
pub const INPUT_SETTLE_MS: u64 = 5;

/// Upper bound accepted for the input settle delay (ms).
///
/// Every input watcher sleeps this long per edge, so it must stay far below
/// the shortest debounce window.
pub const MAX_INPUT_SETTLE_MS: u64 = 50;

// ============================================================================
// Actuator
// ============================================================================

/// Default delay between switching the direction relay and the motor relay (ms).
pub const ACTUATOR_SETTLE_MS: u64 = 100;

/// Upper bound accepted for the actuator settle delay (ms).
///
/// A single actuator command waits at most twice this value.
pub const MAX_ACTUATOR_SETTLE_MS: u64 = 200;

// ============================================================================
// Relay Protocol
// ============================================================================

/// Request to open the gate. Single-byte frame.
pub const CODE_OPEN_REQUEST: u8 = 0x01;

/// Card scan request, followed by the raw UID bytes.
pub const CODE_CARD_SCAN: u8 = 0xA1;

/// Access granted response. Single-byte frame.
pub const CODE_ACCESS_GRANTED: u8 = 0xA2;

/// Access denied response. Single-byte frame.
///
/// Distinct from [`CODE_ACCESS_GRANTED`]; earlier firmware reused `0xA2`
/// for both outcomes, which made a denial indistinguishable from a grant.
pub const CODE_ACCESS_DENIED: u8 = 0xA3;

/// Default time a reader waits for an access decision (ms).
pub const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 5_000;

/// Minimum card UID length in bytes (ISO 14443).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum card UID length in bytes (ISO 14443).
pub const MAX_UID_LENGTH: usize = 10;
