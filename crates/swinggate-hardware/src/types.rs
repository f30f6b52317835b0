//! Common types shared across hardware device implementations.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use swinggate_core::MacAddress;

/// Firing mode of a [`Timer`](crate::timer::Timer) slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerMode {
    /// Fire once after the period, then disarm.
    OneShot,
    /// Fire every period until canceled.
    Periodic,
}

/// Rotation of a leaf motor as seen from above the hinge.
///
/// Counter-clockwise swings a leaf open, clockwise swings it closed. The
/// direction relay is energized for counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorDirection {
    Clockwise,
    CounterClockwise,
}

impl MotorDirection {
    /// Level driven on the direction line.
    #[inline]
    pub fn line_level(self) -> bool {
        matches!(self, MotorDirection::CounterClockwise)
    }
}

impl fmt::Display for MotorDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clockwise => write!(f, "CW"),
            Self::CounterClockwise => write!(f, "CCW"),
        }
    }
}

/// Command for one leaf actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotorCommand {
    Open,
    Close,
    Stop,
}

impl fmt::Display for MotorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Close => write!(f, "close"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// Command for the status lamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LampCommand {
    On,
    Off,
    Toggle,
}

/// One frame received over the radio, with the address of its sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub from: MacAddress,
    pub payload: Bytes,
}

impl Datagram {
    pub fn new(from: MacAddress, payload: impl Into<Bytes>) -> Self {
        Self {
            from,
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_levels() {
        assert!(MotorDirection::CounterClockwise.line_level());
        assert!(!MotorDirection::Clockwise.line_level());
    }

    #[test]
    fn test_timer_mode_serialization() {
        let json = serde_json::to_string(&TimerMode::OneShot).unwrap();
        assert_eq!(json, "\"one_shot\"");
        let mode: TimerMode = serde_json::from_str("\"periodic\"").unwrap();
        assert_eq!(mode, TimerMode::Periodic);
    }

    #[test]
    fn test_motor_command_display() {
        assert_eq!(MotorCommand::Open.to_string(), "open");
        assert_eq!(MotorCommand::Stop.to_string(), "stop");
    }
}
