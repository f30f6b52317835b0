//! Inputs and outputs of the gate state machine.
//!
//! Everything that can happen to the gate is an [`Event`]; everything the
//! state machine wants done to the hardware is an [`Action`]. The runtime
//! turns interrupts, timer expiries and radio frames into events and
//! executes the returned actions in order.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use swinggate_core::{InputId, Leaf, TimerId};
use swinggate_hardware::{LampCommand, MotorCommand, TimerMode};

/// Something that happened to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Local open button, debounced.
    ButtonPressed,
    /// Open-position sensor of a leaf triggered.
    SensorEdge(Leaf),
    /// Break-beam became obstructed.
    BreakBeamEdge,
    /// Shared keep-open countdown ran out.
    CountdownExpired,
    /// Calibrated close time of a leaf elapsed.
    LeafCloseExpired(Leaf),
    /// Lamp blink period elapsed.
    LampTick,
    /// Raw frame received over the radio.
    RadioFrame(Bytes),
}

impl Event {
    /// Event raised by the expiry of a timer slot.
    pub fn from_timer(id: TimerId) -> Self {
        match id {
            TimerId::Countdown => Event::CountdownExpired,
            TimerId::LeafClose(leaf) => Event::LeafCloseExpired(leaf),
            TimerId::LampBlink => Event::LampTick,
        }
    }

    /// Event raised by an accepted edge on an input line.
    pub fn from_input(id: InputId) -> Self {
        match id {
            InputId::OpenButton => Event::ButtonPressed,
            InputId::OpenSensor(leaf) => Event::SensorEdge(leaf),
            InputId::BreakBeam => Event::BreakBeamEdge,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ButtonPressed => write!(f, "button pressed"),
            Event::SensorEdge(leaf) => write!(f, "{leaf} open sensor"),
            Event::BreakBeamEdge => write!(f, "break-beam obstructed"),
            Event::CountdownExpired => write!(f, "countdown expired"),
            Event::LeafCloseExpired(leaf) => write!(f, "{leaf} close time elapsed"),
            Event::LampTick => write!(f, "lamp tick"),
            Event::RadioFrame(bytes) => write!(f, "radio frame {:02X?}", &bytes[..]),
        }
    }
}

/// A hardware command requested by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Motor(Leaf, MotorCommand),
    EnableInput(InputId),
    DisableInput(InputId),
    ArmTimer(TimerId, TimerMode, Duration),
    CancelTimer(TimerId),
    Lamp(LampCommand),
}

/// Input levels sampled right before an event is handled.
///
/// Some transitions depend on the current level of a sensor rather than on
/// its edge: the countdown checks whether the beam is obstructed, and a
/// reversal checks whether the leaf is already at its open sensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub open_sensors: [bool; 2],
    pub break_beam_obstructed: bool,
}

impl SensorSnapshot {
    /// All sensors released.
    pub fn clear() -> Self {
        Self::default()
    }

    pub fn with_open_sensor(mut self, leaf: Leaf, asserted: bool) -> Self {
        self.open_sensors[leaf.index()] = asserted;
        self
    }

    pub fn with_obstruction(mut self, obstructed: bool) -> Self {
        self.break_beam_obstructed = obstructed;
        self
    }

    /// Returns `true` if the leaf is at its open-position sensor.
    pub fn is_open(&self, leaf: Leaf) -> bool {
        self.open_sensors[leaf.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_events() {
        assert_eq!(Event::from_timer(TimerId::Countdown), Event::CountdownExpired);
        assert_eq!(
            Event::from_timer(TimerId::LeafClose(Leaf::Right)),
            Event::LeafCloseExpired(Leaf::Right)
        );
        assert_eq!(Event::from_timer(TimerId::LampBlink), Event::LampTick);
    }

    #[test]
    fn test_input_events() {
        assert_eq!(Event::from_input(InputId::OpenButton), Event::ButtonPressed);
        assert_eq!(
            Event::from_input(InputId::OpenSensor(Leaf::Left)),
            Event::SensorEdge(Leaf::Left)
        );
        assert_eq!(Event::from_input(InputId::BreakBeam), Event::BreakBeamEdge);
    }

    #[test]
    fn test_snapshot_builder() {
        let sensors = SensorSnapshot::clear()
            .with_open_sensor(Leaf::Right, true)
            .with_obstruction(true);
        assert!(!sensors.is_open(Leaf::Left));
        assert!(sensors.is_open(Leaf::Right));
        assert!(sensors.break_beam_obstructed);
    }

    #[test]
    fn test_radio_frame_display() {
        let event = Event::RadioFrame(Bytes::from_static(&[0xA1, 0x04]));
        assert_eq!(event.to_string(), "radio frame [A1, 04]");
    }
}
