//! Gate controller state machine.
//!
//! The controller tracks both leaves through their four-state lifecycle and
//! coordinates them with a shared keep-open countdown, one close timer per
//! leaf and a shared blinking lamp. It is pure: [`GateController::handle`]
//! takes an [`Event`] plus the current sensor levels and returns the
//! [`Action`]s to perform, without touching any hardware.
//!
//! # Leaf Lifecycle
//!
//! ```text
//! CLOSED ──open request──▶ OPENING ──open sensor──▶ OPEN
//!    ▲                        ▲                       │
//!    │                        │ open request /        │ countdown expired,
//!    │ close time elapsed     │ break-beam            │ beam clear
//!    │                        │                       ▼
//!    └──────────────────── CLOSING ◀──────────────────┘
//! ```
//!
//! Closing is open-loop: there is no closed-position sensor, so a leaf is
//! considered closed once its calibrated close time has elapsed.
//!
//! # Safety Interlocks
//!
//! - The countdown never closes through an obstructed beam; it restarts instead.
//! - A break-beam edge reverses every closing leaf.
//!
//! # Examples
//!
//! ```
//! use swinggate_controller::{Action, Event, GateController, SensorSnapshot};
//! use swinggate_core::{Leaf, LeafStatus};
//! use swinggate_hardware::MotorCommand;
//!
//! let mut controller = GateController::new();
//! let sensors = SensorSnapshot::clear();
//!
//! let actions = controller.handle(Event::ButtonPressed, &sensors);
//! assert!(actions.contains(&Action::Motor(Leaf::Left, MotorCommand::Open)));
//! assert_eq!(controller.status(Leaf::Left), LeafStatus::Opening);
//! assert!(controller.is_active());
//! ```

use std::collections::{HashSet, VecDeque};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use swinggate_core::{GateTimings, InputId, Leaf, LeafStatus, Result, TimerId};
use swinggate_hardware::{LampCommand, MotorCommand, TimerMode};
use swinggate_protocol::RelayFrame;
use tracing::{debug, error, info, warn};

use crate::event::{Action, Event, SensorSnapshot};

/// Maximum number of leaf transitions kept for diagnostics.
pub const MAX_HISTORY_SIZE: usize = 100;

/// Sensor inputs that are only enabled while the gate is active.
const SENSOR_INPUTS: [InputId; 3] = [
    InputId::OpenSensor(Leaf::Left),
    InputId::OpenSensor(Leaf::Right),
    InputId::BreakBeam,
];

/// What the status lamp is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LampState {
    Off,
    Blinking,
    Solid,
}

impl fmt::Display for LampState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LampState::Off => write!(f, "off"),
            LampState::Blinking => write!(f, "blinking"),
            LampState::Solid => write!(f, "solid"),
        }
    }
}

/// A status change of one leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafTransition {
    pub leaf: Leaf,
    pub from: LeafStatus,
    pub to: LeafStatus,
    pub timestamp: DateTime<Utc>,
}

/// Point-in-time view of the controller bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerSnapshot {
    pub active: bool,
    pub statuses: [LeafStatus; 2],
    pub lamp: LampState,
    pub enabled_inputs: Vec<InputId>,
    pub armed_timers: Vec<TimerId>,
}

impl ControllerSnapshot {
    pub fn status(&self, leaf: Leaf) -> LeafStatus {
        self.statuses[leaf.index()]
    }

    pub fn is_input_enabled(&self, input: InputId) -> bool {
        self.enabled_inputs.contains(&input)
    }

    pub fn is_timer_armed(&self, timer: TimerId) -> bool {
        self.armed_timers.contains(&timer)
    }
}

/// State machine of a dual-leaf swing gate.
///
/// # Thread Safety
///
/// The controller has no interior locking. The runtime owns it inside a
/// single task and feeds it events one at a time.
#[derive(Debug)]
pub struct GateController {
    timings: GateTimings,
    active: bool,
    statuses: [LeafStatus; 2],
    lamp: LampState,
    enabled_inputs: HashSet<InputId>,
    armed_timers: HashSet<TimerId>,
    history: VecDeque<LeafTransition>,
}

impl GateController {
    /// Controller with both leaves closed and default timings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> GateControllerBuilder {
        GateControllerBuilder::default()
    }

    pub fn status(&self, leaf: Leaf) -> LeafStatus {
        self.statuses[leaf.index()]
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn lamp(&self) -> LampState {
        self.lamp
    }

    pub fn timings(&self) -> &GateTimings {
        &self.timings
    }

    pub fn is_input_enabled(&self, input: InputId) -> bool {
        self.enabled_inputs.contains(&input)
    }

    pub fn is_timer_armed(&self, timer: TimerId) -> bool {
        self.armed_timers.contains(&timer)
    }

    /// Returns `true` when the gate is at rest: inactive, both leaves closed
    /// and no timer armed.
    pub fn is_quiescent(&self) -> bool {
        !self.active
            && self.statuses.iter().all(|s| *s == LeafStatus::Closed)
            && self.armed_timers.is_empty()
    }

    /// Transition history, oldest first.
    pub fn history(&self) -> &VecDeque<LeafTransition> {
        &self.history
    }

    pub fn last_transitions(&self, count: usize) -> Vec<LeafTransition> {
        self.history
            .iter()
            .rev()
            .take(count)
            .rev()
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let mut enabled_inputs: Vec<InputId> = self.enabled_inputs.iter().copied().collect();
        enabled_inputs.sort_by_key(|input| input_order(*input));
        let mut armed_timers: Vec<TimerId> = self.armed_timers.iter().copied().collect();
        armed_timers.sort_by_key(|timer| timer_order(*timer));

        ControllerSnapshot {
            active: self.active,
            statuses: self.statuses,
            lamp: self.lamp,
            enabled_inputs,
            armed_timers,
        }
    }

    /// Handle one event and return the hardware actions it requires, in order.
    pub fn handle(&mut self, event: Event, sensors: &SensorSnapshot) -> Vec<Action> {
        debug!(%event, "Handling event");
        let mut actions = Vec::new();
        match event {
            Event::ButtonPressed => self.open_request(sensors, &mut actions),
            Event::SensorEdge(leaf) => self.open_sensor_edge(leaf, &mut actions),
            Event::BreakBeamEdge => self.break_beam_edge(sensors, &mut actions),
            Event::CountdownExpired => self.countdown_expired(sensors, &mut actions),
            Event::LeafCloseExpired(leaf) => self.close_time_elapsed(leaf, &mut actions),
            Event::LampTick => self.lamp_tick(&mut actions),
            Event::RadioFrame(bytes) => match RelayFrame::decode(&bytes) {
                Ok(RelayFrame::OpenRequest) => {
                    info!("Open request received over radio");
                    self.open_request(sensors, &mut actions);
                }
                Ok(frame) => debug!(%frame, "Ignoring radio frame"),
                Err(e) => warn!(error = %e, bytes = ?&bytes[..], "Malformed radio frame"),
            },
        }
        actions
    }

    /// Shut everything down: disable sensor inputs, cancel all timers, lamp
    /// off. Leaf statuses are left as they are.
    pub fn deactivate(&mut self) -> Vec<Action> {
        let mut actions = Vec::new();
        self.deactivate_into(&mut actions);
        actions
    }

    fn open_request(&mut self, sensors: &SensorSnapshot, actions: &mut Vec<Action>) {
        if !self.active {
            self.active = true;
            info!("Gate system activated");
        }

        for leaf in Leaf::ALL {
            match self.status(leaf) {
                LeafStatus::Closed => {
                    actions.push(Action::Motor(leaf, MotorCommand::Open));
                    self.enable_input(InputId::OpenSensor(leaf), actions);
                    self.set_status(leaf, LeafStatus::Opening);
                    self.start_blinking(actions);
                }
                LeafStatus::Opening => {
                    debug!(%leaf, "Leaf already opening");
                }
                LeafStatus::Open => {
                    self.restart_countdown(actions);
                }
                LeafStatus::Closing => {
                    info!(%leaf, "Open request while closing, reversing leaf");
                    self.reverse(leaf, sensors, actions);
                }
            }
        }

        self.solid_if_all_open(actions);
    }

    fn open_sensor_edge(&mut self, leaf: Leaf, actions: &mut Vec<Action>) {
        let status = self.status(leaf);
        if status != LeafStatus::Opening {
            debug!(%leaf, %status, "Ignoring open sensor edge");
            return;
        }

        actions.push(Action::Motor(leaf, MotorCommand::Stop));
        self.set_status(leaf, LeafStatus::Open);
        self.disable_input(InputId::OpenSensor(leaf), actions);
        self.solid_if_all_open(actions);
        self.restart_countdown(actions);
    }

    fn countdown_expired(&mut self, sensors: &SensorSnapshot, actions: &mut Vec<Action>) {
        self.armed_timers.remove(&TimerId::Countdown);
        if !self.active {
            debug!("Ignoring countdown expiry, system inactive");
            return;
        }

        if sensors.break_beam_obstructed {
            warn!("Break-beam obstructed, postponing close");
            self.restart_countdown(actions);
            return;
        }

        // The beam must be live before any motor starts closing; an edge
        // raised while the close commands run is queued, not lost.
        if self.statuses.contains(&LeafStatus::Open) {
            self.enable_input(InputId::BreakBeam, actions);
        }

        for leaf in Leaf::ALL {
            if self.status(leaf) == LeafStatus::Open {
                actions.push(Action::Motor(leaf, MotorCommand::Close));
                self.arm_timer(
                    TimerId::LeafClose(leaf),
                    TimerMode::OneShot,
                    self.timings.close_time(leaf),
                    actions,
                );
                self.set_status(leaf, LeafStatus::Closing);
            }
        }

        if self.statuses.contains(&LeafStatus::Closing) {
            self.start_blinking(actions);
        }
    }

    fn close_time_elapsed(&mut self, leaf: Leaf, actions: &mut Vec<Action>) {
        self.armed_timers.remove(&TimerId::LeafClose(leaf));
        let status = self.status(leaf);
        if status != LeafStatus::Closing {
            debug!(%leaf, %status, "Ignoring close expiry");
            return;
        }

        actions.push(Action::Motor(leaf, MotorCommand::Stop));
        self.set_status(leaf, LeafStatus::Closed);

        if self.statuses.iter().all(|s| *s == LeafStatus::Closed) {
            info!("Both leaves closed");
            self.deactivate_into(actions);
        }
    }

    fn break_beam_edge(&mut self, sensors: &SensorSnapshot, actions: &mut Vec<Action>) {
        if !self.active {
            debug!("Ignoring break-beam edge, system inactive");
            return;
        }

        let mut countdown_restarted = false;
        for leaf in Leaf::ALL {
            match self.status(leaf) {
                LeafStatus::Open if !countdown_restarted => {
                    self.restart_countdown(actions);
                    countdown_restarted = true;
                }
                LeafStatus::Closing => {
                    warn!(%leaf, "Obstruction while closing, reversing leaf");
                    self.reverse(leaf, sensors, actions);
                }
                LeafStatus::Open | LeafStatus::Opening | LeafStatus::Closed => {}
            }
        }

        self.solid_if_all_open(actions);
    }

    fn lamp_tick(&mut self, actions: &mut Vec<Action>) {
        if self.lamp == LampState::Blinking {
            actions.push(Action::Lamp(LampCommand::Toggle));
        } else {
            debug!(lamp = %self.lamp, "Ignoring lamp tick");
        }
    }

    /// Stop a closing leaf and send it back open.
    fn reverse(&mut self, leaf: Leaf, sensors: &SensorSnapshot, actions: &mut Vec<Action>) {
        self.cancel_timer(TimerId::LeafClose(leaf), actions);
        actions.push(Action::Motor(leaf, MotorCommand::Stop));

        if sensors.is_open(leaf) {
            self.set_status(leaf, LeafStatus::Open);
            self.restart_countdown(actions);
        } else {
            actions.push(Action::Motor(leaf, MotorCommand::Open));
            self.enable_input(InputId::OpenSensor(leaf), actions);
            self.set_status(leaf, LeafStatus::Opening);
        }
    }

    fn deactivate_into(&mut self, actions: &mut Vec<Action>) {
        for input in SENSOR_INPUTS {
            self.enabled_inputs.remove(&input);
            actions.push(Action::DisableInput(input));
        }
        for timer in TimerId::ALL {
            self.armed_timers.remove(&timer);
            actions.push(Action::CancelTimer(timer));
        }
        self.lamp = LampState::Off;
        actions.push(Action::Lamp(LampCommand::Off));

        if self.active {
            info!("Gate system deactivated");
        }
        self.active = false;
    }

    fn restart_countdown(&mut self, actions: &mut Vec<Action>) {
        self.arm_timer(
            TimerId::Countdown,
            TimerMode::OneShot,
            self.timings.keep_open(),
            actions,
        );
    }

    fn start_blinking(&mut self, actions: &mut Vec<Action>) {
        if self.lamp == LampState::Blinking {
            return;
        }
        self.lamp = LampState::Blinking;
        self.arm_timer(
            TimerId::LampBlink,
            TimerMode::Periodic,
            self.timings.lamp_blink(),
            actions,
        );
    }

    fn solid_if_all_open(&mut self, actions: &mut Vec<Action>) {
        if self.lamp == LampState::Solid
            || !self.statuses.iter().all(|s| *s == LeafStatus::Open)
        {
            return;
        }
        self.cancel_timer(TimerId::LampBlink, actions);
        self.lamp = LampState::Solid;
        actions.push(Action::Lamp(LampCommand::On));
    }

    fn arm_timer(
        &mut self,
        timer: TimerId,
        mode: TimerMode,
        period: std::time::Duration,
        actions: &mut Vec<Action>,
    ) {
        self.armed_timers.insert(timer);
        actions.push(Action::ArmTimer(timer, mode, period));
    }

    fn cancel_timer(&mut self, timer: TimerId, actions: &mut Vec<Action>) {
        self.armed_timers.remove(&timer);
        actions.push(Action::CancelTimer(timer));
    }

    fn enable_input(&mut self, input: InputId, actions: &mut Vec<Action>) {
        if self.enabled_inputs.insert(input) {
            actions.push(Action::EnableInput(input));
        }
    }

    fn disable_input(&mut self, input: InputId, actions: &mut Vec<Action>) {
        if self.enabled_inputs.remove(&input) {
            actions.push(Action::DisableInput(input));
        }
    }

    fn set_status(&mut self, leaf: Leaf, to: LeafStatus) {
        let from = self.status(leaf);
        if from == to {
            return;
        }
        self.statuses[leaf.index()] = to;
        info!(%leaf, %from, %to, "Leaf transition");

        self.history.push_back(LeafTransition {
            leaf,
            from,
            to,
            timestamp: Utc::now(),
        });
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for GateController {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GateController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "gate 1: {}, gate 2: {}, lamp: {}, {}",
            self.statuses[0],
            self.statuses[1],
            self.lamp,
            if self.active { "active" } else { "idle" }
        )
    }
}

/// Builder for restoring a controller to known leaf statuses.
///
/// ```
/// use swinggate_controller::GateController;
/// use swinggate_core::{Leaf, LeafStatus};
///
/// let controller = GateController::builder()
///     .with_status(Leaf::Right, LeafStatus::Open)
///     .build();
///
/// assert_eq!(controller.status(Leaf::Right), LeafStatus::Open);
/// assert!(!controller.is_active());
/// ```
#[derive(Debug, Default)]
pub struct GateControllerBuilder {
    timings: GateTimings,
    statuses: [Option<LeafStatus>; 2],
}

impl GateControllerBuilder {
    pub fn with_timings(mut self, timings: GateTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_status(mut self, leaf: Leaf, status: LeafStatus) -> Self {
        self.statuses[leaf.index()] = Some(status);
        self
    }

    /// Restore a leaf status from its numeric encoding.
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownLeafStatus` if `value` is not one of the four
    /// statuses. The leaf needs manual intervention in that case.
    pub fn with_raw_status(self, leaf: Leaf, value: u8) -> Result<Self> {
        match LeafStatus::try_from(value) {
            Ok(status) => Ok(self.with_status(leaf, status)),
            Err(e) => {
                error!(%leaf, value, "Unknown leaf status, manual intervention required");
                Err(e)
            }
        }
    }

    pub fn build(self) -> GateController {
        let mut enabled_inputs = HashSet::new();
        enabled_inputs.insert(InputId::OpenButton);

        GateController {
            timings: self.timings,
            active: false,
            statuses: self.statuses.map(|s| s.unwrap_or(LeafStatus::Closed)),
            lamp: LampState::Off,
            enabled_inputs,
            armed_timers: HashSet::new(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }
}

fn input_order(input: InputId) -> u8 {
    match input {
        InputId::OpenButton => 0,
        InputId::OpenSensor(leaf) => leaf.number(),
        InputId::BreakBeam => 3,
    }
}

fn timer_order(timer: TimerId) -> u8 {
    match timer {
        TimerId::Countdown => 0,
        TimerId::LeafClose(leaf) => leaf.number(),
        TimerId::LampBlink => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use rstest::rstest;
    use std::time::Duration;

    fn clear() -> SensorSnapshot {
        SensorSnapshot::clear()
    }

    fn keep_open() -> Action {
        Action::ArmTimer(
            TimerId::Countdown,
            TimerMode::OneShot,
            Duration::from_millis(15_000),
        )
    }

    fn blink() -> Action {
        Action::ArmTimer(
            TimerId::LampBlink,
            TimerMode::Periodic,
            Duration::from_millis(500),
        )
    }

    /// Controller with both leaves fully open and the countdown running.
    fn both_open() -> GateController {
        let mut controller = GateController::new();
        controller.handle(Event::ButtonPressed, &clear());
        controller.handle(Event::SensorEdge(Leaf::Left), &clear());
        controller.handle(Event::SensorEdge(Leaf::Right), &clear());
        controller
    }

    /// Controller with both leaves closing.
    fn both_closing() -> GateController {
        let mut controller = both_open();
        controller.handle(Event::CountdownExpired, &clear());
        controller
    }

    #[test]
    fn test_new_controller_is_quiescent() {
        let controller = GateController::new();
        assert!(controller.is_quiescent());
        assert_eq!(controller.lamp(), LampState::Off);
        assert!(controller.is_input_enabled(InputId::OpenButton));
        assert!(!controller.is_input_enabled(InputId::BreakBeam));
        assert!(controller.history().is_empty());
    }

    #[test]
    fn test_open_request_from_closed() {
        let mut controller = GateController::new();
        let actions = controller.handle(Event::ButtonPressed, &clear());

        assert_eq!(
            actions,
            vec![
                Action::Motor(Leaf::Left, MotorCommand::Open),
                Action::EnableInput(InputId::OpenSensor(Leaf::Left)),
                blink(),
                Action::Motor(Leaf::Right, MotorCommand::Open),
                Action::EnableInput(InputId::OpenSensor(Leaf::Right)),
            ]
        );
        assert!(controller.is_active());
        assert_eq!(controller.lamp(), LampState::Blinking);
        for leaf in Leaf::ALL {
            assert_eq!(controller.status(leaf), LeafStatus::Opening);
        }
    }

    #[test]
    fn test_open_request_while_opening_is_noop() {
        let mut controller = GateController::new();
        controller.handle(Event::ButtonPressed, &clear());
        let actions = controller.handle(Event::ButtonPressed, &clear());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_first_sensor_edge_keeps_blinking() {
        let mut controller = GateController::new();
        controller.handle(Event::ButtonPressed, &clear());
        let actions = controller.handle(Event::SensorEdge(Leaf::Left), &clear());

        assert_eq!(
            actions,
            vec![
                Action::Motor(Leaf::Left, MotorCommand::Stop),
                Action::DisableInput(InputId::OpenSensor(Leaf::Left)),
                keep_open(),
            ]
        );
        assert_eq!(controller.status(Leaf::Left), LeafStatus::Open);
        assert_eq!(controller.lamp(), LampState::Blinking);
    }

    #[test]
    fn test_second_sensor_edge_makes_lamp_solid() {
        let mut controller = GateController::new();
        controller.handle(Event::ButtonPressed, &clear());
        controller.handle(Event::SensorEdge(Leaf::Left), &clear());
        let actions = controller.handle(Event::SensorEdge(Leaf::Right), &clear());

        assert_eq!(
            actions,
            vec![
                Action::Motor(Leaf::Right, MotorCommand::Stop),
                Action::DisableInput(InputId::OpenSensor(Leaf::Right)),
                Action::CancelTimer(TimerId::LampBlink),
                Action::Lamp(LampCommand::On),
                keep_open(),
            ]
        );
        assert_eq!(controller.lamp(), LampState::Solid);
        assert!(controller.is_timer_armed(TimerId::Countdown));
        assert!(!controller.is_timer_armed(TimerId::LampBlink));
    }

    #[test]
    fn test_open_request_while_open_restarts_countdown() {
        let mut controller = both_open();
        let actions = controller.handle(Event::ButtonPressed, &clear());
        assert_eq!(actions, vec![keep_open(), keep_open()]);
    }

    #[test]
    fn test_countdown_closes_open_leaves() {
        let mut controller = both_open();
        let actions = controller.handle(Event::CountdownExpired, &clear());

        assert_eq!(
            actions,
            vec![
                Action::EnableInput(InputId::BreakBeam),
                Action::Motor(Leaf::Left, MotorCommand::Close),
                Action::ArmTimer(
                    TimerId::LeafClose(Leaf::Left),
                    TimerMode::OneShot,
                    Duration::from_millis(11_000)
                ),
                Action::Motor(Leaf::Right, MotorCommand::Close),
                Action::ArmTimer(
                    TimerId::LeafClose(Leaf::Right),
                    TimerMode::OneShot,
                    Duration::from_millis(12_300)
                ),
                blink(),
            ]
        );
        assert_eq!(controller.lamp(), LampState::Blinking);
        assert!(!controller.is_timer_armed(TimerId::Countdown));
    }

    #[test]
    fn test_countdown_with_obstruction_keeps_leaves_open() {
        let mut controller = both_open();
        let obstructed = clear().with_obstruction(true);
        let actions = controller.handle(Event::CountdownExpired, &obstructed);

        assert_eq!(actions, vec![keep_open()]);
        for leaf in Leaf::ALL {
            assert_eq!(controller.status(leaf), LeafStatus::Open);
        }
        assert!(
            !actions
                .iter()
                .any(|a| matches!(a, Action::Motor(_, MotorCommand::Close)))
        );
    }

    #[test]
    fn test_countdown_skips_leaf_still_opening() {
        let mut controller = GateController::new();
        controller.handle(Event::ButtonPressed, &clear());
        controller.handle(Event::SensorEdge(Leaf::Right), &clear());
        let actions = controller.handle(Event::CountdownExpired, &clear());

        assert!(actions.contains(&Action::Motor(Leaf::Right, MotorCommand::Close)));
        assert!(!actions.contains(&Action::Motor(Leaf::Left, MotorCommand::Close)));
        assert_eq!(controller.status(Leaf::Left), LeafStatus::Opening);
        // Lamp was already blinking; no second arming.
        assert!(!actions.contains(&blink()));
    }

    #[test]
    fn test_close_expiry_of_last_leaf_deactivates() {
        let mut controller = both_closing();

        let actions = controller.handle(Event::LeafCloseExpired(Leaf::Left), &clear());
        assert_eq!(actions, vec![Action::Motor(Leaf::Left, MotorCommand::Stop)]);
        assert!(controller.is_active());

        let actions = controller.handle(Event::LeafCloseExpired(Leaf::Right), &clear());
        assert_eq!(actions[0], Action::Motor(Leaf::Right, MotorCommand::Stop));
        assert!(actions.contains(&Action::DisableInput(InputId::BreakBeam)));
        assert!(actions.contains(&Action::CancelTimer(TimerId::LampBlink)));
        assert_eq!(actions.last(), Some(&Action::Lamp(LampCommand::Off)));
        assert!(controller.is_quiescent());
    }

    #[rstest]
    #[case::obstruction(Event::BreakBeamEdge)]
    #[case::open_request(Event::ButtonPressed)]
    fn test_closing_leaf_reverses(#[case] event: Event) {
        let mut controller = both_closing();
        let actions = controller.handle(event, &clear());

        for leaf in Leaf::ALL {
            let cancel = actions
                .iter()
                .position(|a| *a == Action::CancelTimer(TimerId::LeafClose(leaf)))
                .unwrap();
            let stop = actions
                .iter()
                .position(|a| *a == Action::Motor(leaf, MotorCommand::Stop))
                .unwrap();
            let open = actions
                .iter()
                .position(|a| *a == Action::Motor(leaf, MotorCommand::Open))
                .unwrap();
            assert!(cancel < stop && stop < open);
            assert!(actions.contains(&Action::EnableInput(InputId::OpenSensor(leaf))));
            assert_eq!(controller.status(leaf), LeafStatus::Opening);
            assert!(!controller.is_timer_armed(TimerId::LeafClose(leaf)));
        }
    }

    #[test]
    fn test_reversal_at_open_sensor_lands_open() {
        let mut controller = both_closing();
        let sensors = clear()
            .with_open_sensor(Leaf::Left, true)
            .with_open_sensor(Leaf::Right, true);
        let actions = controller.handle(Event::BreakBeamEdge, &sensors);

        for leaf in Leaf::ALL {
            assert_eq!(controller.status(leaf), LeafStatus::Open);
            assert!(!actions.contains(&Action::Motor(leaf, MotorCommand::Open)));
        }
        assert!(actions.contains(&keep_open()));
        assert_eq!(controller.lamp(), LampState::Solid);
        assert_eq!(actions.last(), Some(&Action::Lamp(LampCommand::On)));
    }

    #[test]
    fn test_break_beam_while_open_restarts_countdown_once() {
        let mut controller = both_open();
        let actions = controller.handle(Event::BreakBeamEdge, &clear());
        assert_eq!(actions, vec![keep_open()]);
    }

    #[test]
    fn test_break_beam_ignored_while_opening() {
        let mut controller = GateController::new();
        controller.handle(Event::ButtonPressed, &clear());
        let actions = controller.handle(Event::BreakBeamEdge, &clear());
        assert!(actions.is_empty());
    }

    #[test]
    fn test_break_beam_ignored_when_inactive() {
        let mut controller = GateController::builder()
            .with_status(Leaf::Left, LeafStatus::Closing)
            .build();
        let actions = controller.handle(Event::BreakBeamEdge, &clear());
        assert!(actions.is_empty());
        assert_eq!(controller.status(Leaf::Left), LeafStatus::Closing);
    }

    #[rstest]
    #[case::closed(LeafStatus::Closed)]
    #[case::open(LeafStatus::Open)]
    #[case::closing(LeafStatus::Closing)]
    fn test_stale_sensor_edge_ignored(#[case] status: LeafStatus) {
        let mut controller = GateController::builder()
            .with_status(Leaf::Left, status)
            .build();
        let actions = controller.handle(Event::SensorEdge(Leaf::Left), &clear());
        assert!(actions.is_empty());
        assert_eq!(controller.status(Leaf::Left), status);
    }

    #[rstest]
    #[case::closed(LeafStatus::Closed)]
    #[case::opening(LeafStatus::Opening)]
    #[case::open(LeafStatus::Open)]
    fn test_stale_close_expiry_ignored(#[case] status: LeafStatus) {
        let mut controller = GateController::builder()
            .with_status(Leaf::Right, status)
            .build();
        let actions = controller.handle(Event::LeafCloseExpired(Leaf::Right), &clear());
        assert!(actions.is_empty());
        assert_eq!(controller.status(Leaf::Right), status);
    }

    #[test]
    fn test_countdown_ignored_when_inactive() {
        let mut controller = GateController::builder()
            .with_status(Leaf::Left, LeafStatus::Open)
            .build();
        assert!(controller.handle(Event::CountdownExpired, &clear()).is_empty());
    }

    #[test]
    fn test_lamp_tick() {
        let mut controller = GateController::new();
        assert!(controller.handle(Event::LampTick, &clear()).is_empty());

        controller.handle(Event::ButtonPressed, &clear());
        assert_eq!(
            controller.handle(Event::LampTick, &clear()),
            vec![Action::Lamp(LampCommand::Toggle)]
        );
    }

    #[test]
    fn test_radio_open_request_matches_button() {
        let mut by_button = GateController::new();
        let mut by_radio = GateController::new();

        let button_actions = by_button.handle(Event::ButtonPressed, &clear());
        let radio_actions =
            by_radio.handle(Event::RadioFrame(Bytes::from_static(&[0x01])), &clear());

        assert_eq!(button_actions, radio_actions);
        assert_eq!(by_button.snapshot(), by_radio.snapshot());
    }

    #[rstest]
    #[case::granted(&[0xA2])]
    #[case::denied(&[0xA3])]
    #[case::card_scan(&[0xA1, 0x04, 0xAB, 0xCD, 0xEF])]
    #[case::unknown(&[0x7F])]
    #[case::open_with_trailer(&[0x01, 0x01])]
    #[case::empty(&[])]
    fn test_other_radio_frames_ignored(#[case] bytes: &'static [u8]) {
        let mut controller = GateController::new();
        let actions = controller.handle(Event::RadioFrame(Bytes::from_static(bytes)), &clear());
        assert!(actions.is_empty());
        assert!(!controller.is_active());
    }

    #[test]
    fn test_deactivate_keeps_statuses() {
        let mut controller = GateController::new();
        controller.handle(Event::ButtonPressed, &clear());
        controller.handle(Event::SensorEdge(Leaf::Left), &clear());

        controller.deactivate();

        assert!(!controller.is_active());
        assert_eq!(controller.status(Leaf::Left), LeafStatus::Open);
        assert_eq!(controller.status(Leaf::Right), LeafStatus::Opening);
        assert_eq!(controller.lamp(), LampState::Off);
        let snapshot = controller.snapshot();
        assert!(snapshot.armed_timers.is_empty());
        assert_eq!(snapshot.enabled_inputs, vec![InputId::OpenButton]);
    }

    #[test]
    fn test_raw_status_restore() {
        let controller = GateController::builder()
            .with_raw_status(Leaf::Left, 3)
            .unwrap()
            .build();
        assert_eq!(controller.status(Leaf::Left), LeafStatus::Closing);

        let result = GateController::builder().with_raw_status(Leaf::Right, 7);
        assert!(matches!(
            result,
            Err(swinggate_core::Error::UnknownLeafStatus { value: 7 })
        ));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut controller = GateController::new();
        for _ in 0..30 {
            controller.handle(Event::ButtonPressed, &clear());
            controller.handle(Event::SensorEdge(Leaf::Left), &clear());
            controller.handle(Event::SensorEdge(Leaf::Right), &clear());
            controller.handle(Event::CountdownExpired, &clear());
            controller.handle(Event::LeafCloseExpired(Leaf::Left), &clear());
            controller.handle(Event::LeafCloseExpired(Leaf::Right), &clear());
        }
        assert_eq!(controller.history().len(), MAX_HISTORY_SIZE);

        let last = controller.last_transitions(2);
        assert_eq!(last[1].leaf, Leaf::Right);
        assert_eq!(last[1].to, LeafStatus::Closed);
    }

    #[test]
    fn test_display() {
        let controller = both_open();
        assert_eq!(
            controller.to_string(),
            "gate 1: Open, gate 2: Open, lamp: solid, active"
        );
    }

    #[test]
    fn test_snapshot_serializes() {
        let snapshot = both_closing().snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["active"], true);
        assert_eq!(json["lamp"], "blinking");
    }
}
