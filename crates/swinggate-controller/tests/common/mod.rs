//! Shared rig for the controller integration tests.
//!
//! A [`Rig`] runs a [`GateSystem`] on mock lines and keeps every control
//! handle, so a test can press buttons, trip sensors and inspect the relay
//! outputs. All tests run with Tokio's paused clock; sleeping advances time
//! instantly once every task is idle.

#![allow(dead_code)]

use std::time::Duration;

use swinggate_controller::{ControllerSnapshot, GateHandle, GateHardware, GateSystem, LeafHardware};
use swinggate_core::{GateConfig, InputId, Leaf, MacAddress};
use swinggate_hardware::mock::{MockInput, MockInputHandle, MockOutput, MockOutputHandle, MockRadio};

pub const CONTROLLER_MAC: MacAddress = MacAddress::new([0xd8, 0x13, 0x2a, 0x2f, 0x3b, 0x10]);
pub const ADMIN_MAC: MacAddress = MacAddress::new([0x1c, 0x69, 0x20, 0xce, 0xf8, 0x0c]);
pub const STRANGER_MAC: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x99]);

/// Long enough for an edge to settle and its actions to run, short enough
/// not to reach any gate timer.
pub const SETTLE: Duration = Duration::from_millis(500);

pub struct Rig {
    pub gate: GateHandle,
    pub button: MockInputHandle,
    pub sensors: [MockInputHandle; 2],
    pub break_beam: MockInputHandle,
    pub motors: [MockOutputHandle; 2],
    pub directions: [MockOutputHandle; 2],
    pub lamp: MockOutputHandle,
}

impl Rig {
    pub fn start(config: GateConfig) -> Self {
        Self::start_with_radio(config, None)
    }

    pub fn start_with_radio(config: GateConfig, radio: Option<MockRadio>) -> Self {
        let (button, button_handle) = MockInput::new(InputId::OpenButton);
        let (break_beam, beam_handle) = MockInput::new(InputId::BreakBeam);
        let (lamp, lamp_handle) = MockOutput::new("lamp");
        let (left, left_handles) = leaf(Leaf::Left);
        let (right, right_handles) = leaf(Leaf::Right);

        let mut system = GateSystem::new(
            config,
            GateHardware {
                button,
                left,
                right,
                break_beam,
                lamp,
            },
        );
        if let Some(radio) = radio {
            system.attach_radio(radio);
        }

        Self {
            gate: system.start(),
            button: button_handle,
            sensors: [left_handles.0, right_handles.0],
            break_beam: beam_handle,
            motors: [left_handles.1, right_handles.1],
            directions: [left_handles.2, right_handles.2],
            lamp: lamp_handle,
        }
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.gate.snapshot().await.unwrap()
    }

    pub async fn press_button(&self) {
        pulse(&self.button).await;
    }

    /// The leaf reaches its open-position stop.
    pub async fn reach_open(&self, leaf: Leaf) {
        pulse(&self.sensors[leaf.index()]).await;
    }

    /// Open both leaves completely. Returns once the countdown is running.
    pub async fn open_fully(&self) {
        self.press_button().await;
        self.reach_open(Leaf::Left).await;
        self.reach_open(Leaf::Right).await;
    }

    pub fn motor_running(&self, leaf: Leaf) -> bool {
        self.motors[leaf.index()].level()
    }

    /// Direction relay level: high swings the leaf open.
    pub fn opening_direction(&self, leaf: Leaf) -> bool {
        self.directions[leaf.index()].level()
    }
}

/// Assert a line for one edge, let it settle, then release it.
pub async fn pulse(line: &MockInputHandle) {
    line.assert_line();
    tokio::time::sleep(SETTLE).await;
    line.release();
}

pub async fn sleep_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn leaf(
    leaf: Leaf,
) -> (
    LeafHardware<MockInput, MockOutput>,
    (MockInputHandle, MockOutputHandle, MockOutputHandle),
) {
    let (open_sensor, sensor_handle) = MockInput::new(InputId::OpenSensor(leaf));
    let (motor, motor_handle) = MockOutput::new(format!("{leaf} motor"));
    let (direction, direction_handle) = MockOutput::new(format!("{leaf} direction"));
    (
        LeafHardware {
            open_sensor,
            motor,
            direction,
        },
        (sensor_handle, motor_handle, direction_handle),
    )
}
