pub mod config;
pub mod relay_demo;
pub mod simulate;

use std::path::Path;

use anyhow::Context;
use swinggate_controller::{GateHardware, LeafHardware};
use swinggate_core::{GateConfig, InputId, Leaf};
use swinggate_hardware::mock::{MockInput, MockInputHandle, MockOutput, MockOutputHandle};

pub fn load_config(path: Option<&Path>) -> anyhow::Result<GateConfig> {
    match path {
        Some(path) => GateConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(GateConfig::default()),
    }
}

/// Test-side handles of the simulated gate hardware.
pub struct Panel {
    pub button: MockInputHandle,
    pub sensors: [MockInputHandle; 2],
    pub break_beam: MockInputHandle,
    pub motors: [MockOutputHandle; 2],
    pub directions: [MockOutputHandle; 2],
    pub lamp: MockOutputHandle,
}

pub fn mock_hardware() -> (GateHardware<MockInput, MockOutput>, Panel) {
    let (button, button_handle) = MockInput::new(InputId::OpenButton);
    let (break_beam, beam_handle) = MockInput::new(InputId::BreakBeam);
    let (lamp, lamp_handle) = MockOutput::new("lamp");

    let leaf_hardware = |leaf: Leaf| {
        let (open_sensor, sensor) = MockInput::new(InputId::OpenSensor(leaf));
        let (motor, motor_handle) = MockOutput::new(format!("{leaf} motor"));
        let (direction, direction_handle) = MockOutput::new(format!("{leaf} direction"));
        (
            LeafHardware {
                open_sensor,
                motor,
                direction,
            },
            (sensor, motor_handle, direction_handle),
        )
    };
    let (left, (left_sensor, left_motor, left_direction)) = leaf_hardware(Leaf::Left);
    let (right, (right_sensor, right_motor, right_direction)) = leaf_hardware(Leaf::Right);

    (
        GateHardware {
            button,
            left,
            right,
            break_beam,
            lamp,
        },
        Panel {
            button: button_handle,
            sensors: [left_sensor, right_sensor],
            break_beam: beam_handle,
            motors: [left_motor, right_motor],
            directions: [left_direction, right_direction],
            lamp: lamp_handle,
        },
    )
}
