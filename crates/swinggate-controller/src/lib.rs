//! Dual-leaf swing gate controller.
//!
//! The controller drives two motorised leaves, a status lamp and reads an
//! open button, one open-position sensor per leaf and a break-beam safety
//! sensor. An open request (button or radio) swings both leaves open, a shared
//! countdown keeps them open, and they close again once the countdown runs out
//! with the beam clear.
//!
//! The crate is split into a pure state machine and the runtime around it:
//!
//! - [`GateController`] decides. It maps an [`Event`] plus sampled
//!   [`SensorSnapshot`] to a list of [`Action`]s and never touches hardware,
//!   so every transition is testable without a clock.
//! - [`GateSystem`] executes. It owns the debounced inputs, timer slots,
//!   actuators and lamp, serialises all events through one queue and hands
//!   out a [`GateHandle`] once started.
//!
//! # Example
//!
//! ```no_run
//! use swinggate_controller::{GateHardware, GateSystem, LeafHardware};
//! use swinggate_core::{GateConfig, InputId, Leaf};
//! use swinggate_hardware::mock::{MockInput, MockOutput};
//!
//! # #[tokio::main] async fn main() -> swinggate_controller::Result<()> {
//! let leaf = |leaf: Leaf| LeafHardware {
//!     open_sensor: MockInput::new(InputId::OpenSensor(leaf)).0,
//!     motor: MockOutput::new(format!("{leaf} motor")).0,
//!     direction: MockOutput::new(format!("{leaf} direction")).0,
//! };
//! let hardware = GateHardware {
//!     button: MockInput::new(InputId::OpenButton).0,
//!     left: leaf(Leaf::Left),
//!     right: leaf(Leaf::Right),
//!     break_beam: MockInput::new(InputId::BreakBeam).0,
//!     lamp: MockOutput::new("lamp").0,
//! };
//!
//! let gate = GateSystem::new(GateConfig::default(), hardware).start();
//! gate.press_button()?;
//! println!("{:?}", gate.snapshot().await?);
//! gate.shutdown().await?;
//! # Ok(()) }
//! ```

pub mod error;
pub mod event;
pub mod runtime;
pub mod state_machine;

pub use error::{ControllerError, Result};
pub use event::{Action, Event, SensorSnapshot};
pub use runtime::{GateHandle, GateHardware, GateSystem, LeafHardware};
pub use state_machine::{
    ControllerSnapshot, GateController, GateControllerBuilder, LampState, LeafTransition,
    MAX_HISTORY_SIZE,
};
