//! Hardware abstraction layer for the swing gate controller.
//!
//! This crate sits between the gate logic and the physical world. It defines
//! the device traits the rest of the workspace is written against, the
//! building blocks that turn raw lines into well-behaved components, and
//! in-memory mocks of every device.
//!
//! # Device Traits
//!
//! - [`InputLine`]: a digital input raising edge interrupts (open button,
//!   open sensors, break-beam).
//! - [`OutputLine`]: a digital output (motor relays, lamp).
//! - [`MonotonicClock`]: a wrapping millisecond tick counter.
//! - [`RfidReader`] and [`StatusDisplay`]: the peripherals of a reader
//!   station.
//! - [`RadioTransport`]: the best-effort point-to-point radio linking the
//!   reader stations, the relay nodes and the gate controller.
//!
//! # Building Blocks
//!
//! - [`DebouncedInput`](debounce::DebouncedInput) filters contact bounce and
//!   can be enabled and disabled at any time.
//! - [`TimerService`](timer::TimerService) provides the exclusive one-shot
//!   and periodic timer slots of the controller.
//! - [`GateActuator`](actuator::GateActuator) drives one leaf motor through
//!   its enable and direction relays, [`Lamp`](actuator::Lamp) the status
//!   lamp.
//!
//! # Example
//!
//! ```
//! use swinggate_core::Leaf;
//! use swinggate_hardware::actuator::GateActuator;
//! use swinggate_hardware::mock::MockOutput;
//!
//! # #[tokio::main] async fn main() -> swinggate_hardware::Result<()> {
//! let (motor, motor_handle) = MockOutput::new("gate 1 motor");
//! let (direction, direction_handle) = MockOutput::new("gate 1 direction");
//! let mut actuator = GateActuator::new(Leaf::Left, motor, direction)
//!     .with_settle(std::time::Duration::ZERO);
//!
//! actuator.open().await?;
//! assert!(motor_handle.level());
//! assert!(direction_handle.level());
//! # Ok(()) }
//! ```
//!
//! # Error Handling
//!
//! Fallible operations return [`Result<T>`] with [`HardwareError`]. The
//! debounce layer never fails; it only filters.

pub mod actuator;
pub mod clock;
pub mod debounce;
pub mod error;
pub mod mock;
pub mod timer;
pub mod traits;
pub mod types;

pub use actuator::{GateActuator, Lamp};
pub use clock::{ManualClock, TokioClock};
pub use debounce::DebouncedInput;
pub use error::{HardwareError, Result};
pub use timer::{Timer, TimerFiring, TimerService};
pub use traits::{
    InputLine, MonotonicClock, OutputLine, RadioTransport, RfidReader, StatusDisplay,
};
pub use types::{Datagram, LampCommand, MotorCommand, MotorDirection, TimerMode};
