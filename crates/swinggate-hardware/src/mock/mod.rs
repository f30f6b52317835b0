//! Mock device implementations for testing and simulation.
//!
//! Every mock comes as a `(device, handle)` pair. The device implements the
//! trait from [`traits`](crate::traits) and is handed to the code under test;
//! the handle stays with the test to drive inputs and observe outputs.

pub mod display;
pub mod input;
pub mod output;
pub mod radio;
pub mod rfid;

pub use display::{MockDisplay, MockDisplayHandle};
pub use input::{MockInput, MockInputHandle};
pub use output::{MockOutput, MockOutputHandle};
pub use radio::{MockRadio, MockRadioBus};
pub use rfid::{MockRfid, MockRfidHandle};
