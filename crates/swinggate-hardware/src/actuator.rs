//! Leaf motor actuator and status lamp.
//!
//! A leaf motor is driven through two relays: an enable line that powers the
//! motor and a direction line that selects the rotation. The direction relay
//! must never switch while the motor is powered, so every command first cuts
//! the motor, waits for the relays to settle, sets the direction, waits
//! again, and only then powers the motor.
//!
//! There is no position feedback. The caller stops the motor when the open
//! sensor triggers or when the calibrated close time has elapsed.

use std::time::Duration;

use swinggate_core::Leaf;
use swinggate_core::constants::ACTUATOR_SETTLE_MS;
use tracing::{debug, trace};

use crate::Result;
use crate::traits::OutputLine;
use crate::types::{LampCommand, MotorCommand, MotorDirection};

/// Motor actuator of one leaf.
#[derive(Debug)]
pub struct GateActuator<O> {
    leaf: Leaf,
    motor: O,
    direction: O,
    settle: Duration,
    running: Option<MotorDirection>,
}

impl<O: OutputLine> GateActuator<O> {
    /// Create an actuator with the default relay settle delay.
    pub fn new(leaf: Leaf, motor: O, direction: O) -> Self {
        Self {
            leaf,
            motor,
            direction,
            settle: Duration::from_millis(ACTUATOR_SETTLE_MS),
            running: None,
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    pub fn leaf(&self) -> Leaf {
        self.leaf
    }

    /// Returns `true` while the motor is powered.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Rotation of the powered motor, `None` when stopped.
    pub fn direction(&self) -> Option<MotorDirection> {
        self.running
    }

    /// Swing the leaf open.
    ///
    /// # Errors
    ///
    /// Returns the error of the first line that could not be driven. The motor
    /// may be left stopped in that case.
    pub async fn open(&mut self) -> Result<()> {
        self.run(MotorDirection::CounterClockwise).await
    }

    /// Swing the leaf closed.
    ///
    /// # Errors
    ///
    /// Same as [`open`](Self::open).
    pub async fn close(&mut self) -> Result<()> {
        self.run(MotorDirection::Clockwise).await
    }

    /// Cut the motor and release the direction relay.
    ///
    /// # Errors
    ///
    /// Returns the error of the first line that could not be driven.
    pub async fn stop(&mut self) -> Result<()> {
        self.motor.set_level(false).await?;
        self.running = None;
        self.settle().await;
        self.direction.set_level(false).await?;
        debug!(leaf = %self.leaf, "Motor stopped");
        Ok(())
    }

    /// Execute a [`MotorCommand`].
    ///
    /// # Errors
    ///
    /// Same as the underlying command.
    pub async fn apply(&mut self, command: MotorCommand) -> Result<()> {
        match command {
            MotorCommand::Open => self.open().await,
            MotorCommand::Close => self.close().await,
            MotorCommand::Stop => self.stop().await,
        }
    }

    async fn run(&mut self, direction: MotorDirection) -> Result<()> {
        self.motor.set_level(false).await?;
        self.running = None;
        self.settle().await;
        self.direction.set_level(direction.line_level()).await?;
        self.settle().await;
        self.motor.set_level(true).await?;
        self.running = Some(direction);
        debug!(leaf = %self.leaf, %direction, "Motor running");
        Ok(())
    }

    async fn settle(&self) {
        if !self.settle.is_zero() {
            tokio::time::sleep(self.settle).await;
        }
    }
}

/// Status lamp on a single output line.
#[derive(Debug)]
pub struct Lamp<O> {
    line: O,
}

impl<O: OutputLine> Lamp<O> {
    pub fn new(line: O) -> Self {
        Self { line }
    }

    pub fn is_on(&self) -> bool {
        self.line.level()
    }

    pub async fn on(&mut self) -> Result<()> {
        self.line.set_level(true).await
    }

    pub async fn off(&mut self) -> Result<()> {
        self.line.set_level(false).await
    }

    pub async fn toggle(&mut self) -> Result<()> {
        let level = !self.line.level();
        trace!(on = level, "Lamp toggled");
        self.line.set_level(level).await
    }

    pub async fn apply(&mut self, command: LampCommand) -> Result<()> {
        match command {
            LampCommand::On => self.on().await,
            LampCommand::Off => self.off().await,
            LampCommand::Toggle => self.toggle().await,
        }
    }
}
