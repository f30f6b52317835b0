//! Event loop binding the state machine to hardware.
//!
//! A [`GateSystem`] owns every device of the controller. Debounced inputs,
//! timer slots and radio listeners all post messages into one queue, and a
//! single task drains it: each event is handed to the [`GateController`]
//! together with freshly sampled sensor levels, and the returned actions are
//! executed in order before the next message is taken. No two events are
//! ever handled concurrently.
//!
//! Only [`GateHandle`]s keep the queue open. Internal producers hold weak
//! senders, so dropping the last handle shuts the gate down just like
//! [`GateHandle::shutdown`].
//!
//! ```text
//!  button ─┐
//!  sensors ├─▶ DebouncedInput ─┐
//!  beam ───┘                   │
//!  timers ─────────────────────┼─▶ queue ─▶ GateController ─▶ actions ─▶ actuators / lamp
//!  radio ──────────────────────┘                                       ─▶ inputs / timers
//! ```

use std::sync::Arc;

use swinggate_core::{GateConfig, InputId, Leaf, LeafStatus};
use swinggate_hardware::{
    DebouncedInput, GateActuator, InputLine, Lamp, OutputLine, RadioTransport, TimerFiring,
    TimerService,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tracing::{debug, error, info, trace, warn};

use crate::error::{ControllerError, Result};
use crate::event::{Action, Event, SensorSnapshot};
use crate::state_machine::{ControllerSnapshot, GateController};

/// Lines of one leaf.
#[derive(Debug)]
pub struct LeafHardware<I, O> {
    pub open_sensor: I,
    pub motor: O,
    pub direction: O,
}

/// Every line wired to the gate controller.
#[derive(Debug)]
pub struct GateHardware<I, O> {
    pub button: I,
    pub left: LeafHardware<I, O>,
    pub right: LeafHardware<I, O>,
    pub break_beam: I,
    pub lamp: O,
}

#[derive(Debug)]
enum Message {
    Event(Event),
    Timer(TimerFiring),
    Snapshot(oneshot::Sender<ControllerSnapshot>),
    Shutdown(oneshot::Sender<()>),
}

/// The gate controller with its devices, before it is started.
pub struct GateSystem<I, O> {
    config: GateConfig,
    tx: mpsc::UnboundedSender<Message>,
    event_loop: EventLoop<I, O>,
}

/// State owned by the running loop task.
struct EventLoop<I, O> {
    controller: GateController,
    button: Arc<DebouncedInput<I>>,
    open_sensors: [Arc<DebouncedInput<I>>; 2],
    break_beam: Arc<DebouncedInput<I>>,
    actuators: [GateActuator<O>; 2],
    lamp: Lamp<O>,
    timers: TimerService,
    rx: mpsc::UnboundedReceiver<Message>,
    tasks: JoinSet<()>,
}

impl<I, O> GateSystem<I, O>
where
    I: InputLine + 'static,
    O: OutputLine + 'static,
{
    /// Wire up the hardware. Only the open button is enabled initially.
    pub fn new(config: GateConfig, hardware: GateHardware<I, O>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let weak = tx.downgrade();

        let controller = GateController::builder()
            .with_timings(config.timings.clone())
            .build();

        let GateHardware {
            button,
            left,
            right,
            break_beam,
            lamp,
        } = hardware;

        let button = debounced(&config, &weak, button);
        let open_sensors = [
            debounced(&config, &weak, left.open_sensor),
            debounced(&config, &weak, right.open_sensor),
        ];
        let break_beam = debounced(&config, &weak, break_beam);
        for sensor in open_sensors.iter().chain([&break_beam]) {
            sensor.disable();
        }

        let actuators = [
            GateActuator::new(Leaf::Left, left.motor, left.direction)
                .with_settle(config.actuator_settle()),
            GateActuator::new(Leaf::Right, right.motor, right.direction)
                .with_settle(config.actuator_settle()),
        ];

        let timer_tx = weak;
        let timers = TimerService::new(move |firing| {
            if let Some(tx) = timer_tx.upgrade() {
                let _ = tx.send(Message::Timer(firing));
            }
        });

        Self {
            config,
            tx,
            event_loop: EventLoop {
                controller,
                button,
                open_sensors,
                break_beam,
                actuators,
                lamp: Lamp::new(lamp),
                timers,
                rx,
                tasks: JoinSet::new(),
            },
        }
    }

    /// Replace the state machine, e.g. with one restored to known leaf
    /// statuses.
    pub fn with_controller(mut self, controller: GateController) -> Self {
        self.event_loop.controller = controller;
        self
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Forward open requests received by `radio` to the controller.
    ///
    /// Frames from peers outside [`GateConfig::trusted_peers`] are dropped.
    /// Must be called from within a Tokio runtime.
    pub fn attach_radio<T>(&mut self, radio: T)
    where
        T: RadioTransport + 'static,
    {
        info!(address = %radio.address(), "Radio attached");
        let tx = self.tx.downgrade();
        let config = self.config.clone();
        self.event_loop.tasks.spawn(listen(radio, tx, config));
    }

    /// Start the input watchers and the event loop.
    ///
    /// The loop runs until [`GateHandle::shutdown`] is called or the last
    /// handle is dropped.
    pub fn start(self) -> GateHandle {
        let Self { tx, mut event_loop, .. } = self;

        let inputs: Vec<_> = event_loop
            .open_sensors
            .iter()
            .chain([&event_loop.button, &event_loop.break_beam])
            .cloned()
            .collect();
        for input in inputs {
            event_loop.tasks.spawn(async move {
                if let Err(e) = input.watch().await {
                    warn!(input = %input.id(), error = %e, "Input watcher stopped");
                }
            });
        }

        tokio::spawn(event_loop.run());
        GateHandle { tx }
    }
}

impl<I, O> EventLoop<I, O>
where
    I: InputLine + 'static,
    O: OutputLine + 'static,
{
    async fn run(mut self) {
        info!(state = %self.controller, "Gate controller started");

        while let Some(message) = self.rx.recv().await {
            match message {
                Message::Event(event) => self.dispatch(event).await,
                Message::Timer(firing) => {
                    if self.timers.is_current(&firing) {
                        self.dispatch(Event::from_timer(firing.id)).await;
                    } else {
                        trace!(timer = %firing.id, generation = firing.generation, "Stale timer firing dropped");
                    }
                }
                Message::Snapshot(reply) => {
                    let _ = reply.send(self.controller.snapshot());
                }
                Message::Shutdown(reply) => {
                    self.shutdown().await;
                    let _ = reply.send(());
                    return;
                }
            }
        }

        info!("Last gate handle dropped");
        self.shutdown().await;
    }

    async fn dispatch(&mut self, event: Event) {
        let sensors = self.sample();
        let actions = self.controller.handle(event, &sensors);
        self.execute(actions).await;
    }

    async fn execute(&mut self, actions: Vec<Action>) {
        for action in actions {
            trace!(?action, "Executing action");
            match action {
                Action::Motor(leaf, command) => {
                    if let Err(e) = self.actuators[leaf.index()].apply(command).await {
                        error!(%leaf, %command, error = %e, "Motor command failed");
                    }
                }
                Action::EnableInput(input) => self.input(input).enable(),
                Action::DisableInput(input) => self.input(input).disable(),
                Action::ArmTimer(timer, mode, period) => self.timers.arm(timer, mode, period),
                Action::CancelTimer(timer) => self.timers.cancel(timer),
                Action::Lamp(command) => {
                    if let Err(e) = self.lamp.apply(command).await {
                        error!(?command, error = %e, "Lamp command failed");
                    }
                }
            }
        }
    }

    async fn shutdown(&mut self) {
        info!("Gate controller shutting down");
        let actions = self.controller.deactivate();
        self.execute(actions).await;
        self.timers.cancel_all();

        for actuator in &mut self.actuators {
            if let Err(e) = actuator.stop().await {
                error!(leaf = %actuator.leaf(), error = %e, "Failed to stop motor");
            }
        }
        self.tasks.abort_all();
    }

    fn sample(&self) -> SensorSnapshot {
        SensorSnapshot {
            open_sensors: [
                self.open_sensors[0].is_asserted(),
                self.open_sensors[1].is_asserted(),
            ],
            break_beam_obstructed: self.break_beam.is_asserted(),
        }
    }

    fn input(&self, input: InputId) -> &DebouncedInput<I> {
        match input {
            InputId::OpenButton => &*self.button,
            InputId::OpenSensor(leaf) => &*self.open_sensors[leaf.index()],
            InputId::BreakBeam => &*self.break_beam,
        }
    }
}

impl<I, O> std::fmt::Debug for GateSystem<I, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateSystem")
            .field("controller", &self.event_loop.controller)
            .field("timers", &self.event_loop.timers)
            .finish_non_exhaustive()
    }
}

fn debounced<I: InputLine>(
    config: &GateConfig,
    tx: &mpsc::WeakUnboundedSender<Message>,
    line: I,
) -> Arc<DebouncedInput<I>> {
    let id = line.id();
    let window = config.debounce.window_for(id);
    let tx = tx.clone();
    let input = DebouncedInput::new(
        line,
        move || {
            if let Some(tx) = tx.upgrade() {
                let _ = tx.send(Message::Event(Event::from_input(id)));
            }
        },
        window,
    )
    .with_settle(config.input_settle());
    Arc::new(input)
}

async fn listen<T: RadioTransport>(
    mut radio: T,
    tx: mpsc::WeakUnboundedSender<Message>,
    config: GateConfig,
) {
    loop {
        let first = match radio.recv().await {
            Ok(datagram) => datagram,
            Err(e) => {
                warn!(error = %e, "Radio listener stopped");
                return;
            }
        };

        let mut next = Some(first);
        while let Some(datagram) = next {
            if !config.is_trusted(&datagram.from) {
                warn!(peer = %datagram.from, "Dropping frame from untrusted peer");
            } else {
                debug!(peer = %datagram.from, len = datagram.payload.len(), "Radio frame received");
                let Some(tx) = tx.upgrade() else {
                    return;
                };
                if tx
                    .send(Message::Event(Event::RadioFrame(datagram.payload)))
                    .is_err()
                {
                    return;
                }
            }

            next = match radio.try_recv() {
                Ok(datagram) => datagram,
                Err(e) => {
                    warn!(error = %e, "Radio listener stopped");
                    return;
                }
            };
        }
    }
}

/// Cloneable handle to a running [`GateSystem`].
#[derive(Debug, Clone)]
pub struct GateHandle {
    tx: mpsc::UnboundedSender<Message>,
}

impl GateHandle {
    /// Request an opening as if the button had been pressed, bypassing the
    /// debounce window.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` if the event loop has exited.
    pub fn press_button(&self) -> Result<()> {
        self.inject(Event::ButtonPressed)
    }

    /// Queue an arbitrary event.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` if the event loop has exited.
    pub fn inject(&self, event: Event) -> Result<()> {
        self.tx
            .send(Message::Event(event))
            .map_err(|_| ControllerError::Stopped)
    }

    /// Snapshot taken after every previously queued message was handled.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` if the event loop has exited.
    pub async fn snapshot(&self) -> Result<ControllerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Message::Snapshot(reply))
            .map_err(|_| ControllerError::Stopped)?;
        response.await.map_err(|_| ControllerError::Stopped)
    }

    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` if the event loop has exited.
    pub async fn status(&self, leaf: Leaf) -> Result<LeafStatus> {
        Ok(self.snapshot().await?.status(leaf))
    }

    /// Deactivate the gate, stop both motors and end the event loop.
    ///
    /// # Errors
    ///
    /// Returns `ControllerError::Stopped` if the event loop had already exited.
    pub async fn shutdown(&self) -> Result<()> {
        let (reply, response) = oneshot::channel();
        self.tx
            .send(Message::Shutdown(reply))
            .map_err(|_| ControllerError::Stopped)?;
        response.await.map_err(|_| ControllerError::Stopped)
    }
}
