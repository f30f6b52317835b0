//! Interactive gate simulator.
//!
//! Reads one command per line from stdin and drives the mock hardware in
//! real time.

use std::path::Path;
use std::time::Duration;

use swinggate_controller::{ControllerSnapshot, GateSystem};
use swinggate_core::{InputId, Leaf, MacAddress};
use swinggate_hardware::mock::{MockInput, MockInputHandle, MockRadioBus};
use swinggate_relay::RemoteButton;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{Panel, load_config, mock_hardware};

const HELP: &str = "\
commands:
  button        press the open button
  open 1|2      leaf reaches its open sensor
  block         obstruct the break-beam
  unblock       clear the break-beam
  radio         press the remote button
  status        print the controller state
  help          show this list
  quit          stop the gate and exit";

const CONTROLLER: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x01]);
const REMOTE: MacAddress = MacAddress::new([0x02, 0x00, 0x00, 0x00, 0x00, 0x02]);

pub async fn run(config: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let config = load_config(config)?;
    config.validate()?;

    let bus = MockRadioBus::new();
    let (remote_line, remote) = MockInput::new(InputId::OpenButton);
    let remote_button = RemoteButton::new(remote_line, bus.attach(REMOTE), CONTROLLER)?;
    tokio::spawn(remote_button.run());

    let (hardware, panel) = mock_hardware();
    let mut system = GateSystem::new(config, hardware);
    system.attach_radio(bus.attach(CONTROLLER));
    let gate = system.start();

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            ["button"] => pulse(&panel.button).await,
            ["open", number] => match number.parse().ok().and_then(|n| Leaf::from_number(n).ok()) {
                Some(leaf) => pulse(&panel.sensors[leaf.index()]).await,
                None => println!("unknown leaf {number}, expected 1 or 2"),
            },
            ["block"] => panel.break_beam.assert_line(),
            ["unblock"] => panel.break_beam.release(),
            ["radio"] => pulse(&remote).await,
            ["status"] => print_status(&gate.snapshot().await?, &panel, json)?,
            ["help"] => println!("{HELP}"),
            ["quit"] | ["exit"] => break,
            _ => println!("unknown command, type `help`"),
        }
    }

    gate.shutdown().await?;
    Ok(())
}

async fn pulse(line: &MockInputHandle) {
    line.assert_line();
    tokio::time::sleep(Duration::from_millis(50)).await;
    line.release();
}

fn print_status(snapshot: &ControllerSnapshot, panel: &Panel, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!(
        "system {}, lamp {} ({})",
        if snapshot.active { "active" } else { "idle" },
        snapshot.lamp,
        if panel.lamp.level() { "lit" } else { "dark" }
    );
    for leaf in Leaf::ALL {
        let motor = if !panel.motors[leaf.index()].level() {
            "stopped"
        } else if panel.directions[leaf.index()].level() {
            "opening"
        } else {
            "closing"
        };
        println!("  {leaf}: {} (motor {motor})", snapshot.status(leaf));
    }
    println!(
        "  timers: {:?}, inputs: {:?}",
        snapshot.armed_timers, snapshot.enabled_inputs
    );
    Ok(())
}
