//! Card scans through a simulated relay network.
//!
//! Builds a reader, a runner, an admin node and a gate controller on one
//! mock radio bus, then scans each card in turn.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use swinggate_controller::GateSystem;
use swinggate_core::constants::DEFAULT_RESPONSE_TIMEOUT_MS;
use swinggate_core::{CardUid, GateConfig, MacAddress, RelayConfig};
use swinggate_hardware::mock::{MockDisplay, MockRadioBus, MockRfid};
use swinggate_relay::{AdminNode, AllowList, ReaderNode, Runner};
use tracing::warn;

use super::{load_config, mock_hardware};

const READER: MacAddress = MacAddress::new([0x84, 0x0d, 0x8e, 0xae, 0x59, 0x66]);
const RUNNER: MacAddress = MacAddress::new([0x1c, 0x69, 0x20, 0xce, 0xfa, 0x24]);
const ADMIN: MacAddress = MacAddress::new([0x1c, 0x69, 0x20, 0xce, 0xf8, 0x0c]);
const CONTROLLER: MacAddress = MacAddress::new([0xd8, 0x13, 0x2a, 0x2f, 0x3b, 0x10]);

pub struct DemoOptions {
    pub relay_config: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
    pub allowed: Vec<String>,
    pub scans: Vec<String>,
}

pub async fn run(config: Option<&Path>, options: DemoOptions) -> anyhow::Result<()> {
    let mut relay = match &options.relay_config {
        Some(path) => RelayConfig::from_json_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RelayConfig {
            admin: ADMIN,
            runner: RUNNER,
            controller: CONTROLLER,
            readers: vec![READER],
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
        },
    };
    if let Some(timeout_ms) = options.timeout_ms {
        relay.response_timeout_ms = timeout_ms;
    }
    relay.validate()?;
    let reader_address = *relay
        .readers
        .first()
        .context("relay configuration lists no reader")?;

    let allow_list = AllowList::new(parse_uids(&options.allowed)?);
    let scans = parse_uids(&options.scans)?;

    let bus = MockRadioBus::new();

    let runner = Runner::from_config(&relay)?;
    let runner_radio = bus.attach(relay.runner);
    tokio::spawn(async move {
        if let Err(e) = runner.run(runner_radio).await {
            warn!(error = %e, "Runner stopped");
        }
    });

    let mut admin = AdminNode::new(allow_list, relay.controller);
    let admin_radio = bus.attach(relay.admin);
    tokio::spawn(async move {
        if let Err(e) = admin.run(admin_radio).await {
            warn!(error = %e, "Admin node stopped");
        }
    });

    let gate_config = GateConfig {
        trusted_peers: vec![relay.admin],
        ..load_config(config)?
    };
    gate_config.validate()?;
    let (hardware, _panel) = mock_hardware();
    let mut system = GateSystem::new(gate_config, hardware);
    system.attach_radio(bus.attach(relay.controller));
    let gate = system.start();

    let (rfid, card) = MockRfid::with_name("reader 1");
    let (display, screen) = MockDisplay::new();
    let mut reader = ReaderNode::new(rfid, display, bus.attach(reader_address), relay.runner)?
        .with_response_timeout(relay.response_timeout())
        .with_hold(Duration::from_millis(200));

    for uid in scans {
        card.tap(uid.clone());
        let outcome = reader.scan_once().await?;
        let snapshot = gate.snapshot().await?;
        println!(
            "{uid}: {outcome:?} | display: {} | gate {}",
            screen.lines().join(" / "),
            if snapshot.active { "active" } else { "idle" }
        );
    }

    gate.shutdown().await?;
    Ok(())
}

fn parse_uids(values: &[String]) -> anyhow::Result<Vec<CardUid>> {
    values
        .iter()
        .map(|value| {
            value
                .parse::<CardUid>()
                .with_context(|| format!("invalid card UID {value:?}"))
        })
        .collect()
}
