//! Runtime configuration for the gate controller and the relay nodes.
//!
//! Every field defaults to the value in [`constants`](crate::constants), so an
//! empty JSON object is a valid configuration:
//!
//! ```
//! use swinggate_core::GateConfig;
//!
//! let config: GateConfig = serde_json::from_str("{}").unwrap();
//! assert_eq!(config, GateConfig::default());
//! config.validate().unwrap();
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::*;
use crate::{Error, InputId, Leaf, MacAddress, Result};

/// Timer periods of the gate controller, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateTimings {
    pub keep_open_ms: u64,
    pub leaf_1_close_ms: u64,
    pub leaf_2_close_ms: u64,
    pub lamp_blink_ms: u64,
}

impl Default for GateTimings {
    fn default() -> Self {
        Self {
            keep_open_ms: KEEP_OPEN_TIME_MS,
            leaf_1_close_ms: LEAF_1_CLOSE_TIME_MS,
            leaf_2_close_ms: LEAF_2_CLOSE_TIME_MS,
            lamp_blink_ms: LAMP_BLINK_PERIOD_MS,
        }
    }
}

impl GateTimings {
    pub fn keep_open(&self) -> Duration {
        Duration::from_millis(self.keep_open_ms)
    }

    /// Calibrated open-loop close duration of a leaf.
    pub fn close_time(&self, leaf: Leaf) -> Duration {
        match leaf {
            Leaf::Left => Duration::from_millis(self.leaf_1_close_ms),
            Leaf::Right => Duration::from_millis(self.leaf_2_close_ms),
        }
    }

    pub fn lamp_blink(&self) -> Duration {
        Duration::from_millis(self.lamp_blink_ms)
    }
}

/// Debounce windows per input, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceWindows {
    pub button_ms: u32,
    pub open_sensor_ms: u32,
    pub break_beam_ms: u32,
}

impl Default for DebounceWindows {
    fn default() -> Self {
        Self {
            button_ms: BUTTON_DEBOUNCE_MS,
            open_sensor_ms: OPEN_SENSOR_DEBOUNCE_MS,
            break_beam_ms: BREAK_BEAM_DEBOUNCE_MS,
        }
    }
}

impl DebounceWindows {
    pub fn window_for(&self, input: InputId) -> u32 {
        match input {
            InputId::OpenButton => self.button_ms,
            InputId::OpenSensor(_) => self.open_sensor_ms,
            InputId::BreakBeam => self.break_beam_ms,
        }
    }
}

/// Gate controller configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub timings: GateTimings,
    pub debounce: DebounceWindows,

    /// Delay between the direction and motor relays.
    pub actuator_settle_ms: u64,

    /// Delay before a raw input edge is re-sampled.
    pub input_settle_ms: u64,

    /// Peers allowed to send open requests over the radio. Empty accepts any peer.
    pub trusted_peers: Vec<MacAddress>,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            timings: GateTimings::default(),
            debounce: DebounceWindows::default(),
            actuator_settle_ms: ACTUATOR_SETTLE_MS,
            input_settle_ms: INPUT_SETTLE_MS,
            trusted_peers: Vec::new(),
        }
    }
}

impl GateConfig {
    /// Load and validate a configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, `Error::ConfigParse` for
    /// malformed JSON and `Error::Config` if validation fails.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading gate configuration");
        let raw = std::fs::read_to_string(path)?;
        let config: GateConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every period is usable.
    ///
    /// # Errors
    /// Returns `Error::Config` describing the first offending field.
    pub fn validate(&self) -> Result<()> {
        let t = &self.timings;
        for (name, value) in [
            ("keep_open_ms", t.keep_open_ms),
            ("leaf_1_close_ms", t.leaf_1_close_ms),
            ("leaf_2_close_ms", t.leaf_2_close_ms),
            ("lamp_blink_ms", t.lamp_blink_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{name} must be greater than zero")));
            }
        }

        let d = &self.debounce;
        for (name, value) in [
            ("button_ms", d.button_ms),
            ("open_sensor_ms", d.open_sensor_ms),
            ("break_beam_ms", d.break_beam_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!(
                    "debounce {name} must be greater than zero"
                )));
            }
        }

        if self.input_settle_ms > MAX_INPUT_SETTLE_MS {
            return Err(Error::Config(format!(
                "input_settle_ms must be at most {MAX_INPUT_SETTLE_MS}, got {}",
                self.input_settle_ms
            )));
        }

        if self.actuator_settle_ms > MAX_ACTUATOR_SETTLE_MS {
            return Err(Error::Config(format!(
                "actuator_settle_ms must be at most {MAX_ACTUATOR_SETTLE_MS}, got {}",
                self.actuator_settle_ms
            )));
        }

        Ok(())
    }

    pub fn actuator_settle(&self) -> Duration {
        Duration::from_millis(self.actuator_settle_ms)
    }

    pub fn input_settle(&self) -> Duration {
        Duration::from_millis(self.input_settle_ms)
    }

    /// Returns `true` if `peer` may send open requests.
    pub fn is_trusted(&self, peer: &MacAddress) -> bool {
        self.trusted_peers.is_empty() || self.trusted_peers.contains(peer)
    }
}

/// Addresses and timeouts of the relay network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Admin/decision node.
    pub admin: MacAddress,

    /// Runner node forwarding between readers and admin.
    pub runner: MacAddress,

    /// Gate controller node.
    pub controller: MacAddress,

    /// Known reader nodes.
    pub readers: Vec<MacAddress>,

    /// How long a reader waits for an access decision.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

fn default_response_timeout_ms() -> u64 {
    DEFAULT_RESPONSE_TIMEOUT_MS
}

impl RelayConfig {
    /// Load and validate a relay configuration file.
    ///
    /// # Errors
    /// Same as [`GateConfig::from_json_file`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let config: RelayConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    /// Returns `Error::Config` if node roles share an address or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.response_timeout_ms == 0 {
            return Err(Error::Config(
                "response_timeout_ms must be greater than zero".to_string(),
            ));
        }

        let roles = [self.admin, self.runner, self.controller];
        for mac in roles.iter().chain(self.readers.iter()) {
            let count = roles
                .iter()
                .chain(self.readers.iter())
                .filter(|other| *other == mac)
                .count();
            if count > 1 {
                return Err(Error::Config(format!(
                    "address {mac} is assigned to more than one node"
                )));
            }
        }
        Ok(())
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn relay_config() -> RelayConfig {
        RelayConfig {
            admin: "1c:69:20:ce:f8:e4".parse().unwrap(),
            runner: "1c:69:20:ce:fa:24".parse().unwrap(),
            controller: "c8:2e:18:51:c8:5c".parse().unwrap(),
            readers: vec![
                "84:0d:8e:ae:59:66".parse().unwrap(),
                "08:a6:f7:bc:e5:48".parse().unwrap(),
            ],
            response_timeout_ms: 5000,
        }
    }

    #[test]
    fn test_defaults_match_constants() {
        let config = GateConfig::default();
        assert_eq!(config.timings.keep_open(), Duration::from_secs(15));
        assert_eq!(
            config.timings.close_time(Leaf::Left),
            Duration::from_millis(11_000)
        );
        assert_eq!(
            config.timings.close_time(Leaf::Right),
            Duration::from_millis(12_300)
        );
        assert_eq!(config.debounce.window_for(InputId::OpenButton), 500);
        assert_eq!(
            config.debounce.window_for(InputId::OpenSensor(Leaf::Right)),
            3000
        );
        assert_eq!(config.debounce.window_for(InputId::BreakBeam), 800);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: GateConfig =
            serde_json::from_str(r#"{ "timings": { "keep_open_ms": 10000 } }"#).unwrap();
        assert_eq!(config.timings.keep_open_ms, 10_000);
        assert_eq!(config.timings.leaf_1_close_ms, LEAF_1_CLOSE_TIME_MS);
        assert_eq!(config.actuator_settle_ms, ACTUATOR_SETTLE_MS);
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let mut config = GateConfig::default();
        config.timings.lamp_blink_ms = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_long_settle() {
        let config = GateConfig {
            actuator_settle_ms: 250,
            ..GateConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_debounce_window() {
        let mut config = GateConfig::default();
        config.debounce.break_beam_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("break_beam_ms"));
    }

    #[test]
    fn test_validate_bounds_input_settle() {
        let mut config = GateConfig {
            input_settle_ms: MAX_INPUT_SETTLE_MS,
            ..GateConfig::default()
        };
        assert!(config.validate().is_ok());

        config.input_settle_ms = 60_000;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_trusted_peers() {
        let peer: MacAddress = "c8:2e:18:51:7e:e9".parse().unwrap();
        let stranger: MacAddress = "00:11:22:33:44:55".parse().unwrap();

        let open = GateConfig::default();
        assert!(open.is_trusted(&stranger));

        let restricted = GateConfig {
            trusted_peers: vec![peer],
            ..GateConfig::default()
        };
        assert!(restricted.is_trusted(&peer));
        assert!(!restricted.is_trusted(&stranger));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "debounce": {{ "break_beam_ms": 600 }}, "trusted_peers": ["c8:2e:18:51:7e:e9"] }}"#
        )
        .unwrap();

        let config = GateConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.debounce.break_beam_ms, 600);
        assert_eq!(config.trusted_peers.len(), 1);
    }

    #[test]
    fn test_from_json_file_missing() {
        let result = GateConfig::from_json_file("/nonexistent/swinggate.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_relay_config_validate() {
        relay_config().validate().unwrap();

        let mut duplicate = relay_config();
        duplicate.readers.push(duplicate.admin);
        assert!(duplicate.validate().is_err());
    }

    #[test]
    fn test_relay_config_default_timeout() {
        let json = r#"{
            "admin": "1c:69:20:ce:f8:e4",
            "runner": "1c:69:20:ce:fa:24",
            "controller": "c8:2e:18:51:c8:5c",
            "readers": ["84:0d:8e:ae:59:66"]
        }"#;
        let config: RelayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.response_timeout(), Duration::from_secs(5));
    }
}
