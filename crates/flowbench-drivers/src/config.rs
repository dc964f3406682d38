use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use flowbench_core::ConnectionParams;

/// Serial settings of the flow regulator family.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RrgConfig {
    #[serde(default = "default_rrg_baudrate")]
    pub baudrate: u32,
    #[serde(default = "default_rrg_slave_id")]
    pub slave_id: u8,
    #[serde(default = "default_rrg_timeout")]
    pub timeout: u64,
}

fn default_rrg_baudrate() -> u32 {
    38400
}
fn default_rrg_slave_id() -> u8 {
    1
}
fn default_rrg_timeout() -> u64 {
    50
}

impl Default for RrgConfig {
    fn default() -> Self {
        Self {
            baudrate: default_rrg_baudrate(),
            slave_id: default_rrg_slave_id(),
            timeout: default_rrg_timeout(),
        }
    }
}

impl RrgConfig {
    /// Connection parameters for the regulator on `port`.
    pub fn params_for(&self, port: impl Into<String>) -> ConnectionParams {
        ConnectionParams::new(port, self.baudrate, self.slave_id, self.timeout)
    }
}

/// Serial settings of the relay family.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    #[serde(default = "default_relay_baudrate")]
    pub baudrate: u32,
    #[serde(default = "default_relay_slave_id")]
    pub slave_id: u8,
    #[serde(default = "default_relay_timeout")]
    pub timeout: u64,
}

fn default_relay_baudrate() -> u32 {
    115200
}
fn default_relay_slave_id() -> u8 {
    6
}
fn default_relay_timeout() -> u64 {
    10
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            baudrate: default_relay_baudrate(),
            slave_id: default_relay_slave_id(),
            timeout: default_relay_timeout(),
        }
    }
}

impl RelayConfig {
    /// Connection parameters for the relay on `port`.
    pub fn params_for(&self, port: impl Into<String>) -> ConnectionParams {
        ConnectionParams::new(port, self.baudrate, self.slave_id, self.timeout)
    }
}

/// Bench configuration: one optional section per device family.
///
/// The serial port is deliberately not part of the file config; the operator
/// picks it per invocation.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct BenchConfig {
    #[serde(default)]
    pub rrg: RrgConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

impl BenchConfig {
    /// Load from the named config file (optional, any format the `config`
    /// crate knows) plus environment overrides such as
    /// `FLOWBENCH__RRG__SLAVE_ID=2`.
    pub fn load(config_path: &str) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // The file is optional; the defaults describe a stock bench.
            .add_source(File::with_name(config_path).required(false))
            .add_source(Environment::with_prefix("FLOWBENCH").separator("__"))
            .build()?;

        let config: BenchConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        validate_family("rrg", self.rrg.baudrate, self.rrg.slave_id, self.rrg.timeout)?;
        validate_family(
            "relay",
            self.relay.baudrate,
            self.relay.slave_id,
            self.relay.timeout,
        )
    }
}

fn validate_family(
    family: &str,
    baudrate: u32,
    slave_id: u8,
    timeout: u64,
) -> Result<(), ConfigError> {
    if !(1..=247).contains(&slave_id) {
        return Err(ConfigError::Message(format!(
            "{}: slave_id {} is outside the MODBUS address range 1-247",
            family, slave_id
        )));
    }
    if baudrate == 0 {
        return Err(ConfigError::Message(format!(
            "{}: baudrate must be non-zero",
            family
        )));
    }
    if timeout == 0 {
        return Err(ConfigError::Message(format!(
            "{}: timeout must be non-zero",
            family
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load_yaml(text: &str) -> Result<BenchConfig, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from_str(text, FileFormat::Yaml))
            .build()?;
        let config: BenchConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_missing_sections_use_family_defaults() {
        let config = load_yaml("{}").unwrap();
        assert_eq!(
            config.rrg,
            RrgConfig {
                baudrate: 38400,
                slave_id: 1,
                timeout: 50
            }
        );
        assert_eq!(
            config.relay,
            RelayConfig {
                baudrate: 115200,
                slave_id: 6,
                timeout: 10
            }
        );
    }

    #[test]
    fn test_partial_section_fills_missing_keys() {
        let config = load_yaml("rrg:\n  slave_id: 2\n").unwrap();
        assert_eq!(config.rrg.slave_id, 2);
        assert_eq!(config.rrg.baudrate, 38400);
        assert_eq!(config.rrg.timeout, 50);
    }

    #[test]
    fn test_slave_id_zero_is_rejected() {
        let result = load_yaml("rrg:\n  slave_id: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_slave_id_above_modbus_range_is_rejected() {
        let result = load_yaml("relay:\n  slave_id: 248\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_baudrate_is_rejected() {
        let result = load_yaml("rrg:\n  baudrate: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = load_yaml("relay:\n  timeout: 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_params_carry_the_chosen_port() {
        let config = BenchConfig::default();
        let params = config.rrg.params_for("/dev/ttyUSB0");
        assert_eq!(params.port, "/dev/ttyUSB0");
        assert_eq!(params.baud_rate, 38400);
        assert_eq!(params.slave_id, 1);
        assert_eq!(params.timeout_ms, 50);
    }
}
