//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use solana_sdk::pubkey::Pubkey;
use std::path::Path;
use std::str::FromStr;

use crate::accounts::timelock::{
    TimelockParams, DEFAULT_DATA_VERSION, DEFAULT_LOCKOUT_DAYS, KIN_MINT, TIMELOCK_PROGRAM_ID,
    TIME_AUTHORITY,
};
use crate::tray::MAX_BILLS_PER_EXCHANGE;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timelock: TimelockConfig,
    #[serde(default)]
    pub tray: TrayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Addresses and seeds used to derive timelock state and vault accounts
#[derive(Debug, Clone, Deserialize)]
pub struct TimelockConfig {
    #[serde(default = "default_program_id")]
    pub program_id: String,
    #[serde(default = "default_mint")]
    pub mint: String,
    #[serde(default = "default_time_authority")]
    pub time_authority: String,
    #[serde(default = "default_lockout_days")]
    pub lockout_days: u8,
    #[serde(default = "default_data_version")]
    pub data_version: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrayConfig {
    /// Bills of one denomination moved per exchange
    #[serde(default = "default_max_bills")]
    pub max_bills_per_exchange: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_program_id() -> String {
    TIMELOCK_PROGRAM_ID.to_string()
}
fn default_mint() -> String {
    KIN_MINT.to_string()
}
fn default_time_authority() -> String {
    TIME_AUTHORITY.to_string()
}
fn default_lockout_days() -> u8 {
    DEFAULT_LOCKOUT_DAYS
}
fn default_data_version() -> u8 {
    DEFAULT_DATA_VERSION
}
fn default_max_bills() -> u64 {
    MAX_BILLS_PER_EXCHANGE
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TimelockConfig {
    fn default() -> Self {
        Self {
            program_id: default_program_id(),
            mint: default_mint(),
            time_authority: default_time_authority(),
            lockout_days: default_lockout_days(),
            data_version: default_data_version(),
        }
    }
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            max_bills_per_exchange: default_max_bills(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            .set_default("timelock.lockout_days", default_lockout_days() as i64)?
            .set_default("timelock.data_version", default_data_version() as i64)?
            .set_default("tray.max_bills_per_exchange", default_max_bills() as i64)?
            .set_default("logging.level", default_log_level())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix TRAY)
            .add_source(
                config::Environment::with_prefix("TRAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.timelock_params()?;

        if self.timelock.lockout_days == 0 {
            anyhow::bail!("lockout_days must be positive");
        }

        let max_bills = self.tray.max_bills_per_exchange;
        if !(1..=MAX_BILLS_PER_EXCHANGE).contains(&max_bills) {
            anyhow::bail!(
                "max_bills_per_exchange must be between 1 and {}, got {}",
                MAX_BILLS_PER_EXCHANGE,
                max_bills
            );
        }

        if self.timelock_params()? != TimelockParams::MAINNET {
            tracing::warn!("Timelock parameters differ from mainnet, derived vaults won't match production");
        }

        Ok(())
    }

    /// Typed timelock parameters for account derivation
    pub fn timelock_params(&self) -> Result<TimelockParams> {
        Ok(TimelockParams {
            program_id: parse_pubkey("program_id", &self.timelock.program_id)?,
            mint: parse_pubkey("mint", &self.timelock.mint)?,
            time_authority: parse_pubkey("time_authority", &self.timelock.time_authority)?,
            lockout_days: self.timelock.lockout_days,
            data_version: self.timelock.data_version,
        })
    }

    /// Human-readable summary
    pub fn display(&self) -> String {
        format!(
            r#"Configuration:
  Timelock:
    program_id: {}
    mint: {}
    time_authority: {}
    lockout_days: {}
    data_version: {}
  Tray:
    max_bills_per_exchange: {}
  Logging:
    level: {}
    json: {}
"#,
            self.timelock.program_id,
            self.timelock.mint,
            self.timelock.time_authority,
            self.timelock.lockout_days,
            self.timelock.data_version,
            self.tray.max_bills_per_exchange,
            self.logging.level,
            self.logging.json,
        )
    }
}

fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid {} public key: {}", field, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timelock_params().unwrap(), TimelockParams::MAINNET);
        assert_eq!(config.tray.max_bills_per_exchange, 9);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.timelock.lockout_days, 21);
        assert_eq!(config.timelock.data_version, 3);
    }

    #[test]
    fn test_load_file() {
        let file = write_config(
            r#"
[timelock]
lockout_days = 7

[tray]
max_bills_per_exchange = 4

[logging]
level = "debug"
json = true
"#,
        );

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.timelock.lockout_days, 7);
        assert_eq!(config.tray.max_bills_per_exchange, 4);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);

        let params = config.timelock_params().unwrap();
        assert_eq!(params.lockout_days, 7);
        assert_eq!(params.mint, KIN_MINT);
    }

    #[test]
    fn test_rejects_chunk_size() {
        for value in [0, 10] {
            let file = write_config(&format!("[tray]\nmax_bills_per_exchange = {}\n", value));
            assert!(Config::load(file.path()).is_err(), "{}", value);
        }
    }

    #[test]
    fn test_rejects_bad_pubkey() {
        let file = write_config("[timelock]\nmint = \"not-a-key\"\n");
        let err = Config::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("mint"));
    }

    #[test]
    fn test_rejects_zero_lockout() {
        let mut config = Config::default();
        config.timelock.lockout_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_display() {
        let display = Config::default().display();
        assert!(display.contains("time2Z2SCnn3qYg3ULKVtdkh8YmZ5jFdKicnA1W2YnJ"));
        assert!(display.contains("max_bills_per_exchange: 9"));
    }
}
