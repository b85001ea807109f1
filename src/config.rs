//! Configuration management with validation and defaults
//!
//! Configuration is read from TOML, overridden by `LOTTERY_*` environment
//! variables, then validated. Everything here is immutable once the engine is
//! constructed.

use crate::errors::{ConfigurationError, LotteryResult};
use crate::oracle::RandomnessRequest;
use crate::types::Wei;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Gas lane used by the development coordinator
pub const DEFAULT_KEY_HASH: &str =
    "0xd89b2bf150e3b9e13446986e571fb9cab24b13cea0a43ea20a6049a85cc807cc";

/// Lottery configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LotteryConfig {
    /// Minimum payment per entry, in wei. Overpayment is kept.
    #[serde(with = "wei_amount")]
    pub entrance_fee: Wei,
    /// Seconds that must elapse since the last draw before upkeep is needed
    pub interval_secs: u64,
    pub randomness: RandomnessConfig,
}

impl Default for LotteryConfig {
    fn default() -> Self {
        Self {
            entrance_fee: 10_000_000_000_000_000, // 0.01 ether
            interval_secs: 30,
            randomness: RandomnessConfig::default(),
        }
    }
}

impl LotteryConfig {
    pub fn with_fee_and_interval(entrance_fee: Wei, interval_secs: u64) -> Self {
        Self {
            entrance_fee,
            interval_secs,
            ..Self::default()
        }
    }
}

/// Oracle subscription settings
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RandomnessConfig {
    /// 32-byte gas lane, hex encoded
    pub key_hash: String,
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl Default for RandomnessConfig {
    fn default() -> Self {
        Self {
            key_hash: DEFAULT_KEY_HASH.to_string(),
            subscription_id: 1,
            request_confirmations: 3,
            callback_gas_limit: 500_000,
            num_words: 1,
        }
    }
}

impl RandomnessConfig {
    /// Build the descriptor sent to the oracle
    pub fn to_request(&self) -> Result<RandomnessRequest, ConfigurationError> {
        Ok(RandomnessRequest {
            key_hash: parse_key_hash(&self.key_hash)?,
            subscription_id: self.subscription_id,
            request_confirmations: self.request_confirmations,
            callback_gas_limit: self.callback_gas_limit,
            num_words: self.num_words,
        })
    }
}

fn parse_key_hash(value: &str) -> Result<[u8; 32], ConfigurationError> {
    let invalid = |reason: &str| ConfigurationError::InvalidValue {
        field: "randomness.key_hash".to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    let bytes = hex::decode(value.strip_prefix("0x").unwrap_or(value))
        .map_err(|_| invalid("Key hash must be hex"))?;
    bytes.try_into().map_err(|_| invalid("Key hash must be 32 bytes"))
}

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    config_path: Option<String>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: "LOTTERY".to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_string_lossy().to_string());
        self
    }

    /// Read overrides from `<prefix>_*` instead of `LOTTERY_*`
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Load configuration from file and environment variables
    pub fn load(&self) -> LotteryResult<LotteryConfig> {
        let mut config = if let Some(ref path) = self.config_path {
            self.load_from_file(path)?
        } else {
            LotteryConfig::default()
        };

        self.apply_env_overrides(&mut config)?;
        Self::validate(&config)?;

        tracing::debug!(
            entrance_fee = config.entrance_fee,
            interval_secs = config.interval_secs,
            subscription_id = config.randomness.subscription_id,
            "Configuration loaded"
        );
        Ok(config)
    }

    fn load_from_file(&self, path: &str) -> LotteryResult<LotteryConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to read {}: {}", path, e)))?;

        toml::from_str(&content)
            .map_err(|e| ConfigurationError::LoadFailed(format!("Failed to parse TOML: {}", e)).into())
    }

    fn env_var(&self, name: &str) -> Option<(String, String)> {
        let key = format!("{}_{}", self.env_prefix, name);
        env::var(&key).ok().map(|value| (key, value))
    }

    fn apply_env_overrides(&self, config: &mut LotteryConfig) -> LotteryResult<()> {
        if let Some((key, value)) = self.env_var("ENTRANCE_FEE") {
            config.entrance_fee = parse_env(&key, &value, "Invalid wei amount")?;
        }
        if let Some((key, value)) = self.env_var("INTERVAL_SECS") {
            config.interval_secs = parse_env(&key, &value, "Invalid interval")?;
        }
        if let Some((key, value)) = self.env_var("SUBSCRIPTION_ID") {
            config.randomness.subscription_id = parse_env(&key, &value, "Invalid subscription id")?;
        }
        if let Some((key, value)) = self.env_var("CALLBACK_GAS_LIMIT") {
            config.randomness.callback_gas_limit = parse_env(&key, &value, "Invalid gas limit")?;
        }
        if let Some((_, value)) = self.env_var("KEY_HASH") {
            config.randomness.key_hash = value;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(config: &LotteryConfig) -> LotteryResult<()> {
        if config.entrance_fee == 0 {
            return Err(invalid_value("entrance_fee", "0", "Entrance fee cannot be zero").into());
        }
        if config.interval_secs == 0 {
            return Err(invalid_value("interval_secs", "0", "Interval cannot be zero").into());
        }
        if config.randomness.num_words == 0 {
            return Err(invalid_value(
                "randomness.num_words",
                "0",
                "At least one random word is required",
            )
            .into());
        }
        if config.randomness.callback_gas_limit == 0 {
            return Err(invalid_value(
                "randomness.callback_gas_limit",
                "0",
                "Callback gas limit cannot be zero",
            )
            .into());
        }
        parse_key_hash(&config.randomness.key_hash)?;
        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, config: &LotteryConfig, path: &str) -> LotteryResult<()> {
        let toml_string = toml::to_string_pretty(config)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)
            .map_err(|e| ConfigurationError::SaveFailed(format!("Failed to write to {}: {}", path, e)).into())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid_value(field: &str, value: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str, reason: &str) -> Result<T, ConfigurationError> {
    value.parse().map_err(|_| invalid_value(key, value, reason))
}

/// Wei amounts exceed TOML's i64 integers, so they are written as decimal
/// strings. Plain integers are still accepted on read.
mod wei_amount {
    use crate::types::Wei;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Wei, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&amount.to_string())
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Wei, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.trim().parse().map_err(de::Error::custom),
            Raw::Number(n) => Ok(n as Wei),
        }
    }
}
