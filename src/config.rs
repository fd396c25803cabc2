//! Ledger configuration.
//!
//! [`LedgerConfig`] deserializes with defaults for every missing field so that it can be
//! embedded in a host application's configuration file, or read from the environment with
//! [`LedgerConfig::from_env`].

use serde::Deserialize;

/// Default number of read-modify-write attempts before surfacing a conflict.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Environment variable overriding [`LedgerConfig::max_attempts`].
pub const MAX_ATTEMPTS_ENV: &str = "LOYALTY_MAX_ATTEMPTS";

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Attempts of a read-modify-write cycle under contention.
    ///
    /// Default: 5. Must be at least 1.
    pub max_attempts: u32,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl LedgerConfig {
    /// Read the configuration from the environment, falling back to defaults
    pub fn from_env() -> Result<Self, Error> {
        let config = match std::env::var(MAX_ATTEMPTS_ENV) {
            Ok(value) => Self::default().with_max_attempts_str(&value)?,
            Err(std::env::VarError::NotPresent) => Self::default(),
            Err(err) => {
                return Err(Error::InvalidValue {
                    key: MAX_ATTEMPTS_ENV,
                    value: err.to_string(),
                })
            }
        };

        config.validate()?;
        Ok(config)
    }

    fn with_max_attempts_str(self, value: &str) -> Result<Self, Error> {
        let max_attempts = value.trim().parse().map_err(|_| Error::InvalidValue {
            key: MAX_ATTEMPTS_ENV,
            value: value.to_string(),
        })?;

        Ok(Self {
            max_attempts,
            ..self
        })
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.max_attempts == 0 {
            return Err(Error::ZeroAttempts);
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
}
