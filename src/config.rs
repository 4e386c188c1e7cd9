//! # Staging Configuration
//!
//! Scheduler settings with three layers, lowest precedence first: built-in defaults, an
//! optional configuration file (format picked from its extension), and `STAGING_*`
//! environment variables.

use crate::constants::{
    env_vars, DEFAULT_JOIN_TIMEOUT_MS, DEFAULT_MAX_CONCURRENT_UNITS, ENV_PREFIX,
};
use crate::error::{Result, StagingError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Wall-clock budget for every join point, in milliseconds
    pub join_timeout_ms: u64,
    /// Maximum executor calls in flight at once for one scheduler
    pub max_concurrent_units: usize,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            max_concurrent_units: DEFAULT_MAX_CONCURRENT_UNITS,
        }
    }
}

impl StagingConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(timeout_ms) = std::env::var(env_vars::JOIN_TIMEOUT_MS) {
            config.join_timeout_ms = timeout_ms.parse().map_err(|e| {
                StagingError::configuration(format!("Invalid join_timeout_ms: {e}"))
            })?;
        }

        if let Ok(max_concurrent) = std::env::var(env_vars::MAX_CONCURRENT_UNITS) {
            config.max_concurrent_units = max_concurrent.parse().map_err(|e| {
                StagingError::configuration(format!("Invalid max_concurrent_units: {e}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder()
            .add_source(::config::Config::try_from(&Self::default())?);

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading staging configuration file");
            builder = builder.add_source(::config::File::from(path).required(true));
        }

        let config: Self = builder
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.join_timeout_ms == 0 {
            return Err(StagingError::configuration(
                "join_timeout_ms must be greater than zero",
            ));
        }
        if self.max_concurrent_units == 0 {
            return Err(StagingError::configuration(
                "max_concurrent_units must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_concurrent_units(mut self, max_concurrent_units: usize) -> Self {
        self.max_concurrent_units = max_concurrent_units;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = StagingConfig::default();
        assert_eq!(config.join_timeout(), Duration::from_secs(60));
        assert_eq!(config.max_concurrent_units, 8);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_values() {
        let zero_timeout = StagingConfig::default().with_join_timeout(Duration::ZERO);
        assert!(matches!(
            zero_timeout.validate(),
            Err(StagingError::Configuration { .. })
        ));

        let zero_pool = StagingConfig::default().with_max_concurrent_units(0);
        assert!(matches!(
            zero_pool.validate(),
            Err(StagingError::Configuration { .. })
        ));
    }

    #[test]
    fn test_env_override_for_join_timeout() {
        std::env::set_var(env_vars::JOIN_TIMEOUT_MS, "1500");
        let config = StagingConfig::from_env();
        std::env::remove_var(env_vars::JOIN_TIMEOUT_MS);

        assert_eq!(config.unwrap().join_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "max_concurrent_units = 3").unwrap();

        let config = StagingConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_concurrent_units, 3);
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let result = StagingConfig::load(Some(Path::new("/nonexistent/staging.toml")));
        assert!(matches!(result, Err(StagingError::Configuration { .. })));
    }
}
