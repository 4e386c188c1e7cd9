//! # System Constants
//!
//! Defaults and environment variable names shared by configuration and logging.

/// Join budget applied when no configuration overrides it.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 60_000;

/// Upper bound on executor calls running at the same time across one scheduler.
pub const DEFAULT_MAX_CONCURRENT_UNITS: usize = 8;

/// Prefix for every environment variable the crate reads.
pub const ENV_PREFIX: &str = "STAGING";

pub mod env_vars {
    pub const JOIN_TIMEOUT_MS: &str = "STAGING_JOIN_TIMEOUT_MS";
    pub const MAX_CONCURRENT_UNITS: &str = "STAGING_MAX_CONCURRENT_UNITS";
    pub const ENVIRONMENT: &str = "STAGING_ENV";
    pub const LOG_FORMAT: &str = "STAGING_LOG_FORMAT";
}

/// Stage lifecycle operations reported through structured logging.
pub mod stage_operations {
    pub const BUILD_STARTED: &str = "build_started";
    pub const BUILD_COMPLETED: &str = "build_completed";
    pub const COMMIT_COMPLETED: &str = "commit_completed";
    pub const FAILED: &str = "failed";
}
