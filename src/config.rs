//! Console configuration.
//!
//! ## Environment
//!
//! | Variable | Values | Default |
//! |----------|--------|---------|
//! | `CASE_KERNEL_CASE_LOCKS` | `none`, `per_case` | `none` |
//! | `CASE_KERNEL_FALLBACK` | `true`, `false`, `1`, `0` | `true` |
//! | `CASE_KERNEL_SEED` | `true`, `false`, `1`, `0` | `true` |

use std::fmt;
use std::str::FromStr;

/// Environment variable selecting the case lock policy.
pub const ENV_CASE_LOCKS: &str = "CASE_KERNEL_CASE_LOCKS";
/// Environment variable toggling fallback on collaborator failure.
pub const ENV_FALLBACK: &str = "CASE_KERNEL_FALLBACK";
/// Environment variable toggling the built-in seed alerts.
pub const ENV_SEED: &str = "CASE_KERNEL_SEED";

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A variable holds a value that cannot be parsed.
    #[error("Invalid value {value:?} for {var}: expected {expected}")]
    InvalidValue {
        /// Variable name.
        var: &'static str,
        /// Rejected value.
        value: String,
        /// What would have been accepted.
        expected: &'static str,
    },
}

/// Whether handlers serialize read-await-write sequences per case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseLockPolicy {
    /// No locking; concurrent handlers on one case race (last writer wins).
    #[default]
    None,
    /// Hold a per-case lock from the snapshot read until the follow-up write.
    PerCase,
}

impl FromStr for CaseLockPolicy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "per_case" | "per-case" | "percase" => Ok(Self::PerCase),
            _ => Err(()),
        }
    }
}

impl fmt::Display for CaseLockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::PerCase => write!(f, "per_case"),
        }
    }
}

/// Settings for the console workflow and store construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Per-case lock policy.
    pub case_locks: CaseLockPolicy,
    /// Substitute the deterministic stand-in when the collaborator fails.
    pub fallback_on_failure: bool,
    /// Load the built-in seed alerts at startup.
    pub seed_alerts: bool,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            case_locks: CaseLockPolicy::None,
            fallback_on_failure: true,
            seed_alerts: true,
        }
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
            expected: "a boolean",
        }),
    }
}

impl ConsoleConfig {
    /// Enable per-case locking.
    pub fn with_case_locks(mut self, policy: CaseLockPolicy) -> Self {
        self.case_locks = policy;
        self
    }

    /// Toggle fallback on collaborator failure.
    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_on_failure = enabled;
        self
    }

    /// Build a configuration from a variable lookup; unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_CASE_LOCKS) {
            config.case_locks = value.parse().map_err(|_| ConfigError::InvalidValue {
                var: ENV_CASE_LOCKS,
                value: value.clone(),
                expected: "none or per_case",
            })?;
        }
        if let Some(value) = lookup(ENV_FALLBACK) {
            config.fallback_on_failure = parse_bool(ENV_FALLBACK, &value)?;
        }
        if let Some(value) = lookup(ENV_SEED) {
            config.seed_alerts = parse_bool(ENV_SEED, &value)?;
        }

        Ok(config)
    }

    /// Read configuration from the process environment.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read configuration from the environment, falling back to defaults
    /// (with a warning) when a variable is malformed.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Invalid console configuration, using defaults");
            Self::default()
        })
    }
}
