//! Runtime configuration, sourced from `MUTATOR_*` environment variables.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::Level;

use crate::webhooks::{DEFAULT_WORKLOAD_KIND, MutationPolicy};

/// Address the TLS webhook listener binds to
pub const ENV_BIND: &str = "MUTATOR_BIND";
/// PEM certificate served by the webhook
pub const ENV_CERT: &str = "MUTATOR_CERT";
/// PEM private key for the certificate
pub const ENV_KEY: &str = "MUTATOR_KEY";
/// Log level for this crate (`trace` through `error`)
pub const ENV_LOG_LEVEL: &str = "MUTATOR_LOGLEVEL";
/// Address of the plain-HTTP health and metrics listener
pub const ENV_HEALTH_BIND: &str = "MUTATOR_HEALTH_BIND";
/// Comma-separated workload kinds the policy applies to
pub const ENV_WORKLOAD_KINDS: &str = "MUTATOR_WORKLOAD_KINDS";

pub const DEFAULT_BIND: &str = "0.0.0.0:5000";
pub const DEFAULT_CERT: &str = "server-cert.pem";
pub const DEFAULT_KEY: &str = "server-key.pem";
pub const DEFAULT_HEALTH_BIND: &str = "0.0.0.0:8080";

/// Errors raised while reading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}={value} is not a valid socket address: {source}")]
    InvalidAddress {
        var: &'static str,
        value: String,
        #[source]
        source: AddrParseError,
    },

    #[error("{var}={value} is not a valid log level")]
    InvalidLogLevel { var: &'static str, value: String },

    #[error("{var} must name at least one workload kind")]
    NoWorkloadKinds { var: &'static str },
}

/// Settings for the webhook process
#[derive(Clone, Debug, PartialEq)]
pub struct WebhookConfig {
    pub bind: SocketAddr,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub log_level: Level,
    pub health_bind: SocketAddr,
    pub workload_kinds: Vec<String>,
}

impl WebhookConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// unset or blank variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str, default: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind = parse_addr(ENV_BIND, get(ENV_BIND, DEFAULT_BIND))?;
        let health_bind = parse_addr(
            ENV_HEALTH_BIND,
            get(ENV_HEALTH_BIND, DEFAULT_HEALTH_BIND),
        )?;

        let level = get(ENV_LOG_LEVEL, "info");
        let log_level = Level::from_str(&level).map_err(|_| ConfigError::InvalidLogLevel {
            var: ENV_LOG_LEVEL,
            value: level.clone(),
        })?;

        let workload_kinds: Vec<String> = get(ENV_WORKLOAD_KINDS, DEFAULT_WORKLOAD_KIND)
            .split(',')
            .map(str::trim)
            .filter(|kind| !kind.is_empty())
            .map(str::to_string)
            .collect();
        if workload_kinds.is_empty() {
            return Err(ConfigError::NoWorkloadKinds {
                var: ENV_WORKLOAD_KINDS,
            });
        }

        Ok(Self {
            bind,
            cert_path: PathBuf::from(get(ENV_CERT, DEFAULT_CERT)),
            key_path: PathBuf::from(get(ENV_KEY, DEFAULT_KEY)),
            log_level,
            health_bind,
            workload_kinds,
        })
    }

    /// The mutation policy these settings describe
    pub fn policy(&self) -> MutationPolicy {
        MutationPolicy::new(self.workload_kinds.iter().cloned())
    }

    /// `EnvFilter` directive enabling this crate at the configured level
    pub fn log_directive(&self) -> String {
        format!(
            "nodeselector_mutator={}",
            self.log_level.as_str().to_ascii_lowercase()
        )
    }
}

fn parse_addr(var: &'static str, value: String) -> Result<SocketAddr, ConfigError> {
    value
        .parse()
        .map_err(|source| ConfigError::InvalidAddress { var, value, source })
}
