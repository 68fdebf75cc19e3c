//! Configuration loading and typed config structures for the swarm service.
//!
//! The canonical configuration lives in `resilience-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader that reads the file, and the startup validation
//! that rejects inconsistent partitions, grids, and deployment policies.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use resilience_types::AgentType;
use serde::Deserialize;

use crate::error::SwarmError;
use crate::partition::RolePartition;
use crate::policy::SelectionPolicy;
use crate::snapshot::GridShape;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// An environment override could not be applied.
    #[error("invalid value for {var}: {message}")]
    Env {
        /// The environment variable name.
        var: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The configuration parsed but is internally inconsistent.
    #[error("invalid configuration: {source}")]
    Invalid {
        /// The validation failure.
        #[from]
        source: SwarmError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
///
/// Mirrors the structure of `resilience-config.yaml`. All fields have
/// defaults so an empty file describes the standard 100-agent swarm.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResilienceConfig {
    /// Swarm size, grid layout, and role partition.
    #[serde(default)]
    pub swarm: SwarmConfig,

    /// Disaster-type to agent-count policy.
    #[serde(default)]
    pub deployment: DeploymentConfig,

    /// Subscriber fan-out and scheduler cadence.
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// HTTP/WebSocket listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ResilienceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values for the listener:
    /// - `RESILIENCE_HOST` overrides `server.host`
    /// - `RESILIENCE_PORT` overrides `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if validation fails.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to unit, not to a map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.server.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that partition, grid, and deployment policy agree with the
    /// swarm size, and that the broadcast cadence is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Configuration`] describing the first problem.
    pub fn validate(&self) -> Result<(), SwarmError> {
        RolePartition::from_allocations(&self.swarm.roles, self.swarm.size)?;
        GridShape::new(self.swarm.size, self.swarm.grid_width)?;
        SelectionPolicy::from_config(&self.deployment, self.swarm.size)?;
        if self.broadcast.interval_ms == 0 {
            return Err(SwarmError::Configuration(
                "broadcast.interval_ms must be greater than zero".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Swarm shape configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SwarmConfig {
    /// Number of agents `N`.
    #[serde(default = "default_swarm_size")]
    pub size: u32,

    /// Grid width. When absent the square root of `N` is used for
    /// perfect squares, otherwise a single row.
    #[serde(default)]
    pub grid_width: Option<u32>,

    /// Ordered role allocation. Ids are handed out contiguously from 1.
    #[serde(default = "default_roles")]
    pub roles: Vec<RoleAllocation>,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            size: default_swarm_size(),
            grid_width: None,
            roles: default_roles(),
        }
    }
}

/// Number of consecutive ids assigned to one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RoleAllocation {
    /// The role.
    pub role: AgentType,
    /// How many agents have it.
    pub count: u32,
}

/// Deployment selection policy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeploymentConfig {
    /// Agents activated for an unrecognized disaster type.
    #[serde(default = "default_deploy_count")]
    pub default_count: u32,

    /// Agents activated per known disaster type (lowercase keys).
    #[serde(default = "default_policies")]
    pub policies: BTreeMap<String, u32>,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            default_count: default_deploy_count(),
            policies: default_policies(),
        }
    }
}

/// Subscriber fan-out configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastConfig {
    /// Milliseconds between status batches.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Maximum concurrent subscribers (0 = unlimited).
    #[serde(default)]
    pub max_subscribers: usize,

    /// Milliseconds a single subscriber may block a delivery before it
    /// is dropped.
    #[serde(default = "default_delivery_timeout_ms")]
    pub delivery_timeout_ms: u64,

    /// Frames buffered per subscriber.
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
}

impl BroadcastConfig {
    /// Scheduler interval as a [`Duration`].
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Per-subscriber delivery timeout as a [`Duration`].
    pub const fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }

    /// Subscriber limit, `None` when unlimited.
    pub const fn subscriber_limit(&self) -> Option<usize> {
        if self.max_subscribers == 0 {
            None
        } else {
            Some(self.max_subscribers)
        }
    }
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_subscribers: 0,
            delivery_timeout_ms: default_delivery_timeout_ms(),
            subscriber_buffer: default_subscriber_buffer(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// The host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Override listener settings with environment variables when set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Env`] if `RESILIENCE_PORT` is not a port number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("RESILIENCE_HOST") {
            self.host = val;
        }
        if let Ok(val) = std::env::var("RESILIENCE_PORT") {
            self.port = val.parse().map_err(|e| ConfigError::Env {
                var: "RESILIENCE_PORT",
                message: format!("{e}"),
            })?;
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_swarm_size() -> u32 {
    100
}

fn default_roles() -> Vec<RoleAllocation> {
    [
        (AgentType::Social, 10),
        (AgentType::News, 10),
        (AgentType::Satellite, 10),
        (AgentType::Sensor, 10),
        (AgentType::Classifier, 10),
        (AgentType::Resource, 10),
        (AgentType::Logistics, 10),
        (AgentType::Predictor, 5),
        (AgentType::Dashboard, 10),
        (AgentType::Reporter, 10),
        (AgentType::Alert, 5),
    ]
    .into_iter()
    .map(|(role, count)| RoleAllocation { role, count })
    .collect()
}

const fn default_deploy_count() -> u32 {
    30
}

fn default_policies() -> BTreeMap<String, u32> {
    let mut m = BTreeMap::new();
    m.insert("earthquake".to_owned(), 50);
    m.insert("flood".to_owned(), 60);
    m.insert("wildfire".to_owned(), 70);
    m
}

const fn default_interval_ms() -> u64 {
    2_000
}

const fn default_delivery_timeout_ms() -> u64 {
    500
}

const fn default_subscriber_buffer() -> usize {
    32
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_owned()
}
