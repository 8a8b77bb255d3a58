//! Projection of a configuration store into the record a monitoring agent expects.
//!
//! The store is first validated into a [`MonitoringSource`] (see [`source`]),
//! which is then turned into a [`MonitoringConfig`]. Both steps are pure:
//! projecting the same store twice yields equal output.

use serde::Serialize;
use tracing::debug;

pub use self::source::{MonitoringSection, MonitoringSource, NewRelicSection, ServiceSection};
use crate::error::ConfigurationError;
use crate::store::ConfigurationStore;

pub mod source;


/// The log level handed to the monitoring agent, regardless of store contents.
pub const AGENT_LOG_LEVEL: &str = "info";


/// Configuration record consumed by the monitoring agent.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MonitoringConfig {
    /// Always exactly one `"<service name>: <environment>"` entry.
    pub app_name: [String; 1],

    pub agent_enabled: bool,

    pub license_key: String,

    pub logging: AgentLoggingConfig,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AgentLoggingConfig {
    pub level: String,
}

impl Default for AgentLoggingConfig {
    fn default() -> Self {
        Self {
            level: AGENT_LOG_LEVEL.to_string(),
        }
    }
}


impl MonitoringConfig {
    pub fn from_source(source: &MonitoringSource) -> Result<Self, ConfigurationError> {
        Ok(Self {
            app_name: [source.app_name()],
            agent_enabled: source.agent_enabled(),
            license_key: source.license_key()?.to_string(),
            logging: AgentLoggingConfig::default(),
        })
    }

    /// The single application name.
    pub fn primary_app_name(&self) -> &str {
        &self.app_name[0]
    }
}


/// Project `store` into a [`MonitoringConfig`].
///
/// Fails with [`ConfigurationError::MissingConfiguration`] if the `service` or
/// `monitoring` groups are absent, or if there is no license key
/// (including when the whole `monitoring.newrelic` block is absent).
pub fn project<S: ConfigurationStore + ?Sized>(
    store: &S,
) -> Result<MonitoringConfig, ConfigurationError> {
    let source = MonitoringSource::read_from(store)?;
    let config = MonitoringConfig::from_source(&source)?;

    debug!(
        app_name = config.primary_app_name(),
        agent_enabled = config.agent_enabled,
        "Projected monitoring configuration."
    );

    Ok(config)
}
