//! The process-wide monitoring configuration.
//!
//! The agent bootstrap reads the projected configuration through [`config`].
//! It is computed exactly once, by [`CONFIG`]`.initialize(..)` at startup,
//! and never recomputed afterwards.

use std::sync::OnceLock;

use tracing::{debug, info};

use crate::error::ConfigurationError;
use crate::projection::{project, MonitoringConfig};
use crate::store::ConfigurationStore;


/// A monitoring configuration that is projected once and then only read.
pub struct ExportedConfig {
    cell: OnceLock<MonitoringConfig>,
}

impl ExportedConfig {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Project `store` and keep the result.
    ///
    /// If a configuration was already kept, it is returned as-is and `store`
    /// is not read. A failed projection keeps nothing, so it can be retried.
    pub fn initialize<S: ConfigurationStore + ?Sized>(
        &self,
        store: &S,
    ) -> Result<&MonitoringConfig, ConfigurationError> {
        if let Some(existing) = self.cell.get() {
            debug!("Monitoring configuration already initialized, keeping it.");
            return Ok(existing);
        }

        let projected = project(store)?;
        let kept = self.cell.get_or_init(|| projected);

        info!(
            app_name = kept.primary_app_name(),
            agent_enabled = kept.agent_enabled,
            "Monitoring configuration initialized."
        );

        Ok(kept)
    }

    pub fn get(&self) -> Option<&MonitoringConfig> {
        self.cell.get()
    }
}

impl Default for ExportedConfig {
    fn default() -> Self {
        Self::new()
    }
}


/// The exported monitoring configuration of this process.
pub static CONFIG: ExportedConfig = ExportedConfig::new();

/// The exported monitoring configuration, if [`CONFIG`] has been initialized.
pub fn config() -> Option<&'static MonitoringConfig> {
    CONFIG.get()
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{GeneratedStore, StoreValue};

    fn store(license: &str) -> GeneratedStore {
        match StoreValue::from(serde_json::json!({
            "service": { "name": "svc", "environment": "prod" },
            "monitoring": { "newrelic": { "enabled": true, "license": license } }
        })) {
            StoreValue::Table(table) => GeneratedStore::from_table("test", table),
            _ => unreachable!(),
        }
    }

    #[test]
    fn keeps_the_first_projection() {
        let exported = ExportedConfig::new();
        assert!(exported.get().is_none());

        let first = exported.initialize(&store("FIRST")).unwrap().clone();
        let second = exported.initialize(&store("SECOND")).unwrap();

        assert_eq!(first.license_key, "FIRST");
        assert_eq!(second, &first);
        assert_eq!(exported.get(), Some(&first));
    }

    #[test]
    fn failed_projection_keeps_nothing() {
        let exported = ExportedConfig::new();
        let empty = GeneratedStore::from_table("empty", Default::default());

        assert!(exported.initialize(&empty).is_err());
        assert!(exported.get().is_none());

        assert!(exported.initialize(&store("LATER")).is_ok());
        assert_eq!(exported.get().map(|config| config.license_key.as_str()), Some("LATER"));
    }
}
