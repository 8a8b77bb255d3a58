//! Assembles the configuration record a monitoring agent expects
//! (`app_name`, `agent_enabled`, `license_key`, `logging.level`)
//! out of a resolved configuration store.
//!
//! ```no_run
//! use monitoring_config::{export::CONFIG, store::LayeredStore};
//!
//! # fn main() -> miette::Result<()> {
//! let store = LayeredStore::builder()
//!     .defaults_file("data/monitoring-defaults.json")
//!     .process_environment()
//!     .build()?;
//!
//! let config = CONFIG.initialize(&store)?;
//! println!("{}", config.primary_app_name());
//! # Ok(())
//! # }
//! ```

pub mod configuration;
pub mod error;
pub mod export;
pub mod inspection;
pub mod projection;
pub mod snapshot;
pub mod store;

pub use error::ConfigurationError;
pub use export::config;
pub use projection::{project, MonitoringConfig};
pub use store::{ConfigurationStore, StoreBackend};
