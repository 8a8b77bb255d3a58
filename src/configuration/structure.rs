use std::fs;
use std::path::{Path, PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;

pub use self::logging::{LogFileConfiguration, LoggingConfiguration};
use self::logging::UnresolvedLoggingConfiguration;
pub use self::store::{StoreBackendKind, StoreConfiguration};
use self::store::UnresolvedStoreConfiguration;
use super::traits::ResolvableConfigurationWithContext;
use super::utilities::{get_default_configuration_file_path, placeholders_for_configuration_file};

mod logging;
mod store;



#[derive(Deserialize, Debug)]
pub(crate) struct UnresolvedConfiguration {
    /// Logging-related configuration.
    logging: UnresolvedLoggingConfiguration,

    /// Configuration store configuration.
    store: UnresolvedStoreConfiguration,
}


/// The entire loader configuration.
#[derive(Debug, Clone)]
pub struct Configuration {
    /// This is the file path this `Configuration` instance was loaded from.
    pub file_path: PathBuf,

    /// Logging-related configuration.
    pub logging: LoggingConfiguration,

    /// Which configuration store to project the monitoring configuration from.
    pub store: StoreConfiguration,
}


impl ResolvableConfigurationWithContext for UnresolvedConfiguration {
    type Resolved = Configuration;
    type Context = PathBuf;
    type Error = miette::Report;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved> {
        let placeholders = placeholders_for_configuration_file(&context);

        let logging = self
            .logging
            .resolve(placeholders.clone())
            .wrap_err("Failed to resolve logging table.")?;

        let store = self
            .store
            .resolve(placeholders)
            .wrap_err("Failed to resolve store table.")?;


        Ok(Configuration {
            file_path: context,
            logging,
            store,
        })
    }
}


impl Configuration {
    /// Load the configuration from a specific file path.
    pub fn load_from_path<S: AsRef<Path>>(configuration_file_path: S) -> Result<Self> {
        // Read the configuration file into memory.
        let configuration_string = fs::read_to_string(configuration_file_path.as_ref())
            .into_diagnostic()
            .wrap_err_with(|| {
                miette!(
                    "Could not read configuration file {}.",
                    configuration_file_path.as_ref().display()
                )
            })?;


        // Parse the string into the `UnresolvedConfiguration` structure and then resolve it.
        let unresolved_configuration =
            toml::from_str::<UnresolvedConfiguration>(&configuration_string)
                .into_diagnostic()
                .wrap_err("Could not load configuration file!")?;


        let configuration_file_path = dunce::canonicalize(configuration_file_path)
            .into_diagnostic()
            .wrap_err("Could not canonicalize configuration file path!")?;

        let resolved_configuration = unresolved_configuration
            .resolve(configuration_file_path)
            .wrap_err("Failed to resolve configuration.")?;

        Ok(resolved_configuration)
    }

    /// Load the configuration from the default path (`./data/configuration.toml`).
    pub fn load_from_default_path() -> Result<Configuration> {
        Configuration::load_from_path(
            get_default_configuration_file_path()
                .wrap_err_with(|| "Could not load configuration file at default path.")?,
        )
    }
}
