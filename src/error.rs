use miette::Diagnostic;
use thiserror::Error;


/// Errors that can occur while opening a configuration store or
/// projecting the monitoring configuration out of it.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigurationError {
    /// A required value (or a whole group) is not present in the store.
    #[error("Missing configuration value at `{path}`.")]
    #[diagnostic(
        code(monitoring_config::missing),
        help("Set it in the defaults file or through the matching environment variable.")
    )]
    MissingConfiguration { path: String },

    /// A value is present, but of the wrong kind (e.g. a table where a string is expected).
    #[error("Configuration value at `{path}` must be {expected}, found {found}.")]
    #[diagnostic(code(monitoring_config::invalid_type))]
    InvalidType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A value is of an acceptable kind, but its contents can't be interpreted.
    #[error("Configuration value at `{path}` is not a valid {expected}: {value:?}.")]
    #[diagnostic(code(monitoring_config::invalid_value))]
    InvalidValue {
        path: String,
        expected: &'static str,
        value: String,
    },

    /// A store layer (defaults file, snapshot, environment) could not be loaded or merged.
    #[error("Could not load configuration store from {origin}.")]
    #[diagnostic(
        code(monitoring_config::store_load),
        help("Defaults and snapshot files must exist (unless optional) and be .json or .toml.")
    )]
    StoreLoad {
        origin: String,
        #[source]
        source: config::ConfigError,
    },

    /// The store itself was set up with unusable options.
    #[error("Invalid store setting: {0}")]
    #[diagnostic(code(monitoring_config::invalid_store_setting))]
    InvalidStoreSetting(String),
}

impl ConfigurationError {
    pub(crate) fn missing<S: Into<String>>(path: S) -> Self {
        Self::MissingConfiguration { path: path.into() }
    }

    pub(crate) fn store_load<S: Into<String>>(origin: S, source: config::ConfigError) -> Self {
        Self::StoreLoad {
            origin: origin.into(),
            source,
        }
    }

    /// Returns `true` if this error reports an absent value.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingConfiguration { .. })
    }
}
