use std::{collections::HashMap, fmt, path::PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;
use tracing::info;

use crate::{
    configuration::{
        traits::ResolvableConfigurationWithContext,
        utilities::replace_placeholders_in_path,
    },
    error::ConfigurationError,
    store::{GeneratedStore, LayeredStore, StoreBackend, DEFAULT_ENVIRONMENT_SEPARATOR},
};


/// Which [`StoreBackend`] variant to open.
#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    /// Environment variables layered over the defaults file.
    Layered,
    /// The defaults file taken as a pre-generated snapshot, without environment layering.
    Generated,
}

impl fmt::Display for StoreBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackendKind::Layered => write!(f, "layered"),
            StoreBackendKind::Generated => write!(f, "generated"),
        }
    }
}


const fn default_true() -> bool {
    true
}

fn default_environment_separator() -> String {
    DEFAULT_ENVIRONMENT_SEPARATOR.to_string()
}


#[derive(Deserialize, Clone, Debug)]
pub(super) struct UnresolvedStoreConfiguration {
    backend: StoreBackendKind,

    defaults_file_path: String,

    #[serde(default = "default_true")]
    defaults_file_required: bool,

    #[serde(default)]
    environment_prefix: String,

    #[serde(default = "default_environment_separator")]
    environment_separator: String,
}

/// Settings for the configuration store the monitoring configuration is projected from.
#[derive(Clone, Debug)]
pub struct StoreConfiguration {
    pub backend: StoreBackendKind,

    pub defaults_file_path: PathBuf,

    /// Only relevant to the layered backend; the generated backend always requires its file.
    pub defaults_file_required: bool,

    pub environment_prefix: String,

    pub environment_separator: String,
}

impl ResolvableConfigurationWithContext for UnresolvedStoreConfiguration {
    type Resolved = StoreConfiguration;
    type Context = HashMap<&'static str, String>;
    type Error = miette::Report;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved> {
        if self.environment_separator.is_empty() {
            return Err(miette!("Field environment_separator must not be empty."));
        }

        let defaults_file_path = replace_placeholders_in_path(self.defaults_file_path, &context);

        let defaults_file_must_exist =
            self.defaults_file_required || self.backend == StoreBackendKind::Generated;

        let defaults_file_path = if defaults_file_path.exists() {
            dunce::canonicalize(&defaults_file_path)
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!(
                        "Failed to canonicalize defaults file path {}.",
                        defaults_file_path.display()
                    )
                })?
        } else if defaults_file_must_exist {
            return Err(miette!(
                "Defaults file {} does not exist.",
                defaults_file_path.display()
            ));
        } else {
            defaults_file_path
        };


        Ok(StoreConfiguration {
            backend: self.backend,
            defaults_file_path,
            defaults_file_required: self.defaults_file_required,
            environment_prefix: self.environment_prefix,
            environment_separator: self.environment_separator,
        })
    }
}


impl StoreConfiguration {
    /// Apply overrides given on the command line.
    /// A defaults file named explicitly is always required.
    pub fn apply_overrides(
        &mut self,
        backend: Option<StoreBackendKind>,
        defaults_file_path: Option<PathBuf>,
    ) {
        if let Some(backend) = backend {
            info!(%backend, "Store backend overridden from the command line.");
            self.backend = backend;
        }

        if let Some(defaults_file_path) = defaults_file_path {
            info!(
                defaults_file_path = %defaults_file_path.display(),
                "Defaults file overridden from the command line."
            );
            self.defaults_file_path = defaults_file_path;
            self.defaults_file_required = true;
        }
    }

    /// Open the configured store backend, reading the defaults file
    /// and (for the layered backend) the process environment.
    pub fn open(&self) -> Result<StoreBackend, ConfigurationError> {
        let backend: StoreBackend = match self.backend {
            StoreBackendKind::Layered => {
                let builder = LayeredStore::builder()
                    .separator(self.environment_separator.as_str())
                    .environment_prefix(self.environment_prefix.as_str())
                    .process_environment();

                let builder = if self.defaults_file_required {
                    builder.defaults_file(&self.defaults_file_path)
                } else {
                    builder.optional_defaults_file(&self.defaults_file_path)
                };

                builder.build()?.into()
            }
            StoreBackendKind::Generated => {
                GeneratedStore::from_snapshot_file(&self.defaults_file_path)?.into()
            }
        };

        info!(backend = %backend, "Opened configuration store.");
        Ok(backend)
    }
}
