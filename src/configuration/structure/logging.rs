use std::{collections::HashMap, path::PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use crate::configuration::{
    traits::ResolvableConfigurationWithContext,
    utilities::replace_placeholders_in_path,
};


fn default_log_file_name_prefix() -> String {
    "monitoring-config.log".to_string()
}

const fn default_log_file_output_enabled() -> bool {
    true
}


#[derive(Deserialize, Clone, Debug)]
pub(super) struct UnresolvedLoggingConfiguration {
    console_output_level_filter: String,

    #[serde(default = "default_log_file_output_enabled")]
    log_file_output_enabled: bool,

    log_file_output_level_filter: String,

    log_file_output_directory: String,

    #[serde(default = "default_log_file_name_prefix")]
    log_file_name_prefix: String,
}

/// Where (and how verbosely) the loader itself logs.
/// This is unrelated to the log level handed to the monitoring agent.
#[derive(Clone, Debug)]
pub struct LoggingConfiguration {
    pub console_output_level_filter: String,

    /// `None` if logging to a file is turned off.
    pub log_file: Option<LogFileConfiguration>,
}

#[derive(Clone, Debug)]
pub struct LogFileConfiguration {
    pub output_level_filter: String,

    pub output_directory: PathBuf,

    /// Log files are rotated daily; the date is appended to this prefix.
    pub file_name_prefix: String,
}


fn validate_level_filter(field_name: &str, filter: &str) -> Result<()> {
    EnvFilter::try_new(filter)
        .into_diagnostic()
        .wrap_err_with(|| miette!("Failed to parse field {field_name}: {filter:?}"))?;

    Ok(())
}

impl ResolvableConfigurationWithContext for UnresolvedLoggingConfiguration {
    type Resolved = LoggingConfiguration;
    type Context = HashMap<&'static str, String>;
    type Error = miette::Report;

    fn resolve(self, context: Self::Context) -> Result<Self::Resolved> {
        validate_level_filter("console_output_level_filter", &self.console_output_level_filter)?;

        if !self.log_file_output_enabled {
            return Ok(LoggingConfiguration {
                console_output_level_filter: self.console_output_level_filter,
                log_file: None,
            });
        }

        validate_level_filter(
            "log_file_output_level_filter",
            &self.log_file_output_level_filter,
        )?;

        if self.log_file_name_prefix.trim().is_empty() {
            return Err(miette!("Field log_file_name_prefix must not be empty."));
        }


        let output_directory = replace_placeholders_in_path(self.log_file_output_directory, &context);


        Ok(LoggingConfiguration {
            console_output_level_filter: self.console_output_level_filter,
            log_file: Some(LogFileConfiguration {
                output_level_filter: self.log_file_output_level_filter,
                output_directory,
                file_name_prefix: self.log_file_name_prefix,
            }),
        })
    }
}

impl LoggingConfiguration {
    pub fn console_output_level_filter(&self) -> EnvFilter {
        // PANIC SAFETY: This is safe because we checked that the input is valid in `resolve`.
        EnvFilter::try_new(&self.console_output_level_filter).unwrap()
    }
}

impl LogFileConfiguration {
    pub fn output_level_filter(&self) -> EnvFilter {
        // PANIC SAFETY: This is safe because we checked that the input is valid in `resolve`.
        EnvFilter::try_new(&self.output_level_filter).unwrap()
    }
}
