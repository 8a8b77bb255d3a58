//! Command-line interface definitions for the loader binary.

use std::path::PathBuf;

use clap::Parser;
use monitoring_config::{configuration::StoreBackendKind, snapshot::OutputFormat};


/// Command-line arguments.
#[derive(Parser)]
#[command(
    name = "monitoring-config",
    author,
    about = "Projects the monitoring agent configuration out of the environment and a defaults file.",
    version
)]
pub struct CLIArgs {
    /// This is the path to the configuration file to use.
    /// If unspecified, this defaults to `./data/configuration.toml`.
    #[arg(
        short = 'c',
        long = "configuration-file-path",
        help = "Path to the configuration file to use. Defaults to ./data/configuration.toml"
    )]
    pub configuration_file_path: Option<PathBuf>,

    #[arg(
        long = "backend",
        value_enum,
        help = "Configuration store backend to use. Overrides the configuration file."
    )]
    pub backend: Option<StoreBackendKind>,

    #[arg(
        long = "defaults-file-path",
        help = "Defaults (or snapshot) file for the configuration store. \
                Overrides the configuration file."
    )]
    pub defaults_file_path: Option<PathBuf>,

    #[arg(
        long = "format",
        value_enum,
        default_value_t = OutputFormat::Toml,
        help = "Format to print the projected configuration in."
    )]
    pub format: OutputFormat,

    #[arg(
        short = 'o',
        long = "output-file-path",
        help = "Write the projected configuration to this file instead of standard output."
    )]
    pub output_file_path: Option<PathBuf>,

    #[arg(
        long = "inspect",
        help = "Also check the projected configuration for license key and \
                application name problems."
    )]
    pub inspect: bool,
}
