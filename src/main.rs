use std::fs;

use clap::Parser;
use miette::{miette, Context, IntoDiagnostic, Result};
use monitoring_config::{
    configuration::Configuration,
    export::CONFIG,
    inspection::{inspect, FindingSeverity},
    snapshot::render_snapshot,
};
use tracing::{info, warn};

use crate::{cli::CLIArgs, logging::initialize_tracing};

mod cli;
mod logging;


fn main() -> Result<()> {
    let cli_args = CLIArgs::parse();

    // Load configuration.
    let mut configuration = match cli_args.configuration_file_path.as_ref() {
        Some(path) => {
            eprintln!("Loading configuration: {}", path.display());
            Configuration::load_from_path(path)
        }
        None => {
            eprintln!("Loading configuration at default path.");
            Configuration::load_from_default_path()
        }
    }
    .wrap_err("Failed to load configuration file.")?;

    eprintln!(
        "Configuration loaded: {}.",
        configuration.file_path.display()
    );


    let logging_raii_guard = initialize_tracing(
        configuration.logging.console_output_level_filter(),
        configuration.logging.log_file.as_ref().map(|log_file| {
            (
                log_file.output_level_filter(),
                log_file.output_directory.as_path(),
                log_file.file_name_prefix.as_str(),
            )
        }),
    )
    .wrap_err("Failed to initialize tracing.")?;

    info!("Tracing initialized.");


    configuration
        .store
        .apply_overrides(cli_args.backend, cli_args.defaults_file_path.clone());

    let store = configuration
        .store
        .open()
        .wrap_err("Failed to open configuration store.")?;

    let monitoring_config = CONFIG
        .initialize(&store)
        .wrap_err_with(|| miette!("Failed to project monitoring configuration from {store}."))?;


    if cli_args.inspect {
        let findings = inspect(monitoring_config);
        for finding in &findings {
            match finding.severity {
                FindingSeverity::Info => info!("{}", finding.message),
                FindingSeverity::Warning | FindingSeverity::Failure => {
                    warn!(severity = %finding.severity, "{}", finding.message)
                }
            }
        }

        if findings
            .iter()
            .any(|finding| finding.severity == FindingSeverity::Failure)
        {
            warn!("Inspection found problems with the monitoring configuration.");
        }
    }


    let rendered = render_snapshot(monitoring_config, cli_args.format, chrono::Local::now())?;

    match cli_args.output_file_path.as_ref() {
        Some(output_file_path) => {
            fs::write(output_file_path, rendered)
                .into_diagnostic()
                .wrap_err_with(|| {
                    miette!(
                        "Failed to write monitoring configuration to {}.",
                        output_file_path.display()
                    )
                })?;

            info!(
                output_file_path = %output_file_path.display(),
                "Monitoring configuration written."
            );
        }
        None => print!("{rendered}"),
    }


    drop(logging_raii_guard);
    Ok(())
}
