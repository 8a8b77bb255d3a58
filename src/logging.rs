use std::path::Path;

use miette::{miette, Context, IntoDiagnostic, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};


/// Initializes the global tracing subscriber: a console layer on stderr
/// (stdout is reserved for the projected configuration) and, optionally,
/// a daily-rotated log file.
///
/// The returned guard flushes the file writer when dropped,
/// so keep it alive until the program exits.
pub fn initialize_tracing(
    console_level_filter: EnvFilter,
    log_file: Option<(EnvFilter, &Path, &str)>,
) -> Result<Option<WorkerGuard>> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(console_level_filter);

    let Some((log_file_level_filter, log_file_output_directory, log_file_name_prefix)) = log_file
    else {
        tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .into_diagnostic()
            .wrap_err("Failed to install tracing subscriber.")?;

        return Ok(None);
    };


    std::fs::create_dir_all(log_file_output_directory)
        .into_diagnostic()
        .wrap_err_with(|| {
            miette!(
                "Failed to create log file output directory at {}.",
                log_file_output_directory.display()
            )
        })?;

    let file_appender =
        tracing_appender::rolling::daily(log_file_output_directory, log_file_name_prefix);
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking_writer)
        .with_filter(log_file_level_filter);


    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("Failed to install tracing subscriber.")?;

    Ok(Some(guard))
}
