//! Rendering of the projected [`MonitoringConfig`] into a snapshot document.

use std::fmt::{self, Display, Formatter};

use chrono::{DateTime, Local};
use miette::{Context, IntoDiagnostic, Result};
use tracing::info;

use crate::projection::MonitoringConfig;


/// Format the projected monitoring configuration is rendered in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Toml,
    Json,
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Toml => write!(f, "toml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}


/// Renders `config` in the agent's shape.
///
/// TOML snapshots start with a `# Generated at <RFC 3339>.` comment line.
/// JSON has no comments, so JSON snapshots are the bare agent shape; the generation
/// time is logged for every format.
pub fn render_snapshot(
    config: &MonitoringConfig,
    format: OutputFormat,
    generated_at: DateTime<Local>,
) -> Result<String> {
    let generated_at = generated_at.to_rfc3339();

    let rendered = match format {
        OutputFormat::Toml => {
            let body = toml::to_string_pretty(config)
                .into_diagnostic()
                .wrap_err("Failed to serialize monitoring configuration to TOML.")?;

            format!("# Generated at {generated_at}.\n{body}")
        }
        OutputFormat::Json => {
            let mut body = serde_json::to_string_pretty(config)
                .into_diagnostic()
                .wrap_err("Failed to serialize monitoring configuration to JSON.")?;
            body.push('\n');

            body
        }
    };

    info!(
        %format,
        generated_at = %generated_at,
        "Rendered monitoring configuration snapshot."
    );

    Ok(rendered)
}


#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        project,
        store::{GeneratedStore, StoreValue},
    };

    fn sample_config() -> MonitoringConfig {
        let tree = match StoreValue::from(serde_json::json!({
            "service": { "name": "svc", "environment": "prod" },
            "monitoring": { "newrelic": { "enabled": true, "license": "ABC123" } }
        })) {
            StoreValue::Table(table) => table,
            _ => unreachable!(),
        };

        project(&GeneratedStore::from_table("sample", tree)).unwrap()
    }

    fn generation_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn toml_snapshot_is_headed_by_its_generation_time() {
        let rendered =
            render_snapshot(&sample_config(), OutputFormat::Toml, generation_time()).unwrap();

        let first_line = rendered.lines().next().unwrap();
        assert_eq!(
            first_line,
            format!("# Generated at {}.", generation_time().to_rfc3339())
        );
    }

    #[test]
    fn toml_snapshot_parses_back_into_the_agent_shape() {
        let rendered =
            render_snapshot(&sample_config(), OutputFormat::Toml, generation_time()).unwrap();

        let parsed: toml::Table = toml::from_str(&rendered).unwrap();

        assert_eq!(
            parsed["app_name"],
            toml::Value::Array(vec![toml::Value::String("svc: prod".to_string())])
        );
        assert_eq!(parsed["agent_enabled"], toml::Value::Boolean(true));
        assert_eq!(parsed["license_key"].as_str(), Some("ABC123"));
        assert_eq!(parsed["logging"]["level"].as_str(), Some("info"));
    }

    #[test]
    fn json_snapshot_is_exactly_the_agent_shape() {
        let rendered =
            render_snapshot(&sample_config(), OutputFormat::Json, generation_time()).unwrap();

        assert!(rendered.ends_with('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({
                "app_name": ["svc: prod"],
                "agent_enabled": true,
                "license_key": "ABC123",
                "logging": { "level": "info" }
            })
        );
    }
}
