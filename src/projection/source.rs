use tracing::debug;

use crate::configuration::traits::ResolvableConfiguration;
use crate::error::ConfigurationError;
use crate::store::{ConfigurationStore, StoreTable, StoreValue};


/// The raw `service` and `monitoring` groups, as found in a store.
pub(crate) struct UnresolvedMonitoringSource<'s> {
    service: Option<&'s StoreValue>,
    monitoring: Option<&'s StoreValue>,
}

impl<'s> UnresolvedMonitoringSource<'s> {
    pub(crate) fn read_from<S: ConfigurationStore + ?Sized>(store: &'s S) -> Self {
        Self {
            service: store.get("service"),
            monitoring: store.get("monitoring"),
        }
    }
}


/// The typed view of the store the monitoring configuration is projected from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringSource {
    pub service: ServiceSection,
    pub monitoring: MonitoringSection,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSection {
    pub name: String,
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringSection {
    /// `None` if the store has no `monitoring.newrelic` block.
    pub newrelic: Option<NewRelicSection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelicSection {
    /// An absent `enabled` field reads as `false`.
    pub enabled: bool,
    pub license: Option<String>,
}


impl<'s> ResolvableConfiguration for UnresolvedMonitoringSource<'s> {
    type Resolved = MonitoringSource;
    type Error = ConfigurationError;

    fn resolve(self) -> Result<Self::Resolved, Self::Error> {
        let service = required_table(self.service, "service")?;
        let name = required_scalar(service, "service", "name")?;
        let environment = required_scalar(service, "service", "environment")?;

        let monitoring = required_table(self.monitoring, "monitoring")?;
        let newrelic = match optional_table(monitoring.get("newrelic"), "monitoring.newrelic")? {
            Some(newrelic) => Some(NewRelicSection {
                enabled: match present(newrelic.get("enabled")) {
                    Some(value) => parse_flag(value, "monitoring.newrelic.enabled")?,
                    None => false,
                },
                license: optional_scalar(newrelic, "monitoring.newrelic", "license")?,
            }),
            None => {
                debug!("No monitoring.newrelic block in the store.");
                None
            }
        };

        Ok(MonitoringSource {
            service: ServiceSection { name, environment },
            monitoring: MonitoringSection { newrelic },
        })
    }
}


impl MonitoringSource {
    /// Validate the relevant parts of `store` into a [`MonitoringSource`].
    pub fn read_from<S: ConfigurationStore + ?Sized>(store: &S) -> Result<Self, ConfigurationError> {
        UnresolvedMonitoringSource::read_from(store).resolve()
    }

    /// `"<service.name>: <service.environment>"`
    pub fn app_name(&self) -> String {
        format!("{}: {}", self.service.name, self.service.environment)
    }

    /// `true` only if the `monitoring.newrelic` block exists and its `enabled` flag is set.
    pub fn agent_enabled(&self) -> bool {
        self.monitoring
            .newrelic
            .as_ref()
            .is_some_and(|newrelic| newrelic.enabled)
    }

    /// The license key, which is required: a missing `monitoring.newrelic` block
    /// and a missing `license` field both fail with
    /// [`ConfigurationError::MissingConfiguration`].
    pub fn license_key(&self) -> Result<&str, ConfigurationError> {
        self.monitoring
            .newrelic
            .as_ref()
            .and_then(|newrelic| newrelic.license.as_deref())
            .ok_or_else(|| ConfigurationError::missing("monitoring.newrelic.license"))
    }
}


/// Explicit nulls read the same as absent values.
fn present(value: Option<&StoreValue>) -> Option<&StoreValue> {
    value.filter(|value| !matches!(value, StoreValue::Null))
}

fn optional_table<'v>(
    value: Option<&'v StoreValue>,
    path: &str,
) -> Result<Option<&'v StoreTable>, ConfigurationError> {
    match present(value) {
        None => Ok(None),
        Some(StoreValue::Table(table)) => Ok(Some(table)),
        Some(other) => Err(ConfigurationError::InvalidType {
            path: path.to_string(),
            expected: "a table",
            found: other.kind_name(),
        }),
    }
}

fn required_table<'v>(
    value: Option<&'v StoreValue>,
    path: &str,
) -> Result<&'v StoreTable, ConfigurationError> {
    optional_table(value, path)?.ok_or_else(|| ConfigurationError::missing(path))
}

fn optional_scalar(
    table: &StoreTable,
    table_path: &str,
    key: &str,
) -> Result<Option<String>, ConfigurationError> {
    let Some(value) = present(table.get(key)) else {
        return Ok(None);
    };

    value
        .to_scalar_string()
        .map(Some)
        .ok_or_else(|| ConfigurationError::InvalidType {
            path: format!("{table_path}.{key}"),
            expected: "a string",
            found: value.kind_name(),
        })
}

fn required_scalar(
    table: &StoreTable,
    table_path: &str,
    key: &str,
) -> Result<String, ConfigurationError> {
    optional_scalar(table, table_path, key)?
        .ok_or_else(|| ConfigurationError::missing(format!("{table_path}.{key}")))
}


/// Interprets a flag value.
///
/// Environment variables always arrive as strings, so the usual textual
/// spellings are accepted alongside real booleans and numbers.
pub(crate) fn parse_flag(value: &StoreValue, path: &str) -> Result<bool, ConfigurationError> {
    match value {
        StoreValue::Boolean(flag) => Ok(*flag),
        StoreValue::Integer(number) => Ok(*number != 0),
        StoreValue::Float(number) => Ok(*number != 0.0),
        StoreValue::Null => Ok(false),
        StoreValue::String(text) => match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" | "" => Ok(false),
            _ => Err(ConfigurationError::InvalidValue {
                path: path.to_string(),
                expected: "boolean (true/false/1/0/yes/no/on/off)",
                value: text.clone(),
            }),
        },
        StoreValue::Array(_) | StoreValue::Table(_) => Err(ConfigurationError::InvalidType {
            path: path.to_string(),
            expected: "a boolean",
            found: value.kind_name(),
        }),
    }
}


#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::store::GeneratedStore;

    fn store(value: serde_json::Value) -> GeneratedStore {
        match StoreValue::from(value) {
            StoreValue::Table(table) => GeneratedStore::from_table("test", table),
            _ => unreachable!(),
        }
    }

    #[rstest]
    #[case(StoreValue::Boolean(true), true)]
    #[case(StoreValue::Boolean(false), false)]
    #[case(StoreValue::String("true".to_string()), true)]
    #[case(StoreValue::String(" TRUE ".to_string()), true)]
    #[case(StoreValue::String("on".to_string()), true)]
    #[case(StoreValue::String("false".to_string()), false)]
    #[case(StoreValue::String("0".to_string()), false)]
    #[case(StoreValue::String(String::new()), false)]
    #[case(StoreValue::Integer(1), true)]
    #[case(StoreValue::Integer(0), false)]
    #[case(StoreValue::Null, false)]
    fn parses_flags(#[case] value: StoreValue, #[case] expected: bool) {
        assert_eq!(parse_flag(&value, "flag").unwrap(), expected);
    }

    #[test]
    fn rejects_unrecognized_flag_text() {
        let error = parse_flag(&StoreValue::String("maybe".to_string()), "flag").unwrap_err();

        assert!(matches!(error, ConfigurationError::InvalidValue { .. }));
    }

    #[test]
    fn resolves_full_source() {
        let source = MonitoringSource::read_from(&store(serde_json::json!({
            "service": { "name": "svc", "environment": "prod" },
            "monitoring": { "newrelic": { "enabled": "yes", "license": "ABC123" } }
        })))
        .unwrap();

        assert_eq!(source.app_name(), "svc: prod");
        assert!(source.agent_enabled());
        assert_eq!(source.license_key().unwrap(), "ABC123");
    }

    #[test]
    fn missing_groups_are_reported_by_path() {
        let without_service = MonitoringSource::read_from(&store(serde_json::json!({
            "monitoring": {}
        })))
        .unwrap_err();
        let without_monitoring = MonitoringSource::read_from(&store(serde_json::json!({
            "service": { "name": "svc", "environment": "prod" }
        })))
        .unwrap_err();
        let without_environment = MonitoringSource::read_from(&store(serde_json::json!({
            "service": { "name": "svc" },
            "monitoring": {}
        })))
        .unwrap_err();

        assert!(
            matches!(without_service, ConfigurationError::MissingConfiguration { ref path } if path == "service")
        );
        assert!(
            matches!(without_monitoring, ConfigurationError::MissingConfiguration { ref path } if path == "monitoring")
        );
        assert!(
            matches!(without_environment, ConfigurationError::MissingConfiguration { ref path } if path == "service.environment")
        );
    }

    #[test]
    fn absent_newrelic_block_disables_agent_but_license_is_still_required() {
        let source = MonitoringSource::read_from(&store(serde_json::json!({
            "service": { "name": "svc", "environment": "prod" },
            "monitoring": { "newrelic": null }
        })))
        .unwrap();

        assert!(!source.agent_enabled());
        assert!(source.license_key().unwrap_err().is_missing());
    }

    #[test]
    fn absent_enabled_field_reads_as_disabled() {
        let source = MonitoringSource::read_from(&store(serde_json::json!({
            "service": { "name": "svc", "environment": "prod" },
            "monitoring": { "newrelic": { "license": "ABC123" } }
        })))
        .unwrap();

        assert!(!source.agent_enabled());
        assert_eq!(source.license_key().unwrap(), "ABC123");
    }

    #[test]
    fn mistyped_values_are_rejected() {
        let error = MonitoringSource::read_from(&store(serde_json::json!({
            "service": { "name": { "nested": true }, "environment": "prod" },
            "monitoring": {}
        })))
        .unwrap_err();

        assert!(matches!(
            error,
            ConfigurationError::InvalidType { ref path, found: "a table", .. } if path == "service.name"
        ));
    }

    #[test]
    fn numeric_service_values_are_rendered_as_text() {
        let source = MonitoringSource::read_from(&store(serde_json::json!({
            "service": { "name": "svc", "environment": 2 },
            "monitoring": {}
        })))
        .unwrap();

        assert_eq!(source.app_name(), "svc: 2");
    }
}
