use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File, Source};
use tracing::{debug, trace};

use super::value::{lookup_path, table_from_config, StoreTable, StoreValue};
use super::ConfigurationStore;
use crate::error::ConfigurationError;


/// Separator used to encode nesting in environment variable names,
/// e.g. `MONITORING__NEWRELIC__LICENSE` -> `monitoring.newrelic.license`.
pub const DEFAULT_ENVIRONMENT_SEPARATOR: &str = "__";

/// Separator between the environment prefix and the rest of a variable name,
/// e.g. `APP` + `_` + `SERVICE__NAME`.
pub const ENVIRONMENT_PREFIX_SEPARATOR: &str = "_";


/// A store made of environment variables layered over a defaults file.
///
/// Values coming from the environment take precedence over the file.
/// Layering is done by the `config` crate once, in [`LayeredStoreBuilder::build`];
/// the resulting tree is immutable.
///
/// Environment variable names are case-insensitive: every path segment is lowercased.
/// When two variables only differ in case, the one whose path part (after the prefix)
/// is already lowercase wins, otherwise the lexicographically smallest name does.
#[derive(Debug, Clone)]
pub struct LayeredStore {
    tree: StoreTable,
    layer_names: Vec<String>,
}

impl LayeredStore {
    pub fn builder() -> LayeredStoreBuilder {
        LayeredStoreBuilder::new()
    }

    /// Names of the layers this store was built from, highest precedence first.
    pub fn layer_names(&self) -> &[String] {
        &self.layer_names
    }

    pub fn tree(&self) -> &StoreTable {
        &self.tree
    }
}

impl ConfigurationStore for LayeredStore {
    fn get(&self, path: &str) -> Option<&StoreValue> {
        lookup_path(&self.tree, path)
    }
}


/// An in-memory table exposed to `config` as a source.
#[derive(Debug, Clone)]
struct TableSource {
    name: String,
    table: StoreTable,
}

impl Source for TableSource {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<config::Map<String, config::Value>, ConfigError> {
        Ok(self
            .table
            .iter()
            .map(|(key, value)| (key.clone(), value.to_config_value(&self.name)))
            .collect())
    }
}


enum EnvironmentSource {
    None,
    Process,
    Explicit(Vec<(String, String)>),
}

enum DefaultsLayer {
    File { path: PathBuf, required: bool },
    Table(TableSource),
}


pub struct LayeredStoreBuilder {
    separator: String,
    prefix: Option<String>,
    environment: EnvironmentSource,
    defaults: Option<DefaultsLayer>,
}

impl LayeredStoreBuilder {
    fn new() -> Self {
        Self {
            separator: DEFAULT_ENVIRONMENT_SEPARATOR.to_string(),
            prefix: None,
            environment: EnvironmentSource::None,
            defaults: None,
        }
    }

    /// Separator that joins path segments inside environment variable names.
    pub fn separator<S: Into<String>>(mut self, separator: S) -> Self {
        self.separator = separator.into();
        self
    }

    /// Only import environment variables named `{prefix}_...`; the prefix is stripped.
    /// Matching is case-insensitive. An empty prefix imports every variable.
    pub fn environment_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() { None } else { Some(prefix) };
        self
    }

    /// Layer the variables of the current process environment on top.
    pub fn process_environment(mut self) -> Self {
        self.environment = EnvironmentSource::Process;
        self
    }

    /// Layer an explicit set of environment variables on top, instead of the process environment.
    pub fn environment_variables<I>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.environment = EnvironmentSource::Explicit(variables.into_iter().collect());
        self
    }

    /// Use the `.json` or `.toml` file at `file_path` as the bottom layer.
    /// The file is read in [`Self::build`]; a missing file is an error there.
    pub fn defaults_file<P: AsRef<Path>>(mut self, file_path: P) -> Self {
        self.defaults = Some(DefaultsLayer::File {
            path: file_path.as_ref().to_path_buf(),
            required: true,
        });
        self
    }

    /// Like [`Self::defaults_file`], but a missing file is treated as an empty layer.
    pub fn optional_defaults_file<P: AsRef<Path>>(mut self, file_path: P) -> Self {
        self.defaults = Some(DefaultsLayer::File {
            path: file_path.as_ref().to_path_buf(),
            required: false,
        });
        self
    }

    /// Use an in-memory table as the bottom layer.
    pub fn defaults_table<S: Into<String>>(mut self, name: S, table: StoreTable) -> Self {
        self.defaults = Some(DefaultsLayer::Table(TableSource {
            name: name.into(),
            table,
        }));
        self
    }

    pub fn build(self) -> Result<LayeredStore, ConfigurationError> {
        let LayeredStoreBuilder {
            separator,
            prefix,
            environment,
            defaults,
        } = self;

        if separator.is_empty() {
            return Err(ConfigurationError::InvalidStoreSetting(
                "environment separator must not be empty".to_string(),
            ));
        }

        let mut builder = Config::builder();
        let mut layer_names = Vec::with_capacity(2);

        match defaults {
            Some(DefaultsLayer::File { path, required }) => {
                if required || path.exists() {
                    layer_names.push(format!("file {}", path.display()));
                } else {
                    debug!(
                        file_path = %path.display(),
                        "Optional defaults file does not exist, skipping layer."
                    );
                }

                builder = builder.add_source(File::from(path.as_path()).required(required));
            }
            Some(DefaultsLayer::Table(source)) => {
                layer_names.push(source.name.clone());
                builder = builder.add_source(source);
            }
            None => {}
        }

        let variables = match environment {
            EnvironmentSource::None => None,
            EnvironmentSource::Process => {
                layer_names.insert(0, "process environment".to_string());
                // Variables that are not valid unicode can't be addressed by path anyway.
                Some(
                    env::vars_os()
                        .filter_map(|(key, value)| {
                            Some((key.into_string().ok()?, value.into_string().ok()?))
                        })
                        .collect::<Vec<_>>(),
                )
            }
            EnvironmentSource::Explicit(variables) => {
                layer_names.insert(0, "environment".to_string());
                Some(variables)
            }
        };

        if let Some(variables) = variables {
            let variables = resolve_case_collisions(variables, prefix.as_deref());
            let imported_candidates = variables.len();

            let environment = match &prefix {
                Some(prefix) => Environment::with_prefix(prefix)
                    .prefix_separator(ENVIRONMENT_PREFIX_SEPARATOR),
                None => Environment::default(),
            };

            builder = builder.add_source(
                environment
                    .separator(&separator)
                    .source(Some(variables)),
            );

            debug!(
                imported_candidates,
                prefix = ?prefix,
                separator = %separator,
                "Layering environment variables."
            );
        }

        let origin = layer_names.join(" over ");
        let config = builder
            .build()
            .map_err(|error| ConfigurationError::store_load(origin.as_str(), error))?;
        let tree = table_from_config(&origin, config)?;

        debug!(
            top_level_keys = tree.len(),
            layers = ?layer_names,
            "Built layered configuration store."
        );

        Ok(LayeredStore { tree, layer_names })
    }
}


/// Keeps a single variable out of every group of names that differ only in case.
///
/// `config` lowercases variable names, so without this the winner of such a group
/// would depend on iteration order.
fn resolve_case_collisions<I>(variables: I, prefix: Option<&str>) -> config::Map<String, String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let prefix_pattern = prefix.map(|prefix| format!("{prefix}{ENVIRONMENT_PREFIX_SEPARATOR}"));
    let mut chosen: BTreeMap<String, (String, String)> = BTreeMap::new();

    for (name, value) in variables {
        let normalized = name.to_lowercase();

        if let Some((existing, _)) = chosen.get(&normalized) {
            if !takes_precedence(&name, existing, prefix_pattern.as_deref()) {
                trace!(kept = %existing, dropped = %name, "Environment variable names collide.");
                continue;
            }

            trace!(kept = %name, dropped = %existing, "Environment variable names collide.");
        }

        chosen.insert(normalized, (name, value));
    }

    chosen.into_values().collect()
}

/// A name whose path part is already lowercase beats one that isn't;
/// otherwise the smaller name wins.
fn takes_precedence(candidate: &str, existing: &str, prefix_pattern: Option<&str>) -> bool {
    let is_lowercase_path = |name: &str| {
        let path = strip_prefix_ignoring_case(name, prefix_pattern);
        path == path.to_lowercase()
    };

    match (is_lowercase_path(candidate), is_lowercase_path(existing)) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate < existing,
    }
}

fn strip_prefix_ignoring_case<'n>(name: &'n str, prefix_pattern: Option<&str>) -> &'n str {
    let Some(pattern) = prefix_pattern else {
        return name;
    };

    match name.get(..pattern.len()) {
        Some(head) if head.eq_ignore_ascii_case(pattern) => &name[pattern.len()..],
        _ => name,
    }
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use rstest::rstest;

    use super::*;

    fn variables(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    fn defaults() -> StoreTable {
        match StoreValue::from(serde_json::json!({
            "service": { "name": "from-file", "environment": "staging" },
            "monitoring": { "newrelic": { "enabled": false, "license": "FILE-LICENSE" } }
        })) {
            StoreValue::Table(table) => table,
            _ => unreachable!(),
        }
    }

    #[test]
    fn environment_overrides_file_defaults() {
        let store = LayeredStore::builder()
            .defaults_table("defaults", defaults())
            .environment_variables(variables(&[
                ("SERVICE__NAME", "from-env"),
                ("MONITORING__NEWRELIC__ENABLED", "true"),
            ]))
            .build()
            .unwrap();

        assert_eq!(store.get("service.name").and_then(StoreValue::as_str), Some("from-env"));
        assert_eq!(store.get("service.environment").and_then(StoreValue::as_str), Some("staging"));
        assert_eq!(
            store.get("monitoring.newrelic.enabled").and_then(StoreValue::as_str),
            Some("true")
        );
        assert_eq!(
            store.get("monitoring.newrelic.license").and_then(StoreValue::as_str),
            Some("FILE-LICENSE")
        );
        assert_eq!(store.layer_names(), ["environment", "defaults"]);
    }

    #[test]
    fn prefix_filters_and_is_stripped() {
        let store = LayeredStore::builder()
            .environment_prefix("APP")
            .environment_variables(variables(&[
                ("APP_SERVICE__NAME", "svc"),
                ("SERVICE__ENVIRONMENT", "ignored"),
            ]))
            .build()
            .unwrap();

        assert_eq!(store.get("service.name").and_then(StoreValue::as_str), Some("svc"));
        assert_eq!(store.get("service.environment"), None);
    }

    #[test]
    fn custom_separator() {
        let store = LayeredStore::builder()
            .separator("::")
            .environment_variables(variables(&[("SERVICE::NAME", "svc")]))
            .build()
            .unwrap();

        assert_eq!(store.get("service.name").and_then(StoreValue::as_str), Some("svc"));
    }

    #[rstest]
    #[case(&[("service__name", "lower"), ("SERVICE__NAME", "upper")])]
    #[case(&[("SERVICE__NAME", "upper"), ("service__name", "lower")])]
    #[case(&[("Service__Name", "mixed"), ("service__name", "lower"), ("SERVICE__NAME", "upper")])]
    fn lowercase_name_wins_case_collisions(#[case] pairs: &[(&str, &str)]) {
        let store = LayeredStore::builder()
            .environment_variables(variables(pairs))
            .build()
            .unwrap();

        assert_eq!(store.get("service.name").and_then(StoreValue::as_str), Some("lower"));
    }

    #[test]
    fn lowercase_path_after_an_uppercase_prefix_wins_collisions() {
        let store = LayeredStore::builder()
            .environment_prefix("APP")
            .environment_variables(variables(&[
                ("APP_SERVICE__NAME", "upper"),
                ("APP_service__name", "lower"),
            ]))
            .build()
            .unwrap();

        assert_eq!(store.get("service.name").and_then(StoreValue::as_str), Some("lower"));
    }

    #[rstest]
    #[case(&[("Service__Name", "mixed"), ("SERVICE__NAME", "upper")])]
    #[case(&[("SERVICE__NAME", "upper"), ("Service__Name", "mixed")])]
    fn smallest_name_wins_collisions_without_a_lowercase_name(#[case] pairs: &[(&str, &str)]) {
        let store = LayeredStore::builder()
            .environment_variables(variables(pairs))
            .build()
            .unwrap();

        assert_eq!(store.get("service.name").and_then(StoreValue::as_str), Some("upper"));
    }

    #[test]
    fn rejects_empty_separator() {
        let error = LayeredStore::builder().separator("").build().unwrap_err();

        assert!(matches!(error, ConfigurationError::InvalidStoreSetting(_)));
    }

    #[test]
    fn environment_overrides_a_toml_defaults_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[service]\nname = \"from-file\"\nenvironment = \"staging\"\n\n[monitoring.newrelic]\nlicense = \"FILE\""
        )
        .unwrap();

        let store = LayeredStore::builder()
            .defaults_file(file.path())
            .environment_variables(variables(&[("SERVICE__ENVIRONMENT", "prod")]))
            .build()
            .unwrap();

        assert_eq!(store.get("service.name").and_then(StoreValue::as_str), Some("from-file"));
        assert_eq!(store.get("service.environment").and_then(StoreValue::as_str), Some("prod"));
        assert_eq!(
            store.get("monitoring.newrelic.license").and_then(StoreValue::as_str),
            Some("FILE")
        );
        assert_eq!(store.layer_names().len(), 2);
    }

    #[test]
    fn missing_optional_defaults_file_is_an_empty_layer() {
        let directory = tempfile::tempdir().unwrap();

        let store = LayeredStore::builder()
            .optional_defaults_file(directory.path().join("absent.json"))
            .build()
            .unwrap();

        assert!(store.tree().is_empty());
        assert!(store.layer_names().is_empty());
    }

    #[test]
    fn missing_required_defaults_file_is_an_error() {
        let directory = tempfile::tempdir().unwrap();

        let result = LayeredStore::builder()
            .defaults_file(directory.path().join("absent.json"))
            .build();

        assert!(matches!(result, Err(ConfigurationError::StoreLoad { .. })));
    }

    #[test]
    fn unsupported_defaults_file_format_is_an_error() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "service:\n  name: svc").unwrap();

        let result = LayeredStore::builder().defaults_file(file.path()).build();

        assert!(matches!(result, Err(ConfigurationError::StoreLoad { .. })));
    }
}
