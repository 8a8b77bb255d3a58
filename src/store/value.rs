use std::collections::BTreeMap;

use config::{Config, ValueKind};

use crate::error::ConfigurationError;


/// A nested table of configuration values, ordered by key.
pub type StoreTable = BTreeMap<String, StoreValue>;


/// A single value held by a configuration store.
///
/// Both store backends normalize whatever the `config` crate merged for them
/// (JSON, TOML, environment variables, serialized settings structures) into this shape.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Array(Vec<StoreValue>),
    Table(StoreTable),
}

impl StoreValue {
    /// Human-readable name of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            StoreValue::Null => "null",
            StoreValue::Boolean(_) => "a boolean",
            StoreValue::Integer(_) => "an integer",
            StoreValue::Float(_) => "a float",
            StoreValue::String(_) => "a string",
            StoreValue::Array(_) => "an array",
            StoreValue::Table(_) => "a table",
        }
    }

    pub fn as_table(&self) -> Option<&StoreTable> {
        match self {
            StoreValue::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StoreValue::String(value) => Some(value),
            _ => None,
        }
    }

    /// Renders a scalar value as text. Tables, arrays and null have no textual form.
    pub fn to_scalar_string(&self) -> Option<String> {
        match self {
            StoreValue::String(value) => Some(value.clone()),
            StoreValue::Boolean(value) => Some(value.to_string()),
            StoreValue::Integer(value) => Some(value.to_string()),
            StoreValue::Float(value) => Some(value.to_string()),
            StoreValue::Null | StoreValue::Array(_) | StoreValue::Table(_) => None,
        }
    }
}


/// Looks up a dotted `path` (e.g. `monitoring.newrelic.license`) in `table`.
///
/// Walking through a non-table value yields `None`, the same as a missing key.
pub fn lookup_path<'t>(table: &'t StoreTable, path: &str) -> Option<&'t StoreValue> {
    let mut segments = path.split('.');
    let first = segments.next()?;

    let mut current = table.get(first)?;
    for segment in segments {
        current = current.as_table()?.get(segment)?;
    }

    Some(current)
}


impl From<config::Value> for StoreValue {
    fn from(value: config::Value) -> Self {
        match value.kind {
            ValueKind::Nil => StoreValue::Null,
            ValueKind::Boolean(value) => StoreValue::Boolean(value),
            ValueKind::I64(value) => StoreValue::Integer(value),
            ValueKind::I128(value) => {
                i64::try_from(value).map_or(StoreValue::Float(value as f64), StoreValue::Integer)
            }
            ValueKind::U64(value) => {
                i64::try_from(value).map_or(StoreValue::Float(value as f64), StoreValue::Integer)
            }
            ValueKind::U128(value) => {
                i64::try_from(value).map_or(StoreValue::Float(value as f64), StoreValue::Integer)
            }
            ValueKind::Float(value) => StoreValue::Float(value),
            ValueKind::String(value) => StoreValue::String(value),
            ValueKind::Array(values) => {
                StoreValue::Array(values.into_iter().map(StoreValue::from).collect())
            }
            ValueKind::Table(table) => StoreValue::Table(
                table
                    .into_iter()
                    .map(|(key, value)| (key, StoreValue::from(value)))
                    .collect(),
            ),
        }
    }
}

impl StoreValue {
    /// Converts this value into a `config` crate value, tagging every node with `origin`.
    pub(crate) fn to_config_value(&self, origin: &String) -> config::Value {
        let kind = match self {
            StoreValue::Null => ValueKind::Nil,
            StoreValue::Boolean(value) => ValueKind::Boolean(*value),
            StoreValue::Integer(value) => ValueKind::I64(*value),
            StoreValue::Float(value) => ValueKind::Float(*value),
            StoreValue::String(value) => ValueKind::String(value.clone()),
            StoreValue::Array(values) => ValueKind::Array(
                values
                    .iter()
                    .map(|value| value.to_config_value(origin))
                    .collect(),
            ),
            StoreValue::Table(table) => ValueKind::Table(
                table
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_config_value(origin)))
                    .collect(),
            ),
        };

        config::Value::new(Some(origin), kind)
    }
}

/// Resolves every source added to `config` and converts the merged tree into a [`StoreTable`].
pub(crate) fn table_from_config(
    origin: &str,
    config: Config,
) -> Result<StoreTable, ConfigurationError> {
    let merged = config
        .try_deserialize::<config::Map<String, config::Value>>()
        .map_err(|error| ConfigurationError::store_load(origin, error))?;

    Ok(merged
        .into_iter()
        .map(|(key, value)| (key, StoreValue::from(value)))
        .collect())
}


impl From<serde_json::Value> for StoreValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => StoreValue::Null,
            serde_json::Value::Bool(value) => StoreValue::Boolean(value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(integer) => StoreValue::Integer(integer),
                // u64 values above i64::MAX end up here as well.
                None => StoreValue::Float(number.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(value) => StoreValue::String(value),
            serde_json::Value::Array(values) => {
                StoreValue::Array(values.into_iter().map(StoreValue::from).collect())
            }
            serde_json::Value::Object(map) => StoreValue::Table(
                map.into_iter()
                    .map(|(key, value)| (key, StoreValue::from(value)))
                    .collect(),
            ),
        }
    }
}
