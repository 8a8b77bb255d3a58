//! Configuration stores the monitoring configuration is read from.
//!
//! Every store exposes a single capability, [`ConfigurationStore::get`],
//! which resolves a dotted path (e.g. `monitoring.newrelic.license`)
//! to a [`StoreValue`]. There are two implementations:
//! - [`LayeredStore`]: environment variables layered over a defaults file,
//! - [`GeneratedStore`]: a pre-built tree with no layering.
//!
//! Reading files and merging layers is left to the `config` crate;
//! both stores convert its merged tree into [`StoreValue`]s once, when they are built.
//!
//! [`StoreBackend`] wraps whichever of the two was selected at initialization time.

use std::fmt::{self, Display, Formatter};

pub use self::generated::GeneratedStore;
pub use self::layered::{
    LayeredStore,
    LayeredStoreBuilder,
    DEFAULT_ENVIRONMENT_SEPARATOR,
    ENVIRONMENT_PREFIX_SEPARATOR,
};
pub use self::value::{lookup_path, StoreTable, StoreValue};
use crate::error::ConfigurationError;

mod generated;
mod layered;
mod value;


/// Read-only access to a fully resolved, nested configuration store.
pub trait ConfigurationStore {
    /// Resolve a dotted `path` to its value, if present.
    fn get(&self, path: &str) -> Option<&StoreValue>;

    /// Resolve a dotted `path` that is expected to point at a table.
    ///
    /// Returns `Ok(None)` if nothing is stored at `path`
    /// and [`ConfigurationError::InvalidType`] if something other than a table is.
    fn get_table(&self, path: &str) -> Result<Option<&StoreTable>, ConfigurationError> {
        match self.get(path) {
            None => Ok(None),
            Some(StoreValue::Table(table)) => Ok(Some(table)),
            Some(other) => Err(ConfigurationError::InvalidType {
                path: path.to_string(),
                expected: "a table",
                found: other.kind_name(),
            }),
        }
    }
}

impl<S: ConfigurationStore + ?Sized> ConfigurationStore for &S {
    fn get(&self, path: &str) -> Option<&StoreValue> {
        (**self).get(path)
    }
}


/// The store backend selected at initialization time.
#[derive(Debug, Clone)]
pub enum StoreBackend {
    Layered(LayeredStore),
    Generated(GeneratedStore),
}

impl ConfigurationStore for StoreBackend {
    fn get(&self, path: &str) -> Option<&StoreValue> {
        match self {
            StoreBackend::Layered(store) => store.get(path),
            StoreBackend::Generated(store) => store.get(path),
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Layered(store) => {
                write!(f, "layered store ({})", store.layer_names().join(" over "))
            }
            StoreBackend::Generated(store) => write!(f, "generated store ({})", store.origin()),
        }
    }
}

impl From<LayeredStore> for StoreBackend {
    fn from(store: LayeredStore) -> Self {
        StoreBackend::Layered(store)
    }
}

impl From<GeneratedStore> for StoreBackend {
    fn from(store: GeneratedStore) -> Self {
        StoreBackend::Generated(store)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_table_distinguishes_absent_from_mistyped() {
        let store = GeneratedStore::from_table(
            "test",
            StoreTable::from([
                ("service".to_string(), StoreValue::String("flat".to_string())),
                ("monitoring".to_string(), StoreValue::Table(StoreTable::new())),
            ]),
        );

        assert!(store.get_table("monitoring").unwrap().is_some());
        assert!(store.get_table("absent").unwrap().is_none());
        assert!(matches!(
            store.get_table("service"),
            Err(ConfigurationError::InvalidType { found: "a string", .. })
        ));
    }

    #[test]
    fn backend_dispatches_to_the_wrapped_store() {
        let generated = GeneratedStore::from_table(
            "test",
            StoreTable::from([("key".to_string(), StoreValue::Integer(1))]),
        );
        let layered = LayeredStore::builder()
            .environment_variables([("KEY".to_string(), "2".to_string())])
            .build()
            .unwrap();

        let backends: [StoreBackend; 2] = [generated.into(), layered.into()];

        assert_eq!(backends[0].get("key"), Some(&StoreValue::Integer(1)));
        assert_eq!(backends[1].get("key"), Some(&StoreValue::String("2".to_string())));
        assert!(backends[0].to_string().starts_with("generated store"));
        assert!(backends[1].to_string().starts_with("layered store"));
    }
}
