use std::path::Path;

use config::{Config, File};
use serde::Serialize;
use tracing::debug;

use super::value::{lookup_path, table_from_config, StoreTable, StoreValue};
use super::ConfigurationStore;
use crate::error::ConfigurationError;


/// A store backed by a pre-built configuration tree.
///
/// Unlike [`LayeredStore`][super::LayeredStore], there is no environment or file
/// layering here: the tree is taken as-is, either from a typed settings structure,
/// an in-memory table or a snapshot file produced elsewhere.
#[derive(Debug, Clone)]
pub struct GeneratedStore {
    origin: String,
    tree: StoreTable,
}

impl GeneratedStore {
    pub fn from_table<S: Into<String>>(origin: S, tree: StoreTable) -> Self {
        Self {
            origin: origin.into(),
            tree,
        }
    }

    /// Builds the tree by serializing a typed settings structure.
    /// The structure must serialize to a table (i.e. be a struct or a map).
    pub fn from_serializable<S, T>(origin: S, settings: &T) -> Result<Self, ConfigurationError>
    where
        S: Into<String>,
        T: Serialize,
    {
        let origin = origin.into();

        let config = Config::try_from(settings).map_err(|error| {
            ConfigurationError::InvalidStoreSetting(format!(
                "settings for {origin} must serialize to a table: {error}"
            ))
        })?;
        let tree = table_from_config(&origin, config)?;

        Ok(Self::from_table(origin, tree))
    }

    /// Loads a `.json` or `.toml` snapshot file as the whole tree.
    pub fn from_snapshot_file<P: AsRef<Path>>(file_path: P) -> Result<Self, ConfigurationError> {
        let file_path = file_path.as_ref();
        let origin = format!("snapshot {}", file_path.display());

        let config = Config::builder()
            .add_source(File::from(file_path))
            .build()
            .map_err(|error| ConfigurationError::store_load(origin.as_str(), error))?;
        let tree = table_from_config(&origin, config)?;

        debug!(
            file_path = %file_path.display(),
            top_level_keys = tree.len(),
            "Loaded generated configuration snapshot."
        );

        Ok(Self::from_table(origin, tree))
    }

    /// Where this tree came from, for diagnostics.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn tree(&self) -> &StoreTable {
        &self.tree
    }
}

impl ConfigurationStore for GeneratedStore {
    fn get(&self, path: &str) -> Option<&StoreValue> {
        lookup_path(&self.tree, path)
    }
}
