//! Store selection from configuration.
//!
//! Maps the configured `storage_type` onto a concrete backend. Local-first:
//! the directory store is the default.

use featurize_common::config::{FeaturizeConfig, StorageType};
use featurize_common::error::Result;

use crate::{DirectoryStore, FeatureStore, MemoryStore, RegistryStore};

/// Opens the feature store named by `config.storage_type`.
///
/// # Errors
///
/// Returns an error if the selected backend cannot be opened (missing
/// checkout, invalid registry URL).
pub fn open_store(config: &FeaturizeConfig) -> Result<Box<dyn FeatureStore>> {
    let store: Box<dyn FeatureStore> = match config.storage_type {
        StorageType::Memory => Box::new(MemoryStore::default()),
        StorageType::Directory => Box::new(DirectoryStore::open(&config.directory.path)?),
        StorageType::Registry => Box::new(RegistryStore::new(&config.registry)?),
    };
    tracing::debug!(kind = store.kind(), "opened feature store");
    Ok(store)
}
