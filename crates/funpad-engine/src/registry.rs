//! External asset registry boundary.
//!
//! The engine registers every launched asset here as the last step of a
//! launch (and of a migration import). Implementations must be idempotent
//! for an identical `(id, metadata)` pair so a rolled-back operation can
//! be retried.

use funpad_core::{AssetMetadata, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Opaque reference handed back by the registry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RegistryHandle {
    pub id: String,
    pub index: u64,
}

pub trait AssetRegistry {
    fn create_asset_record(&mut self, id: &str, metadata: &AssetMetadata) -> EngineResult<RegistryHandle>;
    fn resolve(&self, id: &str) -> Option<RegistryHandle>;
}

/// In-process registry keyed by asset id.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryRegistry {
    records: BTreeMap<String, (RegistryHandle, AssetMetadata)>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn metadata(&self, id: &str) -> Option<&AssetMetadata> {
        self.records.get(id).map(|(_, m)| m)
    }
}

impl AssetRegistry for InMemoryRegistry {
    fn create_asset_record(&mut self, id: &str, metadata: &AssetMetadata) -> EngineResult<RegistryHandle> {
        if let Some((handle, existing)) = self.records.get(id) {
            if existing == metadata {
                return Ok(handle.clone());
            }
            return Err(EngineError::InvalidParameters(format!(
                "registry already holds {} with different metadata",
                id
            )));
        }
        let handle = RegistryHandle {
            id: id.to_string(),
            index: self.records.len() as u64,
        };
        self.records
            .insert(id.to_string(), (handle.clone(), metadata.clone()));
        Ok(handle)
    }

    fn resolve(&self, id: &str) -> Option<RegistryHandle> {
        self.records.get(id).map(|(h, _)| h.clone())
    }
}
