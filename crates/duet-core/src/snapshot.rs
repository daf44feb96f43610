//! Durable identity snapshot persistence.
//!
//! One device-local copy of the signed-in identity, written whole on every
//! identity change and read back once at startup.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::models::UserIdentity;
use crate::{Error, Result};

const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Trait for durable identity snapshot storage.
///
/// `save` overwrites any prior value unconditionally; readers observe
/// either the previous snapshot or the new one, never a partial write.
pub trait SnapshotStore: Clone + Send + Sync + 'static {
    /// Load the stored identity, if any.
    fn load(&self) -> Result<Option<UserIdentity>>;

    /// Overwrite the stored identity.
    fn save(&self, identity: &UserIdentity) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotEnvelope {
    schema_version: u32,
    identity: UserIdentity,
}

/// File-backed snapshot store holding one JSON document at a fixed path.
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the file path this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<UserIdentity>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(&self.path)?;
        let envelope = serde_json::from_str::<SnapshotEnvelope>(&raw)?;
        if envelope.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(Error::Storage(format!(
                "unsupported snapshot schema_version {} (expected {})",
                envelope.schema_version, SNAPSHOT_SCHEMA_VERSION
            )));
        }
        Ok(Some(envelope.identity))
    }

    fn save(&self, identity: &UserIdentity) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let envelope = SnapshotEnvelope {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            identity: identity.clone(),
        };
        let serialized = serde_json::to_string_pretty(&envelope)?;

        // Write a sibling file and rename over the target so a reader never
        // sees a half-written snapshot.
        let staging = self.path.with_extension("json.tmp");
        std::fs::write(&staging, serialized)?;
        std::fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

/// In-memory snapshot store, primarily for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotStore {
    slot: Arc<Mutex<Option<UserIdentity>>>,
}

impl MemorySnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<UserIdentity>> {
        let slot = self
            .slot
            .lock()
            .map_err(|error| Error::Storage(error.to_string()))?;
        Ok(slot.clone())
    }

    fn save(&self, identity: &UserIdentity) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|error| Error::Storage(error.to_string()))?;
        *slot = Some(identity.clone());
        Ok(())
    }
}
