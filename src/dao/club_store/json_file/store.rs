use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde_json::{Map, Value};
use tracing::debug;

use crate::dao::{
    club_store::ClubStore,
    models::{ClubEntity, PersistedEnvelope},
    storage::StorageResult,
};

use super::error::{FileStoreError, FileStoreResult};

/// Store writing the state envelope under one key of a JSON object on disk.
///
/// Other keys of the same file are left untouched, so several hosts can share one file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    namespace: String,
}

impl JsonFileStore {
    /// Build a store for the given file and namespace key. Nothing is touched until the first
    /// load or save.
    pub fn new(path: impl Into<PathBuf>, namespace: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            namespace: namespace.into(),
        }
    }

    /// Location of the state file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> FileStoreResult<Option<Map<String, Value>>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FileStoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        if contents.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| FileStoreError::Decode {
                path: self.path.clone(),
                source,
            })
    }

    fn load_envelope(&self) -> FileStoreResult<Option<PersistedEnvelope>> {
        let Some(mut document) = self.read_document()? else {
            return Ok(None);
        };
        let Some(entry) = document.remove(&self.namespace) else {
            return Ok(None);
        };

        serde_json::from_value(entry)
            .map(Some)
            .map_err(|source| FileStoreError::DecodeNamespace {
                path: self.path.clone(),
                namespace: self.namespace.clone(),
                source,
            })
    }

    fn write_envelope(&self, envelope: &PersistedEnvelope) -> FileStoreResult<()> {
        let mut document = self.read_document()?.unwrap_or_default();
        let entry =
            serde_json::to_value(envelope).map_err(|source| FileStoreError::Encode { source })?;
        document.insert(self.namespace.clone(), entry);

        let payload = serde_json::to_string_pretty(&Value::Object(document))
            .map_err(|source| FileStoreError::Encode { source })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| FileStoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        // Write next to the target and rename so a crash never leaves a half-written file.
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, payload).map_err(|source| FileStoreError::Write {
            path: staging.clone(),
            source,
        })?;
        fs::rename(&staging, &self.path).map_err(|source| FileStoreError::Write {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), namespace = %self.namespace, "club state saved");
        Ok(())
    }
}

impl ClubStore for JsonFileStore {
    fn load(&self) -> StorageResult<Option<ClubEntity>> {
        Ok(self.load_envelope()?.map(|envelope| envelope.state))
    }

    fn save(&mut self, state: &ClubEntity) -> StorageResult<()> {
        self.write_envelope(&PersistedEnvelope::new(state.clone()))
            .map_err(Into::into)
    }
}
