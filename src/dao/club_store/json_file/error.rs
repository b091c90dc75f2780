//! Error types shared by the JSON file store.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::dao::storage::StorageError;

/// Convenient result alias returning [`FileStoreError`] failures.
pub type FileStoreResult<T> = Result<T, FileStoreError>;

/// Failures that can occur while reading or writing the state file.
#[derive(Debug, Error)]
pub enum FileStoreError {
    /// The state file exists but could not be read.
    #[error("failed to read state file `{}`", path.display())]
    Read {
        /// Location of the state file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The state file or its temporary sibling could not be written.
    #[error("failed to write state file `{}`", path.display())]
    Write {
        /// Location of the state file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The file is not a JSON object.
    #[error("state file `{}` is not valid JSON", path.display())]
    Decode {
        /// Location of the state file.
        path: PathBuf,
        /// Underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// The namespace entry does not match the persisted layout.
    #[error("namespace `{namespace}` in `{}` does not hold a club state", path.display())]
    DecodeNamespace {
        /// Location of the state file.
        path: PathBuf,
        /// Key the state is stored under.
        namespace: String,
        /// Underlying decode error.
        #[source]
        source: serde_json::Error,
    },
    /// Serializing the state failed.
    #[error("failed to encode club state")]
    Encode {
        /// Underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl From<FileStoreError> for StorageError {
    fn from(err: FileStoreError) -> Self {
        match err {
            FileStoreError::Decode { .. } | FileStoreError::DecodeNamespace { .. } => {
                StorageError::unavailable("state file is unreadable".into(), err)
            }
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
