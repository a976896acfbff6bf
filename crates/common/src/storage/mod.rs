//! Content-addressed object storage.
//!
//! A backend lists the objects at a [`Location`] together with their content
//! ids, and opens one object by content id. Opening is conditional on the
//! content id still matching, so an approval recorded against one set of
//! bytes can never release different bytes.

mod http;
mod s3;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ErrorKind;
use crate::location::{BackendKind, Location, LocationError};
use crate::types::{File, FileId, FileMetadata};

pub use http::HttpStorage;
pub use s3::{BucketProvider, MemoryBuckets, S3Buckets, S3Config, S3Storage};

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Every object at `location`, in the order the backend reports them.
    /// Objects without a content id are skipped.
    async fn list(&self, location: &Location) -> Result<Vec<FileMetadata>, StorageError>;

    /// Open the object whose content id is `file_id`.
    async fn get(&self, location: &Location, file_id: &FileId) -> Result<File, StorageError>;
}

pub type DynStorage = Arc<dyn ObjectStorage>;

/// The backends a gateway was configured with, one per [`BackendKind`].
#[derive(Clone, Default)]
pub struct StorageBackends {
    s3: Option<DynStorage>,
    generic: Option<DynStorage>,
}

impl StorageBackends {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_s3(mut self, storage: DynStorage) -> Self {
        self.s3 = Some(storage);
        self
    }

    pub fn with_generic(mut self, storage: DynStorage) -> Self {
        self.generic = Some(storage);
        self
    }

    /// Backend serving `location`, if one of its kind is configured.
    pub fn for_location(&self, location: &Location) -> Option<&DynStorage> {
        match location.kind() {
            BackendKind::S3 => self.s3.as_ref(),
            BackendKind::Generic => self.generic.as_ref(),
        }
    }
}

impl std::fmt::Debug for StorageBackends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBackends")
            .field("s3", &self.s3.is_some())
            .field("generic", &self.generic.is_some())
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("no object with content id [{0}]")]
    NotFound(String),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("directory server request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("directory server answered {status} for {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("s3 bucket '{0}' does not exist")]
    BucketNotFound(String),

    #[error("invalid storage configuration: {0}")]
    InvalidConfig(String),
}

impl StorageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StorageError::Location(e) => e.kind(),
            StorageError::NotFound(_) => ErrorKind::NotFound,
            _ => ErrorKind::ServerError,
        }
    }
}
