use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::{GetOptions, ObjectMeta, ObjectStore};
use parking_lot::Mutex;
use serde::Deserialize;

use super::{ObjectStorage, StorageError};
use crate::location::Location;
use crate::types::{File, FileId, FileMetadata};

const DEFAULT_REGION: &str = "us-east-1";

/// S3 section of the service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct S3Config {
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom endpoint, e.g. a local MinIO. Development only.
    pub endpoint: Option<String>,
    /// Bucket expected to exist on the development endpoint.
    pub dev_bucket: Option<String>,
}

/// Hands out one object store client per bucket.
pub trait BucketProvider: Send + Sync {
    fn bucket(&self, name: &str) -> Result<Arc<dyn ObjectStore>, StorageError>;
}

/// Real S3 (or S3-compatible) buckets. Clients are built on first use and
/// reused for every later request against the same bucket.
pub struct S3Buckets {
    config: S3Config,
    clients: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3Buckets {
    pub fn new(config: S3Config) -> Self {
        Self {
            config,
            clients: Mutex::new(HashMap::new()),
        }
    }

    fn build(&self, name: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(name)
            .with_region(self.config.region.as_deref().unwrap_or(DEFAULT_REGION));

        match (&self.config.access_key_id, &self.config.secret_access_key) {
            (Some(key), Some(secret)) => {
                builder = builder
                    .with_access_key_id(key)
                    .with_secret_access_key(secret);
            }
            (None, None) => {}
            _ => {
                return Err(StorageError::InvalidConfig(
                    "s3.access_key_id and s3.secret_access_key must be set together".into(),
                ))
            }
        }

        if let Some(endpoint) = &self.config.endpoint {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::InvalidConfig(e.to_string()))?;
        Ok(Arc::new(store))
    }

    /// Fail fast if `name` does not exist on the configured endpoint.
    pub async fn verify_bucket(&self, name: &str) -> Result<(), StorageError> {
        let store = self.bucket(name)?;
        let mut stream = store.list(None);
        match stream.try_next().await {
            Ok(_) => Ok(()),
            Err(object_store::Error::NotFound { .. }) => {
                Err(StorageError::BucketNotFound(name.to_string()))
            }
            Err(e) if e.to_string().contains("NoSuchBucket") => {
                Err(StorageError::BucketNotFound(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl BucketProvider for S3Buckets {
    fn bucket(&self, name: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(name) {
            return Ok(client.clone());
        }
        let client = self.build(name)?;
        tracing::debug!(bucket = name, "built s3 client");
        clients.insert(name.to_string(), client.clone());
        Ok(client)
    }
}

/// Buckets held in memory, created on first use.
#[derive(Debug, Default)]
pub struct MemoryBuckets {
    buckets: Mutex<HashMap<String, Arc<InMemory>>>,
}

impl MemoryBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    /// The in-memory store behind `name`, for seeding objects.
    pub fn store(&self, name: &str) -> Arc<InMemory> {
        self.buckets
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(InMemory::new()))
            .clone()
    }
}

impl BucketProvider for MemoryBuckets {
    fn bucket(&self, name: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        Ok(self.store(name))
    }
}

/// [`ObjectStorage`] over `s3://<bucket>` locations. An object's content id
/// is its ETag.
#[derive(Clone)]
pub struct S3Storage {
    buckets: Arc<dyn BucketProvider>,
}

impl S3Storage {
    pub fn new(buckets: Arc<dyn BucketProvider>) -> Self {
        Self { buckets }
    }

    fn store(&self, location: &Location) -> Result<Arc<dyn ObjectStore>, StorageError> {
        self.buckets.bucket(location.bucket_name()?)
    }

    async fn find(
        &self,
        store: &Arc<dyn ObjectStore>,
        file_id: &FileId,
    ) -> Result<ObjectMeta, StorageError> {
        let mut objects = store.list(None);
        while let Some(meta) = objects.try_next().await? {
            if meta.e_tag.as_deref().is_some_and(|e_tag| file_id.matches_etag(e_tag)) {
                return Ok(meta);
            }
        }
        Err(StorageError::NotFound(file_id.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn list(&self, location: &Location) -> Result<Vec<FileMetadata>, StorageError> {
        let store = self.store(location)?;
        let mut objects = store.list(None);

        let mut files = Vec::new();
        while let Some(meta) = objects.try_next().await? {
            let Some(e_tag) = meta.e_tag.as_deref() else {
                tracing::warn!(key = %meta.location, "object has no etag, skipping");
                continue;
            };
            files.push(FileMetadata {
                name: meta.location.to_string(),
                id: FileId::normalized(e_tag),
                size: meta.size as u64,
                last_modified: meta.last_modified,
            });
        }
        Ok(files)
    }

    async fn get(&self, location: &Location, file_id: &FileId) -> Result<File, StorageError> {
        let store = self.store(location)?;
        let meta = self.find(&store, file_id).await?;

        let options = GetOptions {
            if_match: meta.e_tag.clone(),
            ..Default::default()
        };
        let result = match store.get_opts(&meta.location, options).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. })
            | Err(object_store::Error::Precondition { .. }) => {
                return Err(StorageError::NotFound(file_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let unchanged = result
            .meta
            .e_tag
            .as_deref()
            .is_some_and(|e_tag| file_id.matches_etag(e_tag));
        if !unchanged {
            tracing::warn!(
                key = %meta.location,
                expected = %file_id,
                actual = ?result.meta.e_tag,
                "object changed between listing and read"
            );
            return Err(StorageError::NotFound(file_id.to_string()));
        }

        let size = result.meta.size as u64;
        let content = result.into_stream().map_err(StorageError::from).boxed();
        Ok(File { content, size })
    }
}
