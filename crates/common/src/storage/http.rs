use std::time::Duration;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{ETAG, IF_MATCH};
use reqwest::StatusCode;
use url::Url;

use super::{ObjectStorage, StorageError};
use crate::directory::{FileEntry, ListFilesResponse};
use crate::location::Location;
use crate::types::{strip_quotes, File, FileId, FileMetadata};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ObjectStorage`] over `http(s)://` locations served by a directory
/// server. Content ids are the server's ETags.
#[derive(Debug, Clone)]
pub struct HttpStorage {
    client: reqwest::Client,
}

impl HttpStorage {
    pub fn new() -> Result<Self, StorageError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    async fn listing(&self, location: &Location) -> Result<ListFilesResponse, StorageError> {
        let url = endpoint(location.url(), "files")?;
        let response = self.client.get(url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(StorageError::UnexpectedStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }
}

/// `base` with `segment` appended to its path.
fn endpoint(base: &Url, segment: &str) -> Result<Url, StorageError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| StorageError::InvalidConfig(format!("{} cannot be a base URL", base)))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

impl From<FileEntry> for FileMetadata {
    fn from(entry: FileEntry) -> Self {
        FileMetadata {
            id: FileId::normalized(&entry.etag),
            name: entry.key,
            size: entry.size,
            last_modified: entry.last_modified,
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpStorage {
    async fn list(&self, location: &Location) -> Result<Vec<FileMetadata>, StorageError> {
        let listing = self.listing(location).await?;
        if listing.file_count > listing.files.len() {
            tracing::warn!(
                location = %location,
                reported = listing.file_count,
                returned = listing.files.len(),
                "directory listing was truncated"
            );
        }

        Ok(listing
            .files
            .into_iter()
            .filter(|entry| {
                let has_etag = !strip_quotes(&entry.etag).is_empty();
                if !has_etag {
                    tracing::warn!(key = %entry.key, "file has no etag, skipping");
                }
                has_etag
            })
            .map(FileMetadata::from)
            .collect())
    }

    async fn get(&self, location: &Location, file_id: &FileId) -> Result<File, StorageError> {
        let entry = self
            .listing(location)
            .await?
            .files
            .into_iter()
            .find(|entry| file_id.matches_etag(&entry.etag))
            .ok_or_else(|| StorageError::NotFound(file_id.to_string()))?;

        let mut url = endpoint(location.url(), "file")?;
        url.query_pairs_mut().append_pair("key", &entry.key);

        let response = self
            .client
            .get(url.clone())
            .header(IF_MATCH, format!("\"{}\"", strip_quotes(file_id.as_str())))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND | StatusCode::PRECONDITION_FAILED => {
                return Err(StorageError::NotFound(file_id.to_string()))
            }
            status => {
                return Err(StorageError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.to_string(),
                })
            }
        }

        let served = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| file_id.matches_etag(value));
        if !served {
            tracing::warn!(key = %entry.key, expected = %file_id, "file changed between listing and read");
            return Err(StorageError::NotFound(file_id.to_string()));
        }

        let size = response.content_length().unwrap_or(entry.size);
        let content = response
            .bytes_stream()
            .map_err(StorageError::from)
            .boxed();
        Ok(File { content, size })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joining() {
        let base = Url::parse("http://localhost:8080").unwrap();
        assert_eq!(
            endpoint(&base, "files").unwrap().as_str(),
            "http://localhost:8080/files"
        );

        let base = Url::parse("https://example.com/v1").unwrap();
        assert_eq!(
            endpoint(&base, "file").unwrap().as_str(),
            "https://example.com/v1/file"
        );

        let base = Url::parse("https://example.com/v1/").unwrap();
        assert_eq!(
            endpoint(&base, "files").unwrap().as_str(),
            "https://example.com/v1/files"
        );
    }

    #[test]
    fn test_entry_to_metadata() {
        let entry = FileEntry {
            key: "dir/a.txt".into(),
            size: 5,
            last_modified: chrono::DateTime::from_timestamp(10, 0).unwrap(),
            etag: "\"abc123\"".into(),
        };
        let metadata = FileMetadata::from(entry);
        assert_eq!(metadata.name, "dir/a.txt");
        assert_eq!(metadata.id, FileId::from("abc123"));
        assert_eq!(metadata.size, 5);
    }
}
