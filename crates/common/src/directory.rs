//! Wire format of the directory server API (`GET /files`, `GET /file`),
//! shared by the server and the HTTP storage backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most entries one listing returns. Further files are left out.
pub const MAX_LIST_FILES: usize = 1000;

/// Longest accepted object key, in bytes.
pub const MAX_KEY_LENGTH: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    /// Quoted entity tag, as sent in the `ETag` header.
    pub etag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListFilesResponse {
    pub files: Vec<FileEntry>,
    pub file_count: usize,
    pub prefix: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListFilesQuery {
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetFileQuery {
    #[serde(default)]
    pub key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_shape() {
        let listing = ListFilesResponse {
            files: vec![FileEntry {
                key: "a/b.txt".into(),
                size: 3,
                last_modified: DateTime::from_timestamp(0, 0).unwrap(),
                etag: "\"abc\"".into(),
            }],
            file_count: 1,
            prefix: "a".into(),
        };

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["file_count"], 1);
        assert_eq!(value["prefix"], "a");
        assert_eq!(value["files"][0]["key"], "a/b.txt");
        assert_eq!(value["files"][0]["etag"], "\"abc\"");
        assert_eq!(value["files"][0]["last_modified"], "1970-01-01T00:00:00Z");
    }
}
