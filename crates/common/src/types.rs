use std::collections::{BTreeMap, HashSet};
use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

use crate::storage::StorageError;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(
    /// A collection of people and data sharing one set of egress approvals.
    ProjectId
);

string_id!(
    /// A reviewer. Only unique within a project.
    UserId
);

string_id!(
    /// Content fingerprint of a file, e.g. an object store ETag with its
    /// quoting removed.
    FileId
);

impl FileId {
    /// Build an id from a client-supplied value or a raw entity tag.
    pub fn normalized(value: &str) -> Self {
        Self::from(strip_quotes(value))
    }

    /// Whether `e_tag` names this content, ignoring quoting on either side.
    pub fn matches_etag(&self, e_tag: &str) -> bool {
        strip_quotes(e_tag) == strip_quotes(self.as_str())
    }
}

/// Reviewers who approved one file, in the order their approvals were recorded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileApprovals(Vec<UserId>);

impl FileApprovals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, user_id: &UserId) -> bool {
        self.0.contains(user_id)
    }

    pub fn push(&mut self, user_id: UserId) {
        self.0.push(user_id);
    }

    /// Number of different reviewers, the population compared against a quorum.
    pub fn distinct_count(&self) -> usize {
        self.0.iter().collect::<HashSet<_>>().len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserId> {
        self.0.iter()
    }
}

impl From<Vec<UserId>> for FileApprovals {
    fn from(value: Vec<UserId>) -> Self {
        Self(value)
    }
}

/// Approvals of every file in a project, keyed by content id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectApprovals(BTreeMap<FileId, FileApprovals>);

impl ProjectApprovals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Approvals for a single file. A file nobody approved has an empty list.
    pub fn file_approvals(&self, file_id: &FileId) -> FileApprovals {
        self.0.get(file_id).cloned().unwrap_or_default()
    }

    pub fn entry(&mut self, file_id: FileId) -> &mut FileApprovals {
        self.0.entry(file_id).or_default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FileId, &FileApprovals)> {
        self.0.iter()
    }
}

/// What a storage backend reports about one object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub name: String,
    pub id: FileId,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
}

/// Stream of bytes handed back by a storage backend.
pub type ContentStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// An opened object. Dropping it releases the underlying connection or handle.
pub struct File {
    pub content: ContentStream,
    pub size: u64,
}

impl fmt::Debug for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("File").field("size", &self.size).finish()
    }
}

/// Remove the quoting some backends wrap around entity tags.
pub fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_quotes() {
        assert_eq!(strip_quotes("thing"), "thing");
        assert_eq!(strip_quotes("\"thing"), "thing");
        assert_eq!(strip_quotes("\"thing\""), "thing");
        assert_eq!(strip_quotes("\"\""), "");
    }

    #[test]
    fn test_file_id_quoting() {
        assert_eq!(FileId::normalized("\"abc\""), FileId::from("abc"));
        assert!(FileId::from("abc").matches_etag("\"abc\""));
        assert!(FileId::from("\"abc\"").matches_etag("abc"));
        assert!(!FileId::from("abc").matches_etag("\"abcd\""));
    }

    #[test]
    fn test_missing_file_has_empty_approvals() {
        let approvals = ProjectApprovals::new();
        let file = approvals.file_approvals(&FileId::from("never-approved"));
        assert!(file.is_empty());
    }

    #[test]
    fn test_distinct_count_ignores_repeats() {
        let approvals = FileApprovals::from(vec![
            UserId::from("alice"),
            UserId::from("bob"),
            UserId::from("alice"),
        ]);
        assert_eq!(approvals.len(), 3);
        assert_eq!(approvals.distinct_count(), 2);
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&FileApprovals::from(vec![UserId::from("user1")])).unwrap();
        assert_eq!(json, r#"["user1"]"#);
    }
}
