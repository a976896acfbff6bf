use std::io;
use std::path::Path;
use std::sync::Arc;

use cap_std::ambient_authority;
use cap_std::fs::{Dir, DirEntry};
use chrono::{DateTime, Utc};

use common::directory::{FileEntry, ListFilesResponse, MAX_KEY_LENGTH, MAX_LIST_FILES};

use crate::error::LocalError;
use crate::etag::{is_quoted, make_etag};

/// The directory tree being served. Every path is resolved beneath one
/// directory handle, so neither `..` nor a symlink can reach outside it.
#[derive(Debug, Clone)]
pub struct ServedRoot {
    dir: Arc<Dir>,
}

/// A file opened for reading, with the tag and timestamp taken from the
/// open handle.
#[derive(Debug)]
pub struct OpenedFile {
    pub file: std::fs::File,
    pub size: u64,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
}

impl ServedRoot {
    pub fn open(path: &Path) -> Result<Self, LocalError> {
        let dir = Dir::open_ambient_dir(path, ambient_authority())?;
        Ok(Self { dir: Arc::new(dir) })
    }

    /// Files under the root whose key starts with `prefix`, in lexical walk
    /// order. At most [`MAX_LIST_FILES`] entries are returned; `file_count`
    /// still reports every match.
    ///
    /// The whole matching subtree is always walked to produce that count, so
    /// the cost grows with the number of matches. Past the limit, entries are
    /// counted without being sorted or stat'ed.
    pub async fn list(&self, prefix: &str) -> Result<ListFilesResponse, LocalError> {
        validate_prefix(prefix)?;

        let dir = self.dir.clone();
        let prefix = prefix.to_string();
        tokio::task::spawn_blocking(move || -> Result<ListFilesResponse, LocalError> {
            let mut listing = ListFilesResponse {
                files: Vec::new(),
                file_count: 0,
                prefix,
            };
            walk(&dir, "", &mut listing)?;
            if listing.file_count > listing.files.len() {
                tracing::info!(
                    prefix = %listing.prefix,
                    matched = listing.file_count,
                    returned = listing.files.len(),
                    "maximum file count reached, truncating listing"
                );
            }
            Ok(listing)
        })
        .await?
    }

    /// Open `key` for reading if its current tag equals `if_match`.
    pub async fn open_file(&self, key: &str, if_match: &str) -> Result<OpenedFile, LocalError> {
        validate_key(key)?;
        if !is_quoted(if_match) {
            return Err(LocalError::InvalidETag);
        }

        let dir = self.dir.clone();
        let key = key.to_string();
        let if_match = if_match.to_string();
        tokio::task::spawn_blocking(move || -> Result<OpenedFile, LocalError> {
            let file = dir.open(&key).map_err(LocalError::from_open)?.into_std();
            let metadata = file.metadata()?;
            if metadata.is_dir() {
                return Err(LocalError::IsDirectory);
            }

            let last_modified = DateTime::<Utc>::from(metadata.modified()?);
            let size = metadata.len();
            let etag = make_etag(&key, size, last_modified.timestamp());
            if etag != if_match {
                tracing::debug!(key = %key, current = %etag, requested = %if_match, "etag mismatch");
                return Err(LocalError::ETagMismatch);
            }

            Ok(OpenedFile {
                file,
                size,
                etag,
                last_modified,
            })
        })
        .await?
    }
}

fn walk(dir: &Dir, base: &str, listing: &mut ListFilesResponse) -> Result<(), LocalError> {
    let mut entries = dir.entries()?.collect::<io::Result<Vec<DirEntry>>>()?;
    if listing.files.len() < MAX_LIST_FILES {
        entries.sort_by_key(|entry| entry.file_name());
    }

    for entry in entries {
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::warn!(directory = %base, name = ?raw, "skipping non UTF-8 file name");
                continue;
            }
        };
        let key = if base.is_empty() {
            name
        } else {
            format!("{}/{}", base, name)
        };

        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            tracing::debug!(key = %key, "skipping symlink");
            continue;
        }
        if file_type.is_dir() {
            if may_contain_prefix(&key, &listing.prefix) {
                walk(&entry.open_dir()?, &key, listing)?;
            }
            continue;
        }
        if !file_type.is_file() || !key.starts_with(&listing.prefix) {
            continue;
        }

        if listing.files.len() >= MAX_LIST_FILES {
            listing.file_count += 1;
            continue;
        }

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            // removed since the directory was read
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        };
        listing.file_count += 1;
        let last_modified = DateTime::<Utc>::from(metadata.modified()?.into_std());
        let size = metadata.len();
        listing.files.push(FileEntry {
            etag: make_etag(&key, size, last_modified.timestamp()),
            key,
            size,
            last_modified,
        });
    }

    Ok(())
}

/// Whether a key below directory `dir_key` can start with `prefix`.
fn may_contain_prefix(dir_key: &str, prefix: &str) -> bool {
    let dir_key = format!("{}/", dir_key);
    dir_key.starts_with(prefix) || prefix.starts_with(&dir_key)
}

/// A relative path whose `..` components never climb above its start.
pub fn is_local(path: &str) -> bool {
    if path.is_empty() || path.starts_with('/') {
        return false;
    }

    let mut depth: usize = 0;
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            _ => depth += 1,
        }
    }
    true
}

pub fn validate_prefix(prefix: &str) -> Result<(), LocalError> {
    if prefix.is_empty() || is_local(prefix) {
        Ok(())
    } else {
        Err(LocalError::InvalidPrefix)
    }
}

pub fn validate_key(key: &str) -> Result<(), LocalError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH || !is_local(key) || key.ends_with('/') {
        return Err(LocalError::InvalidKey);
    }
    Ok(())
}
