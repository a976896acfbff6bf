//! Directory server for the egress gateway.
//!
//! Serves one filesystem subtree over the same content-addressed API the
//! gateway's generic storage backend consumes:
//! - `GET /files?prefix=` lists files with their ETags
//! - `GET /file?key=` streams one file if `If-Match` carries its current ETag

pub mod error;
pub mod etag;
pub mod http;
pub mod process;
pub mod root;

pub use error::LocalError;
pub use root::{OpenedFile, ServedRoot};
