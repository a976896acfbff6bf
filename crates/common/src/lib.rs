/**
 * Which reviewer approved which file, per project.
 *  In-memory and SQL-backed implementations.
 */
pub mod ledger;
/**
 * Content-addressed object storage backends.
 *  S3 buckets through `object_store`, and
 *  directory servers over HTTP.
 */
pub mod storage;
/**
 * Wire types of the directory server API.
 */
pub mod directory;
/**
 * Parsing of storage location URIs.
 */
pub mod location;
/**
 * Identifiers, approval collections and
 *  the file handles backends return.
 */
pub mod types;

mod error;

pub use error::{status_code, ErrorKind, UNCLASSIFIED_STATUS};
