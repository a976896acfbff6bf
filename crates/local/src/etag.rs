use sha2::{Digest, Sha256};

/// Entity tag of a served file: quoted hex SHA-256 over the key, the size
/// and the modification time in whole seconds, the integers little-endian.
///
/// File content is not read, so any rewrite that keeps the size and the
/// second of modification keeps the tag.
pub fn make_etag(key: &str, size: u64, modified_secs: i64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update((size as i64).to_le_bytes());
    hasher.update(modified_secs.to_le_bytes());
    format!("\"{}\"", hex::encode(hasher.finalize()))
}

/// Whether `value` is a quoted entity tag such as `"abc123"`.
pub fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}
