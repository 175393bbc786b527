//! BLAKE3 content keys for compiled artifacts
//!
//! The key identifies a compiled template (or data bundle) by content. Rendering
//! clients use it as a cache key and embed it in markup as `data-hash`, so it
//! must depend on nothing but the bytes it is computed over.

use blake3::Hasher;

/// Length of a content key in hex characters
pub const KEY_LEN: usize = 64;

/// Compute the content key of compiled output
pub fn content_key(content: &str) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content.as_bytes());
    hasher.finalize().to_hex().to_string()
}

/// Check whether a string looks like a content key
pub fn is_content_key(value: &str) -> bool {
    value.len() == KEY_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}
