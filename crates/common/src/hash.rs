//! Content hashing for cache-busting asset names

use sha2::{Digest, Sha256};

/// Number of hex characters of the digest embedded in asset file names.
pub const HASH_LEN: usize = 8;

/// Full SHA-256 of `bytes` as lowercase hex.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Short content hash used inside file names.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut digest = sha256_hex(bytes);
    digest.truncate(HASH_LEN);
    digest
}

/// Insert the content hash of `bytes` before the extension of `name`.
///
/// `horse.webp` becomes `horse-1a2b3c4d.webp`; a name without an extension
/// gets the hash appended (`LICENSE-1a2b3c4d`).
pub fn hashed_file_name(name: &str, bytes: &[u8]) -> String {
    let hash = content_hash(bytes);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{}-{}.{}", stem, hash, ext),
        _ => format!("{}-{}", name, hash),
    }
}
