//! Paddock Common Library
//!
//! Shared error type, content hashing and the asset manifest written by the
//! bundler and read back by the server tooling and the e2e suite.

pub mod error;
pub mod hash;
pub mod manifest;

pub use error::{Error, Result};
pub use hash::{content_hash, hashed_file_name, sha256_hex};
pub use manifest::{AssetManifest, ManifestAsset, MANIFEST_FILE_NAME};

/// Paddock version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
