//! Tubely Storage Library
//!
//! Storage abstraction for relocated videos, with implementations for S3 (and
//! S3-compatible providers) and the local filesystem.
//!
//! # Storage key format
//!
//! Video keys are namespaced by aspect class: `{landscape|portrait|other}/{name}{ext}`,
//! where `name` is 32 random bytes encoded as unpadded URL-safe base64. Keys must not
//! contain `..`, a leading `/`, or the reference delimiter. Key generation lives in the
//! `keys` module so every backend agrees on the layout.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_storage, ConfiguredStorage};
pub use keys::{random_asset_name, video_key};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::{StorageBackend, StorageReference};
