//! Tubely Core Library
//!
//! This crate provides the domain models, error types, configuration and media-type
//! helpers shared by every Tubely component.

pub mod config;
pub mod error;
pub mod media_type;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{BaseConfig, Config, TubelyConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    AspectClass, CreateVideoRequest, ReferenceDecodeError, StorageReference, Video,
    VideoResponse,
};
pub use storage_types::StorageBackend;
