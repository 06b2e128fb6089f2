//! Data models for the application

mod aspect;
mod storage;
mod video;

pub use aspect::AspectClass;
pub use storage::{ReferenceDecodeError, StorageReference, REFERENCE_DELIMITER};
pub use video::{CreateVideoRequest, Video, VideoResponse};
