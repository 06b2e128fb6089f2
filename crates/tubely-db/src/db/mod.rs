//! Repository implementations for video records.

mod memory;
mod postgres;
mod video;

pub use memory::InMemoryVideoRepository;
pub use postgres::PgVideoRepository;
pub use video::{VideoRepository, VideoRow};
