pub mod health;
pub mod media_file;
pub mod thumbnail_upload;
pub mod video_upload;
pub mod videos;
