//! API constants

/// Prefix of every JSON API route.
pub const API_PREFIX: &str = "/api";

/// Path under which thumbnail assets are served.
pub const ASSETS_PATH: &str = "/assets";

/// Path under which local-backend objects are served through presigned URLs.
pub const MEDIA_PATH: &str = "/media";

/// Allowance for multipart framing on top of the file size ceilings.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Multipart field carrying the video file.
pub const VIDEO_FIELD: &str = "video";

/// Multipart field carrying the thumbnail image.
pub const THUMBNAIL_FIELD: &str = "thumbnail";
