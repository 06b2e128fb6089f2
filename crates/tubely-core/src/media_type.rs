//! Media type helpers
//!
//! Declared content types arrive from multipart form fields and may carry parameters
//! (`video/mp4; codecs="avc1"`). Comparisons are made on the bare essence.

/// The only container accepted by the video ingestion pipeline.
pub const VIDEO_MP4: &str = "video/mp4";

/// Content types accepted for thumbnails.
pub const THUMBNAIL_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Extension used when a media type has no usable subtype.
pub const FALLBACK_EXTENSION: &str = ".bin";

/// Parse a declared content type, returning its lowercased `type/subtype` essence
/// with any parameters stripped. Returns `None` when the value is not a media type.
pub fn parse_media_type(raw: &str) -> Option<String> {
    raw.trim()
        .parse::<mime::Mime>()
        .ok()
        .map(|m| m.essence_str().to_ascii_lowercase())
}

/// File extension for a media type: `.` followed by the subtype of a two-part
/// media type, `.bin` otherwise.
pub fn media_type_to_ext(media_type: &str) -> String {
    let parts: Vec<&str> = media_type.split('/').collect();
    if parts.len() != 2 {
        return FALLBACK_EXTENSION.to_string();
    }
    format!(".{}", parts[1])
}

pub fn is_thumbnail_media_type(media_type: &str) -> bool {
    THUMBNAIL_MEDIA_TYPES.contains(&media_type)
}
