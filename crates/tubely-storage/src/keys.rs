//! Shared key generation for storage backends.

use base64::Engine;
use rand::RngCore;
use tubely_core::media_type::media_type_to_ext;
use tubely_core::models::REFERENCE_DELIMITER;
use tubely_core::AspectClass;

use crate::{StorageError, StorageResult};

/// Number of random bytes behind each generated object name.
pub const RANDOM_NAME_BYTES: usize = 32;

/// 32 random bytes from the thread-local CSPRNG, unpadded URL-safe base64 (43 chars).
pub fn random_asset_name() -> String {
    let mut bytes = [0u8; RANDOM_NAME_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// Key for a relocated video: `<class>/<random name><ext>`.
pub fn video_key(class: AspectClass, media_type: &str) -> String {
    format!(
        "{}/{}{}",
        class,
        random_asset_name(),
        media_type_to_ext(media_type)
    )
}

/// Keys must be relative, free of traversal, and must not contain the reference delimiter.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() {
        return Err(StorageError::InvalidKey("Storage key is empty".to_string()));
    }
    if key.contains("..") || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(
            "Storage key contains invalid characters".to_string(),
        ));
    }
    if key.contains(REFERENCE_DELIMITER) {
        return Err(StorageError::InvalidKey(format!(
            "Storage key must not contain '{}'",
            REFERENCE_DELIMITER
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn random_names_are_url_safe_and_unpadded() {
        let name = random_asset_name();
        assert_eq!(name.len(), 43);
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn video_keys_are_unique() {
        let keys: HashSet<String> = (0..256)
            .map(|_| video_key(AspectClass::Landscape, "video/mp4"))
            .collect();
        assert_eq!(keys.len(), 256);
    }

    #[test]
    fn video_key_layout() {
        let key = video_key(AspectClass::Portrait, "video/mp4");
        assert!(key.starts_with("portrait/"));
        assert!(key.ends_with(".mp4"));
        assert!(validate_key(&key).is_ok());

        let key = video_key(AspectClass::Other, "garbage");
        assert!(key.starts_with("other/"));
        assert!(key.ends_with(".bin"));
    }

    #[test]
    fn rejects_bad_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/abs/key").is_err());
        assert!(validate_key("a,b").is_err());
        assert!(validate_key("landscape/abc.mp4").is_ok());
    }
}
