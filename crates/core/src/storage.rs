//! Upload validation, content-type mapping and storage key layout.
//!
//! Storage keys are relative, `/`-separated paths under the configured
//! storage root. Static assets live under `static-assets/`, downloaded
//! generation outputs under `generations/<id>/`.

use sha2::{Digest, Sha256};

use crate::error::CoreError;
use crate::DbId;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default upper bound for a single upload (20 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

/// Content types accepted for static asset uploads.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp", "image/gif"];

/// Prefix for uploaded static assets.
pub const STATIC_ASSET_PREFIX: &str = "static-assets";

/// Prefix for files downloaded from the generation API.
pub const GENERATION_PREFIX: &str = "generations";

// ---------------------------------------------------------------------------
// Content types
// ---------------------------------------------------------------------------

/// Map a content type to a file extension.
///
/// Parameters after `;` are ignored. Unknown types fall back to `bin`.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    let base = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    match base.as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/quicktime" => "mov",
        _ => "bin",
    }
}

/// Guess a content type from a file name or URL path.
pub fn content_type_from_path(path: &str) -> Option<&'static str> {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    let ext = path.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "mp4" => Some("video/mp4"),
        "webm" => Some("video/webm"),
        "mov" => Some("video/quicktime"),
        _ => None,
    }
}

/// Whether the content type is an image that can back a static screen.
pub fn is_image_content_type(content_type: &str) -> bool {
    let base = content_type.split(';').next().unwrap_or("").trim();
    ALLOWED_IMAGE_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(base))
}

/// Validate an upload's content type and size.
pub fn validate_upload(content_type: &str, size_bytes: u64, max_bytes: u64) -> Result<(), CoreError> {
    if size_bytes == 0 {
        return Err(CoreError::Validation("Uploaded file is empty".into()));
    }
    if size_bytes > max_bytes {
        return Err(CoreError::Validation(format!(
            "Uploaded file is {size_bytes} bytes; the limit is {max_bytes} bytes"
        )));
    }
    if !is_image_content_type(content_type) {
        return Err(CoreError::Validation(format!(
            "Unsupported content type '{content_type}'. Supported: {}",
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Key for a newly uploaded static asset.
pub fn static_asset_key(ext: &str) -> String {
    format!("{STATIC_ASSET_PREFIX}/{}.{ext}", uuid::Uuid::new_v4())
}

/// Key for the `index`-th output file of a generation.
pub fn generation_file_key(generation_id: DbId, index: usize, ext: &str) -> String {
    format!(
        "{}/{index}-{}.{ext}",
        generation_dir_key(generation_id),
        uuid::Uuid::new_v4()
    )
}

/// Directory key holding every output file of one generation.
pub fn generation_dir_key(generation_id: DbId) -> String {
    format!("{GENERATION_PREFIX}/{generation_id}")
}

/// Lowercase hex SHA-256 of stored file contents, kept in the `sha256`
/// column of assets and generation files.
pub fn fingerprint(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Reject keys that could escape the storage root.
pub fn validate_storage_key(key: &str) -> Result<(), CoreError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(CoreError::Validation(format!("Invalid storage key '{key}'")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_ignores_parameters_and_case() {
        assert_eq!(extension_for_content_type("image/PNG"), "png");
        assert_eq!(extension_for_content_type("image/jpeg; charset=binary"), "jpg");
        assert_eq!(extension_for_content_type("video/mp4"), "mp4");
        assert_eq!(extension_for_content_type("application/octet-stream"), "bin");
    }

    #[test]
    fn content_type_from_url_path() {
        assert_eq!(
            content_type_from_path("https://v3.fal.media/files/abc/out.webp?x=1"),
            Some("image/webp")
        );
        assert_eq!(content_type_from_path("clip.MP4"), Some("video/mp4"));
        assert_eq!(content_type_from_path("noext"), None);
    }

    #[test]
    fn upload_validation() {
        assert!(validate_upload("image/png", 10, 100).is_ok());
        assert!(validate_upload("image/png", 0, 100).is_err());
        assert!(validate_upload("image/png", 101, 100).is_err());
        assert!(validate_upload("application/pdf", 10, 100).is_err());
    }

    #[test]
    fn keys_have_expected_layout() {
        let key = static_asset_key("png");
        assert!(key.starts_with("static-assets/"));
        assert!(key.ends_with(".png"));
        assert!(validate_storage_key(&key).is_ok());

        let key = generation_file_key(42, 0, "mp4");
        assert!(key.starts_with("generations/42/0-"));
        assert!(validate_storage_key(&key).is_ok());
        assert!(key.starts_with(&format!("{}/", generation_dir_key(42))));
    }

    #[test]
    fn fingerprint_is_hex_sha256() {
        assert_eq!(
            fingerprint(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_ne!(fingerprint(b"frame-1"), fingerprint(b"frame-2"));
    }

    #[test]
    fn traversal_keys_rejected() {
        assert!(validate_storage_key("../etc/passwd").is_err());
        assert!(validate_storage_key("/abs/path").is_err());
        assert!(validate_storage_key("a//b").is_err());
        assert!(validate_storage_key("a\\b").is_err());
        assert!(validate_storage_key("").is_err());
    }
}
