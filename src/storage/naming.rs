//! Content-addressed blob naming
//!
//! A file's stored name is derived from a digest of its content, so
//! identical uploads collapse onto one blob.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use sha2::{Digest, Sha256};

/// Derive the storage name for a blob from its content
///
/// SHA-256 of the full content, base64-encoded with `/` replaced by
/// `-` (slashes are treated as folder separators by the store), with
/// the original file extension appended when there is one.
///
/// Deterministic: same content and extension always produce the same
/// name.
pub fn hashed_file_name(content: &[u8], original_name: &str) -> String {
    let digest = Sha256::digest(content);
    let encoded = STANDARD.encode(digest).replace('/', "-");

    match extension_of(original_name) {
        Some(extension) => format!("{encoded}.{extension}"),
        None => encoded,
    }
}

fn extension_of(name: &str) -> Option<&str> {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_deterministic_across_original_names() {
        let content = b"same bytes";
        assert_eq!(
            hashed_file_name(content, "photo.png"),
            hashed_file_name(content, "other.png")
        );
    }

    #[test]
    fn name_contains_no_slashes_and_keeps_extension() {
        // Digest chosen by content; scan a few inputs to cover the
        // '/' substitution path.
        for i in 0u8..32 {
            let name = hashed_file_name(&[i, i.wrapping_mul(7), 3], "img.jpeg");
            assert!(!name.contains('/'), "slash in {name}");
            assert!(name.ends_with(".jpeg"));
        }
    }

    #[test]
    fn name_without_extension_is_digest_only() {
        let name = hashed_file_name(b"content", "noext");
        assert!(!name.contains('.'));
    }

    #[test]
    fn single_byte_change_changes_digest() {
        let a = hashed_file_name(b"content-a", "img.png");
        let b = hashed_file_name(b"content-b", "img.png");
        assert_ne!(a, b);
    }
}
