//! Image format detection
//!
//! Sniffs magic bytes and decodes only the image header; the full
//! pixel data is never decoded here.

use std::io::Cursor;

use image::{ImageFormat, ImageReader};

/// Result of probing an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    /// Canonical MIME type for the detected format
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
}

/// Why probing failed
///
/// The two kinds stay distinguishable here; the image workflow
/// re-signals both uniformly to the client while keeping the cause
/// for server-side diagnostics.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// Content does not start with any recognized image signature
    #[error("unrecognized image format")]
    UnknownFormat,
    /// Recognized signature but the header does not decode
    #[error("invalid image content: {0}")]
    InvalidContent(#[source] image::ImageError),
}

/// Detect the format and dimensions of image content
pub fn probe(content: &[u8]) -> Result<ImageInfo, ProbeError> {
    let reader = ImageReader::new(Cursor::new(content))
        .with_guessed_format()
        .map_err(|_| ProbeError::UnknownFormat)?;

    let format = reader.format().ok_or(ProbeError::UnknownFormat)?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(ProbeError::InvalidContent)?;

    Ok(ImageInfo {
        format,
        mime_type: format.to_mime_type(),
        width,
        height,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Smallest valid 1x1 PNG (black pixel)
    pub(crate) const TINY_PNG: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x00, 0x00, 0x00, 0x00, 0x3A,
        0x7E, 0x9B, 0x55, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x60,
        0x00, 0x00, 0x00, 0x02, 0x00, 0x01, 0x48, 0xAF, 0xA4, 0x71, 0x00, 0x00, 0x00, 0x00, 0x49,
        0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
    ];

    #[test]
    fn probe_detects_png() {
        let info = probe(TINY_PNG).unwrap();
        assert_eq!(info.format, ImageFormat::Png);
        assert_eq!(info.mime_type, "image/png");
        assert_eq!((info.width, info.height), (1, 1));
    }

    #[test]
    fn probe_rejects_non_image_bytes() {
        let error = probe(b"this is definitely not an image").unwrap_err();
        assert!(matches!(error, ProbeError::UnknownFormat));
    }

    #[test]
    fn probe_rejects_truncated_image() {
        // PNG signature with nothing after it
        let truncated = &TINY_PNG[..12];
        let error = probe(truncated).unwrap_err();
        assert!(matches!(error, ProbeError::InvalidContent(_)));
    }
}
