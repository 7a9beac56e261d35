//! Image service
//!
//! Upload and download of image blobs. Uploads are verified to be
//! images, stored under a content-addressed name, and naturally
//! deduplicated by that name.

use std::sync::Arc;

use crate::error::AppError;
use crate::storage::{MediaFile, MediaStorage, naming, probe};

const NOT_AN_IMAGE: &str = "The file is not an image or this format is not supported";

/// Image service
pub struct ImageService {
    storage: Arc<MediaStorage>,
}

impl ImageService {
    pub fn new(storage: Arc<MediaStorage>) -> Self {
        Self { storage }
    }

    /// Upload an image
    ///
    /// The stored content type is the submitted one when it is
    /// already an `image/*` value, otherwise the detected default
    /// for the sniffed format.
    ///
    /// # Returns
    /// The content-addressed name the blob was stored under.
    pub async fn upload(
        &self,
        data: Vec<u8>,
        content_type: &str,
        original_name: &str,
    ) -> Result<String, AppError> {
        if data.is_empty() {
            return Err(AppError::validation("image data is required"));
        }

        let info = probe::probe(&data).map_err(|error| {
            // Both probe failure kinds surface as one message; the
            // cause stays in the logs.
            tracing::debug!(%error, "image upload rejected");
            AppError::validation(NOT_AN_IMAGE)
        })?;

        let content_type = if content_type.starts_with("image/") {
            content_type.to_string()
        } else {
            info.mime_type.to_string()
        };

        let name = naming::hashed_file_name(&data, original_name);
        self.storage.upload(&name, data, &content_type).await?;

        tracing::info!(
            name = %name,
            format = ?info.format,
            width = info.width,
            height = info.height,
            "image uploaded"
        );
        Ok(name)
    }

    /// Download an image by its stored name
    pub async fn download(&self, name: &str) -> Result<MediaFile, AppError> {
        self.storage
            .download(name)
            .await?
            .ok_or_else(|| AppError::not_found("The file was not found"))
    }
}
