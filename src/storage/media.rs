//! Media storage gateway
//!
//! Named binary blobs in an S3-compatible bucket. The rest of the
//! application only sees `exists` / `upload` / `download`.

use aws_sdk_s3::Client as S3Client;

use crate::error::AppError;

/// A downloaded media file
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Media storage service
pub struct MediaStorage {
    client: S3Client,
    bucket: String,
}

impl MediaStorage {
    /// Create new media storage client
    ///
    /// # Arguments
    /// * `config` - Storage configuration (endpoint, bucket, credentials)
    pub async fn new(config: &crate::config::StorageConfig) -> Result<Self, AppError> {
        use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "rustscribe-media",
        );

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(&config.endpoint)
            .credentials_provider(credentials)
            .build();

        let client = S3Client::from_conf(s3_config);

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
        })
    }

    /// Check whether a blob with this name exists
    pub async fn exists(&self, name: &str) -> Result<bool, AppError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(error) if error.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(error) => Err(AppError::Storage(format!("head failed for {name}: {error}"))),
        }
    }

    /// Upload a blob under a content-addressed name
    ///
    /// Storing a name that is already present is a no-op: identical
    /// content hashes to the identical name, so the existing blob is
    /// the same bytes.
    pub async fn upload(
        &self,
        name: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), AppError> {
        use aws_sdk_s3::primitives::ByteStream;

        if self.exists(name).await? {
            tracing::debug!(name, "blob already stored, skipping upload");
            return Ok(());
        }

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .cache_control("public, max-age=31536000") // 1 year
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload failed for {name}: {e}")))?;

        crate::metrics::MEDIA_UPLOADS_TOTAL.inc();
        Ok(())
    }

    /// Download a blob, or `None` when the name is unknown
    pub async fn download(&self, name: &str) -> Result<Option<MediaFile>, AppError> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) if error.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Ok(None);
            }
            Err(error) => {
                return Err(AppError::Storage(format!(
                    "download failed for {name}: {error}"
                )));
            }
        };

        let content_type = response
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = response
            .body
            .collect()
            .await
            .map_err(|e| AppError::Storage(format!("read failed for {name}: {e}")))?
            .into_bytes()
            .to_vec();

        Ok(Some(MediaFile {
            name: name.to_string(),
            content_type,
            data,
        }))
    }
}
