use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use s3::creds::Credentials;
use s3::region::Region;
use s3::Bucket;
use tracing::debug;

use super::ObjectStore;
use crate::config::Config;

/// S3 client wrapper.
#[derive(Clone)]
pub struct S3Client {
    bucket: Box<Bucket>,
    endpoint: Option<String>,
    public_base_url: Option<String>,
}

impl S3Client {
    /// Create a new S3 client from configuration.
    ///
    /// Credentials come from `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY`.
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are missing or client initialization fails.
    pub fn new(config: &Config) -> Result<Self> {
        let access_key = std::env::var("AWS_ACCESS_KEY_ID").context("AWS_ACCESS_KEY_ID not set")?;
        let secret_key =
            std::env::var("AWS_SECRET_ACCESS_KEY").context("AWS_SECRET_ACCESS_KEY not set")?;

        Self::with_credentials(config, &access_key, &secret_key)
    }

    /// Create a client with explicit credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if client initialization fails.
    pub fn with_credentials(config: &Config, access_key: &str, secret_key: &str) -> Result<Self> {
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .context("Failed to create S3 credentials")?;

        let region = if let Some(ref endpoint) = config.s3_endpoint {
            Region::Custom {
                region: config.s3_region.clone(),
                endpoint: endpoint.clone(),
            }
        } else {
            config.s3_region.parse().unwrap_or(Region::UsEast1)
        };

        let bucket = Bucket::new(&config.s3_bucket, region, credentials)
            .context("Failed to create S3 bucket")?;

        // Use path-style for custom endpoints (MinIO, R2, etc.)
        let bucket = if config.s3_endpoint.is_some() {
            bucket.with_path_style()
        } else {
            bucket
        };

        Ok(Self {
            bucket,
            endpoint: config.s3_endpoint.clone(),
            public_base_url: config.public_base_url.clone(),
        })
    }

    /// Check if the bucket is publicly readable (AWS S3, R2) or private (MinIO).
    #[must_use]
    pub fn is_public(&self) -> bool {
        match &self.endpoint {
            None => true,
            Some(endpoint) => !endpoint.to_lowercase().contains("minio"),
        }
    }

    /// Get the bucket name
    #[must_use]
    pub fn bucket_name(&self) -> String {
        self.bucket.name().to_string()
    }
}

#[async_trait]
impl ObjectStore for S3Client {
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<()> {
        debug!(key = %key, content_type = %content_type, size = data.len(), "Uploading bytes to S3");

        let response = self
            .bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .context("Failed to upload file to S3")?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            bail!("S3 rejected upload of {key} with status {status}");
        }

        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<(Vec<u8>, String)>> {
        debug!(key = %key, "Getting S3 object");

        match self.bucket.get_object(key).await {
            Ok(response) if response.status_code() == 404 => Ok(None),
            Ok(response) if !(200..300).contains(&response.status_code()) => {
                bail!(
                    "S3 get object {key} failed with status {}",
                    response.status_code()
                )
            }
            Ok(response) => {
                let content_type = response
                    .headers()
                    .get("content-type")
                    .map_or("application/octet-stream", |v| v.as_str())
                    .to_string();
                Ok(Some((response.to_vec(), content_type)))
            }
            Err(s3::error::S3Error::HttpFailWithBody(404, _)) => Ok(None),
            Err(e) => Err(anyhow::anyhow!("S3 get object failed: {e}")),
        }
    }

    fn public_url(&self, key: &str) -> String {
        if let Some(base) = &self.public_base_url {
            return format!("{base}/{key}");
        }
        match &self.endpoint {
            None => format!("https://{}.s3.amazonaws.com/{}", self.bucket.name(), key),
            Some(_) if !self.is_public() => format!("/files/{key}"),
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                self.bucket.name(),
                key
            ),
        }
    }
}

impl std::fmt::Debug for S3Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Client")
            .field("bucket", &self.bucket.name())
            .finish()
    }
}
