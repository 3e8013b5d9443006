//! Storage gateway: turns an uploaded file into a stored object with a public
//! address.
//!
//! Files are checked before anything is sent to the object store, so a file
//! that is too large or not an image never costs a network round trip.

mod s3_store;

pub use s3_store::S3Client;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{with_deadline, Access, ShareError, ShareResult};

/// Length of the random part of an object name.
const TOKEN_LEN: usize = 12;

/// Raster formats accepted for upload. Anything scriptable (SVG, HTML) is
/// refused since private objects are served from the app's own origin.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Lowercased media type without parameters, or `None` if not accepted.
#[must_use]
pub fn allowed_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    let essence = if essence == "image/jpg" { "image/jpeg".to_string() } else { essence };
    ALLOWED_CONTENT_TYPES.iter().copied().find(|allowed| *allowed == essence)
}

/// Object storage backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `key`.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> anyhow::Result<()>;

    /// Fetch an object. Returns the data and content type, or `None` if missing.
    async fn get(&self, key: &str) -> anyhow::Result<Option<(Vec<u8>, String)>>;

    /// Address a browser can load the object from.
    fn public_url(&self, key: &str) -> String;
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Where an uploaded file ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredObject {
    /// `<owner>/<token>.<ext>`, relative to the storage prefix.
    pub path: String,
    pub public_url: String,
}

#[derive(Clone)]
pub struct StorageGateway {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    max_upload_bytes: u64,
    timeout: Duration,
}

impl StorageGateway {
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        prefix: impl Into<String>,
        max_upload_bytes: u64,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            max_upload_bytes,
            timeout,
        }
    }

    #[must_use]
    pub const fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Full object key for a gateway path.
    #[must_use]
    pub fn object_key(&self, path: &str) -> String {
        format!("{}{}", self.prefix, path)
    }

    /// Check a file against the upload rules and return its normalized
    /// content type.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::Validation`] if the file is empty, too large, or
    /// not one of [`ALLOWED_CONTENT_TYPES`].
    pub fn validate(&self, file: &UploadFile) -> ShareResult<&'static str> {
        let Some(content_type) = allowed_content_type(&file.content_type) else {
            return Err(ShareError::validation(
                "Please choose a JPEG, PNG, GIF or WebP image",
            ));
        };
        if file.bytes.is_empty() {
            return Err(ShareError::validation("The file is empty"));
        }
        if file.bytes.len() as u64 > self.max_upload_bytes {
            return Err(ShareError::Validation(format!(
                "File size cannot exceed {}",
                format_size(self.max_upload_bytes)
            )));
        }
        Ok(content_type)
    }

    /// Store a file for `owner_id`.
    ///
    /// # Errors
    ///
    /// Validation errors are returned before any network call. Storage
    /// failures come back as [`ShareError::Write`], or
    /// [`ShareError::Connectivity`] on timeout.
    pub async fn upload(&self, file: &UploadFile, owner_id: &str) -> ShareResult<StoredObject> {
        if owner_id.trim().is_empty() {
            return Err(ShareError::validation("Uploads need an owner"));
        }
        let content_type = self.validate(file)?;

        let path = object_path(owner_id, &file.file_name, content_type);
        let key = self.object_key(&path);
        debug!(key = %key, size = file.bytes.len(), "Uploading media file");

        with_deadline(
            self.timeout,
            Access::Write,
            self.store.put(&key, &file.bytes, content_type),
        )
        .await?;

        let public_url = self.store.public_url(&key);
        info!(owner_id, path = %path, "Stored media file");
        Ok(StoredObject { path, public_url })
    }

    /// Whether `key` names an object this gateway uploaded.
    #[must_use]
    pub fn owns_key(&self, key: &str) -> bool {
        key.strip_prefix(self.prefix.as_str()).is_some_and(|rest| {
            !rest.is_empty() && !rest.split('/').any(|seg| seg.is_empty() || seg == "..")
        })
    }

    /// Fetch a stored object by full key.
    ///
    /// Keys outside the upload prefix are reported as missing.
    ///
    /// # Errors
    ///
    /// Returns [`ShareError::Query`] or [`ShareError::Connectivity`] on failure.
    pub async fn fetch(&self, key: &str) -> ShareResult<Option<(Vec<u8>, String)>> {
        if !self.owns_key(key) {
            debug!(key = %key, "Refusing to fetch key outside the upload prefix");
            return Ok(None);
        }
        with_deadline(self.timeout, Access::Read, self.store.get(key)).await
    }
}

impl std::fmt::Debug for StorageGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageGateway")
            .field("prefix", &self.prefix)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish_non_exhaustive()
    }
}

/// Build `<owner>/<random token>.<ext>`.
///
/// Tokens are random and collisions are not checked.
#[must_use]
pub fn object_path(owner_id: &str, file_name: &str, content_type: &str) -> String {
    let token: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();

    format!("{owner_id}/{token}.{}", file_extension(file_name, content_type))
}

/// Extension for a stored file: the file name's, else one matching the
/// content type, else `bin`.
#[must_use]
pub fn file_extension(file_name: &str, content_type: &str) -> String {
    let from_name = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name
        .or_else(|| {
            mime_guess::get_mime_extensions_str(content_type)
                .and_then(|exts| exts.first())
                .map(|ext| (*ext).to_string())
        })
        .unwrap_or_else(|| "bin".to_string())
}

#[must_use]
pub fn format_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{bytes} bytes")
    }
}
