//! File store port for application attachments.
//!
//! Submissions may carry inline `data:` URI attachments; those are decoded,
//! persisted through the [`FileStore`] port, and replaced in the stored form
//! data by the public URL the store hands back.

use async_trait::async_trait;
use base64::Engine;
use dashmap::DashMap;
use serde::Serialize;
use uuid::Uuid;

use crate::error::{MeridianError, Result};

/// A persisted attachment.
#[derive(Debug, Clone, Serialize)]
pub struct UploadedFile {
    pub key: String,
    pub url: String,
    pub content_type: String,
    pub size_bytes: usize,
}

/// Binary attachment storage.
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Persist the bytes and return the public record.
    async fn put(&self, filename: &str, content_type: &str, bytes: Vec<u8>)
        -> Result<UploadedFile>;

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn name(&self) -> &str;
}

/// Decoded `data:` URI payload.
#[derive(Debug, Clone)]
pub struct DataUri {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Parse a `data:<mime>;base64,<payload>` URI.
pub fn parse_data_uri(input: &str) -> Result<DataUri> {
    let rest = input
        .strip_prefix("data:")
        .ok_or_else(|| MeridianError::validation("Attachment must be a data: URI"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| MeridianError::validation("Malformed data: URI"))?;
    let content_type = match header.strip_suffix(";base64") {
        Some(mime) if !mime.is_empty() => mime.to_string(),
        Some(_) => "application/octet-stream".to_string(),
        None => return Err(MeridianError::validation("Attachment must be base64 encoded")),
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| {
            MeridianError::validation(format!("Attachment payload is not valid base64: {}", e))
        })?;
    Ok(DataUri {
        content_type,
        bytes,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// In-Memory File Store
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory file store keyed by generated UUID names.
pub struct InMemoryFileStore {
    files: DashMap<String, (String, Vec<u8>)>,
    public_base_url: String,
}

impl InMemoryFileStore {
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            files: DashMap::new(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FileStore for InMemoryFileStore {
    async fn put(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedFile> {
        let extension = filename.rsplit_once('.').map(|(_, ext)| ext);
        let key = match extension {
            Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
            None => Uuid::new_v4().to_string(),
        };
        let size_bytes = bytes.len();
        self.files
            .insert(key.clone(), (content_type.to_string(), bytes));
        Ok(UploadedFile {
            url: format!("{}/{}", self.public_base_url, key),
            key,
            content_type: content_type.to_string(),
            size_bytes,
        })
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.get(key).map(|entry| entry.value().1.clone()))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
