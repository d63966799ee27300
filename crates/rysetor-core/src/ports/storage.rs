//! Media storage port.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::MediaKind;

/// File contents delivered in chunks, so large videos never sit in memory whole.
pub type MediaChunks = BoxStream<'static, Result<Vec<u8>, StorageError>>;

/// An opened media file, ready to stream.
pub struct MediaFile {
    /// Size in bytes.
    pub len: u64,
    pub chunks: MediaChunks,
}

impl std::fmt::Debug for MediaFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaFile").field("len", &self.len).finish()
    }
}

/// Stores uploaded media files by kind and file name.
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Write a new file. An existing file with the same name is left untouched
    /// and the call fails with [`StorageError::AlreadyExists`].
    async fn create(
        &self,
        kind: MediaKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError>;

    /// Write a file, replacing any existing file with the same name.
    async fn replace(
        &self,
        kind: MediaKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError>;

    async fn load(&self, kind: MediaKind, filename: &str) -> Result<Vec<u8>, StorageError>;

    /// Open a file for streaming.
    async fn open(&self, kind: MediaKind, filename: &str) -> Result<MediaFile, StorageError>;

    async fn delete(&self, kind: MediaKind, filename: &str) -> Result<(), StorageError>;
}

/// Storage errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(String),
}
