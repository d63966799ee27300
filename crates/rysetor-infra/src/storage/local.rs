//! Media store on the local filesystem: `<root>/video/...` and `<root>/image/...`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::{StreamExt, stream};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use rysetor_core::domain::MediaKind;
use rysetor_core::ports::{MediaFile, MediaStore, StorageError};

const CHUNK_SIZE: usize = 64 * 1024;

pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the per-kind directories.
    pub async fn prepare(&self) -> Result<(), StorageError> {
        for kind in [MediaKind::Video, MediaKind::Image] {
            let dir = self.root.join(kind.dir_name());
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| StorageError::Io(format!("{}: {e}", dir.display())))?;
        }
        Ok(())
    }

    fn path(&self, kind: MediaKind, filename: &str) -> Result<PathBuf, StorageError> {
        let single_component = !filename.is_empty()
            && !filename.contains(['/', '\\'])
            && filename != "."
            && filename != "..";
        if !single_component {
            return Err(StorageError::NotFound(filename.to_string()));
        }
        Ok(self.root.join(kind.dir_name()).join(filename))
    }
}

fn io_error(path: &Path, e: std::io::Error) -> StorageError {
    if e.kind() == ErrorKind::NotFound {
        StorageError::NotFound(path.display().to_string())
    } else {
        StorageError::Io(format!("{}: {e}", path.display()))
    }
}

async fn ensure_parent(path: &Path) -> Result<(), StorageError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", dir.display())))?;
    }
    Ok(())
}

#[async_trait]
impl MediaStore for LocalMediaStore {
    async fn create(
        &self,
        kind: MediaKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let path = self.path(kind, filename)?;
        ensure_parent(&path).await?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(filename.to_string()));
            }
            Err(e) => return Err(StorageError::Io(format!("{}: {e}", path.display()))),
        };

        let written = async {
            file.write_all(bytes).await?;
            file.flush().await
        }
        .await;
        if let Err(e) = written {
            drop(file);
            if let Err(cleanup) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %cleanup, "Partial media file left behind");
            }
            return Err(StorageError::Io(format!("{}: {e}", path.display())));
        }

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Media saved");
        Ok(())
    }

    async fn replace(
        &self,
        kind: MediaKind,
        filename: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        let path = self.path(kind, filename)?;
        ensure_parent(&path).await?;

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", path.display())))?;

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "Media replaced");
        Ok(())
    }

    async fn load(&self, kind: MediaKind, filename: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path(kind, filename)?;
        tokio::fs::read(&path).await.map_err(|e| io_error(&path, e))
    }

    async fn open(&self, kind: MediaKind, filename: &str) -> Result<MediaFile, StorageError> {
        let path = self.path(kind, filename)?;
        let file = File::open(&path).await.map_err(|e| io_error(&path, e))?;
        let len = file
            .metadata()
            .await
            .map_err(|e| io_error(&path, e))?
            .len();

        let chunks = stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; CHUNK_SIZE];
            let read = file
                .read(&mut buf)
                .await
                .map_err(|e| StorageError::Io(e.to_string()))?;
            if read == 0 {
                return Ok::<_, StorageError>(None);
            }
            buf.truncate(read);
            Ok(Some((buf, file)))
        });

        Ok(MediaFile {
            len,
            chunks: chunks.boxed(),
        })
    }

    async fn delete(&self, kind: MediaKind, filename: &str) -> Result<(), StorageError> {
        let path = self.path(kind, filename)?;
        tokio::fs::remove_file(&path)
            .await
            .map_err(|e| io_error(&path, e))
    }
}
