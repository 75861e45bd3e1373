use std::io::ErrorKind;
use std::path::Path;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::domain::user::models::ImageFilename;
use crate::domain::user::ports::ImageStore;
use crate::user::errors::ImageStoreError;

/// Stores profile images as plain files in the upload directory.
pub struct FilesystemImageStore {
    directory: PathBuf,
}

impl FilesystemImageStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Create the upload directory if it does not exist yet.
    pub async fn ensure_directory(&self) -> Result<(), ImageStoreError> {
        fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| ImageStoreError::Io(format!("{}: {}", self.directory.display(), e)))
    }

    fn path_of(&self, name: &ImageFilename) -> PathBuf {
        self.directory.join(name.as_str())
    }
}

#[async_trait]
impl ImageStore for FilesystemImageStore {
    async fn save(&self, name: &ImageFilename, bytes: &[u8]) -> Result<(), ImageStoreError> {
        self.ensure_directory().await?;

        let path = self.path_of(name);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => ImageStoreError::AlreadyExists(name.as_str().to_string()),
                _ => ImageStoreError::Io(e.to_string()),
            })?;

        let written = async {
            file.write_all(bytes).await?;
            file.sync_all().await
        }
        .await;

        if let Err(e) = written {
            drop(file);
            let _ = fs::remove_file(&path).await;
            return Err(ImageStoreError::Io(e.to_string()));
        }

        Ok(())
    }

    async fn remove(&self, name: &ImageFilename) -> Result<(), ImageStoreError> {
        match fs::remove_file(self.path_of(name)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ImageStoreError::Io(e.to_string())),
        }
    }
}
