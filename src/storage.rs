//! Upload staging: uploaded bytes land in a per-process directory under the
//! OS temp dir and live there for the life of the process.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::multipart::UploadedFile;

const UPLOAD_SUBDIR: &str = "portdrop-uploads";

/// Staging area for uploaded files awaiting transfer.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Create the staging directory if needed. `dir` overrides the default
    /// location under the OS temp dir.
    pub async fn open(dir: Option<PathBuf>) -> Result<Self> {
        let dir = dir.unwrap_or_else(|| std::env::temp_dir().join(UPLOAD_SUBDIR));
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create upload dir {}", dir.display()))?;
        tracing::debug!(dir = %dir.display(), "upload store ready");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a decoded upload. The stored name is prefixed with a UUID so
    /// concurrent uploads of the same filename never collide; the original
    /// basename is kept as the suffix because the transfer header advertises
    /// the stored file's name to the downloader.
    pub async fn save(&self, file: &UploadedFile) -> Result<PathBuf> {
        let stored_name = format!("{}_{}", Uuid::new_v4(), file.name);
        let path = self.dir.join(stored_name);
        tokio::fs::write(&path, &file.content)
            .await
            .with_context(|| format!("failed to write upload to {}", path.display()))?;
        tracing::info!(
            name = %file.name,
            bytes = file.content.len(),
            path = %path.display(),
            "upload staged"
        );
        Ok(path)
    }
}
