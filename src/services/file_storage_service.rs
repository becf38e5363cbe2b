use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::error::{Error, Result};
use crate::models::document::FileRef;

const ALLOWED_EXTENSIONS: [&str; 8] = ["pdf", "doc", "docx", "jpg", "jpeg", "png", "webp", "json"];

/// Prefix under which stored blobs are referenced and served.
pub const PUBLIC_PREFIX: &str = "uploads";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub path: FileRef,
    pub sha256: String,
    pub size: usize,
    pub original_name: String,
}

/// Content-addressed blob storage on the local filesystem. A blob is
/// written once under its SHA-256 and never rewritten.
#[derive(Clone)]
pub struct FileStorageService {
    root: PathBuf,
}

impl FileStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<StoredFile> {
        if data.is_empty() {
            return Err(Error::validation("file", "file is empty"));
        }
        let ext = extension_of(filename);
        check_content(&ext, data)?;

        let sha256 = hex::encode(Sha256::digest(data));
        let stored_name = format!("{}.{}", sha256, ext);
        let target = self.root.join(&stored_name);

        fs::create_dir_all(&self.root).await.map_err(|e| {
            tracing::error!(error = %e, root = %self.root.display(), "Failed to create upload dir");
            Error::Storage(format!("Failed to prepare storage: {}", e))
        })?;

        if fs::try_exists(&target).await.unwrap_or(false) {
            tracing::debug!(file = %stored_name, "Blob already stored");
        } else {
            // Write to a temporary name first so a reader never sees a partial blob.
            let partial = self.root.join(format!("{}.part", stored_name));
            fs::write(&partial, data).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to write upload");
                Error::Storage(format!("Failed to save file: {}", e))
            })?;
            fs::rename(&partial, &target).await.map_err(|e| {
                tracing::error!(error = %e, "Failed to finalize upload");
                Error::Storage(format!("Failed to save file: {}", e))
            })?;
        }

        Ok(StoredFile {
            path: FileRef::new(format!("{}/{}", PUBLIC_PREFIX, stored_name)),
            sha256,
            size: data.len(),
            original_name: filename.to_string(),
        })
    }

    pub async fn exists(&self, file: &FileRef) -> Result<bool> {
        let Some(path) = self.resolve(file) else {
            return Ok(false);
        };
        fs::try_exists(&path)
            .await
            .map_err(|e| Error::Storage(format!("Failed to check file {}: {}", file.as_str(), e)))
    }

    /// Fails with a validation error naming `field` when `file` was never stored.
    pub async fn ensure_exists(&self, field: &str, file: &FileRef) -> Result<()> {
        if self.exists(file).await? {
            Ok(())
        } else {
            Err(Error::validation(
                field,
                format!("file '{}' has not been uploaded", file.as_str()),
            ))
        }
    }

    fn resolve(&self, file: &FileRef) -> Option<PathBuf> {
        let name = file
            .as_str()
            .strip_prefix(PUBLIC_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))?;
        if name.is_empty() || name.contains('/') || name.contains('\\') || name.starts_with('.') {
            return None;
        }
        Some(self.root.join(name))
    }
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

fn check_content(ext: &str, data: &[u8]) -> Result<()> {
    if !ALLOWED_EXTENSIONS.contains(&ext) {
        return Err(Error::validation(
            "file",
            format!(
                "File type .{} is not allowed. Allowed: {}",
                ext,
                ALLOWED_EXTENSIONS.join(", ")
            ),
        ));
    }
    if ext == "pdf" && !data.starts_with(b"%PDF") {
        return Err(Error::validation("file", "Invalid PDF file content"));
    }
    if (ext == "jpg" || ext == "jpeg") && !data.starts_with(&[0xFF, 0xD8]) {
        return Err(Error::validation("file", "Invalid JPEG file content"));
    }
    if ext == "png" && !data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        return Err(Error::validation("file", "Invalid PNG file content"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_bytes_share_one_blob() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorageService::new(dir.path());

        let a = storage.save("passport.pdf", b"%PDF-1.7 scan").await.unwrap();
        let b = storage.save("copy.PDF", b"%PDF-1.7 scan").await.unwrap();
        assert_eq!(a.path, b.path);
        assert!(a.path.as_str().starts_with("uploads/"));
        assert!(storage.exists(&a.path).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_disallowed_or_spoofed_files() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorageService::new(dir.path());

        let err = storage.save("run.exe", b"MZ").await.unwrap_err();
        assert_eq!(err.code(), "validation_error");
        let err = storage.save("scan.png", b"%PDF").await.unwrap_err();
        assert_eq!(err.code(), "validation_error");
        assert!(storage.save("empty.pdf", b"").await.is_err());
    }

    #[tokio::test]
    async fn unknown_or_escaping_refs_do_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorageService::new(dir.path());

        assert!(!storage.exists(&FileRef::new("uploads/missing.pdf")).await.unwrap());
        assert!(!storage.exists(&FileRef::new("uploads/../etc/passwd")).await.unwrap());
        assert!(!storage.exists(&FileRef::new("/etc/passwd")).await.unwrap());
        let err = storage
            .ensure_exists("certificateFile", &FileRef::new("uploads/missing.pdf"))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }
}
