//! # dp-download-local
//!
//! Local filesystem implementation of `DownloadSink`.
//! Existing files are never overwritten: a clash gets a " (n)" suffix before
//! the extension, the way browsers name repeated downloads.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dp_core::{AppError, DownloadSink, ExportPayload, Result, SavedFile};
use sha2::{Digest, Sha256};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Highest " (n)" suffix tried before giving up.
const MAX_SUFFIX: u32 = 999;

pub struct LocalDownloadSink {
    /// Directory downloads are written into (e.g., "~/Downloads")
    root_path: PathBuf,
}

impl LocalDownloadSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root_path: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root_path
    }

    /// "statement.pdf" -> "statement (2).pdf"
    fn candidate(&self, file_name: &str, attempt: u32) -> PathBuf {
        if attempt == 0 {
            return self.root_path.join(file_name);
        }
        let (stem, ext) = match file_name.rfind('.') {
            Some(dot) if dot > 0 => file_name.split_at(dot),
            _ => (file_name, ""),
        };
        self.root_path.join(format!("{stem} ({}){ext}", attempt + 1))
    }
}

fn io_error(path: &Path, err: std::io::Error) -> AppError {
    AppError::Internal(format!("writing {}: {err}", path.display()))
}

#[async_trait]
impl DownloadSink for LocalDownloadSink {
    async fn save(&self, file_name: &str, payload: &ExportPayload) -> Result<SavedFile> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(AppError::Validation(format!("invalid file name {file_name:?}")));
        }

        fs::create_dir_all(&self.root_path)
            .await
            .map_err(|e| io_error(&self.root_path, e))?;

        for attempt in 0..MAX_SUFFIX {
            let path = self.candidate(file_name, attempt);
            // create_new makes the existence check and the create one step.
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(file) => file,
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(err) => return Err(io_error(&path, err)),
            };
            file.write_all(&payload.bytes)
                .await
                .map_err(|e| io_error(&path, e))?;
            file.flush().await.map_err(|e| io_error(&path, e))?;

            let sha256 = hex::encode(Sha256::digest(&payload.bytes));
            tracing::debug!(path = %path.display(), %sha256, "download written");
            return Ok(SavedFile {
                path,
                size: payload.bytes.len() as u64,
                sha256,
            });
        }

        Err(AppError::Internal(format!(
            "too many existing copies of {file_name} in {}",
            self.root_path.display()
        )))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("dp-download-local-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn payload(body: &'static [u8]) -> ExportPayload {
        ExportPayload {
            bytes: Bytes::from_static(body),
            content_type: Some("application/pdf".into()),
        }
    }

    #[tokio::test]
    async fn writes_file_and_reports_digest() {
        let dir = scratch("digest");
        let sink = LocalDownloadSink::new(&dir);
        let saved = sink.save("statement.pdf", &payload(b"abc")).await.unwrap();

        assert_eq!(saved.path, dir.join("statement.pdf"));
        assert_eq!(saved.size, 3);
        assert_eq!(
            saved.sha256,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"abc");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn never_overwrites_an_existing_download() {
        let dir = scratch("suffix");
        let sink = LocalDownloadSink::new(&dir);
        let first = sink.save("export.zip", &payload(b"one")).await.unwrap();
        let second = sink.save("export.zip", &payload(b"two")).await.unwrap();
        let third = sink.save("export.zip", &payload(b"three")).await.unwrap();

        assert_eq!(first.path, dir.join("export.zip"));
        assert_eq!(second.path, dir.join("export (2).zip"));
        assert_eq!(third.path, dir.join("export (3).zip"));
        assert_eq!(std::fs::read(&first.path).unwrap(), b"one");
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let sink = LocalDownloadSink::new(scratch("reject"));
        assert!(sink.save("../escape.pdf", &payload(b"x")).await.is_err());
        assert!(sink.save("", &payload(b"x")).await.is_err());
    }
}
