//! Upload log and on-disk file handling for the shared uploads directory.
//!
//! The log is an independent collection from the content log: one record
//! per shared file, newest first, persisted with the same snapshot
//! machinery. Deleting a record also removes its backing file.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use crate::store::{SnapshotFile, StoreError};

/// Snapshot document name inside the data directory.
pub const UPLOADS_FILE: &str = "uploads.json";

/// Subdirectory of the data directory where uploaded files are written
/// and served from.
pub const UPLOADS_DIR: &str = "uploads";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    pub url: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

pub struct UploadLog {
    file: SnapshotFile<UploadRecord>,
    records: Mutex<Vec<UploadRecord>>,
}

impl UploadLog {
    pub async fn open(data_dir: &Path) -> Result<Self, StoreError> {
        let file = SnapshotFile::new(data_dir.join(UPLOADS_FILE));
        let records = file.load().await?;
        tracing::debug!(count = records.len(), "Upload log opened");
        Ok(Self {
            file,
            records: Mutex::new(records),
        })
    }

    pub async fn list(&self) -> Vec<UploadRecord> {
        self.records.lock().await.clone()
    }

    /// Record a new upload. Newest records sit at the front of the log.
    pub async fn add(
        &self,
        url: String,
        original_name: String,
        size_bytes: u64,
    ) -> Result<UploadRecord, StoreError> {
        let record = UploadRecord {
            url,
            original_name,
            size_bytes,
            created_at: Utc::now(),
        };

        let mut records = self.records.lock().await;
        let mut next = records.clone();
        next.insert(0, record.clone());
        self.file.persist(&next).await?;
        *records = next;

        Ok(record)
    }

    /// Remove the record with the given served URL. `false` if absent.
    pub async fn delete(&self, url: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock().await;
        let next: Vec<UploadRecord> = records.iter().filter(|r| r.url != url).cloned().collect();
        if next.len() == records.len() {
            return Ok(false);
        }
        self.file.persist(&next).await?;
        *records = next;
        Ok(true)
    }
}

pub fn uploads_dir(data_dir: &Path) -> PathBuf {
    data_dir.join(UPLOADS_DIR)
}

/// Reduce a client-supplied file name to a safe basename. Anything that
/// looks like a path collapses to its last component.
pub fn sanitize_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("upload")
        .to_string()
}

/// Stored name for a posted image: millisecond timestamp + the sanitized
/// original name, so the human-readable name survives on disk.
pub fn image_file_name(original: &str) -> String {
    format!(
        "{}-{}",
        Utc::now().timestamp_millis(),
        sanitize_file_name(original)
    )
}

/// Stored name for a raw upload: millisecond timestamp + random suffix,
/// keeping only the original extension.
pub fn unique_file_name(original: &str) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000_000);
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{}-{}{}", Utc::now().timestamp_millis(), suffix, ext)
}

/// Write an uploaded file into the uploads directory.
pub async fn write_upload_file(
    data_dir: &Path,
    file_name: &str,
    data: &[u8],
) -> Result<PathBuf, std::io::Error> {
    let dir = uploads_dir(data_dir);
    tokio::fs::create_dir_all(&dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, data).await?;
    Ok(path)
}

/// Remove the backing file for a served URL (`/uploads/<name>`). A file
/// that is already gone is not an error; other failures are logged.
pub async fn remove_upload_file(data_dir: &Path, url: &str) {
    let Some(name) = Path::new(url).file_name() else {
        return;
    };
    let path = uploads_dir(data_dir).join(name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove upload file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn newest_records_come_first() {
        let dir = tempfile::tempdir().unwrap();
        let log = UploadLog::open(dir.path()).await.unwrap();

        log.add("/uploads/first.txt".to_string(), "first.txt".to_string(), 1)
            .await
            .unwrap();
        log.add(
            "/uploads/second.txt".to_string(),
            "second.txt".to_string(),
            2,
        )
        .await
        .unwrap();

        let records = log.list().await;
        assert_eq!(records[0].url, "/uploads/second.txt");
        assert_eq!(records[1].url, "/uploads/first.txt");
    }

    #[tokio::test]
    async fn delete_by_url() {
        let dir = tempfile::tempdir().unwrap();
        let log = UploadLog::open(dir.path()).await.unwrap();

        log.add("/uploads/a.txt".to_string(), "a.txt".to_string(), 3)
            .await
            .unwrap();

        assert!(log.delete("/uploads/a.txt").await.unwrap());
        assert!(log.list().await.is_empty());
        assert!(!log.delete("/uploads/a.txt").await.unwrap());
    }

    #[tokio::test]
    async fn log_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let log = UploadLog::open(dir.path()).await.unwrap();
        log.add("/uploads/kept.bin".to_string(), "kept.bin".to_string(), 9)
            .await
            .unwrap();
        drop(log);

        let reopened = UploadLog::open(dir.path()).await.unwrap();
        let records = reopened.list().await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original_name, "kept.bin");
        assert_eq!(records[0].size_bytes, 9);
    }

    #[test]
    fn sanitize_strips_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("notes.txt"), "notes.txt");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[test]
    fn unique_names_keep_the_extension() {
        let name = unique_file_name("report.pdf");
        assert!(name.ends_with(".pdf"));

        let bare = unique_file_name("README");
        assert!(!bare.contains('.'));
    }
}
