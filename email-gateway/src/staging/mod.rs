//! Scoped temporary storage for uploaded attachments
//!
//! [`StagedAttachments`] owns every file written for one request. Call
//! [`StagedAttachments::cleanup`] once the send attempt is over; if the guard is
//! dropped first (early return, cancelled request) the files are removed in
//! `Drop` instead. Deletion failures are logged and never returned.
//!
//! # Example
//!
//! ```rust,no_run
//! use email_gateway::staging::StagedAttachments;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let mut staged = StagedAttachments::new("./uploads");
//!
//! let mut writer = staged.create("report.pdf", Some("application/pdf".into())).await?;
//! writer.write_chunk(b"%PDF-1.4").await?;
//! writer.finish().await?;
//!
//! let refs = staged.attachment_refs();
//! // ... send ...
//! staged.cleanup().await;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicI64, Ordering};

use thiserror::Error;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::email::AttachmentRef;

/// Last timestamp handed out, so suffixes strictly increase within the process
static LAST_STAMP: AtomicI64 = AtomicI64::new(0);

/// Staging errors
#[derive(Debug, Error)]
pub enum StagingError {
    /// Writing a staged file failed
    #[error("failed to stage {path}: {source}")]
    Io {
        /// File being written
        path: PathBuf,
        /// Underlying I/O failure
        source: std::io::Error,
    },
}

/// A file written to the staging directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    /// Filename as uploaded
    pub display_name: String,

    /// Location on disk
    pub path: PathBuf,

    /// MIME type declared by the client
    pub content_type: Option<String>,
}

/// Streams one upload into its staged file
#[derive(Debug)]
pub struct StagedWriter {
    file: File,
    path: PathBuf,
    written: usize,
}

impl StagedWriter {
    /// Append a chunk
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::Io`] if the write fails.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StagingError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(|source| StagingError::Io {
                path: self.path.clone(),
                source,
            })?;
        self.written += chunk.len();
        Ok(())
    }

    /// Bytes written so far
    #[must_use]
    pub const fn written(&self) -> usize {
        self.written
    }

    /// Flush and close, returning the file size
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::Io`] if the flush fails.
    pub async fn finish(mut self) -> Result<usize, StagingError> {
        self.file.flush().await.map_err(|source| StagingError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(self.written)
    }
}

/// The set of files staged for a single request
#[derive(Debug)]
pub struct StagedAttachments {
    dir: PathBuf,
    files: Vec<StagedFile>,
}

impl StagedAttachments {
    /// Empty set staging into `dir`; the directory is created on first use
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Vec::new(),
        }
    }

    /// Create a uniquely named file for an upload and register it for cleanup
    ///
    /// The file is tracked before any byte is written, so a failed or aborted
    /// upload is still removed.
    ///
    /// # Errors
    ///
    /// Returns [`StagingError::Io`] if the directory or file cannot be created.
    pub async fn create(
        &mut self,
        original_name: &str,
        content_type: Option<String>,
    ) -> Result<StagedWriter, StagingError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| StagingError::Io {
                path: self.dir.clone(),
                source,
            })?;

        let path = self.dir.join(staged_name(original_name, next_stamp()));
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
            .map_err(|source| StagingError::Io {
                path: path.clone(),
                source,
            })?;

        debug!(path = %path.display(), name = %original_name, "Staging attachment");
        self.files.push(StagedFile {
            display_name: display_name(original_name),
            path: path.clone(),
            content_type,
        });

        Ok(StagedWriter {
            file,
            path,
            written: 0,
        })
    }

    /// Staged files, in upload order
    #[must_use]
    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    /// Number of staged files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing was staged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Envelope attachments pointing at the staged files
    #[must_use]
    pub fn attachment_refs(&self) -> Vec<AttachmentRef> {
        self.files
            .iter()
            .map(|file| {
                let attachment = AttachmentRef::from_path(&file.display_name, &file.path);
                match &file.content_type {
                    Some(content_type) => attachment.with_content_type(content_type),
                    None => attachment,
                }
            })
            .collect()
    }

    /// Delete every staged file
    ///
    /// Failures are logged and swallowed.
    pub async fn cleanup(mut self) {
        for file in std::mem::take(&mut self.files) {
            match tokio::fs::remove_file(&file.path).await {
                Ok(()) => debug!(path = %file.path.display(), "Removed staged attachment"),
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "Error deleting staged attachment");
                }
            }
        }
    }
}

impl Drop for StagedAttachments {
    fn drop(&mut self) {
        for file in self.files.drain(..) {
            if let Err(e) = std::fs::remove_file(&file.path) {
                warn!(path = %file.path.display(), error = %e, "Error deleting staged attachment");
            }
        }
    }
}

/// Staged filename: `{stem}_{stamp}{.ext}`, restricted to a safe character set
#[must_use]
pub fn staged_name(original_name: &str, stamp: i64) -> String {
    let base = display_name(original_name);
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (base.as_str(), None),
    };

    let stem = sanitize(stem);
    let stem = if stem.is_empty() { "attachment".to_string() } else { stem };

    match ext.map(sanitize).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{stem}_{stamp}.{ext}"),
        None => format!("{stem}_{stamp}"),
    }
}

/// Last path component of a client-supplied filename
fn display_name(original_name: &str) -> String {
    let name = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if name.is_empty() {
        "attachment".to_string()
    } else {
        name.to_string()
    }
}

fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Milliseconds since the epoch, bumped past the previous value when the clock repeats
fn next_stamp() -> i64 {
    let now = chrono::Utc::now().timestamp_millis();
    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(now);
    now.max(previous + 1)
}
