//! Per-address comment files.
//!
//! One file per link, named by the link's address, one comment per line,
//! append-only. A file's existence is the single source of truth for
//! "this link has been processed" (there is no separate processed set),
//! so claiming an address creates its file immediately and exclusively.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::address::Address;

/// File extension for comment files; directory entries with any other
/// extension are ignored by the completion probe.
const COMMENT_FILE_EXT: &str = "txt";

/// Directory of per-address comment files.
pub struct CommentStore {
    dir: PathBuf,
}

impl CommentStore {
    /// Open the store, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("failed to create comment directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path a comment file for `address` would live at.
    #[must_use]
    pub fn path_for(&self, address: Address) -> PathBuf {
        self.dir
            .join(address.to_hex())
            .with_extension(COMMENT_FILE_EXT)
    }

    /// Scan the directory for addresses that already have a comment file.
    ///
    /// This is the completion probe used to filter log replay; entries
    /// whose stem is not a well-formed address are ignored.
    pub async fn completed_addresses(&self) -> HashSet<Address> {
        let mut completed = HashSet::new();
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), "could not scan comment directory: {e}");
                return completed;
            }
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(COMMENT_FILE_EXT) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str())
                && let Ok(address) = stem.parse::<Address>()
            {
                completed.insert(address);
            }
        }
        debug!(count = completed.len(), "scanned completed comment files");
        completed
    }

    /// Exclusively claim `address` for writing.
    ///
    /// Creates the comment file with create-new semantics, closing the
    /// window between an existence check and the first write: if the file
    /// already exists (complete, or claimed by a faster worker), this
    /// returns `Ok(None)` and the caller skips the link. The file exists
    /// (possibly empty) from this moment on, which is exactly the
    /// completion contract.
    pub async fn claim(&self, address: Address) -> Result<Option<CommentFile>> {
        let path = self.path_for(address);
        match OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(&path)
            .await
        {
            Ok(file) => Ok(Some(CommentFile { path, file })),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => {
                Err(e).with_context(|| format!("failed to create comment file {}", path.display()))
            }
        }
    }
}

/// An exclusively claimed, append-only comment file.
pub struct CommentFile {
    path: PathBuf,
    file: File,
}

impl CommentFile {
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one comment per line and flush.
    ///
    /// Suspension points: the batched write and the flush.
    pub async fn append(&mut self, comments: &[String]) -> Result<()> {
        if comments.is_empty() {
            return Ok(());
        }
        let mut buf = String::with_capacity(comments.iter().map(|c| c.len() + 1).sum());
        for comment in comments {
            buf.push_str(comment);
            buf.push('\n');
        }
        self.file
            .write_all(buf.as_bytes())
            .await
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        self.file
            .flush()
            .await
            .with_context(|| format!("failed to flush {}", self.path.display()))?;
        debug!(count = comments.len(), path = %self.path.display(), "appended comments");
        Ok(())
    }
}
