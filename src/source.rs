//! Base/head file contents for changed files.
//!
//! The base file comes from a [`ContentFetcher`]; the head file is rebuilt by
//! applying the patch to it. When the base file cannot be fetched the contents
//! fall back to what the patch itself contains and are marked partial instead
//! of failing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::diff::{self, ContentMode, DiffHunk};
use crate::error::FetchError;
use crate::github::ChangedFile;

/// Source of file contents at a given revision
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch(&self, path: &str, revision: &str) -> Result<String, FetchError>;
}

/// Reads blobs from a local repository with `git show <rev>:<path>`
#[derive(Debug, Clone, Default)]
pub struct GitContentFetcher {
    working_dir: Option<PathBuf>,
}

impl GitContentFetcher {
    pub fn new(working_dir: Option<PathBuf>) -> Self {
        Self { working_dir }
    }
}

#[async_trait]
impl ContentFetcher for GitContentFetcher {
    async fn fetch(&self, path: &str, revision: &str) -> Result<String, FetchError> {
        let object = format!("{}:{}", revision, path);
        if revision.starts_with('-') {
            return Err(FetchError::Git {
                args: format!("show {}", object),
                stderr: "revision must not start with '-'".to_string(),
            });
        }

        let mut command = Command::new("git");
        // Disable C-quoting of non-ASCII paths to get raw UTF-8 output
        command.args(["-c", "core.quotePath=false", "show", &object]);
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        let output = command.output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("does not exist")
                || stderr.contains("exists on disk, but not in")
                || stderr.contains("invalid object name")
            {
                return Err(FetchError::NotFound {
                    path: path.to_string(),
                    revision: revision.to_string(),
                });
            }
            return Err(FetchError::Git {
                args: format!("show {}", object),
                stderr,
            });
        }

        String::from_utf8(output.stdout).map_err(|_| FetchError::InvalidUtf8 {
            path: path.to_string(),
            revision: revision.to_string(),
        })
    }
}

/// Both sides of a changed file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContents {
    pub base: String,
    pub head: String,
    /// Only the hunk regions are present; unchanged lines between them are missing
    pub is_partial: bool,
}

impl FileContents {
    fn from_patch(hunks: &[DiffHunk]) -> Self {
        let contents = diff::reconstruct_fast(hunks);
        Self {
            base: contents.base,
            head: contents.head,
            is_partial: !diff::describes_whole_file(hunks),
        }
    }
}

/// Resolve base and head contents of `file` against `base_revision`.
///
/// Added files never touch the fetcher. In [`ContentMode::Fast`] nothing is
/// fetched at all.
pub async fn resolve_file_contents(
    fetcher: &dyn ContentFetcher,
    file: &ChangedFile,
    base_revision: &str,
    mode: ContentMode,
) -> FileContents {
    let Some(patch) = file.patch.as_deref() else {
        debug!(filename = %file.filename, "no patch (binary or too large)");
        return FileContents {
            is_partial: true,
            ..Default::default()
        };
    };
    let hunks = diff::parse_patch(patch);

    if !file.status.has_base() || mode == ContentMode::Fast {
        return FileContents::from_patch(&hunks);
    }

    match fetcher.fetch(file.base_path(), base_revision).await {
        Ok(original) => FileContents {
            head: diff::reconstruct_complete(&original, &hunks),
            base: original,
            is_partial: false,
        },
        Err(e) => {
            warn!(
                path = file.base_path(),
                revision = base_revision,
                error = %e,
                "failed to fetch base content, falling back to patch contents"
            );
            FileContents::from_patch(&hunks)
        }
    }
}

/// [`resolve_file_contents`] for every file, in order.
pub async fn resolve_all(
    fetcher: &dyn ContentFetcher,
    files: &[ChangedFile],
    base_revision: &str,
    mode: ContentMode,
) -> Vec<FileContents> {
    let mut resolved = Vec::with_capacity(files.len());
    for file in files {
        resolved.push(resolve_file_contents(fetcher, file, base_revision, mode).await);
    }
    resolved
}
