//! Splitting `git diff` output into per-file patches.
//!
//! The patch text of each file is cut at its first `@@` header so that it has
//! the same shape as the `patch` field of the GitHub files API, and positions
//! computed from either source agree.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::github::FileStatus;

/// One file section of a unified diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    /// Path in the old tree (None for added files)
    pub old_path: Option<String>,
    /// Path in the new tree (None for deleted files)
    pub new_path: Option<String>,
    pub status: FileStatus,
    /// Hunks only, starting at the first `@@` line. Empty for binary files and
    /// pure renames.
    pub patch: String,
}

impl FilePatch {
    /// Path used as the key for this file: the new path, or the old path for
    /// deleted files.
    pub fn path(&self) -> Option<&str> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }
}

/// Split `git diff` output into file sections.
pub fn split_unified_diff(unified_diff: &str) -> Vec<FilePatch> {
    let mut files = Vec::new();
    let mut current: Option<SectionBuilder> = None;

    for line in unified_diff.lines() {
        if line.starts_with("diff --git ") {
            if let Some(section) = current.take() {
                files.push(section.finish());
            }
            current = Some(SectionBuilder::new(line));
            continue;
        }

        if let Some(section) = current.as_mut() {
            section.push(line);
        }
    }

    if let Some(section) = current {
        files.push(section.finish());
    }
    files
}

/// Split `git diff` output into a map of path -> patch text.
///
/// Keys have no `a/` or `b/` prefix; renamed files are keyed by their new name,
/// the same way the GitHub API reports `filename`.
pub fn parse_unified_diff(unified_diff: &str) -> HashMap<String, String> {
    split_unified_diff(unified_diff)
        .into_iter()
        .filter_map(|file| {
            let path = file.path()?.to_string();
            Some((path, file.patch))
        })
        .collect()
}

struct SectionBuilder {
    /// Path from the `diff --git` line, if it could be determined
    git_path: Option<String>,
    old_path: Option<String>,
    new_path: Option<String>,
    /// `---`/`+++` paths, with `None` meaning `/dev/null`
    minus_path: Option<Option<String>>,
    plus_path: Option<Option<String>>,
    status: FileStatus,
    hunk_lines: Vec<String>,
}

impl SectionBuilder {
    fn new(diff_git_line: &str) -> Self {
        Self {
            git_path: extract_filename(diff_git_line),
            old_path: None,
            new_path: None,
            minus_path: None,
            plus_path: None,
            status: FileStatus::Modified,
            hunk_lines: Vec::new(),
        }
    }

    fn push(&mut self, line: &str) {
        if !self.hunk_lines.is_empty() || line.starts_with("@@") {
            self.hunk_lines.push(line.to_string());
            return;
        }

        if line.starts_with("new file mode") {
            self.status = FileStatus::Added;
        } else if line.starts_with("deleted file mode") {
            self.status = FileStatus::Removed;
        } else if let Some(path) = line.strip_prefix("rename from ") {
            self.status = FileStatus::Renamed;
            self.old_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("rename to ") {
            self.new_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("copy from ") {
            self.status = FileStatus::Copied;
            self.old_path = Some(path.to_string());
        } else if let Some(path) = line.strip_prefix("copy to ") {
            self.new_path = Some(path.to_string());
        } else if let Some(rest) = line.strip_prefix("--- ") {
            self.minus_path = Some(marker_path(rest));
        } else if let Some(rest) = line.strip_prefix("+++ ") {
            self.plus_path = Some(marker_path(rest));
        }
    }

    fn finish(self) -> FilePatch {
        let old_path = match self.status {
            FileStatus::Added => None,
            _ => self
                .old_path
                .or_else(|| self.minus_path.clone().flatten())
                .or_else(|| self.git_path.clone())
                .or_else(|| self.plus_path.clone().flatten()),
        };
        let new_path = match self.status {
            FileStatus::Removed => None,
            _ => self
                .new_path
                .or(self.git_path)
                .or_else(|| self.plus_path.flatten())
                .or_else(|| self.minus_path.flatten()),
        };

        FilePatch {
            old_path,
            new_path,
            status: self.status,
            patch: self.hunk_lines.join("\n"),
        }
    }
}

/// Path of a `---`/`+++` line without its prefix; `None` for `/dev/null`.
fn marker_path(rest: &str) -> Option<String> {
    // git appends a tab when the path contains spaces
    let rest = rest.trim_end_matches('\t');
    if rest == "/dev/null" {
        None
    } else {
        Some(strip_diff_prefix(rest).to_string())
    }
}

/// Strip the single-char diff prefix (a/, b/, w/, etc.) from a --- or +++ path.
fn strip_diff_prefix(path: &str) -> &str {
    if path.len() >= 2 && path.as_bytes()[1] == b'/' {
        &path[2..]
    } else {
        path
    }
}

/// Extract the new filename from a `diff --git X/old Y/new` line.
///
/// Accepts any single-char prefixes (`a/`+`b/`, or the `c/ i/ o/ w/` pairs of
/// `diff.mnemonicPrefix`). Returns `None` when the split between the two paths
/// is ambiguous; the caller then falls back to the `+++`/`---` lines.
fn extract_filename(git_diff_line: &str) -> Option<String> {
    let content = git_diff_line.strip_prefix("diff --git ")?;
    if content.len() < 2 || content.as_bytes()[1] != b'/' {
        warn!("Failed to parse git diff line: {}", git_diff_line);
        return None;
    }

    let first_prefix = content.as_bytes()[0];
    let paths = &content[2..];

    // Same path on both sides: "path Y/path"
    if let Some(path) = split_identical_paths(paths) {
        return Some(path.to_string());
    }

    let second_prefix = match first_prefix {
        b'a' => b'b',
        b'c' | b'i' | b'o' => b'w',
        _ => {
            warn!(
                "Failed to parse git diff line (unknown prefix): {}",
                git_diff_line
            );
            return None;
        }
    };

    let bytes = paths.as_bytes();
    let mut separators = (0..bytes.len().saturating_sub(2))
        .filter(|&i| bytes[i] == b' ' && bytes[i + 1] == second_prefix && bytes[i + 2] == b'/');

    match (separators.next(), separators.next()) {
        (Some(sep), None) if sep + 3 < paths.len() => Some(paths[sep + 3..].to_string()),
        _ => None,
    }
}

fn split_identical_paths(paths: &str) -> Option<&str> {
    let total = paths.len();
    if total < 4 || (total - 3) % 2 != 0 {
        return None;
    }
    let half = (total - 3) / 2;
    let bytes = paths.as_bytes();
    if bytes[half] != b' ' || bytes[half + 2] != b'/' {
        return None;
    }
    let (first, second) = (paths.get(..half)?, paths.get(half + 3..)?);
    (first == second).then_some(second)
}
