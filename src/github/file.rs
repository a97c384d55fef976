use serde::{Deserialize, Serialize};

/// `status` of a changed file in the pull request files API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    #[default]
    Modified,
    Renamed,
    Copied,
    Changed,
    Unchanged,
    #[serde(other)]
    Other,
}

impl FileStatus {
    /// Whether the base revision has a version of this file.
    pub fn has_base(self) -> bool {
        !matches!(self, FileStatus::Added)
    }

    /// Whether the head revision has a version of this file.
    pub fn has_head(self) -> bool {
        !matches!(self, FileStatus::Removed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedFile {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_filename: Option<String>,
    #[serde(default)]
    pub status: FileStatus,
    #[serde(default)]
    pub additions: u32,
    #[serde(default)]
    pub deletions: u32,
    /// Absent for binary files and very large diffs
    #[serde(default)]
    pub patch: Option<String>,
}

impl ChangedFile {
    /// Path of the file in the base revision.
    pub fn base_path(&self) -> &str {
        self.previous_filename.as_deref().unwrap_or(&self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_files_response() {
        let json = r#"[
            {"filename": "src/new.rs", "status": "renamed", "previous_filename": "src/old.rs",
             "additions": 1, "deletions": 1, "patch": "@@ -1 +1 @@\n-a\n+b"},
            {"filename": "logo.png", "status": "added", "additions": 0, "deletions": 0},
            {"filename": "weird.txt", "status": "something-new"}
        ]"#;
        let files: Vec<ChangedFile> = serde_json::from_str(json).unwrap();
        assert_eq!(files[0].status, FileStatus::Renamed);
        assert_eq!(files[0].base_path(), "src/old.rs");
        assert_eq!(files[1].status, FileStatus::Added);
        assert!(files[1].patch.is_none());
        assert_eq!(files[1].base_path(), "logo.png");
        assert_eq!(files[2].status, FileStatus::Other);
    }

    #[test]
    fn test_status_sides() {
        assert!(!FileStatus::Added.has_base());
        assert!(FileStatus::Added.has_head());
        assert!(FileStatus::Removed.has_base());
        assert!(!FileStatus::Removed.has_head());
        assert!(FileStatus::Renamed.has_base() && FileStatus::Renamed.has_head());
    }
}
