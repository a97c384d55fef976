use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// `@@ -old_start[,old_len] +new_start[,new_len] @@[ section]`
static HUNK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@(.*)$")
        .expect("hunk header regex is valid")
});

/// Numeric fields of a unified-diff hunk header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HunkHeader {
    pub old_start: u32,
    pub old_length: u32,
    pub new_start: u32,
    pub new_length: u32,
    /// Text after the closing `@@` (usually the enclosing function), trimmed
    pub section: String,
}

impl HunkHeader {
    /// Parse a hunk header line.
    ///
    /// Returns `None` for anything that is not a header. Omitted lengths default
    /// to 1: `@@ -3 +3 @@` describes a single-line change.
    pub fn parse(line: &str) -> Option<Self> {
        let caps = HUNK_HEADER_RE.captures(line)?;
        let number = |idx: usize| -> Option<u32> {
            match caps.get(idx) {
                Some(m) => m.as_str().parse().ok(),
                None => Some(1),
            }
        };

        Some(Self {
            old_start: number(1)?,
            old_length: number(2)?,
            new_start: number(3)?,
            new_length: number(4)?,
            section: caps
                .get(5)
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        })
    }

    pub fn is_header(line: &str) -> bool {
        Self::parse(line).is_some()
    }
}
