//! Patch parsing utilities for GitHub review diffs.
//!
//! This module provides:
//! - Line scanning that keeps `\r\n` / embedded `\r` information
//! - Hunk header parsing and a lazy hunk parser with per-line old/new line numbers
//! - Head content reconstruction, with or without the base file
//! - Mapping of review comment positions between patches and file lines
//! - Unified diff splitting for multi-file `git diff` output
//!
//! Everything here is pure: the same input always parses to equal values, and
//! nothing is cached between calls.

mod header;
mod hunk;
mod position;
mod reconstruct;
mod scanner;
mod unified;

pub use header::HunkHeader;
pub use hunk::{parse_patch, DiffHunk, DiffLine, DiffLineKind, DiffSide, Hunks, Patch};
pub use position::{
    absolute_position, diff_line_at, diff_line_by_line_number, last_diff_line,
    map_comments_to_head, map_head_line_to_diff_hunk_position, map_old_position_to_new,
    position_in_diff,
};
pub use reconstruct::{
    describes_whole_file, reconstruct_complete, reconstruct_content, reconstruct_fast,
    split_lines, ContentMode, FastContents, Reconstruction,
};
pub use scanner::{count_carriage_returns, LineEnding, LineScanner, ScannedLine};
pub use unified::{parse_unified_diff, split_unified_diff, FilePatch};
