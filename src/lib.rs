//! Review-diff parsing and comment position mapping.
//!
//! [`diff`] holds the pure patch model. [`source`] resolves file contents for
//! changed files through a [`source::ContentFetcher`].

pub mod config;
pub mod diff;
pub mod error;
pub mod github;
pub mod source;

pub use diff::{
    map_comments_to_head, map_head_line_to_diff_hunk_position, map_old_position_to_new,
    parse_patch, reconstruct_complete, reconstruct_content, DiffHunk, DiffLine, DiffLineKind,
    DiffSide, Patch,
};
pub use error::FetchError;
pub use github::{ChangedFile, FileStatus, ReviewComment};
pub use source::{resolve_file_contents, ContentFetcher, FileContents, GitContentFetcher};
