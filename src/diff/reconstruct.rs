//! Rebuilding file contents from a patch.
//!
//! With the base file at hand the whole head file can be produced
//! ([`reconstruct_complete`]). Without it only the regions covered by hunks are
//! known ([`reconstruct_fast`]), and the result is flagged as partial.

use serde::{Deserialize, Serialize};

use super::hunk::{parse_patch, DiffHunk, DiffLineKind};

/// How file contents are obtained for a changed file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Fetch the base file and apply the patch to it
    #[default]
    Complete,
    /// Use only the text contained in the patch
    Fast,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconstruction {
    /// Head (post-patch) content
    pub content: String,
    /// Unchanged regions outside the hunks are missing from `content`
    pub is_partial: bool,
}

/// Both sides of a patch as far as the hunks cover them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FastContents {
    pub base: String,
    pub head: String,
}

/// Split file content into lines, accepting `\n` and `\r\n`.
///
/// Empty content has no lines. Content ending with a newline yields a final
/// empty line so that joining with `\n` gives the content back.
pub fn split_lines(content: &str) -> Vec<&str> {
    if content.is_empty() {
        return Vec::new();
    }
    content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Apply `hunks` to `original` and return the head content.
///
/// The original's trailing newline is kept unless the last hunk reaches the
/// end of the file and a `\ No newline at end of file` marker says otherwise.
pub fn reconstruct_complete(original: &str, hunks: &[DiffHunk]) -> String {
    let mut original_lines = split_lines(original);
    let base_ends_with_newline = original.ends_with('\n');
    if base_ends_with_newline {
        original_lines.pop();
    }

    let mut output: Vec<&str> = Vec::with_capacity(original_lines.len());
    // 1-based; 0 means no original line has been consumed yet
    let mut last_common_line: usize = 0;

    for hunk in hunks {
        let first_old_line = hunk.old_range_start() as usize;
        for line_number in (last_common_line + 1)..first_old_line {
            if let Some(&line) = original_lines.get(line_number - 1) {
                output.push(line);
            }
        }

        output.extend(
            hunk.content_lines()
                .filter(|line| matches!(line.kind, DiffLineKind::Added | DiffLineKind::Context))
                .map(|line| line.text.as_str()),
        );
        last_common_line = last_common_line.max(hunk.old_range_end() as usize);
    }

    if let Some(rest) = original_lines.get(last_common_line..) {
        output.extend(rest);
    }

    let ends_with_newline = match hunks.last() {
        Some(last) if last.old_range_end().max(last.old_start) as usize >= original_lines.len() => {
            head_ends_with_newline(last, base_ends_with_newline)
        }
        _ => base_ends_with_newline,
    };

    let mut content = output.join("\n");
    if ends_with_newline && !output.is_empty() {
        content.push('\n');
    }
    content
}

/// Whether the head file ends with a newline after the final hunk.
///
/// Only explicit no-newline markers change the base file's state.
fn head_ends_with_newline(last_hunk: &DiffHunk, base_ends_with_newline: bool) -> bool {
    let last_of = |excluded: DiffLineKind| {
        last_hunk
            .content_lines()
            .filter(|line| line.kind != excluded && line.kind != DiffLineKind::Control)
            .last()
    };

    match (last_of(DiffLineKind::Added), last_of(DiffLineKind::Removed)) {
        (_, Some(head)) if !head.ends_with_line_break => false,
        (Some(base), Some(_)) if !base.ends_with_line_break => true,
        _ => base_ends_with_newline,
    }
}

/// Collect the base and head text of every hunk, ignoring unchanged regions
/// between them.
pub fn reconstruct_fast(hunks: &[DiffHunk]) -> FastContents {
    let mut base: Vec<&str> = Vec::new();
    let mut head: Vec<&str> = Vec::new();

    for line in hunks.iter().flat_map(|hunk| hunk.content_lines()) {
        match line.kind {
            DiffLineKind::Context => {
                base.push(&line.text);
                head.push(&line.text);
            }
            DiffLineKind::Added => head.push(&line.text),
            DiffLineKind::Removed => base.push(&line.text),
            DiffLineKind::Control => {}
        }
    }

    FastContents {
        base: base.join("\n"),
        head: head.join("\n"),
    }
}

/// Whether the patch contains an entire file: a creation (`-0,0`) or a
/// deletion (`+0,0`).
pub fn describes_whole_file(hunks: &[DiffHunk]) -> bool {
    match hunks {
        [hunk] => {
            (hunk.old_start == 0 && hunk.old_length == 0)
                || (hunk.new_start == 0 && hunk.new_length == 0)
        }
        _ => false,
    }
}

/// Head content for `patch`, applied to `original` when it is available.
pub fn reconstruct_content(original: Option<&str>, patch: &str) -> Reconstruction {
    let hunks = parse_patch(patch);
    match original {
        Some(original) => Reconstruction {
            content: reconstruct_complete(original, &hunks),
            is_partial: false,
        },
        None => Reconstruction {
            content: reconstruct_fast(&hunks).head,
            is_partial: !describes_whole_file(&hunks),
        },
    }
}
