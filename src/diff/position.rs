//! Mapping between patch positions and file line numbers.
//!
//! GitHub anchors review comments with a patch position (see
//! [`DiffLine::position_in_hunk`]). These functions translate such positions
//! into base/head line numbers and across patches, e.g. from the pull request
//! patch to a working tree that has uncommitted edits on top of it.
//!
//! Lookups use exact equality; a position or line that does not exist yields
//! `None`.

use tracing::debug;

use super::hunk::{DiffHunk, DiffLine, DiffLineKind, DiffSide};
use crate::github::ReviewComment;

/// Find the line with the given patch position.
pub fn diff_line_at(hunks: &[DiffHunk], position: u32) -> Option<&DiffLine> {
    hunks
        .iter()
        .flat_map(|hunk| hunk.lines.iter())
        .find(|line| line.position_in_hunk == position)
}

/// Find the first line whose base (old) or head (new) line number is `line_number`.
pub fn diff_line_by_line_number(
    hunks: &[DiffHunk],
    line_number: u32,
    side: DiffSide,
) -> Option<&DiffLine> {
    hunks
        .iter()
        .flat_map(|hunk| hunk.lines.iter())
        .find(|line| line.line_number(side) == Some(line_number))
}

/// Last line of the last hunk.
pub fn last_diff_line(hunks: &[DiffHunk]) -> Option<&DiffLine> {
    hunks.last().and_then(|hunk| hunk.lines.last())
}

/// Line number at which `comment` is shown in the base or head file.
///
/// Outdated comments and unknown positions give `None`. On the base side the
/// anchor's old line number is used as is, so comments on added lines are not
/// shown there. On the head side a comment whose anchor also exists in the base
/// file is skipped, because it is already shown on the base side.
pub fn absolute_position(
    comment: &ReviewComment,
    hunks: &[DiffHunk],
    side: DiffSide,
) -> Option<u32> {
    let position = comment.position?;
    let line = diff_line_at(hunks, position)?;

    match side {
        DiffSide::Base => line.old_line_number,
        DiffSide::Head => match line.old_line_number {
            Some(old) if old > 0 => None,
            _ => line.new_line_number,
        },
    }
}

/// The comment's own position when it should be rendered inline in the diff of
/// the given side: added lines on the head side, removed lines on the base side.
pub fn position_in_diff(
    comment: &ReviewComment,
    hunks: &[DiffHunk],
    side: DiffSide,
) -> Option<u32> {
    let position = comment.position?;
    let line = diff_line_at(hunks, position)?;

    match (line.kind, side) {
        (DiffLineKind::Added, DiffSide::Head) | (DiffLineKind::Removed, DiffSide::Base) => {
            Some(position)
        }
        _ => None,
    }
}

/// Translate an old-file line number of `hunks` into the new file.
///
/// Every hunk that ends before the line shifts it by the hunk's net line
/// change; the hunk containing the line shifts it once more and ends the walk.
/// Lines before the first hunk are returned unchanged.
pub fn map_old_position_to_new(hunks: &[DiffHunk], old_line_number: u32) -> u32 {
    let mut delta: i64 = 0;

    for hunk in hunks {
        if hunk.old_range_start() > old_line_number {
            continue;
        }
        delta += hunk.delta();
        if hunk.old_range_end() >= old_line_number {
            break;
        }
    }

    clamp_line(i64::from(old_line_number) + delta)
}

/// Position in `hunks` for a line of the working tree file.
///
/// `local_hunks` is the diff from the pull request head to the working tree.
/// The line is first moved back into the pull request head coordinates by
/// undoing every local hunk that starts at or before it, then looked up on the
/// requested side of `hunks`. A local pure insertion starts after its
/// `old_start` line, as in [`DiffHunk::old_range_start`].
pub fn map_head_line_to_diff_hunk_position(
    hunks: &[DiffHunk],
    local_hunks: &[DiffHunk],
    head_line_number: u32,
    side: DiffSide,
) -> Option<u32> {
    let delta: i64 = local_hunks
        .iter()
        .filter(|hunk| hunk.old_range_start() <= head_line_number)
        .map(|hunk| -hunk.delta())
        .sum();

    let line_in_pr_diff = u32::try_from(i64::from(head_line_number) + delta).ok()?;
    diff_line_by_line_number(hunks, line_in_pr_diff, side).map(|line| line.position_in_hunk)
}

/// Resolve every comment to a line of the current head file.
///
/// The anchor is looked up by `position`, falling back to `original_position`
/// for outdated comments. Comments whose anchor cannot be found (or anchors on
/// a hunk header) come back with `absolute_position: None`.
pub fn map_comments_to_head(
    hunks: &[DiffHunk],
    local_hunks: &[DiffHunk],
    comments: &[ReviewComment],
) -> Vec<ReviewComment> {
    let mapped: Vec<ReviewComment> = comments
        .iter()
        .map(|comment| ReviewComment {
            absolute_position: head_line_for(hunks, local_hunks, comment),
            ..comment.clone()
        })
        .collect();

    debug!(
        total = mapped.len(),
        resolved = mapped.iter().filter(|c| c.absolute_position.is_some()).count(),
        "mapped comments to head"
    );
    mapped
}

fn head_line_for(
    hunks: &[DiffHunk],
    local_hunks: &[DiffHunk],
    comment: &ReviewComment,
) -> Option<u32> {
    let line = diff_line_at(hunks, comment.anchor_position()?)?;
    let line_in_pr_diff = match line.kind {
        DiffLineKind::Removed => line.old_line_number,
        _ => line.new_line_number,
    }?;
    Some(map_old_position_to_new(local_hunks, line_in_pr_diff))
}

fn clamp_line(line: i64) -> u32 {
    u32::try_from(line.max(0)).unwrap_or(u32::MAX)
}
