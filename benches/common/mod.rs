//! Common utilities for benchmarks.
//!
//! Provides test data generators with fixed seeds for reproducibility.

#![allow(dead_code)]

use diffmap::github::{ReviewComment, User};
use rand::Rng;
use rand_chacha::rand_core::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Fixed seed for reproducible benchmark data
const SEED: u64 = 42;

/// Lines of unchanged content between two hunks
const HUNK_GAP: u32 = 20;

/// Create a seeded RNG for reproducible test data
pub fn seeded_rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(SEED)
}

/// Generate a base file with `line_count` lines of Rust-like code.
pub fn generate_original_file(line_count: usize) -> String {
    let mut rng = seeded_rng();
    (1..=line_count)
        .map(|i| generate_code_line(&mut rng, i))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Generate a patch of roughly `line_count` lines against
/// [`generate_original_file`].
///
/// Hunks of about 30 lines are separated by [`HUNK_GAP`] unchanged lines. Each
/// header carries the exact old/new lengths of its body, so the patch applies
/// cleanly to a base file of `2 * line_count` lines.
pub fn generate_diff_patch(line_count: usize) -> String {
    let mut rng = seeded_rng();
    let mut lines = Vec::with_capacity(line_count);
    let mut old_line = 1u32;
    let mut new_line = 1u32;

    while lines.len() < line_count {
        let body_len = 29.min(line_count - lines.len() - 1).max(1);
        let mut body = Vec::with_capacity(body_len);
        let (mut old_len, mut new_len) = (0u32, 0u32);

        for _ in 0..body_len {
            let content = generate_code_line(&mut rng, (old_line + old_len) as usize);
            match rng.random_range(0..10u8) {
                // 20% added
                0..=1 => {
                    body.push(format!("+{}", content));
                    new_len += 1;
                }
                // 20% removed
                2..=3 => {
                    body.push(format!("-{}", content));
                    old_len += 1;
                }
                // 60% context
                _ => {
                    body.push(format!(" {}", content));
                    old_len += 1;
                    new_len += 1;
                }
            }
        }

        lines.push(format!(
            "@@ -{},{} +{},{} @@",
            old_line, old_len, new_line, new_len
        ));
        lines.extend(body);
        old_line += old_len + HUNK_GAP;
        new_line += new_len + HUNK_GAP;
    }

    lines.join("\n")
}

/// Generate a line of realistic Rust-like code
fn generate_code_line(rng: &mut ChaCha8Rng, line_num: usize) -> String {
    let templates = [
        "    let hunks = parse_patch(&patch);",
        "    for hunk in hunks.iter() {",
        "        let delta = hunk.new_length as i64 - hunk.old_length as i64;",
        "    }",
        "    match line.kind {",
        "        DiffLineKind::Added => head.push(&line.text),",
        "        DiffLineKind::Removed => base.push(&line.text),",
        "        _ => {}",
        "    let position = comment.position.or(comment.original_position)?;",
        "    pub struct ReviewThread {",
        "        comments: Vec<ReviewComment>,",
        "    impl Default for ReviewThread {",
        "    #[derive(Debug, Clone, Serialize)]",
        "    /// Line in the head file, if still present",
        "    // old_start == 0 means the file was created",
        "    assert_eq!(map_old_position_to_new(&hunks, 9), 9);",
        "    warn!(path = %file.filename, \"missing base content\");",
        "    let original = fetcher.fetch(&path, &revision).await?;",
        "    if hunk.old_length == 0 { continue; }",
        "    .filter(|line| line.kind != DiffLineKind::Control)",
    ];

    let idx = rng.random_range(0..templates.len());
    format!("{} // line {}", templates[idx], line_num)
}

/// Generate review comments anchored at random positions in `1..=max_position`.
///
/// Roughly one comment in five is outdated and only carries
/// `original_position`.
pub fn generate_comments(max_position: u32, count: usize) -> Vec<ReviewComment> {
    let mut rng = seeded_rng();
    (0..count)
        .map(|i| {
            let position = rng.random_range(1..=max_position);
            let outdated = rng.random_range(0..5u8) == 0;
            ReviewComment {
                id: i as u64 + 1,
                path: "src/lib.rs".to_string(),
                position: (!outdated).then_some(position),
                original_position: Some(position),
                body: format!("comment {}", i),
                user: User {
                    login: "reviewer".to_string(),
                },
                ..Default::default()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_generate_diff_patch_length() {
        let patch = super::generate_diff_patch(100);
        let line_count = patch.lines().count();
        assert_eq!(line_count, 100);
    }

    #[test]
    fn test_generate_diff_patch_reproducible() {
        let patch1 = super::generate_diff_patch(50);
        let patch2 = super::generate_diff_patch(50);
        assert_eq!(patch1, patch2);
    }

    #[test]
    fn test_generated_headers_match_bodies() {
        let patch = super::generate_diff_patch(300);
        for hunk in diffmap::parse_patch(&patch) {
            let old = hunk.content_lines().filter(|l| l.old_line_number.is_some()).count();
            let new = hunk.content_lines().filter(|l| l.new_line_number.is_some()).count();
            assert_eq!(old as u32, hunk.old_length);
            assert_eq!(new as u32, hunk.new_length);
        }
    }

    #[test]
    fn test_generate_comments() {
        let comments = super::generate_comments(50, 100);
        assert_eq!(comments.len(), 100);
        assert!(comments
            .iter()
            .all(|c| c.original_position.is_some_and(|p| (1..=50).contains(&p))));
    }
}
