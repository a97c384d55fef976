//! Structured hunks parsed from a single-file unified diff.
//!
//! Every emitted line (hunk headers included) receives a `position_in_hunk`
//! that keeps counting across hunks, so a position addresses one line of the
//! whole patch. Review comments from the hosting API are anchored with these
//! positions.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::header::HunkHeader;
use super::scanner::{count_carriage_returns, LineScanner};

/// Classification of a line inside a hunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffLineKind {
    /// Unchanged line (starts with space)
    Context,
    /// Line added in the new version (starts with +)
    Added,
    /// Line removed from the old version (starts with -)
    Removed,
    /// Hunk header, or a marker such as `\ No newline at end of file`
    Control,
}

impl DiffLineKind {
    /// Classify a raw diff line by its leading marker character.
    pub fn from_marker(line: &str) -> Self {
        match line.as_bytes().first() {
            Some(b' ') => DiffLineKind::Context,
            Some(b'+') => DiffLineKind::Added,
            Some(b'-') => DiffLineKind::Removed,
            _ => DiffLineKind::Control,
        }
    }
}

/// Which file of a comparison a line number or comment refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffSide {
    /// The pre-change file
    Base,
    /// The post-change file
    Head,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: DiffLineKind,
    /// Line number in the old file (None for added lines and headers)
    pub old_line_number: Option<u32>,
    /// Line number in the new file (None for removed lines and headers)
    pub new_line_number: Option<u32>,
    /// 1-based position within the whole patch
    pub position_in_hunk: u32,
    /// Content without the diff marker. Headers keep the full header line.
    pub text: String,
    pub ends_with_line_break: bool,
}

impl DiffLine {
    /// Number of source lines this diff line stands for.
    pub fn source_line_count(&self) -> u32 {
        1 + count_carriage_returns(&self.text) as u32
    }

    pub fn line_number(&self, side: DiffSide) -> Option<u32> {
        match side {
            DiffSide::Base => self.old_line_number,
            DiffSide::Head => self.new_line_number,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffHunk {
    pub old_start: u32,
    pub old_length: u32,
    pub new_start: u32,
    pub new_length: u32,
    /// Position assigned to the header line
    pub header_position: u32,
    /// Header line first, then content lines in patch order
    pub lines: Vec<DiffLine>,
}

impl DiffHunk {
    fn open(header: &HunkHeader, header_line: &str, position: u32) -> Self {
        Self {
            old_start: header.old_start,
            old_length: header.old_length,
            new_start: header.new_start,
            new_length: header.new_length,
            header_position: position,
            lines: vec![DiffLine {
                kind: DiffLineKind::Control,
                old_line_number: None,
                new_line_number: None,
                position_in_hunk: position,
                text: header_line.to_string(),
                ends_with_line_break: true,
            }],
        }
    }

    /// Lines after the header.
    pub fn content_lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.lines.iter().skip(1)
    }

    /// First old-file line covered by the hunk.
    ///
    /// A hunk with `old_length == 0` inserts after line `old_start`, so the
    /// region it replaces begins on the following line. `old_start == 0` (empty
    /// old file) therefore starts at line 1 and covers nothing.
    pub fn old_range_start(&self) -> u32 {
        if self.old_length == 0 {
            self.old_start.saturating_add(1)
        } else {
            self.old_start
        }
    }

    /// Last old-file line covered by the hunk; `old_range_start() - 1` when the
    /// hunk covers no old lines.
    pub fn old_range_end(&self) -> u32 {
        self.old_range_start()
            .saturating_add(self.old_length)
            .saturating_sub(1)
    }

    /// New-file counterpart of [`DiffHunk::old_range_start`].
    pub fn new_range_start(&self) -> u32 {
        if self.new_length == 0 {
            self.new_start.saturating_add(1)
        } else {
            self.new_start
        }
    }

    pub fn new_range_end(&self) -> u32 {
        self.new_range_start()
            .saturating_add(self.new_length)
            .saturating_sub(1)
    }

    pub fn contains_old_line(&self, line: u32) -> bool {
        self.old_length > 0 && (self.old_range_start()..=self.old_range_end()).contains(&line)
    }

    /// Net change in line count introduced by this hunk.
    pub fn delta(&self) -> i64 {
        i64::from(self.new_length) - i64::from(self.old_length)
    }

    pub fn last_position(&self) -> u32 {
        self.lines
            .last()
            .map_or(self.header_position, |line| line.position_in_hunk)
    }
}

/// Counters carried while a hunk is open
#[derive(Debug)]
struct OpenHunk {
    hunk: DiffHunk,
    old_line: u32,
    new_line: u32,
}

#[derive(Debug)]
enum ParserState {
    BetweenHunks,
    InHunk(OpenHunk),
}

/// Lazy iterator over the hunks of a patch.
///
/// Text before the first hunk header (`diff --git`, `---`, `+++`, ...) is
/// skipped and does not consume positions.
#[derive(Debug)]
pub struct Hunks<'a> {
    scanner: LineScanner<'a>,
    state: ParserState,
    /// Last position handed out; 0 until the first header
    position: u32,
}

impl<'a> Hunks<'a> {
    pub fn new(patch: &'a str) -> Self {
        Self {
            scanner: LineScanner::new(patch),
            state: ParserState::BetweenHunks,
            position: 0,
        }
    }

    fn next_position(&mut self) -> u32 {
        self.position += 1;
        self.position
    }

    /// Start a new hunk, returning the one that was open (if any).
    fn open_hunk(&mut self, header: &HunkHeader, line: &str) -> Option<DiffHunk> {
        let position = self.next_position();
        let opened = OpenHunk {
            hunk: DiffHunk::open(header, line, position),
            old_line: header.old_start,
            new_line: header.new_start,
        };
        match std::mem::replace(&mut self.state, ParserState::InHunk(opened)) {
            ParserState::InHunk(done) => Some(done.hunk),
            ParserState::BetweenHunks => None,
        }
    }

    fn push_content_line(&mut self, line: &str) {
        let kind = DiffLineKind::from_marker(line);
        let position = match kind {
            DiffLineKind::Control => 0,
            _ => self.position + 1,
        };

        let ParserState::InHunk(open) = &mut self.state else {
            return;
        };

        if kind == DiffLineKind::Control {
            // "\ No newline at end of file" applies to the previous content
            // line; directly after a header there is nothing to mark.
            if open.hunk.lines.len() > 1 {
                if let Some(previous) = open.hunk.lines.last_mut() {
                    previous.ends_with_line_break = false;
                }
            }
            return;
        }

        let diff_line = DiffLine {
            kind,
            old_line_number: (kind != DiffLineKind::Added).then_some(open.old_line),
            new_line_number: (kind != DiffLineKind::Removed).then_some(open.new_line),
            position_in_hunk: position,
            text: line[1..].to_string(),
            ends_with_line_break: true,
        };
        let line_count = diff_line.source_line_count();
        open.hunk.lines.push(diff_line);

        match kind {
            DiffLineKind::Context => {
                open.old_line = open.old_line.saturating_add(line_count);
                open.new_line = open.new_line.saturating_add(line_count);
            }
            DiffLineKind::Removed => open.old_line = open.old_line.saturating_add(line_count),
            DiffLineKind::Added => open.new_line = open.new_line.saturating_add(line_count),
            DiffLineKind::Control => {}
        }
        self.position = position;
    }
}

impl Iterator for Hunks<'_> {
    type Item = DiffHunk;

    fn next(&mut self) -> Option<DiffHunk> {
        while let Some(scanned) = self.scanner.next() {
            if let Some(header) = HunkHeader::parse(scanned.text) {
                if let Some(done) = self.open_hunk(&header, scanned.text) {
                    return Some(done);
                }
                continue;
            }

            if matches!(self.state, ParserState::InHunk(_)) {
                self.push_content_line(scanned.text);
            }
        }

        match std::mem::replace(&mut self.state, ParserState::BetweenHunks) {
            ParserState::InHunk(done) => Some(done.hunk),
            ParserState::BetweenHunks => None,
        }
    }
}

/// Parse every hunk of `patch`.
pub fn parse_patch(patch: &str) -> Vec<DiffHunk> {
    let hunks: Vec<DiffHunk> = Hunks::new(patch).collect();
    debug!(hunks = hunks.len(), bytes = patch.len(), "parsed patch");
    hunks
}

/// The hunks of one file's patch, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    hunks: Vec<DiffHunk>,
}

impl Patch {
    pub fn parse(patch: &str) -> Self {
        Self {
            hunks: parse_patch(patch),
        }
    }

    pub fn hunks(&self) -> &[DiffHunk] {
        &self.hunks
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// All lines of all hunks in position order.
    pub fn lines(&self) -> impl Iterator<Item = &DiffLine> {
        self.hunks.iter().flat_map(|hunk| hunk.lines.iter())
    }

    pub fn line_at(&self, position: u32) -> Option<&DiffLine> {
        super::position::diff_line_at(&self.hunks, position)
    }

    /// Whether every hunk starts after the old-side end of the previous one.
    pub fn is_non_overlapping(&self) -> bool {
        self.hunks.windows(2).all(|pair| {
            let end = i64::from(pair[0].old_start) + i64::from(pair[0].old_length) - 1;
            i64::from(pair[1].old_start) > end
        })
    }
}

impl AsRef<[DiffHunk]> for Patch {
    fn as_ref(&self) -> &[DiffHunk] {
        &self.hunks
    }
}

impl From<Vec<DiffHunk>> for Patch {
    fn from(hunks: Vec<DiffHunk>) -> Self {
        Self { hunks }
    }
}

impl FromIterator<DiffHunk> for Patch {
    fn from_iter<I: IntoIterator<Item = DiffHunk>>(iter: I) -> Self {
        Self {
            hunks: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn render(hunks: &[DiffHunk]) -> String {
        let number = |n: Option<u32>| n.map_or("-".to_string(), |n| n.to_string());
        let mut out = Vec::new();
        for hunk in hunks {
            for line in &hunk.lines {
                out.push(format!(
                    "{:<2} {:<7} {:>2} {:>2} {}{}",
                    line.position_in_hunk,
                    format!("{:?}", line.kind),
                    number(line.old_line_number),
                    number(line.new_line_number),
                    line.text,
                    if line.ends_with_line_break { "" } else { " [no eol]" }
                ));
            }
        }
        out.join("\n")
    }

    #[test]
    fn test_single_hunk_scenario() {
        let hunks = parse_patch("@@ -1,2 +1,3 @@\n line1\n+line2\n line3\n");
        assert_eq!(hunks.len(), 1);

        let hunk = &hunks[0];
        assert_eq!(
            (hunk.old_start, hunk.old_length, hunk.new_start, hunk.new_length),
            (1, 2, 1, 3)
        );
        assert_eq!(hunk.header_position, 1);
        assert_eq!(hunk.lines.len(), 4);

        let kinds: Vec<_> = hunk.lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiffLineKind::Control,
                DiffLineKind::Context,
                DiffLineKind::Added,
                DiffLineKind::Context
            ]
        );
        let positions: Vec<_> = hunk.lines.iter().map(|l| l.position_in_hunk).collect();
        assert_eq!(positions, vec![1, 2, 3, 4]);

        let line3 = &hunk.lines[3];
        assert_eq!(line3.text, "line3");
        assert_eq!(line3.old_line_number, Some(2));
        assert_eq!(line3.new_line_number, Some(3));
    }

    #[test]
    fn test_multi_hunk_positions_do_not_reset() {
        let patch = "@@ -1,3 +1,3 @@\n-old1\n+new1\n ctx\n@@ -10,3 +10,4 @@ fn tail() {\n ctx2\n-old2\n+new2\n+new3";
        let hunks = parse_patch(patch);
        assert_snapshot!(render(&hunks), @r"
        1  Control  -  - @@ -1,3 +1,3 @@
        2  Removed  1  - old1
        3  Added    -  1 new1
        4  Context  2  2 ctx
        5  Control  -  - @@ -10,3 +10,4 @@ fn tail() {
        6  Context 10 10 ctx2
        7  Removed 11  - old2
        8  Added    - 11 new2
        9  Added    - 12 new3
        ");
        assert_eq!(hunks[1].header_position, 5);
    }

    #[test]
    fn test_positions_are_contiguous_from_one() {
        let patch = "diff --git a/f b/f\n--- a/f\n+++ b/f\n@@ -1,2 +1,2 @@\n-a\n+b\n c\n\\ No newline at end of file\n@@ -8 +8,2 @@\n x\n+y\n@@ -20,2 +21 @@\n-p\n-q\n+r";
        let patch = Patch::parse(patch);
        let positions: Vec<u32> = patch.lines().map(|l| l.position_in_hunk).collect();
        let expected: Vec<u32> = (1..=positions.len() as u32).collect();
        assert_eq!(positions, expected);
        assert_eq!(positions.len(), 11);
    }

    #[test]
    fn test_meta_lines_before_first_header_are_skipped() {
        let patch = "diff --git a/foo.rs b/foo.rs\nindex 123..456 100644\n--- a/foo.rs\n+++ b/foo.rs\n@@ -1,2 +1,3 @@\n fn main() {\n+    println!(\"hello\");\n }";
        let hunks = parse_patch(patch);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].header_position, 1);
        assert_eq!(hunks[0].lines[1].text, "fn main() {");
        assert_eq!(hunks[0].lines[1].position_in_hunk, 2);
    }

    #[test]
    fn test_no_newline_marker_marks_previous_line() {
        let patch = "@@ -1 +1 @@\n-old\n\\ No newline at end of file\n+new\n\\ No newline at end of file";
        let hunks = parse_patch(patch);
        let lines = &hunks[0].lines;
        assert_eq!(lines.len(), 3);
        assert!(!lines[1].ends_with_line_break);
        assert!(!lines[2].ends_with_line_break);
        assert_eq!(lines[2].position_in_hunk, 3);
    }

    #[test]
    fn test_no_newline_marker_directly_after_header_is_noop() {
        let hunks = parse_patch("@@ -0,0 +0,0 @@\n\\ No newline at end of file");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 1);
        assert!(hunks[0].lines[0].ends_with_line_break);
    }

    #[test]
    fn test_embedded_carriage_returns_advance_counters() {
        let patch = "@@ -1,4 +1,4 @@\n a\rb\r\n-c\rd\n+e\n f";
        let hunks = parse_patch(patch);
        let lines = &hunks[0].lines;
        // " a\rb" covers old/new lines 1 and 2
        assert_eq!(lines[1].source_line_count(), 2);
        assert_eq!(lines[2].old_line_number, Some(3));
        assert_eq!(lines[3].new_line_number, Some(3));
        assert_eq!(lines[4].old_line_number, Some(5));
        assert_eq!(lines[4].new_line_number, Some(4));
    }

    #[test]
    fn test_crlf_patch_matches_lf_patch() {
        let lf = parse_patch("@@ -1,2 +1,2 @@\n-a\n+b\n c\n");
        let crlf = parse_patch("@@ -1,2 +1,2 @@\r\n-a\r\n+b\r\n c\r\n");
        assert_eq!(lf, crlf);
    }

    #[test]
    fn test_new_file_hunk() {
        let hunks = parse_patch("@@ -0,0 +1,3 @@\n+fn new_function() {\n+    todo!()\n+}");
        let new_numbers: Vec<_> = hunks[0]
            .content_lines()
            .map(|l| (l.old_line_number, l.new_line_number))
            .collect();
        assert_eq!(
            new_numbers,
            vec![(None, Some(1)), (None, Some(2)), (None, Some(3))]
        );
        assert_eq!(hunks[0].old_range_start(), 1);
        assert_eq!(hunks[0].old_range_end(), 0);
        assert!(!hunks[0].contains_old_line(0));
        assert!(!hunks[0].contains_old_line(1));
    }

    #[test]
    fn test_deleted_file_hunk() {
        let hunks = parse_patch("@@ -1,3 +0,0 @@\n-a\n-b\n-c");
        let old_numbers: Vec<_> = hunks[0]
            .content_lines()
            .map(|l| (l.old_line_number, l.new_line_number))
            .collect();
        assert_eq!(
            old_numbers,
            vec![(Some(1), None), (Some(2), None), (Some(3), None)]
        );
        assert_eq!(hunks[0].delta(), -3);
    }

    #[test]
    fn test_unknown_marker_lines_are_not_rejected() {
        let hunks = parse_patch("@@ -1,2 +1,2 @@\n a\n\n b");
        // the blank line is a control line and marks "a"
        let lines = &hunks[0].lines;
        assert_eq!(lines.len(), 3);
        assert!(!lines[1].ends_with_line_break);
        assert_eq!(lines[2].text, "b");
        assert_eq!(lines[2].old_line_number, Some(2));
    }

    #[test]
    fn test_zero_hunks() {
        assert!(parse_patch("").is_empty());
        assert!(parse_patch("Binary files /dev/null and b/image.png differ").is_empty());
        assert!(parse_patch(" stray context\n+stray add").is_empty());
    }

    #[test]
    fn test_malformed_header_inside_hunk_is_control() {
        let hunks = parse_patch("@@ -1,2 +1,2 @@\n a\n@@ garbage @@\n b");
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 3);
        assert!(!hunks[0].lines[1].ends_with_line_break);
    }

    #[test]
    fn test_parsing_is_idempotent() {
        let patch = "@@ -1,3 +1,3 @@\n-old1\n+new1\n ctx\n@@ -10,2 +10,2 @@\n-old2\n+new2";
        assert_eq!(parse_patch(patch), parse_patch(patch));
        assert_eq!(Patch::parse(patch), Patch::parse(patch));
    }

    #[test]
    fn test_lazy_iterator_yields_hunks_one_by_one() {
        let patch = "@@ -1 +1 @@\n-a\n+b\n@@ -5 +5 @@\n-c\n+d";
        let mut hunks = Hunks::new(patch);
        assert_eq!(hunks.next().map(|h| h.old_start), Some(1));
        assert_eq!(hunks.next().map(|h| h.old_start), Some(5));
        assert!(hunks.next().is_none());
        assert!(hunks.next().is_none());
    }

    #[test]
    fn test_non_overlapping_hunks() {
        let patch = Patch::parse("@@ -1,3 +1,3 @@\n a\n b\n c\n@@ -10,2 +10,2 @@\n x\n y");
        assert!(patch.is_non_overlapping());

        let overlapping = Patch::parse("@@ -1,5 +1,5 @@\n a\n@@ -3,2 +3,2 @@\n b");
        assert!(!overlapping.is_non_overlapping());
    }

    #[test]
    fn test_insertion_hunk_ranges() {
        let hunks = parse_patch("@@ -5,0 +6,2 @@\n+x\n+y");
        assert_eq!(hunks[0].old_range_start(), 6);
        assert_eq!(hunks[0].old_range_end(), 5);
        assert_eq!(hunks[0].new_range_start(), 6);
        assert_eq!(hunks[0].new_range_end(), 7);
        assert_eq!(hunks[0].last_position(), 3);
    }

    #[test]
    fn test_classify_markers() {
        assert_eq!(DiffLineKind::from_marker(" x"), DiffLineKind::Context);
        assert_eq!(DiffLineKind::from_marker("+x"), DiffLineKind::Added);
        assert_eq!(DiffLineKind::from_marker("-x"), DiffLineKind::Removed);
        assert_eq!(DiffLineKind::from_marker("\\ x"), DiffLineKind::Control);
        assert_eq!(DiffLineKind::from_marker(""), DiffLineKind::Control);
    }
}
