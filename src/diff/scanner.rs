//! Line splitting for raw patch text.
//!
//! Unlike [`str::lines`], the scanner keeps track of which terminator ended
//! each line so that `\r\n` patches can be told apart from `\n` patches, and a
//! stray `\r` inside a line is kept in the text instead of being swallowed.

/// Terminator that ended a scanned line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

/// A single line produced by [`LineScanner`], terminator stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannedLine<'a> {
    pub text: &'a str,
    /// `None` only for a final line that had no terminator
    pub ending: Option<LineEnding>,
}

impl ScannedLine<'_> {
    /// Carriage returns left inside the line text (not part of the terminator).
    pub fn embedded_carriage_returns(&self) -> usize {
        count_carriage_returns(self.text)
    }
}

/// Count `\r` characters in `text`.
///
/// A diff line containing a bare `\r` represents more than one source line
/// when the file uses old-style carriage-return line endings.
pub fn count_carriage_returns(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\r').count()
}

/// Iterator over the logical lines of a patch.
///
/// Cloning the scanner restarts nothing: the clone continues from the same
/// offset. Create a new scanner to re-read from the start.
#[derive(Debug, Clone)]
pub struct LineScanner<'a> {
    text: &'a str,
    offset: usize,
}

impl<'a> LineScanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, offset: 0 }
    }

    /// Whether the last line of `text` ends with a terminator.
    ///
    /// Empty input has no lines and therefore reports `false`.
    pub fn has_trailing_terminator(text: &str) -> bool {
        LineScanner::new(text)
            .last()
            .is_some_and(|line| line.ending.is_some())
    }
}

impl<'a> Iterator for LineScanner<'a> {
    type Item = ScannedLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.text.len() {
            return None;
        }

        let rest = &self.text[self.offset..];
        match rest.find('\n') {
            Some(newline) => {
                self.offset += newline + 1;
                let line = &rest[..newline];
                match line.strip_suffix('\r') {
                    Some(text) => Some(ScannedLine {
                        text,
                        ending: Some(LineEnding::CrLf),
                    }),
                    None => Some(ScannedLine {
                        text: line,
                        ending: Some(LineEnding::Lf),
                    }),
                }
            }
            None => {
                self.offset = self.text.len();
                Some(ScannedLine {
                    text: rest,
                    ending: None,
                })
            }
        }
    }
}
