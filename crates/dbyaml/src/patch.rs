//! Text edits against the original file.
//!
//! Edits are made on the raw text rather than by re-serializing the parsed
//! tree, so comments, blank lines and ERB in untouched parts of the file
//! survive byte for byte.

use miette::Diagnostic;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum PatchError {
    #[error("no text matches `{pattern}`")]
    #[diagnostic(
        code(dbyaml::patch::anchor),
        help("the shared block must be written as `name: &name` followed by indented lines")
    )]
    AnchorNotFound { pattern: String },

    #[error("text not found:\n{text}")]
    #[diagnostic(code(dbyaml::patch::text))]
    TextNotFound { text: String },

    #[error("invalid pattern")]
    #[diagnostic(code(dbyaml::patch::pattern))]
    Pattern(#[from] regex::Error),
}

/// The two edits a database addition needs.
pub trait PatchEngine {
    /// Insert `text` right after the first match of `anchor`.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::AnchorNotFound`] if nothing matches.
    fn insert_after(&mut self, anchor: &Regex, text: &str) -> Result<(), PatchError>;

    /// Replace every occurrence of `old` that spans whole lines with `new`.
    /// Occurrences that start or end mid-line are left alone.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError::TextNotFound`] if `old` never spans whole lines.
    fn replace(&mut self, old: &str, new: &str) -> Result<(), PatchError>;
}

/// A [`PatchEngine`] over an in-memory copy of the file.
#[derive(Debug, Clone, Default)]
pub struct TextPatcher {
    content: String,
}

impl TextPatcher {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn into_content(self) -> String {
        self.content
    }
}

impl PatchEngine for TextPatcher {
    fn insert_after(&mut self, anchor: &Regex, text: &str) -> Result<(), PatchError> {
        let Some(found) = anchor.find(&self.content) else {
            return Err(PatchError::AnchorNotFound {
                pattern: anchor.as_str().to_string(),
            });
        };
        self.content.insert_str(found.end(), text);
        Ok(())
    }

    fn replace(&mut self, old: &str, new: &str) -> Result<(), PatchError> {
        let mut out = String::with_capacity(self.content.len());
        let mut last = 0;
        let mut found = false;
        for (start, _) in self.content.match_indices(old) {
            let end = start + old.len();
            if old.is_empty() || !spans_lines(&self.content, start, end) {
                continue;
            }
            out.push_str(&self.content[last..start]);
            out.push_str(new);
            last = end;
            found = true;
        }
        if !found {
            return Err(PatchError::TextNotFound {
                text: old.to_string(),
            });
        }
        out.push_str(&self.content[last..]);
        self.content = out;
        Ok(())
    }
}

/// Whether `content[start..end]` begins at a line start and ends at a line end.
fn spans_lines(content: &str, start: usize, end: usize) -> bool {
    let starts_line = start == 0 || content[..start].ends_with('\n');
    let ends_line = end == content.len() || content[end..].starts_with('\n');
    starts_line && ends_line
}
