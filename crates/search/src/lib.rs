//! Text search engine used by the fcstamp document host and CLI.
//!
//! The engine runs plain or regex patterns over a whole buffer, optionally
//! case-insensitive. Matches carry byte offsets for editing plus 1-based
//! line/column positions for reporting.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Error conditions raised by the search engine.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search pattern cannot be empty")]
    EmptyPattern,
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Determines how the search pattern is interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchMode {
    Plain,
    Regex,
}

/// Options supplied to the search engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub pattern: String,
    pub mode: SearchMode,
    pub case_sensitive: bool,
}

impl SearchOptions {
    /// Creates a new option set for the specified pattern with sensible defaults.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            mode: SearchMode::Plain,
            case_sensitive: false,
        }
    }

    /// Shorthand for a case-sensitive regex search.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            mode: SearchMode::Regex,
            case_sensitive: true,
            ..Self::new(pattern)
        }
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.pattern.is_empty() {
            return Err(SearchError::EmptyPattern);
        }
        Ok(())
    }
}

/// Represents a single match produced by a search query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub matched: String,
}

/// Search engine bound to a particular text buffer.
pub struct SearchEngine<'a> {
    text: &'a str,
    line_index: LineIndex<'a>,
}

impl<'a> SearchEngine<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            line_index: LineIndex::new(text),
        }
    }

    /// Returns all matches that satisfy the given options, in document order.
    pub fn find_all(&self, options: &SearchOptions) -> Result<Vec<SearchMatch>, SearchError> {
        options.validate()?;
        let regex = build_regex(options)?;
        let matches = regex
            .find_iter(self.text)
            .map(|m| {
                let (line, column) = self.line_index.line_and_column(m.start());
                SearchMatch {
                    start: m.start(),
                    end: m.end(),
                    line,
                    column,
                    matched: m.as_str().to_string(),
                }
            })
            .collect();
        Ok(matches)
    }
}

fn build_regex(options: &SearchOptions) -> Result<Regex, SearchError> {
    let pattern = match options.mode {
        SearchMode::Plain => regex::escape(&options.pattern),
        SearchMode::Regex => options.pattern.clone(),
    };
    RegexBuilder::new(&pattern)
        .case_insensitive(!options.case_sensitive)
        .multi_line(true)
        .build()
        .map_err(|err| SearchError::InvalidPattern(err.to_string()))
}

#[derive(Clone)]
struct LineIndex<'a> {
    text: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(text: &'a str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.char_indices()
                .filter(|(_, ch)| *ch == '\n')
                .map(|(idx, ch)| idx + ch.len_utf8()),
        );
        Self { text, starts }
    }

    fn line_and_column(&self, index: usize) -> (usize, usize) {
        let pos = match self.starts.binary_search(&index) {
            Ok(line_zero) => line_zero,
            Err(insert) => insert.saturating_sub(1),
        };
        let line_start = self.starts.get(pos).copied().unwrap_or(0);
        let column = self
            .text
            .get(line_start..index)
            .map_or(0, |prefix| prefix.chars().count())
            .saturating_add(1);
        (pos + 1, column)
    }
}
