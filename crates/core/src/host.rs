//! Contract between the stamping logic and the document editing surface.
//!
//! A host mirrors the batched model of word-processor add-in APIs: reads
//! return immediately, writes are queued, and [`HostDocument::sync`] commits
//! the queue. A failure of any queued write is reported by `sync`, after
//! which the whole batch is discarded.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::range::TextRange;
use crate::style::FontFormat;

/// Structured classification of host failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostErrorKind {
    /// The request referenced a range, value, or pattern the host rejected.
    InvalidArgument,
    /// The document is read-only or the caller lacks permission.
    AccessDenied,
    /// The host is not reachable or not ready.
    ServiceNotAvailable,
    GeneralException,
}

impl HostErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            HostErrorKind::InvalidArgument => "InvalidArgument",
            HostErrorKind::AccessDenied => "AccessDenied",
            HostErrorKind::ServiceNotAvailable => "ServiceNotAvailable",
            HostErrorKind::GeneralException => "GeneralException",
        }
    }
}

impl fmt::Display for HostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error reported by a [`HostDocument`] implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct HostError {
    kind: HostErrorKind,
    message: String,
}

impl HostError {
    pub fn new(kind: HostErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::InvalidArgument, message)
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::AccessDenied, message)
    }

    pub fn kind(&self) -> HostErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Where inserted text lands relative to the target range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertLocation {
    Start,
    End,
    /// Replaces the range's contents.
    Replace,
}

/// Search flags understood by [`HostDocument::search_body`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostSearchOptions {
    /// Interpret the pattern as a wildcard/regex expression.
    pub match_wildcards: bool,
    pub match_case: bool,
}

impl Default for HostSearchOptions {
    fn default() -> Self {
        Self {
            match_wildcards: false,
            match_case: true,
        }
    }
}

/// A piece of document text located by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub range: TextRange,
    pub text: String,
}

/// Editing surface the stamping logic runs against.
///
/// All calls are cooperative: they may suspend, and the caller never issues a
/// second call before the previous one resolved.
#[async_trait(?Send)]
pub trait HostDocument {
    /// Searches the whole document body.
    async fn search_body(
        &mut self,
        pattern: &str,
        options: HostSearchOptions,
    ) -> Result<Vec<TextSpan>, HostError>;

    /// Returns the current selection (a collapsed range for a bare cursor).
    async fn selection(&mut self) -> Result<TextRange, HostError>;

    /// Queues an insertion relative to `range` and returns the range the text will occupy.
    async fn insert_text(
        &mut self,
        range: TextRange,
        text: &str,
        location: InsertLocation,
    ) -> Result<TextRange, HostError>;

    /// Queues font changes for `range`.
    async fn set_font(&mut self, range: TextRange, format: &FontFormat) -> Result<(), HostError>;

    /// Commits queued writes, surfacing the first failure among them.
    async fn sync(&mut self) -> Result<(), HostError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_error_display_leads_with_kind_code() {
        let err = HostError::invalid_argument("range is stale");
        assert_eq!(err.to_string(), "InvalidArgument: range is stale");
        assert_eq!(err.kind(), HostErrorKind::InvalidArgument);
        assert_eq!(err.message(), "range is stale");
    }
}
