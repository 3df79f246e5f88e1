use std::collections::HashSet;

use fcstamp_core::{HostDocument, HostError, HostSearchOptions};
use tracing::debug;

use crate::code::{Code, CODE_PATTERN};

/// Snapshot of the code-shaped strings found in a document.
///
/// Holds every match verbatim, including ones the generator never produces
/// (such as `fc-012-345`), so its size counts against capacity the same way.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExistingCodes {
    codes: HashSet<String>,
}

impl ExistingCodes {
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &Code) -> bool {
        self.codes.contains(&code.to_string())
    }

    /// Records a code, returning whether it was new.
    pub fn insert(&mut self, code: Code) -> bool {
        self.codes.insert(code.to_string())
    }

    /// Codes in ascending order, for stable display.
    pub fn sorted(&self) -> Vec<&str> {
        let mut codes: Vec<&str> = self.codes.iter().map(String::as_str).collect();
        codes.sort_unstable();
        codes
    }
}

impl<S: Into<String>> FromIterator<S> for ExistingCodes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            codes: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Collects every distinct code-shaped string in the document body.
///
/// The host batch is flushed before returning so the snapshot is complete.
pub async fn scan_codes<H>(host: &mut H) -> Result<ExistingCodes, HostError>
where
    H: HostDocument + ?Sized,
{
    let spans = host
        .search_body(
            CODE_PATTERN,
            HostSearchOptions {
                match_wildcards: true,
                match_case: true,
            },
        )
        .await?;
    host.sync().await?;

    let occurrences = spans.len();
    let codes: ExistingCodes = spans.into_iter().map(|span| span.text).collect();
    debug!(occurrences, distinct = codes.len(), "scanned document for codes");
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcstamp_core::{Document, HostErrorKind, MemoryHost};
    use futures::executor::block_on;

    #[test]
    fn duplicate_occurrences_count_once() {
        let mut host = MemoryHost::new(Document::from_text(
            "first fc-101-202, then fc-101-202 again",
        ));
        let codes = block_on(scan_codes(&mut host)).unwrap();
        assert_eq!(codes.len(), 1);
        assert!(codes.contains(&Code::new(101, 202).unwrap()));
    }

    #[test]
    fn keeps_non_canonical_matches() {
        let mut host = MemoryHost::new(Document::from_text(
            "fc-012-345 fc-999-100 FC-111-111 xfc-222-3334",
        ));
        let codes = block_on(scan_codes(&mut host)).unwrap();
        assert_eq!(codes.sorted(), vec!["fc-012-345", "fc-222-333", "fc-999-100"]);
    }

    #[test]
    fn empty_document_yields_empty_set() {
        let mut host = MemoryHost::new(Document::new());
        let codes = block_on(scan_codes(&mut host)).unwrap();
        assert!(codes.is_empty());
        assert_eq!(host.stats().searches, 1);
        assert_eq!(host.stats().syncs, 1);
    }

    #[test]
    fn host_failures_pass_through() {
        let mut host = MemoryHost::new(Document::from_text("fc-101-202"));
        host.set_available(false);
        let err = block_on(scan_codes(&mut host)).unwrap_err();
        assert_eq!(err.kind(), HostErrorKind::ServiceNotAvailable);
    }
}
