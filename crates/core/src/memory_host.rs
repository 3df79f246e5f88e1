use async_trait::async_trait;
use fcstamp_search::{SearchEngine, SearchOptions};

use crate::document::{Document, DocumentError};
use crate::host::{
    HostDocument, HostError, HostErrorKind, HostSearchOptions, InsertLocation, TextSpan,
};
use crate::range::TextRange;
use crate::style::FontFormat;

/// 主機呼叫次數統計。 / Number of calls a [`MemoryHost`] has served, per operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCallStats {
    pub searches: usize,
    pub selections: usize,
    pub inserts: usize,
    pub formats: usize,
    pub syncs: usize,
}

impl HostCallStats {
    pub fn total(&self) -> usize {
        self.searches + self.selections + self.inserts + self.formats + self.syncs
    }
}

#[derive(Debug, Clone)]
struct Staged {
    document: Document,
    selection: TextRange,
    has_writes: bool,
}

/// 以記憶體文件實作的主機。 / [`HostDocument`] backed by an in-memory [`Document`].
///
/// 寫入先套用在工作副本，`sync` 時才提交。 / Writes land on a working copy and are committed by `sync`;
/// a rejected write poisons the batch, which `sync` then discards.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    document: Document,
    selection: TextRange,
    staged: Option<Staged>,
    deferred: Option<HostError>,
    read_only: bool,
    available: bool,
    stats: HostCallStats,
}

impl MemoryHost {
    /// 建立主機，游標位於文件開頭。 / Creates a host with the cursor at the start of the document.
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: TextRange::caret(0),
            staged: None,
            deferred: None,
            read_only: false,
            available: true,
            stats: HostCallStats::default(),
        }
    }

    /// 以指定選取範圍建立主機；範圍不驗證，以便模擬過期選取。 / Sets the selection without validation, so stale selections can be modelled.
    pub fn with_selection(mut self, selection: TextRange) -> Self {
        self.selection = selection;
        self
    }

    /// 設定選取範圍，需落在文件內。 / Moves the selection; it must lie inside the document.
    pub fn set_selection(&mut self, selection: TextRange) -> Result<(), DocumentError> {
        selection.validate(self.document.text())?;
        self.selection = selection;
        Ok(())
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    /// 模擬主機離線。 / Simulates the host becoming unreachable.
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// 已提交的文件。 / The committed document.
    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn into_document(self) -> Document {
        self.document
    }

    /// 已提交的選取範圍。 / The committed selection.
    pub fn current_selection(&self) -> TextRange {
        self.selection
    }

    pub fn stats(&self) -> HostCallStats {
        self.stats
    }

    /// 是否有尚未提交的寫入。 / Whether writes are waiting for `sync`.
    pub fn has_pending_writes(&self) -> bool {
        self.staged.as_ref().is_some_and(|staged| staged.has_writes)
    }

    fn ensure_available(&self) -> Result<(), HostError> {
        if self.available {
            Ok(())
        } else {
            Err(HostError::new(
                HostErrorKind::ServiceNotAvailable,
                "document host is not available",
            ))
        }
    }

    fn view(&self) -> (&Document, TextRange) {
        match &self.staged {
            Some(staged) => (&staged.document, staged.selection),
            None => (&self.document, self.selection),
        }
    }

    fn working(&mut self) -> &mut Staged {
        let document = &self.document;
        let selection = self.selection;
        self.staged.get_or_insert_with(|| Staged {
            document: document.clone(),
            selection,
            has_writes: false,
        })
    }

    fn defer(&mut self, error: HostError) {
        if self.deferred.is_none() {
            self.deferred = Some(error);
        }
    }

    fn stage_insert(
        &mut self,
        range: TextRange,
        text: &str,
        location: InsertLocation,
    ) -> Result<TextRange, DocumentError> {
        let staged = self.working();
        range.validate(staged.document.text())?;
        let at = match location {
            InsertLocation::Start => range.start(),
            InsertLocation::End => range.end(),
            InsertLocation::Replace => {
                staged.document.delete(range)?;
                staged.selection.shift_for_delete(range);
                range.start()
            }
        };
        let inserted = staged.document.insert(at, text)?;
        staged.selection.shift_for_insert(at, inserted.len());
        staged.has_writes = true;
        Ok(inserted)
    }
}

#[async_trait(?Send)]
impl HostDocument for MemoryHost {
    async fn search_body(
        &mut self,
        pattern: &str,
        options: HostSearchOptions,
    ) -> Result<Vec<TextSpan>, HostError> {
        self.stats.searches += 1;
        self.ensure_available()?;
        let mut search = if options.match_wildcards {
            SearchOptions::regex(pattern)
        } else {
            SearchOptions::new(pattern)
        };
        search.case_sensitive = options.match_case;

        let (document, _) = self.view();
        let matches = SearchEngine::new(document.text())
            .find_all(&search)
            .map_err(|err| HostError::invalid_argument(err.to_string()))?;
        Ok(matches
            .into_iter()
            .map(|m| TextSpan {
                range: TextRange::new(m.start, m.end),
                text: m.matched,
            })
            .collect())
    }

    async fn selection(&mut self) -> Result<TextRange, HostError> {
        self.stats.selections += 1;
        self.ensure_available()?;
        Ok(self.view().1)
    }

    async fn insert_text(
        &mut self,
        range: TextRange,
        text: &str,
        location: InsertLocation,
    ) -> Result<TextRange, HostError> {
        self.stats.inserts += 1;
        self.ensure_available()?;
        if self.deferred.is_some() {
            return Ok(TextRange::caret(range.start()));
        }
        match self.stage_insert(range, text, location) {
            Ok(inserted) => Ok(inserted),
            Err(err) => {
                self.defer(HostError::invalid_argument(err.to_string()));
                Ok(TextRange::caret(range.start()))
            }
        }
    }

    async fn set_font(&mut self, range: TextRange, format: &FontFormat) -> Result<(), HostError> {
        self.stats.formats += 1;
        self.ensure_available()?;
        if self.deferred.is_some() {
            return Ok(());
        }
        if let Some(reason) = format.invalid_reason() {
            self.defer(HostError::invalid_argument(reason));
            return Ok(());
        }
        let staged = self.working();
        match staged.document.apply_format(range, format) {
            Ok(()) => {
                staged.has_writes = true;
                Ok(())
            }
            Err(err) => {
                self.defer(HostError::invalid_argument(err.to_string()));
                Ok(())
            }
        }
    }

    async fn sync(&mut self) -> Result<(), HostError> {
        self.stats.syncs += 1;
        let staged = self.staged.take();
        let deferred = self.deferred.take();
        self.ensure_available()?;
        if let Some(err) = deferred {
            return Err(err);
        }
        let Some(staged) = staged else {
            return Ok(());
        };
        if staged.has_writes {
            if self.read_only {
                return Err(HostError::access_denied("document is read-only"));
            }
            self.document = staged.document;
            self.selection = staged.selection;
        }
        Ok(())
    }
}
