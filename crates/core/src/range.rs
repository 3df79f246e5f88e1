use std::ops::Range;

use thiserror::Error;

/// 定義一段已排序（start <= end）的文字範圍。 / Represents an ordered byte range within a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct TextRange {
    start: usize,
    end: usize,
}

/// 範圍無法套用於目前文字時的錯誤。 / Raised when a range cannot be applied to the current text.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RangeError {
    #[error("range {start}..{end} is out of bounds for text of length {len}")]
    OutOfBounds { start: usize, end: usize, len: usize },
    #[error("offset {offset} does not fall on a character boundary")]
    NotCharBoundary { offset: usize },
}

impl TextRange {
    /// 建立新的範圍，會自動將 start/end 排序。 / Creates a range with automatically ordered bounds.
    pub fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// 建立空範圍（插入點）。 / Creates a collapsed range, i.e. a caret.
    pub fn caret(position: usize) -> Self {
        Self {
            start: position,
            end: position,
        }
    }

    /// 範圍起點。 / Returns the start of the range.
    pub fn start(&self) -> usize {
        self.start
    }

    /// 範圍終點。 / Returns the end of the range.
    pub fn end(&self) -> usize {
        self.end
    }

    /// 範圍長度。 / Returns the length of the range in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// 是否為空範圍。 / Returns whether the range is collapsed.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// 驗證範圍落在文字內且位於字元邊界。 / Ensures the range lies within `text` on char boundaries.
    pub fn validate(&self, text: &str) -> Result<(), RangeError> {
        if self.end > text.len() {
            return Err(RangeError::OutOfBounds {
                start: self.start,
                end: self.end,
                len: text.len(),
            });
        }
        for offset in [self.start, self.end] {
            if !text.is_char_boundary(offset) {
                return Err(RangeError::NotCharBoundary { offset });
            }
        }
        Ok(())
    }

    /// 在 `at` 插入 `len` 位元組後調整範圍；位於插入點的邊界不移動。 / Adjusts the range for an insertion of `len` bytes at `at`; bounds sitting exactly on `at` stay put.
    pub fn shift_for_insert(&mut self, at: usize, len: usize) {
        if self.start > at {
            self.start += len;
        }
        if self.end > at {
            self.end += len;
        }
    }

    /// 刪除 `removed` 後調整範圍。 / Adjusts the range after `removed` was deleted from the text.
    pub fn shift_for_delete(&mut self, removed: TextRange) {
        let adjust = |offset: usize| {
            if offset <= removed.start {
                offset
            } else if offset >= removed.end {
                offset - removed.len()
            } else {
                removed.start
            }
        };
        self.start = adjust(self.start);
        self.end = adjust(self.end);
    }
}

impl From<Range<usize>> for TextRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}
