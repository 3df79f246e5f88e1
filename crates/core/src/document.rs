use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::range::{RangeError, TextRange};
use crate::style::{FontFormat, TextStyle};

const DOCUMENT_VERSION: u32 = 1;

/// 文件在磁碟上的儲存格式。 / On-disk representation of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// 純文字，儲存時捨棄樣式。 / Plain UTF-8 text; styling is dropped on save.
    PlainText,
    /// 含樣式區段的 JSON。 / Versioned JSON carrying the style runs.
    Styled,
}

impl DocumentFormat {
    /// 依副檔名判斷格式（`.json` 為含樣式格式）。 / Picks the format from the file extension (`.json` means styled).
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Styled,
            _ => DocumentFormat::PlainText,
        }
    }
}

/// 文件載入、儲存或編輯時可能發生的錯誤。 / Errors that can occur while loading, saving, or editing a document.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("file is not valid UTF-8")]
    InvalidEncoding,
    #[error("failed to parse styled document: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unsupported document version {0}")]
    UnsupportedVersion(u32),
    #[error("style runs do not cover the document text")]
    InvalidRuns,
    #[error(transparent)]
    Range(#[from] RangeError),
    #[error("document has no associated path")]
    NoPath,
}

/// 一段共用相同樣式的文字。 / A run of text sharing one style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleRun {
    pub start: usize,
    pub end: usize,
    pub style: TextStyle,
}

impl StyleRun {
    fn range(&self) -> TextRange {
        TextRange::new(self.start, self.end)
    }
}

#[derive(Serialize, Deserialize)]
struct StyledFile {
    version: u32,
    text: String,
    #[serde(default)]
    runs: Vec<StyleRun>,
}

/// 帶有字元樣式的文件記憶體模型。 / In-memory document: text plus contiguous style runs.
#[derive(Debug, Clone)]
pub struct Document {
    path: Option<PathBuf>,
    text: String,
    runs: Vec<StyleRun>,
    default_style: TextStyle,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// 建立一個空內容且尚未儲存的文件。 / Creates an unsaved document with empty contents.
    pub fn new() -> Self {
        Self {
            path: None,
            text: String::new(),
            runs: Vec::new(),
            default_style: TextStyle::default(),
        }
    }

    /// 以預設樣式建立含指定文字的文件。 / Creates a document whose text uses the default style.
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut document = Self::new();
        document.text = text.into();
        document.runs = document.full_run(document.default_style.clone());
        document
    }

    /// 從磁碟載入文件，格式依副檔名決定。 / Loads a document from disk; the format follows the extension.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path_ref = path.as_ref();
        let bytes = fs::read(path_ref)?;
        let mut document = match DocumentFormat::from_path(path_ref) {
            DocumentFormat::PlainText => {
                let text = String::from_utf8(bytes).map_err(|_| DocumentError::InvalidEncoding)?;
                Self::from_text(text)
            }
            DocumentFormat::Styled => Self::from_styled_json(&bytes)?,
        };
        document.path = Some(path_ref.to_path_buf());
        Ok(document)
    }

    fn from_styled_json(bytes: &[u8]) -> Result<Self, DocumentError> {
        let file: StyledFile = serde_json::from_slice(bytes)?;
        if file.version == 0 || file.version > DOCUMENT_VERSION {
            return Err(DocumentError::UnsupportedVersion(file.version));
        }
        let mut document = Self::new();
        document.text = file.text;
        document.runs = if file.runs.is_empty() {
            document.full_run(document.default_style.clone())
        } else {
            file.runs
        };
        document.check_runs()?;
        document.merge_runs();
        Ok(document)
    }

    /// 將文件儲存至現有路徑；若尚未指定路徑則失敗。 / Saves the document to its current path; fails if no path is set.
    pub fn save(&mut self) -> Result<(), DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::NoPath)?;
        self.save_as(path)
    }

    /// 將文件另存為新路徑並更新相關中繼資料。 / Saves the document to a new path, updating the associated metadata.
    pub fn save_as(&mut self, path: impl AsRef<Path>) -> Result<(), DocumentError> {
        let path_ref = path.as_ref();
        let encoded = self.serialise(DocumentFormat::from_path(path_ref))?;

        // 先寫入暫存檔再重新命名，避免出現部分寫入的情況。 / Use a temporary file plus rename to guard against partial writes.
        let tmp_path = path_ref.with_extension("tmp_fcstamp");
        {
            let mut tmp_file = File::create(&tmp_path)?;
            tmp_file.write_all(&encoded)?;
            tmp_file.sync_all()?;
        }
        fs::rename(&tmp_path, path_ref)?;

        self.path = Some(path_ref.to_path_buf());
        Ok(())
    }

    fn serialise(&self, format: DocumentFormat) -> Result<Vec<u8>, DocumentError> {
        match format {
            DocumentFormat::PlainText => Ok(self.text.clone().into_bytes()),
            DocumentFormat::Styled => {
                let file = StyledFile {
                    version: DOCUMENT_VERSION,
                    text: self.text.clone(),
                    runs: self.runs.clone(),
                };
                Ok(serde_json::to_vec_pretty(&file)?)
            }
        }
    }

    /// 取得目前文件內容。 / Returns the current document text.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// 取得所有樣式區段。 / Returns the style runs in document order.
    pub fn runs(&self) -> &[StyleRun] {
        &self.runs
    }

    /// 取得指定位元組位置字元的樣式。 / Returns the style of the character starting at `offset`.
    pub fn style_at(&self, offset: usize) -> Option<&TextStyle> {
        self.runs
            .iter()
            .find(|run| run.start <= offset && offset < run.end)
            .map(|run| &run.style)
    }

    /// 在 `offset` 插入文字；新文字沿用前一個字元的樣式。 / Inserts text at `offset`; the new text inherits the style of the preceding character.
    pub fn insert(&mut self, offset: usize, text: &str) -> Result<TextRange, DocumentError> {
        TextRange::caret(offset).validate(&self.text)?;
        if text.is_empty() {
            return Ok(TextRange::caret(offset));
        }
        let len = text.len();
        self.text.insert_str(offset, text);

        match self.runs.iter().position(|run| run.end >= offset) {
            Some(owner) => {
                for (idx, run) in self.runs.iter_mut().enumerate() {
                    if idx == owner {
                        run.end += len;
                    } else if idx > owner {
                        run.start += len;
                        run.end += len;
                    }
                }
            }
            None => self.runs.push(StyleRun {
                start: offset,
                end: offset + len,
                style: self.default_style.clone(),
            }),
        }
        Ok(TextRange::new(offset, offset + len))
    }

    /// 刪除範圍內的文字。 / Removes the text covered by `range`.
    pub fn delete(&mut self, range: TextRange) -> Result<(), DocumentError> {
        range.validate(&self.text)?;
        if range.is_empty() {
            return Ok(());
        }
        self.text.replace_range(range.as_range(), "");
        for run in &mut self.runs {
            let mut bounds = run.range();
            bounds.shift_for_delete(range);
            run.start = bounds.start();
            run.end = bounds.end();
        }
        self.runs.retain(|run| run.start < run.end);
        self.merge_runs();
        Ok(())
    }

    /// 將字型格式套用於範圍內的文字。 / Applies `format` to every character inside `range`.
    pub fn apply_format(
        &mut self,
        range: TextRange,
        format: &FontFormat,
    ) -> Result<(), DocumentError> {
        range.validate(&self.text)?;
        if range.is_empty() || format.is_empty() {
            return Ok(());
        }
        self.split_at(range.start());
        self.split_at(range.end());
        for run in &mut self.runs {
            if run.start >= range.start() && run.end <= range.end() {
                run.style.apply(format);
            }
        }
        self.merge_runs();
        Ok(())
    }

    fn full_run(&self, style: TextStyle) -> Vec<StyleRun> {
        if self.text.is_empty() {
            return Vec::new();
        }
        vec![StyleRun {
            start: 0,
            end: self.text.len(),
            style,
        }]
    }

    fn split_at(&mut self, offset: usize) {
        let Some(idx) = self
            .runs
            .iter()
            .position(|run| run.start < offset && offset < run.end)
        else {
            return;
        };
        let tail = StyleRun {
            start: offset,
            end: self.runs[idx].end,
            style: self.runs[idx].style.clone(),
        };
        self.runs[idx].end = offset;
        self.runs.insert(idx + 1, tail);
    }

    fn merge_runs(&mut self) {
        let mut merged: Vec<StyleRun> = Vec::with_capacity(self.runs.len());
        for run in self.runs.drain(..) {
            match merged.last_mut() {
                Some(prev) if prev.end == run.start && prev.style == run.style => {
                    prev.end = run.end;
                }
                _ => merged.push(run),
            }
        }
        self.runs = merged;
    }

    fn check_runs(&self) -> Result<(), DocumentError> {
        let mut cursor = 0;
        for run in &self.runs {
            if run.start != cursor || run.end <= run.start {
                return Err(DocumentError::InvalidRuns);
            }
            run.range().validate(&self.text)?;
            cursor = run.end;
        }
        if cursor != self.text.len() {
            return Err(DocumentError::InvalidRuns);
        }
        Ok(())
    }
}
