use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::notation::{collect_line_instruments, TextEncoding, TitleLine};

/// One imported song. The file's bytes and titles are frozen at import; the
/// edit flags are always worked out by comparing against them.
#[derive(Debug, Clone, Serialize)]
pub struct SongEntry {
    filename: String,
    original_path: PathBuf,
    #[serde(skip)]
    original_content: Vec<u8>,
    #[serde(skip)]
    encoding: TextEncoding,
    title: String,
    original_title: String,
    title_lines: Vec<TitleLine>,
    duration_seconds: u32,
    instruments: Vec<String>,
    order: usize,
}

impl SongEntry {
    pub(crate) fn new(
        original_path: &Path,
        original_content: Vec<u8>,
        encoding: TextEncoding,
        title: String,
        duration_seconds: u32,
        title_lines: Vec<TitleLine>,
        instruments: Vec<String>,
        order: usize,
    ) -> Self {
        let filename = original_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            filename,
            original_path: original_path.to_path_buf(),
            original_content,
            encoding,
            original_title: title.clone(),
            title,
            title_lines,
            duration_seconds,
            instruments,
            order,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn original_path(&self) -> &Path {
        &self.original_path
    }

    /// The file exactly as it was read
    pub fn original_content(&self) -> &[u8] {
        &self.original_content
    }

    /// How `original_content` was decoded for titles and timing
    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn original_title(&self) -> &str {
        &self.original_title
    }

    pub fn title_edited(&self) -> bool {
        self.title != self.original_title
    }

    pub fn title_lines(&self) -> &[TitleLine] {
        &self.title_lines
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_seconds
    }

    pub fn instruments(&self) -> &[String] {
        &self.instruments
    }

    /// Position in the setlist, always equal to the entry's index
    pub fn order(&self) -> usize {
        self.order
    }

    /// True when export has to rewrite the file instead of copying it
    pub fn has_edits(&self) -> bool {
        self.title_edited() || self.title_lines.iter().any(TitleLine::title_edited)
    }

    pub(crate) fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    /// Edit one title line and rebuild the instrument list from the lines.
    /// Returns false when the line does not exist.
    pub(crate) fn set_title_line(&mut self, line_index: usize, text: &str) -> bool {
        let Some(line) = self.title_lines.get_mut(line_index) else {
            return false;
        };
        line.set_text(text);
        self.instruments = collect_line_instruments(&self.title_lines);
        true
    }

    pub(crate) fn set_order(&mut self, order: usize) {
        self.order = order;
    }
}
