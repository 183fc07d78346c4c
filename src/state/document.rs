use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("Could not open {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not save {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("The document has not been saved yet; choose a file name")]
    NoPath,
}

/// Formatting snippets offered on the editor toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snippet {
    Bold,
    Italic,
    Heading1,
    Heading2,
    Link,
    Image,
    Code,
    Mermaid,
}

impl Snippet {
    pub const ALL: [Snippet; 8] = [
        Snippet::Bold,
        Snippet::Italic,
        Snippet::Heading1,
        Snippet::Heading2,
        Snippet::Link,
        Snippet::Image,
        Snippet::Code,
        Snippet::Mermaid,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Bold => "Bold",
            Self::Italic => "Italic",
            Self::Heading1 => "H1",
            Self::Heading2 => "H2",
            Self::Link => "Link",
            Self::Image => "Image",
            Self::Code => "Code",
            Self::Mermaid => "Mermaid",
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            Self::Bold => "**Bold**",
            Self::Italic => "*Italic*",
            Self::Heading1 => "\n# ",
            Self::Heading2 => "\n## ",
            Self::Link => "[](url)",
            Self::Image => "![](url)",
            Self::Code => "\n```\n\n```\n",
            Self::Mermaid => "\n```mermaid\ngraph TD;\nA-->B;\n```\n",
        }
    }
}

/// A Markdown buffer, optionally backed by a file.
///
/// Cursor and selection are byte offsets into `text`, always on char
/// boundaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    path: Option<PathBuf>,
    text: String,
    cursor: usize,
    selection: Option<Range<usize>>,
    dirty: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DocumentError> {
        let path = path.into();
        let text = fs::read_to_string(&path).map_err(|source| DocumentError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path: Some(path),
            text,
            ..Self::default()
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn title(&self) -> String {
        match &self.path {
            Some(path) => format!("Editor - {}", path.display()),
            None => "Editor - New File".to_string(),
        }
    }

    /// Directory used to resolve relative links in the preview.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.path
            .as_ref()
            .and_then(|p| p.parent())
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok())
    }

    /// Replace the whole buffer, e.g. after typing or an assistant rewrite.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text == self.text {
            return;
        }
        self.text = text;
        self.cursor = self.floor_boundary(self.cursor.min(self.text.len()));
        self.selection = None;
        self.dirty = true;
    }

    pub fn set_cursor(&mut self, offset: usize) {
        self.cursor = self.floor_boundary(offset.min(self.text.len()));
        self.selection = None;
    }

    /// Position cursor from a UTF-16 index as reported by web text inputs.
    pub fn set_cursor_utf16(&mut self, index: usize) {
        let offset = self.byte_offset_utf16(index);
        self.set_cursor(offset);
    }

    /// Byte offset of a UTF-16 code unit index.
    pub fn byte_offset_utf16(&self, index: usize) -> usize {
        let mut units = 0;
        for (byte, c) in self.text.char_indices() {
            if units >= index {
                return byte;
            }
            units += c.len_utf16();
        }
        self.text.len()
    }

    /// UTF-16 code unit index of a byte offset.
    pub fn utf16_index(&self, offset: usize) -> usize {
        let offset = self.floor_boundary(offset.min(self.text.len()));
        self.text[..offset].encode_utf16().count()
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selection.as_ref().map(|r| &self.text[r.clone()])
    }

    pub fn select(&mut self, range: Range<usize>) {
        let start = self.floor_boundary(range.start.min(self.text.len()));
        let end = self.floor_boundary(range.end.min(self.text.len())).max(start);
        self.selection = Some(start..end);
        self.cursor = end;
    }

    /// Insert at the cursor, replacing the selection if there is one.
    pub fn insert_text(&mut self, insert: &str) {
        let range = self.selection.take().unwrap_or(self.cursor..self.cursor);
        self.text.replace_range(range.clone(), insert);
        self.cursor = range.start + insert.len();
        self.dirty = true;
    }

    pub fn insert_snippet(&mut self, snippet: Snippet) {
        self.insert_text(snippet.text());
    }

    /// Select the next match after the cursor, wrapping around once.
    pub fn find_next(&mut self, needle: &str) -> Option<Range<usize>> {
        if needle.is_empty() {
            return None;
        }
        let from = self.cursor.min(self.text.len());
        let found = self.text[from..]
            .find(needle)
            .map(|i| i + from)
            .or_else(|| self.text.find(needle))?;

        let range = found..found + needle.len();
        self.select(range.clone());
        Some(range)
    }

    /// Replace the current selection if it equals `needle`, then move on to
    /// the next match. Returns whether a replacement happened.
    pub fn replace_selection(&mut self, needle: &str, replacement: &str) -> bool {
        let replaced = !needle.is_empty() && self.selected_text() == Some(needle);
        if replaced {
            self.insert_text(replacement);
        }
        self.find_next(needle);
        replaced
    }

    /// Replace every occurrence, returning how many were replaced.
    pub fn replace_all(&mut self, needle: &str, replacement: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        let count = self.text.matches(needle).count();
        if count > 0 {
            let text = self.text.replace(needle, replacement);
            self.set_text(text);
        }
        count
    }

    pub fn save(&mut self) -> Result<(), DocumentError> {
        let path = self.path.clone().ok_or(DocumentError::NoPath)?;
        fs::write(&path, &self.text).map_err(|source| DocumentError::Write { path, source })?;
        self.dirty = false;
        tracing::info!("Saved {:?}", self.path);
        Ok(())
    }

    pub fn save_as(&mut self, path: impl Into<PathBuf>) -> Result<(), DocumentError> {
        let previous = self.path.replace(path.into());
        let result = self.save();
        if result.is_err() {
            self.path = previous;
        }
        result
    }

    fn floor_boundary(&self, mut offset: usize) -> usize {
        while offset > 0 && !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}
