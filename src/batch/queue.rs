use std::path::{Path, PathBuf};

use crate::export::ExportFormat;

/// Ordered, duplicate-free list of Markdown files waiting for conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileQueue {
    files: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
}

pub fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
}

impl FileQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Append Markdown files not already queued. Returns how many were added.
    pub fn add_paths<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let before = self.files.len();
        for path in paths {
            let path = path.into();
            if !is_markdown(&path) {
                tracing::debug!("Skipping non-Markdown file {:?}", path);
                continue;
            }
            if !self.files.contains(&path) {
                self.files.push(path);
            }
        }
        self.files.len() - before
    }

    /// Remove the entries at `indices`; out-of-range indices are ignored.
    pub fn remove(&mut self, indices: &[usize]) {
        let mut index = 0;
        self.files.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    pub fn set_output_dir(&mut self, dir: Option<PathBuf>) {
        self.output_dir = dir;
    }

    /// Target for `source`, or `None` to write next to the source.
    pub fn output_path_for(&self, source: &Path, format: ExportFormat) -> Option<PathBuf> {
        let dir = self.output_dir.as_ref()?;
        let mut name = source.file_stem()?.to_os_string();
        name.push(".");
        name.push(format.extension());
        Some(dir.join(name))
    }
}
