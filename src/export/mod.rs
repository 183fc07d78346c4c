mod browser;
mod docx;

pub use browser::{find_browser, ChromeBackend, ChromePage, PdfBackend, BROWSER_ENV};
pub use docx::PandocConverter;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::render::{render_page_with_layout, PageLayout, RenderOptions};

pub const DEFAULT_GRACE: Duration = Duration::from_millis(3000);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum ExportFormat {
    #[default]
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Docx => "docx",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Docx => "Word",
        }
    }

    pub fn all() -> &'static [ExportFormat] {
        &[Self::Pdf, Self::Docx]
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No Chromium-based browser found; set {var} or pass --browser", var = BROWSER_ENV)]
    BrowserNotFound,
    #[error("Browser exited with {status}: {stderr}")]
    BrowserFailed { status: String, stderr: String },
    #[error("Printing did not finish within {0:?}")]
    Timeout(Duration),
    #[error("No output was produced at {0}")]
    MissingOutput(PathBuf),
    #[error("{0} is not installed")]
    ToolNotFound(String),
    #[error("{tool} failed: {stderr}")]
    ToolFailed { tool: String, stderr: String },
    #[error("Could not start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Where the output goes when no explicit path is given: next to the source.
pub fn default_output_path(source: &Path, format: ExportFormat) -> PathBuf {
    source.with_extension(format.extension())
}

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Browser executable; discovered when unset.
    pub browser: Option<PathBuf>,
    /// Time given to Mermaid and MathJax before capture.
    pub grace: Duration,
    pub timeout: Duration,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            browser: None,
            grace: DEFAULT_GRACE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Converts Markdown files into print formats.
pub struct Exporter<B: PdfBackend = ChromeBackend> {
    backend: B,
    pandoc: PandocConverter,
    layout: PageLayout,
    grace: Duration,
}

impl Exporter<ChromeBackend> {
    pub fn new(options: ExportOptions) -> Self {
        let backend = ChromeBackend::new(options.browser, options.timeout);
        Self {
            backend,
            pandoc: PandocConverter::new("pandoc", options.timeout),
            layout: PageLayout::default(),
            grace: options.grace,
        }
    }
}

impl<B: PdfBackend> Exporter<B> {
    pub fn with_backend(backend: B, grace: Duration) -> Self {
        Self {
            backend,
            pandoc: PandocConverter::default(),
            layout: PageLayout::default(),
            grace,
        }
    }

    pub fn with_pandoc(mut self, pandoc: PandocConverter) -> Self {
        self.pandoc = pandoc;
        self
    }

    pub fn with_layout(mut self, layout: PageLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Convert one file, returning the path written.
    pub async fn export(
        &self,
        source: &Path,
        output: Option<&Path>,
        format: ExportFormat,
    ) -> Result<PathBuf, ExportError> {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_output_path(source, format));
        tracing::info!("Converting {:?} to {:?}", source, output);

        let markdown = tokio::fs::read_to_string(source)
            .await
            .map_err(|e| ExportError::Read {
                path: source.to_path_buf(),
                source: e,
            })?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ExportError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        match format {
            ExportFormat::Pdf => self.print_pdf(source, &markdown, &output).await?,
            ExportFormat::Docx => self.pandoc.convert(source, &output).await?,
        }

        tracing::info!("Wrote {:?}", output);
        Ok(output)
    }

    /// Like [`Exporter::export`] but never fails: errors are logged and
    /// reported as `false`.
    pub async fn convert(&self, source: &Path, output: Option<&Path>, format: ExportFormat) -> bool {
        match self.export(source, output, format).await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("Failed to convert {:?}: {}", source, e);
                false
            }
        }
    }

    async fn print_pdf(&self, source: &Path, markdown: &str, output: &Path) -> Result<(), ExportError> {
        let base_dir = source
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .or_else(|| std::env::current_dir().ok());
        let html = render_page_with_layout(
            markdown,
            &RenderOptions::default(),
            base_dir.as_deref(),
            &self.layout,
        );

        let mut page = self.backend.load(&html, base_dir.as_deref()).await?;
        self.backend.settle(&mut page, self.grace).await?;
        self.backend.print(page, output).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PdfBackend for Recorder {
        type Page = String;

        async fn load(&self, html: &str, _base_dir: Option<&Path>) -> Result<String, ExportError> {
            self.calls.lock().unwrap().push("load".into());
            Ok(html.to_string())
        }

        async fn settle(&self, _page: &mut String, grace: Duration) -> Result<(), ExportError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.calls
                .lock()
                .unwrap()
                .push(format!("settle {}", grace.as_millis()));
            Ok(())
        }

        async fn print(&self, page: String, output: &Path) -> Result<(), ExportError> {
            self.calls.lock().unwrap().push("print".into());
            std::fs::write(output, page).map_err(|source| ExportError::Write {
                path: output.to_path_buf(),
                source,
            })
        }
    }

    #[test]
    fn test_default_output_path() {
        assert_eq!(
            default_output_path(Path::new("notes/Report.md"), ExportFormat::Pdf),
            PathBuf::from("notes/Report.pdf")
        );
        assert_eq!(
            default_output_path(Path::new("a.MD"), ExportFormat::Docx),
            PathBuf::from("a.docx")
        );
    }

    #[tokio::test]
    async fn test_steps_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.md");
        std::fs::write(&source, "# Title\n\n```mermaid\ngraph TD;\nA-->B;\n```\n").unwrap();

        let exporter = Exporter::with_backend(Recorder::default(), Duration::from_millis(1500));
        let output = exporter.export(&source, None, ExportFormat::Pdf).await.unwrap();

        assert_eq!(output, dir.path().join("doc.pdf"));
        assert_eq!(exporter.backend().calls(), ["load", "settle 1500", "print"]);

        let html = std::fs::read_to_string(&output).unwrap();
        assert!(html.contains("<div class=\"mermaid\">"));
        assert!(html.contains("size: A4"));
    }

    #[tokio::test]
    async fn test_explicit_output_creates_directory() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.md");
        std::fs::write(&source, "hello").unwrap();
        let target = dir.path().join("out/nested/doc.pdf");

        let exporter = Exporter::with_backend(Recorder::default(), DEFAULT_GRACE);
        let written = exporter
            .export(&source, Some(&target), ExportFormat::Pdf)
            .await
            .unwrap();
        assert_eq!(written, target);
        assert!(target.is_file());
    }

    #[tokio::test]
    async fn test_unreadable_source_never_reaches_backend() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = Exporter::with_backend(Recorder::default(), DEFAULT_GRACE);

        let err = exporter
            .export(&dir.path().join("missing.md"), None, ExportFormat::Pdf)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Read { .. }));
        assert!(exporter.backend().calls().is_empty());

        assert!(
            !exporter
                .convert(&dir.path().join("missing.md"), None, ExportFormat::Pdf)
                .await
        );
    }

    #[tokio::test]
    async fn test_docx_uses_pandoc() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("doc.md");
        std::fs::write(&source, "hello").unwrap();

        let exporter = Exporter::with_backend(Recorder::default(), DEFAULT_GRACE).with_pandoc(
            PandocConverter::new(dir.path().join("missing-pandoc"), DEFAULT_TIMEOUT),
        );
        let err = exporter
            .export(&source, None, ExportFormat::Docx)
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::ToolNotFound(_)));
        assert!(exporter.backend().calls().is_empty());
    }
}
