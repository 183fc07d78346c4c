use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use super::ExportError;

pub const BROWSER_ENV: &str = "MDPRESS_BROWSER";

const BROWSER_CANDIDATES: [&str; 7] = [
    "chromium",
    "chromium-browser",
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "microsoft-edge",
    "msedge",
];

const MACOS_BROWSERS: [&str; 3] = [
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

/// A print engine that turns a rendered page into a PDF.
///
/// The exporter drives the three steps in order and awaits each one.
pub trait PdfBackend: Send + Sync {
    type Page: Send;

    /// Make the page available to the engine.
    fn load(
        &self,
        html: &str,
        base_dir: Option<&Path>,
    ) -> impl Future<Output = Result<Self::Page, ExportError>> + Send;

    /// Give client-side scripts time to finish before capture.
    fn settle(
        &self,
        page: &mut Self::Page,
        grace: Duration,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;

    fn print(
        &self,
        page: Self::Page,
        output: &Path,
    ) -> impl Future<Output = Result<(), ExportError>> + Send;
}

/// Prints through a headless Chromium-family browser.
#[derive(Debug, Clone)]
pub struct ChromeBackend {
    browser: Option<PathBuf>,
    timeout: Duration,
}

/// A page written to a temporary file. The file is removed on drop.
#[derive(Debug)]
pub struct ChromePage {
    file: tempfile::NamedTempFile,
    budget: Duration,
}

impl ChromePage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl ChromeBackend {
    pub fn new(browser: Option<PathBuf>, timeout: Duration) -> Self {
        Self { browser, timeout }
    }

    fn resolve_browser(&self) -> Result<PathBuf, ExportError> {
        find_browser(self.browser.as_deref()).ok_or(ExportError::BrowserNotFound)
    }

    fn print_args(page: &ChromePage, output: &Path) -> Vec<String> {
        vec![
            "--headless=new".to_string(),
            "--disable-gpu".to_string(),
            "--no-first-run".to_string(),
            "--allow-file-access-from-files".to_string(),
            "--no-pdf-header-footer".to_string(),
            "--run-all-compositor-stages-before-draw".to_string(),
            format!("--virtual-time-budget={}", page.budget.as_millis()),
            format!("--print-to-pdf={}", output.display()),
            file_url(page.path()),
        ]
    }
}

impl PdfBackend for ChromeBackend {
    type Page = ChromePage;

    async fn load(&self, html: &str, base_dir: Option<&Path>) -> Result<ChromePage, ExportError> {
        // Next to the source when possible, so file:// access stays within one directory.
        let mut file = base_dir
            .and_then(|dir| page_file().tempfile_in(dir).ok())
            .map(Ok)
            .unwrap_or_else(|| page_file().tempfile())
            .map_err(|source| ExportError::Write {
                path: std::env::temp_dir(),
                source,
            })?;

        file.write_all(html.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|source| ExportError::Write {
                path: file.path().to_path_buf(),
                source,
            })?;

        tracing::debug!("Loaded page into {:?}", file.path());
        Ok(ChromePage {
            file,
            budget: Duration::ZERO,
        })
    }

    async fn settle(&self, page: &mut ChromePage, grace: Duration) -> Result<(), ExportError> {
        // The browser runs scripts against virtual time, so the wait happens inside it.
        page.budget = grace;
        Ok(())
    }

    async fn print(&self, page: ChromePage, output: &Path) -> Result<(), ExportError> {
        let browser = self.resolve_browser()?;
        tracing::debug!("Printing {:?} with {:?}", page.path(), browser);

        // A leftover file from an earlier run must not count as output.
        match tokio::fs::remove_file(output).await {
            Ok(()) => tracing::debug!("Removed previous output {:?}", output),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ExportError::Write {
                    path: output.to_path_buf(),
                    source,
                })
            }
        }

        let run = Command::new(&browser)
            .args(Self::print_args(&page, output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let result = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ExportError::Timeout(self.timeout))?
            .map_err(|source| ExportError::Spawn {
                program: browser.clone(),
                source,
            })?;

        if !result.status.success() {
            return Err(ExportError::BrowserFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        match tokio::fs::metadata(output).await {
            Ok(meta) if meta.len() > 0 => Ok(()),
            _ => Err(ExportError::MissingOutput(output.to_path_buf())),
        }
    }
}

fn page_file() -> tempfile::Builder<'static, 'static> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(".mdpress-").suffix(".html");
    builder
}

fn file_url(path: &Path) -> String {
    reqwest::Url::from_file_path(path)
        .map(|url| url.to_string())
        .unwrap_or_else(|_| format!("file://{}", path.display()))
}

/// Locate a browser able to print headless.
///
/// An explicit path wins, then `MDPRESS_BROWSER`, then well-known names on
/// `PATH`, then standard macOS application bundles.
pub fn find_browser(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = std::env::var_os(BROWSER_ENV).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let path_var = std::env::var_os("PATH").unwrap_or_default();
    find_in_dirs(std::env::split_paths(&path_var), &BROWSER_CANDIDATES).or_else(|| {
        MACOS_BROWSERS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
    })
}

fn find_in_dirs(dirs: impl Iterator<Item = PathBuf>, names: &[&str]) -> Option<PathBuf> {
    let dirs: Vec<PathBuf> = dirs.collect();
    names.iter().find_map(|name| {
        dirs.iter().find_map(|dir| {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
            let exe = candidate.with_extension("exe");
            exe.is_file().then_some(exe)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_browser_wins() {
        let path = Path::new("/opt/custom/chrome");
        assert_eq!(find_browser(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn test_candidate_order_beats_path_order() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("google-chrome"), "").unwrap();
        std::fs::write(second.path().join("chromium"), "").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        let found = find_in_dirs(dirs.into_iter(), &BROWSER_CANDIDATES);
        assert_eq!(found, Some(second.path().join("chromium")));
    }

    #[test]
    fn test_no_candidates() {
        let empty = tempfile::tempdir().unwrap();
        let found = find_in_dirs(std::iter::once(empty.path().to_path_buf()), &BROWSER_CANDIDATES);
        assert_eq!(found, None);
    }

    #[tokio::test]
    async fn test_page_file_lives_until_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ChromeBackend::new(None, Duration::from_secs(1));
        let mut page = backend.load("<p>hi</p>", Some(dir.path())).await.unwrap();
        backend
            .settle(&mut page, Duration::from_millis(3000))
            .await
            .unwrap();

        let path = page.path().to_path_buf();
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<p>hi</p>");

        let args = ChromeBackend::print_args(&page, Path::new("/tmp/out.pdf"));
        assert!(args.contains(&"--virtual-time-budget=3000".to_string()));
        assert!(args.contains(&"--print-to-pdf=/tmp/out.pdf".to_string()));
        assert!(args.last().unwrap().starts_with("file://"));

        drop(page);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_browser_binary_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ChromeBackend::new(
            Some(dir.path().join("no-such-browser")),
            Duration::from_secs(5),
        );
        let page = backend.load("<p>x</p>", None).await.unwrap();
        let err = backend
            .print(page, &dir.path().join("out.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExportError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stale_output_is_not_success() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("doc.pdf");
        std::fs::write(&output, "%PDF-old").unwrap();

        // Exits 0 without printing anything.
        let backend = ChromeBackend::new(Some(PathBuf::from("true")), Duration::from_secs(5));
        let page = backend.load("<p>x</p>", Some(dir.path())).await.unwrap();
        let err = backend.print(page, &output).await.unwrap_err();

        assert!(matches!(err, ExportError::MissingOutput(_)));
        assert!(!output.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_browser_failure() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ChromeBackend::new(Some(PathBuf::from("false")), Duration::from_secs(5));
        let page = backend.load("<p>x</p>", Some(dir.path())).await.unwrap();
        let err = backend
            .print(page, &dir.path().join("out.pdf"))
            .await
            .unwrap_err();

        assert!(matches!(err, ExportError::BrowserFailed { .. }), "got {}", err);
    }
}
