use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use mdpress::batch::{run_batch, BatchEvent, ExportRequest, ExportWorker, FileQueue};
use mdpress::export::{ExportError, ExportFormat, Exporter, PdfBackend};
use tokio::sync::mpsc;

/// Writes a stub PDF and records the order of calls.
#[derive(Clone, Default)]
struct StubPrinter {
    log: Arc<Mutex<Vec<String>>>,
}

impl StubPrinter {
    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl PdfBackend for StubPrinter {
    type Page = String;

    async fn load(&self, html: &str, _base_dir: Option<&Path>) -> Result<String, ExportError> {
        self.log.lock().unwrap().push("load".to_string());
        Ok(html.to_string())
    }

    async fn settle(&self, _page: &mut String, _grace: Duration) -> Result<(), ExportError> {
        self.log.lock().unwrap().push("settle".to_string());
        Ok(())
    }

    async fn print(&self, _page: String, output: &Path) -> Result<(), ExportError> {
        self.log.lock().unwrap().push("print".to_string());
        std::fs::write(output, b"%PDF-1.4\n%stub\n").map_err(|source| ExportError::Write {
            path: output.to_path_buf(),
            source,
        })
    }
}

fn write_sources(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, format!("# {name}\n\nSome *text*.\n")).unwrap();
            path
        })
        .collect()
}

#[tokio::test]
async fn test_one_unreadable_file_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut paths = write_sources(dir.path(), &["one.md", "two.md", "four.md"]);
    paths.insert(2, dir.path().join("three.md")); // never written

    let mut queue = FileQueue::new();
    assert_eq!(queue.add_paths(paths.clone()), 4);

    let printer = StubPrinter::default();
    let exporter = Exporter::with_backend(printer.clone(), Duration::from_millis(10));
    let mut events = Vec::new();
    let summary = run_batch(&exporter, &queue, ExportFormat::Pdf, |e| events.push(e)).await;

    assert_eq!(summary.succeeded, 3);
    assert_eq!(summary.failed, 1);
    for name in ["one.pdf", "two.pdf", "four.pdf"] {
        assert!(dir.path().join(name).is_file(), "{name} missing");
    }
    assert!(!dir.path().join("three.pdf").exists());

    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Progress(p) => Some(*p),
            _ => None,
        })
        .collect();
    assert_eq!(progress, [25, 50, 75, 100]);

    let finished: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            BatchEvent::Finished { ok, .. } => Some(*ok),
            _ => None,
        })
        .collect();
    assert_eq!(finished, [true, true, false, true]);
    assert_eq!(events.last(), Some(&BatchEvent::Completed(summary)));

    // Three successful conversions, each load -> settle -> print.
    assert_eq!(printer.log().len(), 9);
    assert!(printer.log().chunks(3).all(|c| c == ["load", "settle", "print"]));
}

#[tokio::test]
async fn test_event_order_per_file() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sources(dir.path(), &["only.md"]);
    let mut queue = FileQueue::new();
    queue.add_paths(paths.clone());

    let exporter = Exporter::with_backend(StubPrinter::default(), Duration::ZERO);
    let mut events = Vec::new();
    run_batch(&exporter, &queue, ExportFormat::Pdf, |e| events.push(e)).await;

    assert_eq!(
        events,
        [
            BatchEvent::Started {
                index: 0,
                path: paths[0].clone()
            },
            BatchEvent::Finished {
                index: 0,
                path: paths[0].clone(),
                ok: true
            },
            BatchEvent::Progress(100),
            BatchEvent::Completed(mdpress::batch::BatchSummary {
                succeeded: 1,
                failed: 0
            }),
        ]
    );
}

#[tokio::test]
async fn test_output_directory_is_used() {
    let src = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let paths = write_sources(src.path(), &["a.md", "b.md"]);

    let mut queue = FileQueue::new();
    queue.add_paths(paths);
    queue.set_output_dir(Some(out.path().to_path_buf()));

    let exporter = Exporter::with_backend(StubPrinter::default(), Duration::ZERO);
    let summary = run_batch(&exporter, &queue, ExportFormat::Pdf, |_| {}).await;

    assert_eq!(summary.succeeded, 2);
    assert!(out.path().join("a.pdf").is_file());
    assert!(out.path().join("b.pdf").is_file());
    assert!(!src.path().join("a.pdf").exists());
}

#[tokio::test]
async fn test_worker_streams_events() {
    let dir = tempfile::tempdir().unwrap();
    let paths = write_sources(dir.path(), &["x.md", "y.md"]);

    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let exporter = Exporter::with_backend(StubPrinter::default(), Duration::ZERO);
    let worker = tokio::spawn(ExportWorker::new(exporter, request_rx, event_tx).run());

    request_tx
        .send(ExportRequest::Batch {
            paths,
            output_dir: None,
            format: ExportFormat::Pdf,
        })
        .unwrap();
    drop(request_tx);

    let mut last = None;
    while let Some(event) = event_rx.recv().await {
        last = Some(event);
    }
    worker.await.unwrap();

    match last {
        Some(BatchEvent::Completed(summary)) => {
            assert_eq!(summary.succeeded, 2);
            assert_eq!(summary.failed, 0);
        }
        other => panic!("unexpected final event: {other:?}"),
    }
}
