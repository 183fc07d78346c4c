mod queue;

pub use queue::*;

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::export::{ExportFormat, ExportOptions, Exporter, PdfBackend};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started { index: usize, path: PathBuf },
    Finished { index: usize, path: PathBuf, ok: bool },
    /// Whole-batch progress in percent.
    Progress(u8),
    Completed(BatchSummary),
}

#[derive(Debug, Clone)]
pub enum ExportRequest {
    Batch {
        paths: Vec<PathBuf>,
        output_dir: Option<PathBuf>,
        format: ExportFormat,
    },
}

fn percent(done: usize, total: usize) -> u8 {
    (done * 100 / total.max(1)).min(100) as u8
}

/// Convert every queued file in order. A failing file is logged and
/// counted, then the batch moves on.
pub async fn run_batch<B, F>(
    exporter: &Exporter<B>,
    queue: &FileQueue,
    format: ExportFormat,
    mut on_event: F,
) -> BatchSummary
where
    B: PdfBackend,
    F: FnMut(BatchEvent),
{
    let total = queue.len();
    let mut summary = BatchSummary::default();
    tracing::info!("Starting batch of {} file(s) as {}", total, format);

    for (index, path) in queue.files().iter().enumerate() {
        on_event(BatchEvent::Started {
            index,
            path: path.clone(),
        });

        let output = queue.output_path_for(path, format);
        let ok = exporter.convert(path, output.as_deref(), format).await;
        if ok {
            summary.succeeded += 1;
        } else {
            summary.failed += 1;
        }

        on_event(BatchEvent::Finished {
            index,
            path: path.clone(),
            ok,
        });
        on_event(BatchEvent::Progress(percent(index + 1, total)));
    }

    tracing::info!(
        "Batch finished: {} converted, {} failed",
        summary.succeeded,
        summary.failed
    );
    on_event(BatchEvent::Completed(summary));
    summary
}

pub struct ExportWorker<B: PdfBackend> {
    exporter: Exporter<B>,
    request_rx: mpsc::UnboundedReceiver<ExportRequest>,
    event_tx: mpsc::UnboundedSender<BatchEvent>,
}

impl<B: PdfBackend> ExportWorker<B> {
    pub fn new(
        exporter: Exporter<B>,
        request_rx: mpsc::UnboundedReceiver<ExportRequest>,
        event_tx: mpsc::UnboundedSender<BatchEvent>,
    ) -> Self {
        Self {
            exporter,
            request_rx,
            event_tx,
        }
    }

    pub async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            match request {
                ExportRequest::Batch {
                    paths,
                    output_dir,
                    format,
                } => {
                    let mut queue = FileQueue::new();
                    queue.add_paths(paths);
                    queue.set_output_dir(output_dir);

                    let tx = self.event_tx.clone();
                    run_batch(&self.exporter, &queue, format, |event| {
                        let _ = tx.send(event);
                    })
                    .await;
                }
            }
        }
    }
}

/// Start the export thread. Requests go in, progress events come out.
pub fn spawn_export_worker(
    options: ExportOptions,
) -> (
    mpsc::UnboundedSender<ExportRequest>,
    mpsc::UnboundedReceiver<BatchEvent>,
) {
    let (request_tx, request_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(ExportWorker::new(Exporter::new(options), request_rx, event_tx).run()),
        Err(e) => tracing::error!("Could not start export worker: {}", e),
    });

    (request_tx, event_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(0, 0), 0);
    }

    #[test]
    fn test_summary_total() {
        let summary = BatchSummary {
            succeeded: 2,
            failed: 1,
        };
        assert_eq!(summary.total(), 3);
    }
}
