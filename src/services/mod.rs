use std::path::{Path, PathBuf};

use dioxus::prelude::*;
use tokio::sync::mpsc;

use crate::batch::{spawn_export_worker, BatchEvent, ExportRequest};
use crate::export::ExportOptions;
use crate::llm::{spawn_chat_worker, ChatError, ChatJob, ChatOutcome};
use crate::state::*;

pub type ChatSender = mpsc::UnboundedSender<ChatJob>;
pub type ExportSender = mpsc::UnboundedSender<ExportRequest>;

pub fn init_services() -> (ChatSender, ExportSender) {
    let (chat_tx, chat_rx) = spawn_chat_worker();
    let (export_tx, export_rx) = spawn_export_worker(ExportOptions::default());

    spawn(async move {
        handle_chat_outcomes(chat_rx).await;
    });
    spawn(async move {
        handle_batch_events(export_rx).await;
    });

    (chat_tx, export_tx)
}

async fn handle_chat_outcomes(mut rx: mpsc::UnboundedReceiver<ChatOutcome>) {
    while let Some(outcome) = rx.recv().await {
        let resolution = SESSION.write().finish_chat(outcome);
        if let ChatResolution::Replied {
            buffer_replaced: true,
        } = resolution
        {
            refresh_preview();
        }
    }
}

async fn handle_batch_events(mut rx: mpsc::UnboundedReceiver<BatchEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            BatchEvent::Started { index, path } => {
                let total = QUEUE.read().len();
                *BATCH_STATUS.write() =
                    format!("Converting {} ({}/{})", file_name(&path), index + 1, total);
            }
            BatchEvent::Finished { path, ok: false, .. } => {
                FAILED_FILES.write().push(path);
            }
            BatchEvent::Finished { .. } => {}
            BatchEvent::Progress(percent) => *BATCH_PROGRESS.write() = percent,
            BatchEvent::Completed(summary) => {
                *CONVERTING.write() = false;
                *BATCH_STATUS.write() = if summary.failed == 0 {
                    format!("Done: {} file(s) converted", summary.succeeded)
                } else {
                    format!(
                        "Done: {} converted, {} failed",
                        summary.succeeded, summary.failed
                    )
                };
            }
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Queue every file for conversion in the export worker.
pub fn start_conversion(tx: &ExportSender) {
    let queue = QUEUE.read().clone();
    if queue.is_empty() || *CONVERTING.read() {
        return;
    }

    *CONVERTING.write() = true;
    *BATCH_PROGRESS.write() = 0;
    FAILED_FILES.write().clear();
    *BATCH_STATUS.write() = "Starting...".to_string();

    let request = ExportRequest::Batch {
        paths: queue.files().to_vec(),
        output_dir: queue.output_dir().map(Path::to_path_buf),
        format: *EXPORT_FORMAT.read(),
    };
    if tx.send(request).is_err() {
        *CONVERTING.write() = false;
        *BATCH_STATUS.write() = "Export worker is not running".to_string();
    }
}

/// Send the chat input to the assistant. A missing key opens the settings
/// dialog instead.
pub fn send_chat(tx: &ChatSender) {
    let input = CHAT_INPUT.read().clone();
    let settings = SETTINGS.read().clone();
    let result = SESSION.write().submit_chat(&input, &settings, tx);

    match result {
        Ok(()) => CHAT_INPUT.write().clear(),
        Err(ChatError::MissingKey(provider)) => {
            *EDITOR_STATUS.write() =
                EditorStatus::Error(format!("Enter an API key for {} first", provider));
            *SHOW_SETTINGS.write() = true;
        }
        Err(ChatError::EmptyPrompt) | Err(ChatError::Busy) => {}
        Err(e) => *EDITOR_STATUS.write() = EditorStatus::Error(e.to_string()),
    }
}

pub fn refresh_preview() {
    let html = SESSION.read().preview_html();
    *PREVIEW_HTML.write() = html;
}

/// Switch to the editor with `path` loaded, or an empty buffer.
pub fn open_in_editor(path: Option<PathBuf>) {
    let document = match path {
        Some(path) => match Document::open(&path) {
            Ok(document) => document,
            Err(e) => {
                tracing::error!("{}", e);
                *BATCH_STATUS.write() = e.to_string();
                return;
            }
        },
        None => Document::new(),
    };

    *SESSION.write() = EditorSession::new(document);
    *EDITOR_STATUS.write() = EditorStatus::None;
    CHAT_INPUT.write().clear();
    refresh_preview();
    *VIEW.write() = View::Editor;
}
