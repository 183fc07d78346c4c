use std::path::PathBuf;

use dioxus::prelude::*;

use crate::batch::FileQueue;
use crate::config::Settings;
use crate::export::ExportFormat;

use super::EditorSession;

#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum View {
    #[default]
    Queue,
    Editor,
}

pub static VIEW: GlobalSignal<View> = Signal::global(|| View::Queue);

/// Current effective theme
pub static IS_DARK_MODE: GlobalSignal<bool> = Signal::global(|| true);

// Converter
pub static QUEUE: GlobalSignal<FileQueue> = Signal::global(FileQueue::new);
pub static SELECTED_FILES: GlobalSignal<Vec<usize>> = Signal::global(Vec::new);
pub static EXPORT_FORMAT: GlobalSignal<ExportFormat> = Signal::global(|| ExportFormat::Pdf);
pub static CONVERTING: GlobalSignal<bool> = Signal::global(|| false);
pub static BATCH_PROGRESS: GlobalSignal<u8> = Signal::global(|| 0);
pub static BATCH_STATUS: GlobalSignal<String> = Signal::global(|| "Ready".to_string());
pub static FAILED_FILES: GlobalSignal<Vec<PathBuf>> = Signal::global(Vec::new);

// Editor
pub static SESSION: GlobalSignal<EditorSession> = Signal::global(EditorSession::default);
pub static PREVIEW_HTML: GlobalSignal<String> = Signal::global(String::new);
pub static CHAT_INPUT: GlobalSignal<String> = Signal::global(String::new);
pub static FIND_TEXT: GlobalSignal<String> = Signal::global(String::new);
pub static REPLACE_TEXT: GlobalSignal<String> = Signal::global(String::new);

#[derive(Clone, Debug, PartialEq)]
pub enum EditorStatus {
    None,
    Info(String),
    Error(String),
}

pub static EDITOR_STATUS: GlobalSignal<EditorStatus> = Signal::global(|| EditorStatus::None);

// Settings
pub static SETTINGS: GlobalSignal<Settings> = Signal::global(Settings::default);
pub static SHOW_SETTINGS: GlobalSignal<bool> = Signal::global(|| false);
