use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use uuid::Uuid;

use super::{Debouncer, Document};
use crate::config::Settings;
use crate::llm::{build_prompt, extract_update, ChatError, ChatJob, ChatMessage, ChatOutcome};
use crate::render::{render_page, RenderOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    Error,
}

/// One line of the chat pane.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub text: String,
    pub at: DateTime<Local>,
}

impl TranscriptEntry {
    fn new(kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            at: Local::now(),
        }
    }
}

/// What happened when an assistant outcome was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatResolution {
    /// The outcome belongs to a request this session is no longer waiting for.
    Stale,
    Replied { buffer_replaced: bool },
    Failed,
}

/// State of one editor window: buffer, pane toggles and the assistant
/// conversation.
#[derive(Debug, Clone)]
pub struct EditorSession {
    pub document: Document,
    pub preview_visible: bool,
    pub assistant_visible: bool,
    /// Whether assistant replies may overwrite the buffer.
    pub canvas_mode: bool,
    conversation: Vec<ChatMessage>,
    transcript: Vec<TranscriptEntry>,
    pending: Option<Uuid>,
    debounce: Debouncer,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(Document::new())
    }
}

impl EditorSession {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            preview_visible: true,
            assistant_visible: true,
            canvas_mode: true,
            conversation: Vec::new(),
            transcript: Vec::new(),
            pending: None,
            debounce: Debouncer::default(),
        }
    }

    pub fn conversation(&self) -> &[ChatMessage] {
        &self.conversation
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn debouncer(&self) -> &Debouncer {
        &self.debounce
    }

    /// Apply typed text. Returns a preview ticket when a re-render should be
    /// scheduled after the quiet period.
    pub fn edit(&mut self, text: impl Into<String>) -> Option<u64> {
        self.document.set_text(text);
        self.preview_visible.then(|| self.debounce.touch())
    }

    pub fn should_render(&self, ticket: u64) -> bool {
        self.preview_visible && self.debounce.is_current(ticket)
    }

    /// Flip preview visibility; returns the new state. Showing the preview
    /// again should render it right away.
    pub fn toggle_preview(&mut self) -> bool {
        self.preview_visible = !self.preview_visible;
        self.preview_visible
    }

    pub fn toggle_assistant(&mut self) -> bool {
        self.assistant_visible = !self.assistant_visible;
        self.assistant_visible
    }

    pub fn preview_html(&self) -> String {
        let base_dir = self.document.base_dir();
        render_page(
            self.document.text(),
            &RenderOptions::preview(),
            base_dir.as_deref(),
        )
    }

    /// Start an assistant request for `input`.
    ///
    /// Fails without touching the conversation when the input is empty, a
    /// request is already in flight, or the selected provider has no key.
    pub fn begin_chat(&mut self, input: &str, settings: &Settings) -> Result<ChatJob, ChatError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ChatError::EmptyPrompt);
        }
        if self.pending.is_some() {
            return Err(ChatError::Busy);
        }
        let api_key = settings
            .api_key()
            .ok_or(ChatError::MissingKey(settings.provider))?;

        let prompt = build_prompt(input, self.document.text(), self.canvas_mode);
        self.conversation.push(ChatMessage::user(prompt));
        self.transcript
            .push(TranscriptEntry::new(EntryKind::User, input));

        let id = Uuid::new_v4();
        self.pending = Some(id);

        Ok(ChatJob {
            id,
            provider: settings.provider,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            messages: self.conversation.clone(),
        })
    }

    /// Begin a request and hand it to the worker behind `tx`.
    ///
    /// When the worker is gone the request is closed with an inline error,
    /// so the session does not stay busy.
    pub fn submit_chat(
        &mut self,
        input: &str,
        settings: &Settings,
        tx: &mpsc::UnboundedSender<ChatJob>,
    ) -> Result<(), ChatError> {
        let job = self.begin_chat(input, settings)?;
        let id = job.id;
        if tx.send(job).is_err() {
            tracing::error!("Assistant worker is gone; dropping request {}", id);
            self.finish_chat(ChatOutcome {
                id,
                result: Err(ChatError::WorkerStopped),
            });
            return Err(ChatError::WorkerStopped);
        }
        Ok(())
    }

    pub fn finish_chat(&mut self, outcome: ChatOutcome) -> ChatResolution {
        if self.pending != Some(outcome.id) {
            tracing::warn!("Dropping stale assistant reply {}", outcome.id);
            return ChatResolution::Stale;
        }
        self.pending = None;

        match outcome.result {
            Ok(reply) => {
                let update = if self.canvas_mode {
                    extract_update(&reply)
                } else {
                    None
                };
                let buffer_replaced = update.is_some();
                let display = match update {
                    Some(update) => {
                        self.document.set_text(update.content);
                        update.display
                    }
                    None => reply.clone(),
                };

                self.transcript
                    .push(TranscriptEntry::new(EntryKind::Assistant, display));
                self.conversation.push(ChatMessage::assistant(reply));
                ChatResolution::Replied { buffer_replaced }
            }
            Err(e) => {
                self.transcript
                    .push(TranscriptEntry::new(EntryKind::Error, e.to_string()));
                ChatResolution::Failed
            }
        }
    }
}
