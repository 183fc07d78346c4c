use std::ops::Range;

use crate::components::ChatPanel;
use crate::services::{open_in_editor, refresh_preview};
use crate::state::*;
use dioxus::prelude::*;

const EDITOR_ID: &str = "md-editor";

#[component]
pub fn EditorView() -> Element {
    let is_dark = *IS_DARK_MODE.read();
    let session = SESSION.read();
    let preview_visible = session.preview_visible;
    let assistant_visible = session.assistant_visible;
    let text = session.document.text().to_string();
    drop(session);
    let preview_html = PREVIEW_HTML.read().clone();

    let editor_bg = if is_dark {
        "bg-black text-gray-300"
    } else {
        "bg-white text-gray-800"
    };
    let border_class = if is_dark {
        "border-gray-800"
    } else {
        "border-gray-200"
    };

    rsx! {
        div {
            class: "flex-1 flex flex-col min-h-0",

            EditorToolbar {}
            FindBar {}

            div {
                class: "flex-1 flex min-h-0",

                if preview_visible {
                    div {
                        class: "flex-1 border-r {border_class} bg-white",
                        iframe {
                            class: "w-full h-full border-0",
                            srcdoc: "{preview_html}",
                        }
                    }
                }

                div {
                    class: "flex-1 flex flex-col min-w-0",
                    textarea {
                        id: EDITOR_ID,
                        class: "flex-1 w-full p-4 font-mono text-sm leading-6 resize-none focus:outline-none border-0 {editor_bg}",
                        value: "{text}",
                        spellcheck: "false",
                        placeholder: "Write Markdown here...",
                        oninput: move |e| on_edit(e.value()),
                        onkeydown: move |e| {
                            let modifiers = e.data.modifiers();
                            let ctrl = modifiers.contains(Modifiers::CONTROL)
                                || modifiers.contains(Modifiers::META);
                            if ctrl && e.data.key() == Key::Character("s".into()) {
                                e.prevent_default();
                                save_document(false);
                            }
                        },
                    }
                }

                if assistant_visible {
                    div {
                        class: "w-96 border-l {border_class} flex flex-col min-h-0",
                        ChatPanel {}
                    }
                }
            }
        }
    }
}

#[component]
fn EditorToolbar() -> Element {
    let is_dark = *IS_DARK_MODE.read();
    let session = SESSION.read();
    let toggles = [
        ("Preview", session.preview_visible),
        ("Assistant", session.assistant_visible),
        ("Canvas", session.canvas_mode),
    ];
    drop(session);

    let toolbar_bg = if is_dark { "bg-black" } else { "bg-gray-50" };
    let border_class = if is_dark {
        "border-gray-800"
    } else {
        "border-gray-200"
    };
    let button_class = if is_dark {
        "px-2 py-1 text-sm rounded bg-gray-900 hover:bg-gray-800 text-gray-300 transition-colors"
    } else {
        "px-2 py-1 text-sm rounded bg-gray-100 hover:bg-gray-200 text-gray-700 transition-colors"
    };
    let active_class = "px-2 py-1 text-sm rounded bg-blue-600 hover:bg-blue-500 text-white transition-colors";

    rsx! {
        div {
            class: "h-10 {toolbar_bg} border-b {border_class} flex items-center px-3 space-x-1",

            button {
                class: button_class,
                onclick: move |_| *VIEW.write() = View::Queue,
                "Back"
            }
            button {
                class: button_class,
                onclick: move |_| open_in_editor(None),
                "New"
            }
            button {
                class: button_class,
                onclick: move |_| {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Markdown", &["md", "MD"])
                        .pick_file()
                    {
                        open_in_editor(Some(path));
                    }
                },
                "Open"
            }
            button {
                class: button_class,
                onclick: move |_| save_document(false),
                "Save"
            }
            button {
                class: button_class,
                onclick: move |_| save_document(true),
                "Save As"
            }

            div { class: "w-px h-6 bg-gray-700 mx-2" }

            for snippet in Snippet::ALL {
                button {
                    key: "{snippet:?}",
                    class: button_class,
                    onclick: move |_| {
                        spawn(async move {
                            sync_selection().await;
                            SESSION.write().document.insert_snippet(snippet);
                            after_change();
                        });
                    },
                    {snippet.label()}
                }
            }

            div { class: "flex-1" }

            for (label, on) in toggles {
                button {
                    key: "{label}",
                    class: if on { active_class } else { button_class },
                    onclick: move |_| toggle(label),
                    "{label}"
                }
            }

            button {
                class: button_class,
                onclick: move |_| *SHOW_SETTINGS.write() = true,
                title: "Assistant settings",
                "Settings"
            }
        }
    }
}

#[component]
fn FindBar() -> Element {
    let is_dark = *IS_DARK_MODE.read();
    let input_class = if is_dark {
        "px-2 py-1 text-sm rounded border bg-black border-gray-700 text-gray-300 focus:outline-none"
    } else {
        "px-2 py-1 text-sm rounded border bg-white border-gray-300 text-gray-700 focus:outline-none"
    };
    let button_class = if is_dark {
        "px-2 py-1 text-sm rounded bg-gray-900 hover:bg-gray-800 text-gray-300"
    } else {
        "px-2 py-1 text-sm rounded bg-gray-100 hover:bg-gray-200 text-gray-700"
    };
    let border_class = if is_dark {
        "border-gray-800"
    } else {
        "border-gray-200"
    };

    rsx! {
        div {
            class: "h-10 border-b {border_class} flex items-center px-3 space-x-2",

            input {
                class: input_class,
                r#type: "text",
                placeholder: "Find",
                value: "{FIND_TEXT}",
                oninput: move |e| *FIND_TEXT.write() = e.value(),
                onkeydown: move |e| {
                    if e.data.key() == Key::Enter {
                        spawn(find_next());
                    }
                },
            }
            input {
                class: input_class,
                r#type: "text",
                placeholder: "Replace with",
                value: "{REPLACE_TEXT}",
                oninput: move |e| *REPLACE_TEXT.write() = e.value(),
            }
            button {
                class: button_class,
                onclick: move |_| {
                    spawn(find_next());
                },
                "Find Next"
            }
            button {
                class: button_class,
                onclick: move |_| {
                    spawn(replace_next());
                },
                "Replace"
            }
            button {
                class: button_class,
                onclick: move |_| replace_all(),
                "Replace All"
            }
        }
    }
}

fn on_edit(text: String) {
    let ticket = SESSION.write().edit(text);
    let Some(ticket) = ticket else {
        return;
    };
    let quiet = SESSION.read().debouncer().quiet();
    spawn(async move {
        tokio::time::sleep(quiet).await;
        if SESSION.read().should_render(ticket) {
            refresh_preview();
        }
    });
}

/// Re-render right away after a discrete change such as a snippet insert.
fn after_change() {
    if SESSION.read().preview_visible {
        refresh_preview();
    }
}

fn toggle(label: &str) {
    let mut session = SESSION.write();
    match label {
        "Preview" => {
            let visible = session.toggle_preview();
            drop(session);
            if visible {
                refresh_preview();
            }
        }
        "Assistant" => {
            session.toggle_assistant();
        }
        _ => session.canvas_mode = !session.canvas_mode,
    }
}

fn save_document(pick_path: bool) {
    let needs_path = pick_path || SESSION.read().document.path().is_none();
    let result = if needs_path {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Markdown", &["md"])
            .set_file_name("untitled.md")
            .save_file()
        else {
            return;
        };
        SESSION.write().document.save_as(path)
    } else {
        SESSION.write().document.save()
    };

    *EDITOR_STATUS.write() = match result {
        Ok(()) => EditorStatus::Info("Saved".to_string()),
        Err(e) => {
            tracing::error!("{}", e);
            EditorStatus::Error(e.to_string())
        }
    };
}

/// Copy the textarea's cursor and selection into the document.
async fn sync_selection() {
    let script = format!(
        "const el = document.getElementById('{}'); return el ? [el.selectionStart, el.selectionEnd] : null;",
        EDITOR_ID
    );
    let Ok(value) = document::eval(&script).await else {
        return;
    };
    let bounds = value.as_array().and_then(|pair| {
        let start = pair.first()?.as_u64()? as usize;
        let end = pair.get(1)?.as_u64()? as usize;
        Some((start, end))
    });
    let Some((start, end)) = bounds else {
        return;
    };

    let mut session = SESSION.write();
    let doc = &mut session.document;
    let start = doc.byte_offset_utf16(start);
    let end = doc.byte_offset_utf16(end);
    if start < end {
        doc.select(start..end);
    } else {
        doc.set_cursor(start);
    }
}

async fn select_in_editor(range: Range<usize>) {
    let (start, end) = {
        let session = SESSION.read();
        (
            session.document.utf16_index(range.start),
            session.document.utf16_index(range.end),
        )
    };
    let script = format!(
        "const el = document.getElementById('{}'); if (el) {{ el.focus(); el.setSelectionRange({}, {}); }}",
        EDITOR_ID, start, end
    );
    let _ = document::eval(&script).await;
}

async fn find_next() {
    let needle = FIND_TEXT.read().clone();
    sync_selection().await;
    let found = SESSION.write().document.find_next(&needle);
    match found {
        Some(range) => select_in_editor(range).await,
        None if !needle.is_empty() => {
            *EDITOR_STATUS.write() = EditorStatus::Info(format!("\"{}\" not found", needle));
        }
        None => {}
    }
}

async fn replace_next() {
    let needle = FIND_TEXT.read().clone();
    let replacement = REPLACE_TEXT.read().clone();
    sync_selection().await;

    let replaced = SESSION.write().document.replace_selection(&needle, &replacement);
    if replaced {
        after_change();
    }
    let selection = SESSION.read().document.selection();
    if let Some(range) = selection {
        select_in_editor(range).await;
    }
}

fn replace_all() {
    let needle = FIND_TEXT.read().clone();
    let replacement = REPLACE_TEXT.read().clone();
    let count = SESSION.write().document.replace_all(&needle, &replacement);
    if count > 0 {
        after_change();
    }
    *EDITOR_STATUS.write() = EditorStatus::Info(format!("Replaced {} occurrence(s)", count));
}
