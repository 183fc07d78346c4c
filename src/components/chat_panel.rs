use crate::services::{send_chat, ChatSender};
use crate::state::*;
use dioxus::prelude::*;

#[component]
pub fn ChatPanel() -> Element {
    let chat_tx = use_context::<ChatSender>();
    let is_dark = *IS_DARK_MODE.read();
    let session = SESSION.read();
    let busy = session.is_busy();
    let canvas_mode = session.canvas_mode;
    let transcript = session.transcript().to_vec();
    drop(session);
    let input = CHAT_INPUT.read().clone();
    let can_send = !busy && !input.trim().is_empty();

    let header_bg = if is_dark { "bg-black" } else { "bg-gray-50" };
    let border_color = if is_dark {
        "border-gray-800"
    } else {
        "border-gray-200"
    };
    let input_class = if is_dark {
        "bg-black border-gray-700 text-gray-300"
    } else {
        "bg-white border-gray-300 text-gray-700"
    };
    let user_bubble = if is_dark { "bg-gray-800" } else { "bg-blue-50" };
    let assistant_bubble = if is_dark { "bg-gray-900" } else { "bg-gray-100" };
    let hint_color = if is_dark {
        "text-gray-600"
    } else {
        "text-gray-400"
    };

    let send_tx = chat_tx.clone();
    let on_send = move |_| send_chat(&send_tx);

    let key_tx = chat_tx.clone();
    let on_key_down = move |e: KeyboardEvent| {
        if e.key() == Key::Enter && !e.modifiers().contains(Modifiers::SHIFT) {
            e.prevent_default();
            send_chat(&key_tx);
        }
    };

    rsx! {
        div {
            class: "px-3 py-2 {header_bg} border-b {border_color} flex items-center justify-between text-sm",
            span { class: "font-semibold", "Assistant" }
            span {
                class: "text-xs {hint_color}",
                if canvas_mode { "Canvas on: replies may edit the document" } else { "Canvas off: chat only" }
            }
        }

        div {
            class: "flex-1 overflow-auto p-3 space-y-2 text-sm",

            if transcript.is_empty() {
                div {
                    class: "text-xs {hint_color}",
                    "Ask for edits, summaries or new sections."
                }
            }

            for (index, entry) in transcript.into_iter().enumerate() {
                {
                    let (who, bubble) = match entry.kind {
                        EntryKind::User => ("You", user_bubble),
                        EntryKind::Assistant => ("AI", assistant_bubble),
                        EntryKind::Error => ("Error", "bg-red-900 bg-opacity-30 text-red-400"),
                    };
                    let time = entry.at.format("%H:%M").to_string();
                    let text = entry.text;
                    rsx! {
                        div {
                            key: "{index}",
                            class: "rounded px-3 py-2 {bubble}",
                            div {
                                class: "text-xs {hint_color} mb-1",
                                "{who} · {time}"
                            }
                            div {
                                class: "whitespace-pre-wrap break-words",
                                "{text}"
                            }
                        }
                    }
                }
            }

            if busy {
                div {
                    class: "flex items-center space-x-2 text-xs {hint_color}",
                    div {
                        class: "animate-spin h-4 w-4 border-2 border-blue-500 border-t-transparent rounded-full",
                    }
                    span { "Thinking..." }
                }
            }
        }

        div {
            class: "p-3 border-t {border_color} flex items-end space-x-2",

            textarea {
                class: "flex-1 px-3 py-2 text-sm rounded border {input_class} focus:outline-none focus:ring-2 focus:ring-blue-500 resize-none",
                placeholder: "Message the assistant...",
                rows: 3,
                value: "{input}",
                oninput: move |e| *CHAT_INPUT.write() = e.value(),
                onkeydown: on_key_down,
            }

            button {
                class: if can_send {
                    "px-4 py-2 text-sm font-medium text-white bg-blue-600 hover:bg-blue-500 rounded transition-colors"
                } else {
                    "px-4 py-2 text-sm font-medium text-gray-400 bg-gray-700 rounded cursor-not-allowed"
                },
                disabled: !can_send,
                onclick: on_send,
                "Send"
            }
        }
    }
}
