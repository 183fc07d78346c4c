use crate::state::*;
use dioxus::prelude::*;

#[component]
pub fn StatusBar() -> Element {
    let is_dark = *IS_DARK_MODE.read();

    let bg_class = if is_dark { "bg-black" } else { "bg-gray-50" };
    let border_class = if is_dark {
        "border-gray-800"
    } else {
        "border-gray-200"
    };
    let muted_text = if is_dark {
        "text-gray-600"
    } else {
        "text-gray-500"
    };

    let (status_text, status_color) = match *VIEW.read() {
        View::Queue => (BATCH_STATUS.read().clone(), muted_text),
        View::Editor => match EDITOR_STATUS.read().clone() {
            EditorStatus::None => (String::new(), muted_text),
            EditorStatus::Info(msg) => (msg, "text-green-500"),
            EditorStatus::Error(msg) => (msg, "text-red-500"),
        },
    };

    let session = SESSION.read();
    let editor_info = (*VIEW.read() == View::Editor).then(|| {
        let dirty = if session.document.is_dirty() {
            "Modified"
        } else {
            "Saved"
        };
        let chars = session.document.text().chars().count();
        let provider = SETTINGS.read().provider;
        (dirty, chars, provider)
    });

    rsx! {
        div {
            class: "h-7 {bg_class} border-t {border_class} flex items-center px-3 justify-between text-xs",

            div {
                class: "flex items-center space-x-4",
                span {
                    class: status_color,
                    "{status_text}"
                }
            }

            if let Some((dirty, chars, provider)) = editor_info {
                div {
                    class: "flex items-center space-x-4",
                    span { class: muted_text, "{dirty}" }
                    span { class: muted_text, "{chars} chars" }
                    span { class: muted_text, "{provider}" }
                }
            }
        }
    }
}
