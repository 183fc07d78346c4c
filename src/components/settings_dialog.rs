use crate::config::{Settings, SettingsStore};
use crate::llm::Provider;
use crate::state::*;
use dioxus::prelude::*;

#[component]
pub fn SettingsDialog() -> Element {
    let show = *SHOW_SETTINGS.read();

    if !show {
        return rsx! {};
    }

    rsx! {
        SettingsForm {}
    }
}

#[component]
fn SettingsForm() -> Element {
    let store = use_context::<SettingsStore>();
    let is_dark = *IS_DARK_MODE.read();

    // Form state lives until the dialog closes
    let mut provider = use_signal(|| SETTINGS.read().provider);
    let mut gemini_key = use_signal(|| SETTINGS.read().gemini_key.clone());
    let mut open_router_key = use_signal(|| SETTINGS.read().open_router_key.clone());
    let mut model = use_signal(|| SETTINGS.read().model.clone());
    let mut error = use_signal(|| None::<String>);

    let overlay_bg = if is_dark {
        "bg-black bg-opacity-50"
    } else {
        "bg-black bg-opacity-30"
    };
    let dialog_bg = if is_dark { "bg-gray-900" } else { "bg-white" };
    let dialog_border = if is_dark {
        "border-gray-700"
    } else {
        "border-gray-300"
    };
    let text_color = if is_dark {
        "text-gray-300"
    } else {
        "text-gray-700"
    };
    let input_class = if is_dark {
        "w-full px-3 py-2 text-sm border rounded bg-black border-gray-700 text-gray-300 focus:outline-none focus:ring-2 focus:ring-blue-500"
    } else {
        "w-full px-3 py-2 text-sm border rounded bg-gray-50 border-gray-300 text-gray-700 focus:outline-none focus:ring-2 focus:ring-blue-500"
    };

    let on_save = move |_| {
        let settings = Settings {
            provider: *provider.read(),
            gemini_key: gemini_key.read().trim().to_string(),
            open_router_key: open_router_key.read().trim().to_string(),
            model: model.read().trim().to_string(),
        };

        match store.save(&settings) {
            Ok(()) => {
                tracing::info!("Saved settings to {:?}", store.path());
                *SETTINGS.write() = settings;
                *EDITOR_STATUS.write() = EditorStatus::Info("Settings saved".into());
                *SHOW_SETTINGS.write() = false;
            }
            Err(e) => error.set(Some(format!("Failed to save: {}", e))),
        }
    };

    let close = move |_| *SHOW_SETTINGS.write() = false;

    let current_provider = *provider.read();
    let model_hint = match current_provider {
        Provider::Gemini => "e.g. gemini-2.0-flash-exp",
        Provider::OpenRouter => "e.g. openai/gpt-3.5-turbo",
    };

    rsx! {
        div {
            class: "fixed inset-0 {overlay_bg} flex items-center justify-center z-50",
            onclick: close,

            div {
                class: "{dialog_bg} border {dialog_border} rounded-lg shadow-xl p-6 w-full max-w-md",
                onclick: move |e: MouseEvent| e.stop_propagation(),

                h2 {
                    class: "text-lg font-semibold {text_color} mb-4",
                    "Assistant Settings"
                }

                div {
                    class: "mb-4",
                    label {
                        class: "block text-sm font-medium {text_color} mb-2",
                        "Provider"
                    }
                    select {
                        class: input_class,
                        onchange: move |e| {
                            if let Some(p) = Provider::from_name(&e.value()) {
                                provider.set(p);
                            }
                        },
                        for p in Provider::all() {
                            option {
                                value: p.display_name(),
                                selected: *p == current_provider,
                                {p.display_name()}
                            }
                        }
                    }
                }

                div {
                    class: "mb-4",
                    label {
                        class: "block text-sm font-medium {text_color} mb-2",
                        "Gemini API Key"
                    }
                    input {
                        class: input_class,
                        r#type: "password",
                        value: "{gemini_key}",
                        oninput: move |e| gemini_key.set(e.value()),
                    }
                }

                div {
                    class: "mb-4",
                    label {
                        class: "block text-sm font-medium {text_color} mb-2",
                        "OpenRouter API Key"
                    }
                    input {
                        class: input_class,
                        r#type: "password",
                        value: "{open_router_key}",
                        oninput: move |e| open_router_key.set(e.value()),
                    }
                }

                div {
                    class: "mb-4",
                    label {
                        class: "block text-sm font-medium {text_color} mb-2",
                        "Model"
                    }
                    input {
                        class: input_class,
                        r#type: "text",
                        placeholder: model_hint,
                        value: "{model}",
                        oninput: move |e| model.set(e.value()),
                    }
                }

                if let Some(message) = error.read().clone() {
                    div {
                        class: "mb-4 text-sm text-red-400",
                        "{message}"
                    }
                }

                div {
                    class: "flex justify-end space-x-3 mt-6",

                    button {
                        class: "px-4 py-2 text-sm font-medium text-gray-400 hover:text-gray-300 transition-colors",
                        onclick: close,
                        "Cancel"
                    }

                    button {
                        class: "px-4 py-2 text-sm font-medium text-white bg-blue-600 hover:bg-blue-500 rounded transition-colors",
                        onclick: on_save,
                        "Save"
                    }
                }
            }
        }
    }
}
