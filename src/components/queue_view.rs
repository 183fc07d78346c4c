use crate::export::ExportFormat;
use crate::services::{open_in_editor, start_conversion, ExportSender};
use crate::state::*;
use dioxus::prelude::*;

#[component]
pub fn QueueView() -> Element {
    let export_tx = use_context::<ExportSender>();
    let is_dark = *IS_DARK_MODE.read();
    let converting = *CONVERTING.read();
    let progress = *BATCH_PROGRESS.read();
    let files = QUEUE.read().files().to_vec();
    let selected = SELECTED_FILES.read().clone();
    let failed = FAILED_FILES.read().clone();
    let format = *EXPORT_FORMAT.read();
    let output_dir = QUEUE
        .read()
        .output_dir()
        .map(|d| d.display().to_string())
        .unwrap_or_else(|| "Same folder as each file".to_string());

    let toolbar_bg = if is_dark { "bg-black" } else { "bg-gray-50" };
    let border_class = if is_dark {
        "border-gray-800"
    } else {
        "border-gray-200"
    };
    let button_class = if is_dark {
        "px-3 py-1.5 text-sm rounded bg-gray-900 hover:bg-gray-800 text-gray-300 transition-colors"
    } else {
        "px-3 py-1.5 text-sm rounded bg-gray-100 hover:bg-gray-200 text-gray-700 transition-colors"
    };
    let row_selected = if is_dark { "bg-gray-800" } else { "bg-blue-50" };
    let muted_text = if is_dark {
        "text-gray-600"
    } else {
        "text-gray-400"
    };
    let track_bg = if is_dark { "bg-gray-900" } else { "bg-gray-200" };

    let can_convert = !converting && !files.is_empty();

    rsx! {
        div {
            class: "flex-1 flex flex-col min-h-0",

            div {
                class: "h-12 {toolbar_bg} border-b {border_class} flex items-center px-3 space-x-2",

                button {
                    class: button_class,
                    disabled: converting,
                    onclick: move |_| {
                        if let Some(paths) = rfd::FileDialog::new()
                            .add_filter("Markdown", &["md", "MD"])
                            .pick_files()
                        {
                            let added = QUEUE.write().add_paths(paths);
                            tracing::info!("Queued {} file(s)", added);
                        }
                    },
                    "Add Files"
                }

                button {
                    class: button_class,
                    disabled: converting || selected.is_empty(),
                    onclick: move |_| {
                        let indices = SELECTED_FILES.read().clone();
                        QUEUE.write().remove(&indices);
                        SELECTED_FILES.write().clear();
                    },
                    "Remove Selected"
                }

                button {
                    class: button_class,
                    disabled: converting,
                    onclick: move |_| {
                        QUEUE.write().clear();
                        SELECTED_FILES.write().clear();
                    },
                    "Clear"
                }

                div { class: "w-px h-6 bg-gray-700 mx-2" }

                button {
                    class: button_class,
                    onclick: move |_| {
                        let selected = SELECTED_FILES.read().first().copied();
                        let path = selected.and_then(|i| QUEUE.read().files().get(i).cloned());
                        open_in_editor(path);
                    },
                    "Open Editor"
                }

                div { class: "flex-1" }

                select {
                    class: "px-2 py-1.5 text-sm rounded border {border_class} {toolbar_bg}",
                    disabled: converting,
                    onchange: move |e| {
                        let format = match e.value().as_str() {
                            "docx" => ExportFormat::Docx,
                            _ => ExportFormat::Pdf,
                        };
                        *EXPORT_FORMAT.write() = format;
                    },
                    for option_format in ExportFormat::all() {
                        option {
                            value: option_format.extension(),
                            selected: *option_format == format,
                            "{option_format}"
                        }
                    }
                }

                button {
                    class: if can_convert {
                        "px-4 py-1.5 text-sm font-medium text-white bg-blue-600 hover:bg-blue-500 rounded transition-colors"
                    } else {
                        "px-4 py-1.5 text-sm font-medium text-gray-400 bg-gray-700 rounded cursor-not-allowed"
                    },
                    disabled: !can_convert,
                    onclick: move |_| start_conversion(&export_tx),
                    "Convert"
                }
            }

            div {
                class: "px-3 py-2 border-b {border_class} flex items-center space-x-2 text-sm",
                span { class: muted_text, "Output:" }
                span { class: "flex-1 truncate", "{output_dir}" }
                button {
                    class: button_class,
                    disabled: converting,
                    onclick: move |_| {
                        if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                            QUEUE.write().set_output_dir(Some(dir));
                        }
                    },
                    "Choose Folder"
                }
                button {
                    class: button_class,
                    disabled: converting,
                    onclick: move |_| QUEUE.write().set_output_dir(None),
                    "Next to Source"
                }
            }

            div {
                class: "flex-1 overflow-auto",

                if files.is_empty() {
                    div {
                        class: "h-full flex items-center justify-center text-sm {muted_text}",
                        "Add Markdown files to convert them"
                    }
                }

                for (index, path) in files.iter().cloned().enumerate() {
                    {
                        let is_selected = selected.contains(&index);
                        let is_failed = failed.contains(&path);
                        let label = path.display().to_string();
                        rsx! {
                            div {
                                key: "{index}",
                                class: "px-3 py-1.5 text-sm flex items-center space-x-2 cursor-pointer",
                                class: if is_selected { row_selected } else { "" },
                                onclick: move |_| {
                                    let mut selected = SELECTED_FILES.write();
                                    if let Some(pos) = selected.iter().position(|i| *i == index) {
                                        selected.remove(pos);
                                    } else {
                                        selected.push(index);
                                    }
                                },
                                ondoubleclick: {
                                    let path = path.clone();
                                    move |_| open_in_editor(Some(path.clone()))
                                },
                                input {
                                    r#type: "checkbox",
                                    checked: is_selected,
                                }
                                span { class: "flex-1 truncate", "{label}" }
                                if is_failed {
                                    span { class: "text-red-500 text-xs", "failed" }
                                }
                            }
                        }
                    }
                }
            }

            div {
                class: "px-3 py-2 border-t {border_class}",
                div {
                    class: "w-full h-2 rounded {track_bg}",
                    div {
                        class: "h-2 rounded bg-blue-600 transition-all",
                        style: "width: {progress}%",
                    }
                }
            }
        }
    }
}
