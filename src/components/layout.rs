use crate::components::*;
use crate::state::*;
use dioxus::prelude::*;

#[component]
pub fn AppLayout() -> Element {
    use_effect(|| {
        spawn(async move {
            let is_dark = detect_system_theme().await;
            *IS_DARK_MODE.write() = is_dark;
        });
    });

    let is_dark = *IS_DARK_MODE.read();
    let theme_class = if is_dark {
        "bg-black text-gray-300"
    } else {
        "bg-white text-gray-700"
    };
    let title = match *VIEW.read() {
        View::Queue => "Markdown to PDF Converter".to_string(),
        View::Editor => SESSION.read().document.title(),
    };

    rsx! {
        document::Title { "{title}" }

        document::Link {
            rel: "stylesheet",
            href: "https://cdn.jsdelivr.net/npm/tailwindcss@2.2.19/dist/tailwind.min.css",
        }

        document::Style {{
            let bg_color = if is_dark { "black" } else { "white" };
            let border_color = if is_dark { "#1f2937" } else { "#e5e7eb" };
            let scrollbar_hover = if is_dark { "#4b5563" } else { "#d1d5db" };

            format!(r#"
            html, body {{
                background: {bg_color};
                margin: 0;
                padding: 0;
                width: 100%;
                height: 100%;
            }}
            ::-webkit-scrollbar {{
                width: 8px;
                height: 8px;
            }}
            ::-webkit-scrollbar-track {{
                background: transparent;
            }}
            ::-webkit-scrollbar-thumb {{
                background: {border_color};
                border-radius: 4px;
            }}
            ::-webkit-scrollbar-thumb:hover {{
                background: {scrollbar_hover};
            }}
            "#)
        }}

        div {
            class: "h-screen w-screen flex flex-col overflow-hidden {theme_class}",

            match *VIEW.read() {
                View::Queue => rsx! { QueueView {} },
                View::Editor => rsx! { EditorView {} },
            }

            StatusBar {}
        }

        SettingsDialog {}
    }
}

async fn detect_system_theme() -> bool {
    let result = document::eval(
        r#"
        return window.matchMedia && window.matchMedia('(prefers-color-scheme: dark)').matches;
    "#,
    )
    .await;

    match result {
        Ok(val) => val.as_bool().unwrap_or(true),
        Err(_) => true,
    }
}
