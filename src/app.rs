use std::path::PathBuf;

use dioxus::desktop::tao::window::Theme;
use dioxus::desktop::{Config, WindowBuilder};
use dioxus::prelude::*;

use crate::components::AppLayout;
use crate::config::SettingsStore;
use crate::services::{init_services, open_in_editor};
use crate::state::*;

/// File to open in the editor on startup.
#[derive(Clone, Debug, Default)]
struct StartupFile(Option<PathBuf>);

pub fn launch(store: SettingsStore, file: Option<PathBuf>) {
    dioxus::LaunchBuilder::desktop()
        .with_cfg(
            Config::new().with_window(
                WindowBuilder::new()
                    .with_title("Markdown to PDF Converter")
                    .with_theme(Some(Theme::Dark)),
            ),
        )
        .with_context(store)
        .with_context(StartupFile(file))
        .launch(App);
}

#[component]
fn App() -> Element {
    let store = use_context::<SettingsStore>();
    let startup = use_context::<StartupFile>();

    let (chat_tx, export_tx) = use_hook(|| {
        *SETTINGS.write() = store.load();
        if let Some(path) = startup.0 {
            open_in_editor(Some(path));
        }
        init_services()
    });
    use_context_provider(|| chat_tx);
    use_context_provider(|| export_tx);

    rsx! {
        AppLayout {}
    }
}
