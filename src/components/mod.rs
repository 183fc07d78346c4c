mod chat_panel;
mod editor_view;
mod layout;
mod queue_view;
mod settings_dialog;
mod status_bar;

pub use chat_panel::*;
pub use editor_view::*;
pub use layout::*;
pub use queue_view::*;
pub use settings_dialog::*;
pub use status_bar::*;
