mod debounce;
mod document;
mod session;

pub use debounce::*;
pub use document::*;
pub use session::*;

#[cfg(feature = "desktop")]
mod ui;
#[cfg(feature = "desktop")]
pub use ui::*;
