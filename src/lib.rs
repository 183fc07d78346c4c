//! Markdown to PDF conversion with a live-preview editor and an AI
//! assistant that can rewrite the document in place.

pub mod batch;
pub mod config;
pub mod export;
pub mod llm;
pub mod logging;
pub mod render;
pub mod state;

#[cfg(feature = "desktop")]
pub mod app;
#[cfg(feature = "desktop")]
pub mod components;
#[cfg(feature = "desktop")]
pub mod services;
