//! LyricFrame Core Engine
//!
//! Core editing engine module.
//! Handles the caption timeline, undo/redo history, drag interaction math,
//! frame composition, export orchestration, and document persistence.

pub mod captions;
pub mod commands;
pub mod fs;
pub mod project;
pub mod render;
pub mod session;
pub mod settings;
pub mod theme;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
