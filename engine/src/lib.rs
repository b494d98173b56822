//! LyricFrame Core Library
//!
//! Caption timeline editing and frame-composition engine for lyric videos.
//! This library contains the caption data model, snapshot-based undo/redo,
//! the drag/resize interaction math, the frame compositor shared by preview
//! and export, and the export orchestrator.
//!
//! Host capabilities (media capture, encoding, image decoding, dictation,
//! the AI captioning call) are consumed through traits so every algorithm
//! here runs headless and deterministically under test.

pub mod core;

use std::path::Path;
use std::sync::OnceLock;

pub use crate::core::session::EditorSession;
pub use crate::core::{CoreError, CoreResult};

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Installs the global tracing subscriber.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `info`). When `log_dir`
/// is given, a daily rolling `lyricframe.log` is written there as well.
/// Calling this more than once is harmless.
pub fn init_logging(log_dir: Option<&Path>) {
    use tracing_subscriber::prelude::*;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let file_layer = log_dir.and_then(|dir| {
        if std::fs::create_dir_all(dir).is_err() {
            return None;
        }
        let file_appender = tracing_appender::rolling::daily(dir, "lyricframe.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);
        Some(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
    });

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, repeated CLI setup).
    let _ = tracing::subscriber::set_global_default(subscriber);
}
