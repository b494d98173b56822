//! Snapshot Module
//!
//! Saves and loads the editor document as pretty JSON inside a versioned
//! envelope. Writes are atomic so a crash mid-save keeps the previous file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::captions::sort_captions;
use crate::core::fs::{atomic_write_json_pretty, read_json};
use crate::core::project::EditorState;
use crate::core::{CoreError, CoreResult};

/// Current snapshot format version
pub const SNAPSHOT_VERSION: u32 = 1;

/// Default document file name inside a project directory
pub const SNAPSHOT_FILE: &str = "project.lyricframe.json";

/// On-disk envelope around the document
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    /// Snapshot format version for migrations
    pub version: u32,
    /// When the snapshot was written (RFC 3339)
    pub saved_at: String,
    pub state: EditorState,
}

/// Reads and writes document snapshots
pub struct Snapshot;

impl Snapshot {
    /// Saves the document to `path`
    pub fn save(path: &Path, state: &EditorState) -> CoreResult<()> {
        let data = SnapshotData {
            version: SNAPSHOT_VERSION,
            saved_at: chrono::Utc::now().to_rfc3339(),
            state: state.clone(),
        };
        atomic_write_json_pretty(path, &data)?;
        info!(
            path = %path.display(),
            captions = state.caption_lines().len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Loads a document, returning it with its envelope metadata
    pub fn load(path: &Path) -> CoreResult<SnapshotData> {
        if !path.exists() {
            return Err(CoreError::ProjectNotFound(
                path.to_string_lossy().to_string(),
            ));
        }

        let mut data: SnapshotData = read_json(path).map_err(|e| match e {
            CoreError::JsonError(err) => CoreError::ProjectCorrupted(err.to_string()),
            other => other,
        })?;

        if data.version > SNAPSHOT_VERSION {
            return Err(CoreError::ProjectCorrupted(format!(
                "Unsupported snapshot version {} (newest known is {})",
                data.version, SNAPSHOT_VERSION
            )));
        }
        if data.state.active_theme().is_err() {
            return Err(CoreError::ProjectCorrupted(format!(
                "Active theme '{}' has no config",
                data.state.theme
            )));
        }
        if let Some(captions) = data.state.captions.as_mut() {
            if let Some((index, line)) = captions.iter().enumerate().find(|(_, line)| {
                !line.start_time.is_finite()
                    || !line.end_time.is_finite()
                    || line.start_time < 0.0
                    || line.end_time <= line.start_time
            }) {
                return Err(CoreError::ProjectCorrupted(format!(
                    "Caption {} has invalid interval {}..{}",
                    index, line.start_time, line.end_time
                )));
            }
            sort_captions(captions);
        }

        debug!(path = %path.display(), saved_at = %data.saved_at, "Snapshot loaded");
        Ok(data)
    }

    /// Default snapshot path within a project directory
    pub fn default_path(project_dir: &Path) -> PathBuf {
        project_dir.join(SNAPSHOT_FILE)
    }
}
