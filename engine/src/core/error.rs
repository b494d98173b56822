//! LyricFrame Error Definitions
//!
//! Defines error types used throughout the project.

use thiserror::Error;

use super::TimeSec;

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Document Errors
    // =========================================================================
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project file corrupted: {0}")]
    ProjectCorrupted(String),

    // =========================================================================
    // Caption Errors
    // =========================================================================
    #[error("Caption not found at index {0}")]
    CaptionNotFound(usize),

    #[error("Invalid time range: {0}~{1} seconds")]
    InvalidTimeRange(TimeSec, TimeSec),

    #[error("Theme not found: {0}")]
    ThemeNotFound(String),

    // =========================================================================
    // Gesture Errors
    // =========================================================================
    #[error("A drag gesture is in progress")]
    GestureInProgress,

    #[error("No drag gesture is active")]
    NoActiveGesture,

    // =========================================================================
    // Render / Export Errors
    // =========================================================================
    #[error("Render failed: {0}")]
    RenderFailed(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Export already running")]
    ExportInProgress,

    #[error("Resource load failed: {0}")]
    ResourceLoadFailed(String),

    // =========================================================================
    // AI Errors
    // =========================================================================
    #[error("Captioning failed: {0}")]
    CaptioningFailed(String),

    #[error("AI response could not be parsed: {0}")]
    AIResponseInvalid(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Message suitable for showing to the user.
    ///
    /// Collaborator failures collapse into one generic sentence; the detailed
    /// cause stays in the logs.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::CaptioningFailed(_) | CoreError::AIResponseInvalid(_) => {
                "Failed to generate captions. Please try again.".to_string()
            }
            CoreError::ExportFailed(_) | CoreError::ResourceLoadFailed(_) => {
                "Failed to export video. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}
