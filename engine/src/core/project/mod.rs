//! Project Document Module
//!
//! Handles the editable document state, history patches, and snapshots on disk.

mod snapshot;
mod state;

pub use snapshot::*;
pub use state::*;
