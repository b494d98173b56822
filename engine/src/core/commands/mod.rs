//! Edit Command System
//!
//! Every document change flows through here: actions are reduced into
//! patches, and patches are committed to the snapshot history.

mod actions;
mod history;

pub use actions::*;
pub use history::*;
