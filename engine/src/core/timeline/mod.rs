//! Timeline Interaction Module
//!
//! Pointer interaction with the caption track: hit-testing caption blocks
//! and turning drag gestures into new caption intervals.

mod drag;

pub use drag::*;
