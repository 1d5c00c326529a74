//! Developer Tooling: read-only overlay inspector.
//!
//! # Invariants
//! - Tools never mutate overlay state.

mod inspector;

pub use inspector::{EntryInfo, OverlayInspector, OverlaySummary};
