//! Overlay Kernel: the whisper overlay's state container, its pure
//! transitions, and the location providers that drive it.
//!
//! # Invariants
//! - History never exceeds [`HISTORY_CAPACITY`] entries and is newest-first.
//! - At most one whisper request is in flight.
//! - The current location is always a member of the closed set.
//! - All state changes flow through [`OverlayEvent`]s.

pub mod overlay;
pub mod wander;

pub use overlay::{HISTORY_CAPACITY, OutcomeTally, Overlay, OverlayEvent, OverlayState};
pub use wander::{FixedLocation, LocationSource, Wanderer, splitmix64};
