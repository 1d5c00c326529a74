//! Shared types for the sky realm workspace.

mod types;

pub use types::{Location, LocationParseError, WhisperEntry, WhisperId, WhisperOutcome};
