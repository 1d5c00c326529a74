//! Overlay Session: runs the whisper overlay against a host event loop.
//!
//! # Invariants
//! - Only the host thread mutates overlay state (via `pump`/`next_event`).
//! - Only one whisper lifecycle is active; extra triggers are dropped.
//! - The ticker stops on shutdown; an in-flight whisper still settles.

mod session;

pub use session::{EVENT_LOG_LIMIT, OverlaySession, SessionConfig, SessionError};
