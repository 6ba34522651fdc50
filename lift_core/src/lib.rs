#![forbid(unsafe_code)]

//! Core domain model and business logic for the Liftlog system.
//!
//! This crate provides:
//! - Domain types (sets, workout logs, analytics points, snapshots)
//! - Training-load analytics engine (Bannister impulse-response model)
//! - Active-session state machine with rest countdown and crash recovery
//! - Persistence (workout-log WAL, CSV archive, session snapshot)
//! - Exercise substitution coach collaborator

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod analytics;
pub mod session;
pub mod snapshot;
pub mod logstore;
pub mod history;
pub mod rollup;
pub mod coach;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::{AnalyticsConfig, Config, SessionConfig};
pub use analytics::{compute_training_load, FormInterpretation};
pub use session::{
    Cue, CuePlayer, Effect, NoopWakeLock, SessionDriver, SessionEvent, SilentCue, WakeLock,
    WorkoutSession,
};
pub use snapshot::{FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use logstore::{JsonlSink, LogSink};
pub use history::load_history;
pub use coach::{AiCoach, OfflineTransport, SubstituteCoach};
