//! Core domain types for the Liftlog system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout sets and finished workout logs
//! - Training-load analytics points
//! - The active-session recovery snapshot
//! - Exercises and equipment (for the substitution coach)

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Workout Types
// ============================================================================

/// A single set within a workout: target reps, load, and completion flag.
///
/// Sets are mutable only while their session is active; once a session
/// finishes and the log is written, the set list is frozen.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSet {
    /// Unique within its workout
    pub id: String,
    pub reps: u32,
    pub weight: f64,
    pub completed: bool,
}

impl WorkoutSet {
    pub fn new(id: impl Into<String>, weight: f64, reps: u32) -> Self {
        Self {
            id: id.into(),
            reps,
            weight,
            completed: false,
        }
    }

    /// Volume load contributed by this set (weight × reps).
    pub fn volume_load(&self) -> f64 {
        self.weight * self.reps as f64
    }

    /// Epley estimate of the one-repetition maximum for this set:
    /// `weight × (1 + reps/30)`.
    pub fn estimated_1rm(&self) -> f64 {
        self.weight * (1.0 + self.reps as f64 / 30.0)
    }
}

/// A finished, immutable workout record.
///
/// Created exactly once, when a session completes; owned by the historical
/// log store afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkoutLog {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub exercise_id: String,
    pub sets: Vec<WorkoutSet>,
    /// Sum of weight × reps over all sets
    pub total_volume_load: f64,
    /// Max Epley one-rep-max estimate over all sets
    pub estimated_1rm: f64,
}

impl WorkoutLog {
    /// Build a log from the set list a finished session emitted.
    ///
    /// Volume and 1RM summaries are derived here, once; an empty set list
    /// yields zeros for both.
    pub fn from_sets(
        exercise_id: impl Into<String>,
        sets: Vec<WorkoutSet>,
        date: DateTime<Utc>,
    ) -> Self {
        let total_volume_load = sets.iter().map(WorkoutSet::volume_load).sum();
        let estimated_1rm = sets
            .iter()
            .map(WorkoutSet::estimated_1rm)
            .fold(0.0, f64::max);

        Self {
            id: Uuid::new_v4(),
            date,
            exercise_id: exercise_id.into(),
            sets,
            total_volume_load,
            estimated_1rm,
        }
    }
}

// ============================================================================
// Analytics Types
// ============================================================================

/// One day of the derived training-load series.
///
/// Never persisted on its own: the full series is reproducible from the
/// workout-log history plus the "now" bound used to compute it. The date
/// serializes as the `YYYY-MM-DD` calendar-day key the presentation layer
/// charts by.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AnalyticsPoint {
    pub date: NaiveDate,
    /// Normalized daily training stress (volume / capacity, scaled)
    pub stress: f64,
    /// Chronic training load (42-day EMA of stress)
    pub fitness: f64,
    /// Acute training load (7-day EMA of stress)
    pub fatigue: f64,
    /// Training stress balance: fitness − fatigue
    pub form: f64,
}

// ============================================================================
// Session Types
// ============================================================================

/// State of the one active workout session.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Warmup,
    Working,
    Resting,
    Finished,
}

/// The durable recovery record for one in-flight session.
///
/// Exactly one slot exists at a time; it is overwritten on every mutation
/// of the triple and deleted when the session finishes. The rest countdown
/// is deliberately excluded.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SessionSnapshot {
    pub sets: Vec<WorkoutSet>,
    pub state: SessionState,
    pub active_set_index: usize,
}

// ============================================================================
// Exercise Types
// ============================================================================

/// An exercise, as handed to the substitution coach.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub description: String,
    pub target_muscle: String,
    pub required_equipment: Vec<String>,
}

/// A piece of equipment the user has available.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,
    pub name: String,
}
