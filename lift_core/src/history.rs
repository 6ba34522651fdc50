//! Workout history loading.
//!
//! Merges the active WAL with the CSV archive into the full, deduplicated
//! log history the analytics engine reads.

use crate::{Result, WorkoutLog};
use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

/// CSV row format for reading archived workout logs
///
/// The archive's `set_count` column is informational and not read back.
#[derive(Debug, Deserialize)]
struct CsvRow {
    id: String,
    date: String,
    exercise_id: String,
    total_volume_load: f64,
    estimated_1rm: f64,
}

impl TryFrom<CsvRow> for WorkoutLog {
    type Error = crate::Error;

    fn try_from(row: CsvRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| crate::Error::Other(format!("Invalid UUID: {}", e)))?;

        let date = DateTime::parse_from_rfc3339(&row.date)
            .map_err(|e| crate::Error::Other(format!("Invalid date: {}", e)))?
            .with_timezone(&Utc);

        Ok(WorkoutLog {
            id,
            date,
            exercise_id: row.exercise_id,
            sets: vec![], // Individual sets are not stored in the CSV
            total_volume_load: row.total_volume_load,
            estimated_1rm: row.estimated_1rm,
        })
    }
}

/// Load the full workout history from both WAL and CSV archive
///
/// Returns logs sorted by date ascending (the order the analytics walk
/// wants). Logs that appear in both WAL and CSV are deduplicated by id.
pub fn load_history(wal_path: &Path, csv_path: &Path) -> Result<Vec<WorkoutLog>> {
    let mut logs = Vec::new();
    let mut seen_ids = HashSet::new();

    // Load from WAL first (most recent)
    if wal_path.exists() {
        let wal_logs = crate::logstore::read_logs(wal_path)?;
        for log in wal_logs {
            seen_ids.insert(log.id);
            logs.push(log);
        }
        tracing::debug!("Loaded {} logs from WAL", logs.len());
    }

    // Load from CSV (archived)
    if csv_path.exists() {
        let csv_logs = load_logs_from_csv(csv_path)?;
        let mut csv_count = 0;
        for log in csv_logs {
            if !seen_ids.contains(&log.id) {
                seen_ids.insert(log.id);
                logs.push(log);
                csv_count += 1;
            }
        }
        tracing::debug!("Loaded {} logs from CSV archive", csv_count);
    }

    // Sort by date, oldest first
    logs.sort_by(|a, b| a.date.cmp(&b.date));

    tracing::info!("Loaded {} total workout logs", logs.len());

    Ok(logs)
}

/// Load all workout logs from a CSV file
fn load_logs_from_csv(path: &Path) -> Result<Vec<WorkoutLog>> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_path(path)?;

    let mut logs = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        match result {
            Ok(row) => match WorkoutLog::try_from(row) {
                Ok(log) => logs.push(log),
                Err(e) => {
                    tracing::warn!("Failed to parse CSV row: {}", e);
                }
            },
            Err(e) => {
                tracing::warn!("Failed to deserialize CSV row: {}", e);
            }
        }
    }

    Ok(logs)
}
