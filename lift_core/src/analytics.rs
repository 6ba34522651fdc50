//! Training-load analytics engine.
//!
//! Implements a Bannister impulse-response model adapted for strength
//! training: each day's normalized stress feeds two exponential moving
//! averages, a slow one (fitness, chronic load) and a fast one (fatigue,
//! acute load), whose difference is the day's form (readiness).
//!
//! The engine is a pure function of the log history and an injected "now"
//! bound; identical inputs always reproduce the identical series.

use crate::{AnalyticsConfig, AnalyticsPoint, WorkoutLog};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::BTreeMap;

/// Aggregated load for one calendar day with at least one logged workout.
#[derive(Clone, Debug, PartialEq)]
pub struct DailyLoad {
    /// Sum of total volume load over the day's workouts
    pub volume: f64,
    /// Max estimated 1RM over the day's workouts (the day's capacity)
    pub capacity: f64,
}

/// Aggregate workout logs by calendar day.
///
/// Volumes are summed; capacity is the max 1RM seen that day, clamped to
/// at least 1 so it is always safe as a denominator. Keys come back
/// ordered, so the walk over the series needs no extra sort.
pub fn aggregate_daily_load(logs: &[WorkoutLog]) -> BTreeMap<NaiveDate, DailyLoad> {
    let mut daily: BTreeMap<NaiveDate, DailyLoad> = BTreeMap::new();

    for log in logs {
        let capacity = log.estimated_1rm.max(1.0);
        daily
            .entry(log.date.date_naive())
            .and_modify(|day| {
                day.volume += log.total_volume_load;
                day.capacity = day.capacity.max(capacity);
            })
            .or_insert(DailyLoad {
                volume: log.total_volume_load,
                capacity,
            });
    }

    daily
}

/// Exponential moving average step: `k = 2 / (time_constant + 1)`.
fn ema(today: f64, prev: f64, time_constant: u16) -> f64 {
    let k = 2.0 / (time_constant as f64 + 1.0);
    today * k + prev * (1.0 - k)
}

/// Compute the day-by-day training-load series from a log history.
///
/// Walks every calendar day from the earliest log through `now` inclusive,
/// cold-starting both averages at zero. Days with no logged workout carry
/// zero stress; a logged day's stress is `volume / capacity × stress_scale`
/// with capacity clamped to at least 1 so the division is always defined.
///
/// An empty history yields an empty series; there are no other failure
/// modes.
pub fn compute_training_load(
    logs: &[WorkoutLog],
    now: DateTime<Utc>,
    config: &AnalyticsConfig,
) -> Vec<AnalyticsPoint> {
    let daily = aggregate_daily_load(logs);

    let Some(&start) = daily.keys().next() else {
        return Vec::new();
    };
    let end = now.date_naive();

    let mut points = Vec::new();
    let mut fitness = 0.0;
    let mut fatigue = 0.0;

    let mut day = start;
    while day <= end {
        let stress = daily
            .get(&day)
            .map(|d| d.volume / d.capacity * config.stress_scale)
            .unwrap_or(0.0);

        fitness = ema(stress, fitness, config.fitness_time_constant);
        fatigue = ema(stress, fatigue, config.fatigue_time_constant);

        points.push(AnalyticsPoint {
            date: day,
            stress,
            fitness,
            fatigue,
            form: fitness - fatigue,
        });

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    tracing::debug!(
        "Computed {} analytics points from {} logs",
        points.len(),
        logs.len()
    );

    points
}

/// Qualitative reading of a form (TSB) value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormInterpretation {
    /// Recovered and ready for hard training
    Fresh,
    /// Normal training balance
    Neutral,
    /// Carrying more acute load than chronic fitness
    Fatigued,
}

impl FormInterpretation {
    pub fn from_form(form: f64) -> Self {
        if form >= 5.0 {
            FormInterpretation::Fresh
        } else if form >= -10.0 {
            FormInterpretation::Neutral
        } else {
            FormInterpretation::Fatigued
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            FormInterpretation::Fresh => "Fresh - ready to perform",
            FormInterpretation::Neutral => "Neutral - normal training balance",
            FormInterpretation::Fatigued => "Fatigued - recovery recommended",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WorkoutSet;
    use chrono::TimeZone;

    fn log_on(day: NaiveDate, volume: f64, one_rm: f64) -> WorkoutLog {
        let date = Utc
            .from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap());
        WorkoutLog {
            id: uuid::Uuid::new_v4(),
            date,
            exercise_id: "bench-press".into(),
            sets: vec![WorkoutSet::new("s1", 100.0, 5)],
            total_volume_load: volume,
            estimated_1rm: one_rm,
        }
    }

    fn noon(day: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&day.and_hms_opt(12, 0, 0).unwrap())
    }

    fn day(ymd: (i32, u32, u32)) -> NaiveDate {
        NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap()
    }

    #[test]
    fn test_empty_history_yields_empty_series() {
        let points = compute_training_load(&[], Utc::now(), &AnalyticsConfig::default());
        assert!(points.is_empty());
    }

    #[test]
    fn test_single_day_worked_example() {
        // volume 1000 at capacity 200 => stress 50
        let d0 = day((2025, 6, 1));
        let logs = vec![log_on(d0, 1000.0, 200.0)];

        let points = compute_training_load(&logs, noon(d0), &AnalyticsConfig::default());
        assert_eq!(points.len(), 1);

        let p = &points[0];
        assert_eq!(p.date, d0);
        assert!((p.stress - 50.0).abs() < 1e-9);
        assert!((p.fitness - 50.0 * (2.0 / 43.0)).abs() < 1e-9);
        assert!((p.fatigue - 12.5).abs() < 1e-9);
        assert!((p.form - (p.fitness - p.fatigue)).abs() < 1e-12);
        assert!(p.form < 0.0); // single hard day reads as fatigue
    }

    #[test]
    fn test_series_has_one_point_per_day_no_gaps() {
        let d0 = day((2025, 6, 1));
        let d5 = day((2025, 6, 6));
        let now = day((2025, 6, 8));
        let logs = vec![log_on(d0, 1000.0, 200.0), log_on(d5, 800.0, 200.0)];

        let points = compute_training_load(&logs, noon(now), &AnalyticsConfig::default());

        // d0 through now inclusive
        assert_eq!(points.len(), 8);
        for (i, p) in points.iter().enumerate() {
            assert_eq!(p.date, d0 + chrono::Days::new(i as u64));
        }
        for pair in points.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }

        // Rest days carry zero stress but the averages keep decaying
        assert_eq!(points[1].stress, 0.0);
        assert!(points[1].fatigue < points[0].fatigue);
    }

    #[test]
    fn test_same_day_logs_merge_into_one_point() {
        let d0 = day((2025, 6, 1));
        let logs = vec![log_on(d0, 600.0, 150.0), log_on(d0, 400.0, 200.0)];

        let daily = aggregate_daily_load(&logs);
        assert_eq!(daily.len(), 1);
        let load = daily.get(&d0).unwrap();
        assert_eq!(load.volume, 1000.0);
        assert_eq!(load.capacity, 200.0); // max, not sum

        let points = compute_training_load(&logs, noon(d0), &AnalyticsConfig::default());
        assert_eq!(points.len(), 1);
        assert!((points[0].stress - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_capacity_clamped_to_one() {
        let d0 = day((2025, 6, 1));
        let logs = vec![log_on(d0, 100.0, 0.0)];

        let daily = aggregate_daily_load(&logs);
        assert_eq!(daily.get(&d0).unwrap().capacity, 1.0);

        let points = compute_training_load(&logs, noon(d0), &AnalyticsConfig::default());
        // Denominator clamps to 1 instead of dividing by zero
        assert!((points[0].stress - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_stress_converges_monotonically() {
        let d0 = day((2025, 1, 1));
        let days = 120u64;
        let logs: Vec<WorkoutLog> = (0..days)
            .map(|i| log_on(d0 + chrono::Days::new(i), 1000.0, 200.0))
            .collect();
        let now = d0 + chrono::Days::new(days - 1);

        let points = compute_training_load(&logs, noon(now), &AnalyticsConfig::default());
        assert_eq!(points.len(), days as usize);

        for pair in points.windows(2) {
            // Both averages climb toward the constant stress, never past it
            assert!(pair[1].fitness > pair[0].fitness);
            assert!(pair[1].fatigue >= pair[0].fatigue);
            assert!(pair[1].fitness < 50.0);
            assert!(pair[1].fatigue <= 50.0 + 1e-9);
        }

        // The short time constant converges faster
        let last = points.last().unwrap();
        assert!(last.fatigue > last.fitness);
        assert!((last.fatigue - 50.0).abs() < 0.01);
        assert!(last.fitness > 45.0);
    }

    #[test]
    fn test_determinism() {
        let d0 = day((2025, 6, 1));
        let now = day((2025, 6, 20));
        let logs = vec![log_on(d0, 1000.0, 200.0), log_on(day((2025, 6, 10)), 900.0, 210.0)];

        let a = compute_training_load(&logs, noon(now), &AnalyticsConfig::default());
        let b = compute_training_load(&logs, noon(now), &AnalyticsConfig::default());
        assert_eq!(a, b);
    }

    #[test]
    fn test_date_serializes_as_calendar_day_key() {
        let d0 = day((2025, 6, 1));
        let logs = vec![log_on(d0, 1000.0, 200.0)];
        let points = compute_training_load(&logs, noon(d0), &AnalyticsConfig::default());

        let json = serde_json::to_string(&points[0]).unwrap();
        assert!(json.contains("\"2025-06-01\""));
    }

    #[test]
    fn test_form_interpretation_bands() {
        assert_eq!(
            FormInterpretation::from_form(10.0),
            FormInterpretation::Fresh
        );
        assert_eq!(
            FormInterpretation::from_form(0.0),
            FormInterpretation::Neutral
        );
        assert_eq!(
            FormInterpretation::from_form(-20.0),
            FormInterpretation::Fatigued
        );
    }
}
