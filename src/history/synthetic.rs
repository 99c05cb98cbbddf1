//! Synthetic run-history generation for demos.
//!
//! Produces a plausible daily run series for a job: starts clustered
//! around an overnight batch window with per-day jitter, durations in the
//! tens of minutes, mostly successful with occasional failures. Output is
//! fully determined by the caller's seed, the job id and the anchor day,
//! so demo charts are stable across reloads.
//!
//! This is demo tooling only. The engine never substitutes synthetic
//! history for real data on its own; callers opt in explicitly.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use chrono::{Duration, NaiveDate, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::graph::JobStatus;

use super::aggregate::RunRecord;

/// Configuration for the synthetic generator.
#[derive(Debug, Clone)]
pub struct SyntheticHistoryConfig {
    /// Number of daily runs to generate (default: 30).
    pub days: usize,
    /// Batch-window start hour, 24h clock (default: 2).
    pub start_hour: u32,
    /// Maximum start jitter in minutes (default: 90).
    pub start_jitter_minutes: i64,
    /// Run duration range in minutes (default: 15..=75).
    pub min_duration_minutes: i64,
    /// Upper bound of the duration range.
    pub max_duration_minutes: i64,
    /// Probability of a successful run (default: 0.85); half the
    /// remainder fails, half aborts.
    pub success_ratio: f64,
}

impl Default for SyntheticHistoryConfig {
    fn default() -> Self {
        Self {
            days: 30,
            start_hour: 2,
            start_jitter_minutes: 90,
            min_duration_minutes: 15,
            max_duration_minutes: 75,
            success_ratio: 0.85,
        }
    }
}

/// Generate a deterministic synthetic run series for a job, one run per
/// day, ending on `last_day`.
pub fn synthetic_history(
    job_id: &str,
    seed: u64,
    last_day: NaiveDate,
    config: &SyntheticHistoryConfig,
) -> Vec<RunRecord> {
    let mut hasher = DefaultHasher::new();
    job_id.hash(&mut hasher);
    let mut rng = StdRng::seed_from_u64(seed ^ hasher.finish());

    let mut runs = Vec::with_capacity(config.days);
    for day_offset in (0..config.days as i64).rev() {
        let day = last_day - Duration::days(day_offset);
        let base = Utc
            .from_utc_datetime(&day.and_hms_opt(config.start_hour, 0, 0).unwrap_or_default());

        let jitter = rng.gen_range(-config.start_jitter_minutes..=config.start_jitter_minutes);
        let duration = rng.gen_range(config.min_duration_minutes..=config.max_duration_minutes);
        let started_at = base + Duration::minutes(jitter);
        let ended_at = started_at + Duration::minutes(duration);

        let roll: f64 = rng.r#gen();
        let status = if roll < config.success_ratio {
            JobStatus::Completed
        } else if roll < config.success_ratio + (1.0 - config.success_ratio) / 2.0 {
            JobStatus::Failed
        } else {
            JobStatus::Aborted
        };

        runs.push(RunRecord {
            job_id: job_id.to_owned(),
            started_at,
            ended_at,
            status,
        });
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::daily_trend;

    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 31).unwrap()
    }

    #[test]
    fn test_deterministic_for_same_inputs() {
        let config = SyntheticHistoryConfig::default();
        let first = synthetic_history("etl", 7, anchor(), &config);
        let second = synthetic_history("etl", 7, anchor(), &config);

        assert_eq!(first.len(), second.len());
        for (a, b) in first.iter().zip(second.iter()) {
            assert_eq!(a.started_at, b.started_at);
            assert_eq!(a.ended_at, b.ended_at);
            assert_eq!(a.status, b.status);
        }
    }

    #[test]
    fn test_different_jobs_differ() {
        let config = SyntheticHistoryConfig::default();
        let etl = synthetic_history("etl", 7, anchor(), &config);
        let report = synthetic_history("report", 7, anchor(), &config);

        assert!(
            etl.iter()
                .zip(report.iter())
                .any(|(a, b)| a.started_at != b.started_at),
            "different job ids should not share a run series"
        );
    }

    #[test]
    fn test_runs_are_daily_ordered_and_terminal() {
        let config = SyntheticHistoryConfig::default();
        let runs = synthetic_history("etl", 3, anchor(), &config);

        assert_eq!(runs.len(), config.days);
        for run in &runs {
            assert!(run.ended_at > run.started_at);
            assert!(run.status.is_terminal());
        }
        for pair in runs.windows(2) {
            assert!(pair[0].started_at < pair[1].started_at);
        }
        assert_eq!(runs.last().unwrap().started_at.date_naive(), anchor());
    }

    #[test]
    fn test_feeds_the_trend_aggregator() {
        let config = SyntheticHistoryConfig::default();
        let mut runs = synthetic_history("etl", 11, anchor(), &config);
        let trend = daily_trend(&mut runs, 7);

        // 30 daily runs give a full trend series (jitter can spill a run
        // across midnight, so allow a day of slack).
        assert!(trend.len() >= config.days - 2);
    }
}
