//! Run-history aggregation: the completion time-of-day trend.
//!
//! For a selected job, past runs are grouped by the calendar day they
//! finished on and reduced to "how late in the day did it finish". A
//! windowed moving average over neighboring days smooths the values into
//! the trend line drawn in the history tab:
//!
//! 1. Sort runs by start time (defensively; callers are not trusted to
//!    pre-sort).
//! 2. Group by the UTC date of the end timestamp; extract each run's
//!    time of day as seconds since midnight (the date part is discarded
//!    so runs compare across days).
//! 3. For each distinct day at index i, average every run value within
//!    the day-index window [i − ⌊w/2⌋, i + ⌊w/2⌋], clamped at the
//!    dataset edges. No wraparound.
//!
//! Fewer than two distinct days yields an empty trend: single points are
//! plotted directly by the chart and a one-point "line" would be noise.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::graph::JobStatus;

/// Default moving-average window in days.
pub const DEFAULT_WINDOW_DAYS: usize = 7;

/// One historical run of a job.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    /// The job this run belongs to.
    pub job_id: String,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub ended_at: DateTime<Utc>,
    /// Terminal status of the run (`success`/`failed`/`aborted`
    /// vocabulary accepted).
    #[serde(deserialize_with = "status_from_str", serialize_with = "status_to_str")]
    pub status: JobStatus,
}

fn status_from_str<'de, D>(deserializer: D) -> Result<JobStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(JobStatus::parse(&raw))
}

fn status_to_str<S>(status: &JobStatus, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(status.as_str())
}

/// One point of the smoothed trend: a day and the windowed mean
/// completion time of day, in seconds since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    /// The day this point represents.
    pub date: NaiveDate,
    /// Windowed mean of end-time seconds since midnight.
    pub mean_seconds_of_day: f64,
}

/// Compute the windowed completion-time trend for a set of runs.
///
/// Returns one point per distinct end day, or nothing when fewer than
/// two distinct days are present.
pub fn daily_trend(entries: &mut [RunRecord], window_days: usize) -> Vec<TrendPoint> {
    entries.sort_by_key(|entry| entry.started_at);

    // Group end time-of-day values by end date; BTreeMap keeps days in
    // ascending order for the index window below.
    let mut by_day: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for entry in entries.iter() {
        let day = entry.ended_at.date_naive();
        let seconds = entry.ended_at.time().num_seconds_from_midnight() as f64;
        by_day.entry(day).or_default().push(seconds);
    }

    if by_day.len() < 2 {
        return Vec::new();
    }

    let days: Vec<(&NaiveDate, &Vec<f64>)> = by_day.iter().collect();
    let half = window_days / 2;

    days.iter()
        .enumerate()
        .map(|(index, &(date, _))| {
            let lo = index.saturating_sub(half);
            let hi = (index + half).min(days.len() - 1);
            let window: Vec<f64> = days[lo..=hi]
                .iter()
                .flat_map(|&(_, values)| values.iter().copied())
                .collect();
            TrendPoint {
                date: *date,
                mean_seconds_of_day: window.iter().sum::<f64>() / window.len() as f64,
            }
        })
        .collect()
}

/// In-memory run-history access, keyed by job id.
///
/// An explicit value store injected where it is needed; loading replaces
/// the previous contents wholesale, mirroring the job-list lifecycle.
#[derive(Debug, Default)]
pub struct RunHistoryStore {
    runs: HashMap<String, Vec<RunRecord>>,
}

impl RunHistoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the store contents with the given runs.
    pub fn load(&mut self, records: Vec<RunRecord>) {
        self.runs.clear();
        for record in records {
            self.runs
                .entry(record.job_id.clone())
                .or_default()
                .push(record);
        }
    }

    /// Append runs for a single job.
    pub fn insert(&mut self, record: RunRecord) {
        self.runs
            .entry(record.job_id.clone())
            .or_default()
            .push(record);
    }

    /// All runs of a job, sorted ascending by start time. Unknown jobs
    /// have an empty history.
    pub fn history_for(&self, job_id: &str) -> Vec<RunRecord> {
        let mut runs = self.runs.get(job_id).cloned().unwrap_or_default();
        runs.sort_by_key(|entry| entry.started_at);
        runs
    }

    /// The smoothed completion-time trend of a job.
    pub fn trend_for(&self, job_id: &str, window_days: usize) -> Vec<TrendPoint> {
        let mut runs = self.history_for(job_id);
        daily_trend(&mut runs, window_days)
    }

    /// Number of jobs with any history.
    pub fn job_count(&self) -> usize {
        self.runs.len()
    }
}
