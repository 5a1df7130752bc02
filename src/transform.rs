use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde_json::Value;

use crate::error::{BuildLensError, Result};
use crate::records::RawBuildRecord;

const SECONDS_PER_DAY: i64 = 86_400;

/// A build with its timestamps resolved and normalized to UTC.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecord {
    /// Start time, or the finish time when the build never started.
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Reported duration in seconds. `None` when the data file holds `null`.
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Interval,
    Duration,
}

impl SeriesKind {
    /// Suffix used in output file names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Interval => "diff-date",
            Self::Duration => "build-duration",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Interval => "Interval Between Dates",
            Self::Duration => "Build Duration",
        }
    }
}

/// A series of minute values derived from a [`BuildRecordSet`].
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSeries {
    pub kind: SeriesKind,
    pub values: Vec<f64>,
}

/// Builds ordered by resolved start time.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildRecordSet {
    records: Vec<BuildRecord>,
}

impl BuildRecordSet {
    pub fn from_raw(raw: &[RawBuildRecord]) -> Result<Self> {
        if raw.len() < 2 {
            return Err(BuildLensError::data_format(format!(
                "at least two build records are required to compute intervals, found {}",
                raw.len()
            )));
        }

        let mut records = raw
            .iter()
            .enumerate()
            .map(|(index, record)| resolve_record(index, record))
            .collect::<Result<Vec<_>>>()?;

        // Stable, so builds sharing a start time keep their file order.
        records.sort_by_key(|record| record.started_at);

        Ok(Self { records })
    }

    pub fn records(&self) -> &[BuildRecord] {
        &self.records
    }

    /// Durations in minutes of every build that reported a positive duration.
    pub fn duration_series(&self) -> DerivedSeries {
        let values = self
            .records
            .iter()
            .filter_map(|record| record.duration)
            .filter(|&duration| duration > 0.0)
            .map(|duration| duration / 60.0)
            .collect();

        DerivedSeries {
            kind: SeriesKind::Duration,
            values,
        }
    }

    /// Minutes between the start of each build and the start of the next one.
    ///
    /// Each value is the sub-day part of `started_at[i] - started_at[i + 1]`,
    /// with days floored so the seconds part stays in `[0, 86400)`. Because the
    /// set is ascending this difference is negative, so a ten minute gap comes
    /// out as 1430 minutes and whole days are dropped.
    pub fn interval_series(&self) -> DerivedSeries {
        let values = self
            .records
            .windows(2)
            .map(|pair| sub_day_minutes(pair[0].started_at - pair[1].started_at))
            .collect();

        DerivedSeries {
            kind: SeriesKind::Interval,
            values,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn sub_day_minutes(delta: TimeDelta) -> f64 {
    let whole_seconds = if delta.subsec_nanos() < 0 {
        delta.num_seconds() - 1
    } else {
        delta.num_seconds()
    };

    whole_seconds.rem_euclid(SECONDS_PER_DAY) as f64 / 60.0
}

fn resolve_record(index: usize, record: &RawBuildRecord) -> Result<BuildRecord> {
    let finished_at = record
        .finished_at
        .as_ref()
        .and_then(timestamp_value)
        .ok_or_else(|| {
            BuildLensError::data_format(format!(
                "record {index} has a missing or unparsable finished_at"
            ))
        })?;

    let started_at = record
        .started_at
        .as_ref()
        .and_then(timestamp_value)
        .unwrap_or(finished_at);

    let duration = match &record.duration {
        None => {
            return Err(BuildLensError::data_format(format!(
                "record {index} has no duration"
            )))
        }
        Some(Value::Null) => None,
        Some(Value::Number(number)) => number.as_f64(),
        Some(other) => {
            return Err(BuildLensError::data_format(format!(
                "record {index} has a non-numeric duration: {other}"
            )))
        }
    };

    Ok(BuildRecord {
        started_at,
        finished_at,
        duration,
    })
}

fn timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_timestamp)
}

/// Parse the timestamp layouts found in harvested build data.
///
/// Values without an offset are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }

    // Ruby's Time#to_s layout
    if let Ok(timestamp) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
        return Some(timestamp.with_timezone(&Utc));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(raw, layout).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc())
}
