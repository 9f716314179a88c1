//! Bucket granularity for consumption summaries.

use core::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// Error returned for an unknown granularity name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("No aggregation of type '{0}'. The ones available are: minute, hour, day")]
pub struct GranularityError(pub String);

/// Width of the fixed time windows used to group item-creation events.
///
/// Buckets are aligned to the Unix epoch in UTC, so hourly buckets start on the
/// hour and daily buckets start at midnight UTC.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// One-minute buckets.
    Minute,
    /// One-hour buckets.
    #[default]
    Hour,
    /// One-day buckets.
    Day,
}

impl Granularity {
    /// Bucket width in seconds.
    #[must_use]
    pub const fn width_secs(self) -> i64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 60 * 60,
            Self::Day => 24 * 60 * 60,
        }
    }

    /// Bucket width as a duration.
    #[must_use]
    pub fn step(self) -> TimeDelta {
        TimeDelta::seconds(self.width_secs())
    }

    /// Start of the bucket containing `at`.
    #[must_use]
    pub fn bucket_start(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let secs = at.timestamp();
        let floor = secs - secs.rem_euclid(self.width_secs());
        DateTime::from_timestamp(floor, 0).unwrap_or(at)
    }

    /// Lowercase name as accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minute => "minute",
            Self::Hour => "hour",
            Self::Day => "day",
        }
    }
}

impl FromStr for Granularity {
    type Err = GranularityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minute" => Ok(Self::Minute),
            "hour" => Ok(Self::Hour),
            "day" => Ok(Self::Day),
            other => Err(GranularityError(other.to_owned())),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
