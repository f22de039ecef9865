use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{
    Filter,
    records::{Gap, IntervalRecord},
};

use super::DriverNumber;

/// How much interval history to request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataWindow {
    /// The whole session
    #[default]
    Off,
    /// Only the last N minutes
    Minutes(u32),
}

impl DataWindow {
    /// Server-side filter for this window, evaluated at `now`.
    pub fn filter(&self, now: DateTime<Utc>) -> Option<Filter> {
        match self {
            Self::Off => None,
            Self::Minutes(minutes) => Some(Filter::since(now - Duration::minutes(*minutes as i64))),
        }
    }
}

impl FromStr for DataWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("off") {
            return Ok(Self::Off);
        }
        s.parse::<u32>()
            .map(Self::Minutes)
            .map_err(|_| format!("expected 'off' or a number of minutes, got '{s}'"))
    }
}

impl fmt::Display for DataWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => f.write_str("Off"),
            Self::Minutes(minutes) => write!(f, "{minutes}"),
        }
    }
}

/// Timestamp-keyed values kept in arrival order.
///
/// The feed is time ordered, so a repeated timestamp normally follows its first occurrence
/// directly and replaces that value. A repeat arriving after a different timestamp is kept
/// as a new point; earlier points are never searched.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TimeSeries<T> {
    points: Vec<(String, T)>,
}

impl<T> Default for TimeSeries<T> {
    fn default() -> Self {
        Self { points: Vec::new() }
    }
}

impl<T> TimeSeries<T> {
    pub fn insert(&mut self, timestamp: &str, value: T) {
        match self.points.last_mut() {
            Some((last, last_value)) if last == timestamp => *last_value = value,
            _ => self.points.push((timestamp.to_string(), value)),
        }
    }

    pub fn last(&self) -> Option<&T> {
        self.points.last().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.points.iter().map(|(timestamp, value)| (timestamp.as_str(), value))
    }
}

impl TimeSeries<Gap> {
    /// Points with a gap in seconds; lapped and missing gaps are left out of plots.
    pub fn numeric_points(&self) -> Vec<(&str, f64)> {
        self.iter()
            .filter_map(|(timestamp, gap)| gap.seconds().map(|seconds| (timestamp, seconds)))
            .collect()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DriverIntervals {
    /// Gap to the race leader
    pub leader: TimeSeries<Gap>,
    /// Gap to the car directly ahead
    pub interval: TimeSeries<Gap>,
}

impl DriverIntervals {
    pub fn last_gap_to_leader(&self) -> Gap {
        self.leader.last().cloned().unwrap_or_default()
    }

    pub fn last_interval(&self) -> Gap {
        self.interval.last().cloned().unwrap_or_default()
    }
}

pub type IntervalSeries = BTreeMap<DriverNumber, DriverIntervals>;

pub fn build_interval_series(records: &[IntervalRecord]) -> IntervalSeries {
    let mut series = IntervalSeries::new();
    for record in records {
        let driver = series.entry(record.driver_number).or_default();
        driver.leader.insert(&record.date, record.gap_to_leader.clone());
        driver.interval.insert(&record.date, record.interval.clone());
    }
    series
}
