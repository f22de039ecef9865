use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDateTime, Timelike};

use crate::api::records::LapRecord;

use super::{DriverNumber, LapNumber};

/// Lap everyone starts from, anchored at 0 seconds.
pub const RACE_START_LAP: LapNumber = 0;
/// The opening lap is not timed by the feed; its duration is derived from when lap 2 starts.
pub const OPENING_LAP: LapNumber = 1;
pub(crate) const FIRST_TIMED_LAP: LapNumber = 2;

pub type LapSeries = BTreeMap<LapNumber, f64>;
pub type DriverLapSeries = BTreeMap<DriverNumber, LapSeries>;

/// Seconds elapsed since the top of the hour (minutes and seconds only) of an ISO-8601 timestamp,
/// read in the timestamp's own offset.
///
/// The hour is discarded, so an opening lap whose end crosses the hour comes out wrong.
pub fn seconds_past_the_hour(timestamp: &str) -> Option<f64> {
    let time = DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()?;
    Some(time.minute() as f64 * 60. + time.second() as f64 + time.nanosecond() as f64 / 1e9)
}

/// Opening lap duration carried by a lap-2 record, if it has a usable start time.
pub(crate) fn synthesized_opening_lap(record: &LapRecord) -> Option<f64> {
    if record.lap_number != FIRST_TIMED_LAP {
        return None;
    }
    record.date_start.as_deref().and_then(seconds_past_the_hour)
}

/// Timed duration of a record; the opening lap is never taken from the feed.
pub(crate) fn timed_duration(record: &LapRecord) -> Option<f64> {
    if record.lap_number < FIRST_TIMED_LAP {
        return None;
    }
    record.lap_duration
}

pub fn build_lap_series(records: &[LapRecord]) -> DriverLapSeries {
    let mut series = DriverLapSeries::new();
    for record in records {
        let laps = series
            .entry(record.driver_number)
            .or_insert_with(|| LapSeries::from([(RACE_START_LAP, 0.)]));
        if let Some(opening_lap) = synthesized_opening_lap(record) {
            laps.insert(OPENING_LAP, opening_lap);
        }
        if let Some(duration) = timed_duration(record) {
            laps.insert(record.lap_number, duration);
        }
    }
    series
}
