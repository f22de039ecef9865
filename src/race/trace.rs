use std::collections::BTreeMap;

use crate::api::records::LapRecord;

use super::{
    Aggregation, DriverNumber, Reference, build_reference,
    laps::{DriverLapSeries, LapSeries, build_lap_series},
};

/// Per driver, lap number to seconds gained (negative) or lost against the reference lap.
pub type TraceDeltas = BTreeMap<DriverNumber, LapSeries>;

/// Differences every driver lap against `reference`.
///
/// # Panics
///
/// When a driver lap has no entry in a reference table. Tables built by [`build_reference`]
/// from the same records always cover the series, so this only happens when unrelated
/// series and tables are paired.
pub fn diff_laps(series: &DriverLapSeries, reference: &Reference) -> TraceDeltas {
    series
        .iter()
        .map(|(driver, laps)| {
            let deltas = laps
                .iter()
                .map(|(lap, seconds)| {
                    let reference_s = match reference {
                        Reference::Fixed(fixed) => *fixed,
                        Reference::Table(table) => *table.get(lap).unwrap_or_else(|| {
                            panic!("no reference time for lap {lap} of driver {driver}")
                        }),
                    };
                    (*lap, seconds - reference_s)
                })
                .collect();
            (*driver, deltas)
        })
        .collect()
}

/// Running total of lap deltas: the drift-from-par curve plotted for each driver.
pub fn cumulative(deltas: &LapSeries) -> LapSeries {
    deltas
        .iter()
        .scan(0., |total, (lap, delta)| {
            *total += delta;
            Some((*lap, *total))
        })
        .collect()
}

/// Lap series and reference built from the same records, differenced.
pub fn race_trace(records: &[LapRecord], aggregation: Aggregation) -> TraceDeltas {
    let series = build_lap_series(records);
    let reference = build_reference(records, aggregation);
    diff_laps(&series, &reference)
}
