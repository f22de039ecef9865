use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::api::records::LapRecord;

use super::{
    LapNumber,
    laps::{OPENING_LAP, RACE_START_LAP, synthesized_opening_lap, timed_duration},
};

/// Lap time used by [`Aggregation::Fixed`] when none is given.
pub const DEFAULT_FIXED_LAP_S: f64 = 90.;
const REFERENCE_DECIMALS: i32 = 3;

/// How the per-lap reference time every driver is compared against is obtained.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Aggregation {
    Mean,
    #[default]
    Median,
    /// Mean of every lap time up to and including the lap
    RunningMean,
    /// The same lap time for every lap
    Fixed(f64),
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "mean" | "avg" | "average" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            "running-mean" | "moving-avg" => Ok(Self::RunningMean),
            "fixed" => Ok(Self::Fixed(DEFAULT_FIXED_LAP_S)),
            _ => match s.strip_prefix("fixed=").or_else(|| s.strip_prefix("fixed:")) {
                Some(seconds) => seconds
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .map(Self::Fixed)
                    .ok_or_else(|| format!("invalid fixed lap time '{seconds}'")),
                None => Err(format!(
                    "unknown aggregation '{s}', expected mean, median, running-mean or fixed=<seconds>"
                )),
            },
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean => f.write_str("mean"),
            Self::Median => f.write_str("median"),
            Self::RunningMean => f.write_str("running-mean"),
            Self::Fixed(seconds) => write!(f, "fixed={seconds}"),
        }
    }
}

pub type ReferenceTable = BTreeMap<LapNumber, f64>;

/// What driver lap times are differenced against.
#[derive(Clone, Debug, PartialEq)]
pub enum Reference {
    Table(ReferenceTable),
    Fixed(f64),
}

/// Builds the reference for `aggregation` from the same records the driver series come from.
pub fn build_reference(records: &[LapRecord], aggregation: Aggregation) -> Reference {
    match aggregation {
        Aggregation::Fixed(seconds) => Reference::Fixed(seconds),
        Aggregation::Mean => Reference::Table(reduce_groups(lap_groups(records), mean)),
        Aggregation::Median => Reference::Table(reduce_groups(lap_groups(records), median)),
        Aggregation::RunningMean => Reference::Table(running_mean(lap_groups(records))),
    }
}

/// Every driver's time per lap, with the opening lap derived from lap-2 start times.
fn lap_groups(records: &[LapRecord]) -> BTreeMap<LapNumber, Vec<f64>> {
    let mut groups: BTreeMap<LapNumber, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let Some(opening_lap) = synthesized_opening_lap(record) {
            groups.entry(OPENING_LAP).or_default().push(opening_lap);
        }
        if let Some(duration) = timed_duration(record) {
            groups.entry(record.lap_number).or_default().push(duration);
        }
    }
    groups
}

fn reduce_groups(
    groups: BTreeMap<LapNumber, Vec<f64>>,
    statistic: fn(&[f64]) -> f64,
) -> ReferenceTable {
    let mut table = ReferenceTable::from([(RACE_START_LAP, 0.)]);
    table.extend(
        groups
            .into_iter()
            .map(|(lap, times)| (lap, round_to_decimals(statistic(&times), REFERENCE_DECIMALS))),
    );
    table
}

fn running_mean(groups: BTreeMap<LapNumber, Vec<f64>>) -> ReferenceTable {
    let mut table = ReferenceTable::from([(RACE_START_LAP, 0.)]);
    let (mut sum, mut count) = (0., 0usize);
    for (lap, times) in groups {
        sum += times.iter().sum::<f64>();
        count += times.len();
        table.insert(lap, round_to_decimals(sum / count as f64, REFERENCE_DECIMALS));
    }
    table
}

pub fn round_to_decimals(number: f64, decimals: i32) -> f64 {
    let multiplier = 10f64.powi(decimals);
    (number * multiplier).round() / multiplier
}

pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Middle value, or the mean of the two middle values for an even count.
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let middle = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[middle - 1] + sorted[middle]) / 2.
    } else {
        sorted[middle]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::laps::tests::{lap, lap_two};
    use proptest::prelude::*;

    fn table(records: &[LapRecord], aggregation: Aggregation) -> ReferenceTable {
        match build_reference(records, aggregation) {
            Reference::Table(table) => table,
            Reference::Fixed(_) => panic!("Expected a reference table"),
        }
    }

    #[test]
    fn test_statistics_on_symmetric_laps() {
        let records = vec![
            lap(1, 5, Some(88.)),
            lap(2, 5, Some(90.)),
            lap(3, 5, Some(92.)),
        ];
        assert_eq!(table(&records, Aggregation::Median)[&5], 90.);
        assert_eq!(table(&records, Aggregation::Mean)[&5], 90.);
    }

    #[test]
    fn test_mean_rounded_to_three_decimals() {
        let records = vec![
            lap(1, 5, Some(88.)),
            lap(2, 5, Some(90.)),
            lap(3, 5, Some(93.)),
        ];
        assert_eq!(table(&records, Aggregation::Median)[&5], 90.);
        assert_eq!(table(&records, Aggregation::Mean)[&5], 90.333);
    }

    #[test]
    fn test_median_of_even_count() {
        assert_eq!(median(&[92., 88., 90., 94.]), 91.);
        assert_eq!(median(&[7.]), 7.);
    }

    #[test]
    fn test_table_includes_start_and_opening_lap() {
        let records = vec![
            lap(1, 1, Some(130.)),
            lap_two(1, Some(95.), "2024-01-01T00:01:40+00:00"),
            lap_two(2, None, "2024-01-01T00:01:42+00:00"),
            lap(2, 3, None),
        ];
        let reference = table(&records, Aggregation::Median);
        // lap 3 has no valid time and lap 1's feed value is ignored
        assert_eq!(
            reference,
            ReferenceTable::from([(0, 0.), (1, 101.), (2, 95.)])
        );
    }

    #[test]
    fn test_running_mean_accumulates_laps() {
        let records = vec![
            lap(1, 2, Some(90.)),
            lap(2, 2, Some(92.)),
            lap(1, 3, Some(88.)),
            lap(1, 4, Some(100.)),
        ];
        let reference = table(&records, Aggregation::RunningMean);
        assert_eq!(reference[&2], 91.);
        assert_eq!(reference[&3], 90.);
        assert_eq!(reference[&4], 92.5);
    }

    #[test]
    fn test_fixed_builds_no_table() {
        let records = vec![lap(1, 2, Some(90.))];
        assert_eq!(
            build_reference(&records, Aggregation::Fixed(95.)),
            Reference::Fixed(95.)
        );
    }

    #[test]
    fn test_aggregation_parsing() {
        assert_eq!("median".parse::<Aggregation>(), Ok(Aggregation::Median));
        assert_eq!("AVG".parse::<Aggregation>(), Ok(Aggregation::Mean));
        assert_eq!(
            "running-mean".parse::<Aggregation>(),
            Ok(Aggregation::RunningMean)
        );
        assert_eq!(
            "fixed".parse::<Aggregation>(),
            Ok(Aggregation::Fixed(DEFAULT_FIXED_LAP_S))
        );
        assert_eq!("fixed=95.5".parse::<Aggregation>(), Ok(Aggregation::Fixed(95.5)));
        assert!("fixed=fast".parse::<Aggregation>().is_err());
        assert!("mode".parse::<Aggregation>().is_err());
        assert_eq!(Aggregation::Fixed(95.5).to_string(), "fixed=95.5");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_reference_within_lap_bounds(times in proptest::collection::vec(60.0f64..200.0, 1..30)) {
            let records: Vec<LapRecord> = times
                .iter()
                .enumerate()
                .map(|(driver, time)| lap(driver as u32, 7, Some(*time)))
                .collect();
            let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            for aggregation in [Aggregation::Mean, Aggregation::Median] {
                let value = table(&records, aggregation)[&7];
                prop_assert!(value >= min - 0.0005 && value <= max + 0.0005);
            }
        }
    }
}
