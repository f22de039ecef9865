use criterion::{Criterion, black_box, criterion_group, criterion_main};
use race_engineer::Aggregation;
use race_engineer::api::records::{Gap, IntervalRecord, LapRecord};
use race_engineer::race::{
    IntervalSeries, PositionTable, build_interval_series, project_leaderboard, race_trace,
    standings,
};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

const DRIVERS: u32 = 20;
const LAPS: u32 = 70;

fn create_sample_laps() -> Vec<LapRecord> {
    let mut records = Vec::new();
    for driver in 1..=DRIVERS {
        for lap_number in 1..=LAPS {
            let (lap_duration, date_start) = match lap_number {
                1 => (None, None),
                2 => (
                    Some(91.0 + driver as f64 * 0.1),
                    Some(format!("2024-06-09T18:{:02}:{:02}.000000+00:00", 5, driver)),
                ),
                _ => (Some(90.0 + driver as f64 * 0.05 + (lap_number % 7) as f64 * 0.2), None),
            };
            records.push(LapRecord {
                driver_number: driver,
                lap_number,
                lap_duration,
                date_start,
            });
        }
    }
    records
}

fn create_sample_intervals(updates: u32) -> Vec<IntervalRecord> {
    let mut records = Vec::new();
    for update in 0..updates {
        for driver in 1..=DRIVERS {
            let gap = if driver == 1 {
                Gap::Missing
            } else if driver == DRIVERS {
                Gap::Text("+1 LAP".to_string())
            } else {
                Gap::Seconds(driver as f64 * 1.7 + update as f64 * 0.01)
            };
            records.push(IntervalRecord {
                driver_number: driver,
                date: format!("2024-06-09T18:{:02}:{:02}.000000+00:00", update / 60, update % 60),
                gap_to_leader: gap.clone(),
                interval: gap,
            });
        }
    }
    records
}

fn bench_race_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("race_trace");

    let laps = create_sample_laps();
    for aggregation in [
        Aggregation::Mean,
        Aggregation::Median,
        Aggregation::RunningMean,
        Aggregation::Fixed(90.),
    ] {
        group.bench_function(format!("trace_{aggregation}"), |b| {
            b.iter(|| black_box(race_trace(black_box(&laps), aggregation)));
        });
    }

    group.finish();
}

fn bench_leaderboard(c: &mut Criterion) {
    let mut group = c.benchmark_group("leaderboard");

    let intervals = create_sample_intervals(600);
    group.bench_function("build_interval_series_12000_records", |b| {
        b.iter(|| black_box(build_interval_series(black_box(&intervals))));
    });

    let gaps: IntervalSeries = build_interval_series(&intervals);
    let positions = PositionTable::new();
    let drivers = BTreeMap::new();
    let selection = BTreeSet::from([3, 7, 11, 15]);
    group.bench_function("project_selected_drivers", |b| {
        b.iter(|| {
            let entries = standings(&gaps, &positions, &drivers);
            black_box(project_leaderboard(entries, black_box(&selection)))
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets = bench_race_trace, bench_leaderboard
}
criterion_main!(benches);
