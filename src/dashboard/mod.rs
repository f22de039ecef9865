pub mod config;

use std::collections::BTreeMap;

use chrono::{DateTime, Local, Utc};
use log::{debug, info};
use serde::Serialize;

use crate::{
    api::{Filter, Query, RaceDataSource, Resource, SessionKey, fetch},
    race::{
        Aggregation, DataWindow, DriverNumber, DriverRegistry, IntervalSeries, LapSeries,
        LeaderboardRow, PositionTable, Session, TraceDeltas, build_driver_registry,
        build_interval_series, build_session_catalogue, cumulative, project_leaderboard,
        race_trace, standings, track_positions,
    },
};

pub use config::AppConfig;

const STATUS_TIME_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// One session's worth of queries against a data source.
///
/// Every method performs a single request. An unavailable resource yields an empty result.
pub struct RaceData<'a, S: RaceDataSource + ?Sized> {
    source: &'a S,
    session: SessionKey,
}

impl<'a, S: RaceDataSource + ?Sized> RaceData<'a, S> {
    pub fn new(source: &'a S, session: SessionKey) -> Self {
        Self { source, session }
    }

    fn query(&self, resource: Resource) -> Query {
        Query::for_session(resource, &self.session)
    }

    /// Race and sprint sessions of a season, keyed by session key.
    pub fn races_of_year(&self, year: i32) -> BTreeMap<u32, Session> {
        let query = Query::new(Resource::Sessions)
            .filter(Filter::eq("session_type", "Race"))
            .filter(Filter::eq("year", year));
        fetch(self.source, &query)
            .map(|records| build_session_catalogue(&records))
            .unwrap_or_default()
    }

    pub fn race_event(&self) -> Option<Session> {
        fetch(self.source, &self.query(Resource::Sessions))
            .ok()
            .and_then(|records| build_session_catalogue(&records).into_values().last())
    }

    pub fn drivers(&self) -> DriverRegistry {
        fetch(self.source, &self.query(Resource::Drivers))
            .map(|records| build_driver_registry(&records))
            .unwrap_or_default()
    }

    pub fn race_trace(&self, aggregation: Aggregation) -> TraceDeltas {
        fetch(self.source, &self.query(Resource::Laps))
            .map(|records| race_trace(&records, aggregation))
            .unwrap_or_default()
    }

    pub fn intervals(&self, window: DataWindow, now: DateTime<Utc>) -> IntervalSeries {
        let mut query = self.query(Resource::Intervals);
        if let Some(filter) = window.filter(now) {
            query = query.filter(filter);
        }
        fetch(self.source, &query)
            .map(|records| build_interval_series(&records))
            .unwrap_or_default()
    }

    pub fn positions(&self) -> PositionTable {
        fetch(self.source, &self.query(Resource::Position))
            .map(|records| track_positions(&records))
            .unwrap_or_default()
    }
}

/// What caused a refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    Manual,
    SelectionChanged,
    SessionChanged,
}

/// Everything the dashboard currently displays. Parts that could not be refreshed keep
/// their previous value.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DashboardState {
    pub session: Option<SessionKey>,
    pub title: String,
    pub drivers: DriverRegistry,
    pub trace: TraceDeltas,
    pub gaps: IntervalSeries,
    pub positions: PositionTable,
    pub leaderboard: Vec<LeaderboardRow>,
    pub status: String,
}

impl DashboardState {
    /// Drift-from-par curve per driver.
    pub fn cumulative_trace(&self) -> BTreeMap<DriverNumber, LapSeries> {
        self.trace
            .iter()
            .map(|(driver, deltas)| (*driver, cumulative(deltas)))
            .collect()
    }

    /// Plottable gap-to-leader points per driver.
    pub fn gap_curves(&self) -> BTreeMap<DriverNumber, Vec<(&str, f64)>> {
        self.gaps
            .iter()
            .map(|(driver, intervals)| (*driver, intervals.leader.numeric_points()))
            .collect()
    }
}

/// Runs one fetch-and-transform round for the current settings.
///
/// On a session change the previous state is discarded. The event title and driver registry
/// are fetched before anything else whenever they are still missing, so a failed first load is
/// retried by the next refresh. Resources that come back unavailable keep their previous value.
pub fn refresh<S: RaceDataSource + ?Sized>(
    source: &S,
    settings: &AppConfig,
    mut state: DashboardState,
    trigger: Trigger,
    now: DateTime<Utc>,
) -> DashboardState {
    let race = RaceData::new(source, settings.session.clone());
    debug!("Refreshing session {} ({:?})", settings.session, trigger);

    if trigger == Trigger::SessionChanged || state.session.as_ref() != Some(&settings.session) {
        state = DashboardState {
            session: Some(settings.session.clone()),
            ..Default::default()
        };
    }

    // Retried on every refresh until the session's event and drivers have been loaded once
    if state.title.is_empty()
        && let Some(event) = race.race_event()
    {
        state.title = event.title();
    }
    if state.drivers.is_empty() {
        state.drivers = race.drivers();
        info!(
            "Loaded {} drivers for session {}",
            state.drivers.len(),
            settings.session
        );
    }

    let mut unavailable = Vec::new();

    let trace = race.race_trace(settings.aggregation);
    if trace.is_empty() {
        unavailable.push("(no trace)");
    } else {
        state.trace = trace;
    }

    let gaps = race.intervals(settings.data_window, now);
    if gaps.is_empty() {
        unavailable.push("(no gaps)");
    } else {
        state.gaps = gaps;
    }

    let positions = race.positions();
    if positions.is_empty() {
        unavailable.push("(no pos)");
    } else {
        state.positions = positions;
    }

    if !state.gaps.is_empty() {
        let entries = standings(&state.gaps, &state.positions, &state.drivers);
        state.leaderboard = project_leaderboard(entries, &settings.selected_drivers);
    }

    state.status = status_text(now.with_timezone(&Local), &unavailable);
    state
}

fn status_text(updated: DateTime<Local>, unavailable: &[&str]) -> String {
    let mut status = format!("Last updated on {}", updated.format(STATUS_TIME_FORMAT));
    for part in unavailable {
        status.push(' ');
        status.push_str(part);
    }
    status
}
