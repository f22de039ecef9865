// Pure transformations from raw timing records to driver series and standings.

pub mod aggregation;
pub mod drivers;
pub mod intervals;
pub mod laps;
pub mod leaderboard;
pub mod positions;
pub mod sessions;
pub mod trace;

pub type DriverNumber = u32;
pub type LapNumber = u32;

pub use aggregation::{Aggregation, Reference, ReferenceTable, build_reference};
pub use drivers::{DEFAULT_TEAM_COLOUR, Driver, DriverRegistry, build_driver_registry};
pub use intervals::{DataWindow, DriverIntervals, IntervalSeries, TimeSeries, build_interval_series};
pub use laps::{DriverLapSeries, LapSeries, build_lap_series};
pub use leaderboard::{LeaderboardRow, StandingsEntry, project_leaderboard, standings};
pub use positions::{DriverPosition, PositionTable, track_positions};
pub use sessions::{Session, build_session_catalogue};
pub use trace::{TraceDeltas, cumulative, diff_laps, race_trace};
