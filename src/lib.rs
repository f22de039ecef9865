// race-engineer library: data access, race computations and dashboard refresh.
// The binary and the integration tests build on these modules.

pub mod api;
pub mod dashboard;
pub mod errors;
pub mod race;

pub use api::{FetchError, OpenF1Client, RaceDataSource, ReplaySource, SessionKey};
pub use dashboard::{AppConfig, DashboardState, RaceData, Trigger, refresh};
pub use errors::RaceEngineerError;
pub use race::{Aggregation, DataWindow, LeaderboardRow};
