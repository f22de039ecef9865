pub mod openf1;
pub mod records;
pub mod replay;

use std::{fmt, io, str::FromStr};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use snafu::Snafu;

pub use openf1::OpenF1Client;
pub use replay::ReplaySource;

pub const OPENF1_BASE_URL: &str = "https://api.openf1.org/v1";

/// Collections exposed by the timing data API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resource {
    Sessions,
    Drivers,
    Laps,
    Position,
    Intervals,
}

impl Resource {
    pub fn path(&self) -> &'static str {
        match self {
            Self::Sessions => "sessions",
            Self::Drivers => "drivers",
            Self::Laps => "laps",
            Self::Position => "position",
            Self::Intervals => "intervals",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Session selector: either the live session or a specific session key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SessionKey {
    #[default]
    Latest,
    Key(u32),
}

impl FromStr for SessionKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("latest") {
            return Ok(Self::Latest);
        }
        s.parse::<u32>()
            .map(Self::Key)
            .map_err(|_| format!("expected 'latest' or a numeric session key, got '{s}'"))
    }
}

impl TryFrom<String> for SessionKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SessionKey> for String {
    fn from(value: SessionKey) -> Self {
        value.to_string()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Latest => f.write_str("latest"),
            Self::Key(key) => write!(f, "{key}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Gte,
    Lte,
}

impl FilterOp {
    fn symbol(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Gte => ">=",
            Self::Lte => "<=",
        }
    }
}

/// A single `field{op}value` query parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: String,
}

impl Filter {
    pub fn eq(field: &str, value: impl fmt::Display) -> Self {
        Self {
            field: field.to_string(),
            op: FilterOp::Eq,
            value: value.to_string(),
        }
    }

    /// Restricts timestamped resources to records at or after `since`, truncated to whole seconds.
    pub fn since(since: DateTime<Utc>) -> Self {
        Self {
            field: "date".to_string(),
            op: FilterOp::Gte,
            value: since.format("%Y-%m-%dT%H:%M:%S").to_string(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.field, self.op.symbol(), self.value)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub resource: Resource,
    pub session: Option<SessionKey>,
    pub filters: Vec<Filter>,
}

impl Query {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            session: None,
            filters: Vec::new(),
        }
    }

    pub fn for_session(resource: Resource, session: &SessionKey) -> Self {
        Self {
            resource,
            session: Some(session.clone()),
            filters: Vec::new(),
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Request path and query string, e.g. `laps?session_key=latest`.
    pub fn request_text(&self) -> String {
        let params = self
            .session
            .iter()
            .map(|session| format!("session_key={session}"))
            .chain(self.filters.iter().map(Filter::to_string))
            .collect::<Vec<_>>();
        if params.is_empty() {
            self.resource.path().to_string()
        } else {
            format!("{}?{}", self.resource, params.join("&"))
        }
    }

    pub fn url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.request_text())
    }
}

/// Every way a request can come back without usable data. The display strings double as the
/// status text of the request log line.
#[derive(Debug, Snafu)]
pub enum FetchError {
    #[snafu(display("Error retrieving data: {source}"))]
    Transport { source: reqwest::Error },
    #[snafu(display("Error retrieving data: {source}"))]
    Replay { source: io::Error },
    #[snafu(display("Error retrieving data: {source}"))]
    Decode { source: serde_json::Error },
    #[snafu(display("Server response: {code}"))]
    Status { code: u16 },
    #[snafu(display("Server response empty"))]
    Empty,
}

/// Anything that can answer a [`Query`] with a raw JSON body.
pub trait RaceDataSource {
    /// Location requests are resolved against; only used to label log lines.
    fn base_url(&self) -> &str;

    fn get(&self, query: &Query) -> Result<String, FetchError>;
}

/// Runs `query` against `source` and decodes the returned collection.
///
/// Emits exactly one log line per call. Records that fail to decode are dropped one by one
/// instead of failing the whole collection.
pub fn fetch<T, S>(source: &S, query: &Query) -> Result<Vec<T>, FetchError>
where
    T: DeserializeOwned,
    S: RaceDataSource + ?Sized,
{
    let result = source.get(query).and_then(|body| decode_records(&body));
    let url = query.url(source.base_url());
    match &result {
        Ok(_) => info!("[{url}] Success"),
        Err(e @ FetchError::Empty) => info!("[{url}] {e}"),
        Err(e) => warn!("[{url}] {e}"),
    }
    result
}

fn decode_records<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, FetchError> {
    let values: Vec<serde_json::Value> =
        serde_json::from_str(body).map_err(|e| FetchError::Decode { source: e })?;
    if values.is_empty() {
        return Err(FetchError::Empty);
    }
    Ok(values
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value(value)
                .map_err(|e| debug!("Discarding malformed record: {}", e))
                .ok()
        })
        .collect())
}
