// Raw records as served by the timing API. Only the fields the dashboard reads are decoded.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DriverRecord {
    pub driver_number: u32,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub headshot_url: Option<String>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub team_colour: Option<String>,
    #[serde(default)]
    pub name_acronym: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub driver_number: u32,
    pub lap_number: u32,
    /// Seconds; `None` for untimed or invalid laps
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub lap_duration: Option<f64>,
    #[serde(default)]
    pub date_start: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub driver_number: u32,
    pub date: String,
    #[serde(default)]
    pub gap_to_leader: Gap,
    #[serde(default)]
    pub interval: Gap,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    pub driver_number: u32,
    pub date: String,
    pub position: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_key: u32,
    #[serde(default)]
    pub session_name: Option<String>,
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub date_start: Option<String>,
}

/// A time gap as reported by the interval feed.
///
/// Lapped cars are reported with text such as `+1 LAP` instead of seconds, and the leader
/// has no gap at all.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Gap {
    Seconds(f64),
    Text(String),
    #[default]
    Missing,
}

impl Gap {
    pub fn seconds(&self) -> Option<f64> {
        match self {
            Self::Seconds(seconds) => Some(*seconds),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Seconds(_))
    }
}

impl fmt::Display for Gap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seconds(seconds) => write!(f, "{seconds:.3}"),
            Self::Text(text) => f.write_str(text),
            Self::Missing => Ok(()),
        }
    }
}

impl<'de> Deserialize<'de> for Gap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => match text.trim().parse::<f64>() {
                Ok(seconds) if seconds.is_finite() => Gap::Seconds(seconds),
                _ => Gap::Text(text),
            },
            value => numeric(&value).map(Gap::Seconds).unwrap_or(Gap::Missing),
        })
    }
}

/// Finite number from a JSON number or numeric string.
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn lenient_seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(numeric(&Value::deserialize(deserializer)?))
}
