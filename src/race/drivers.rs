use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::records::DriverRecord;

use super::DriverNumber;

/// Colour used for drivers whose team colour is not published.
pub const DEFAULT_TEAM_COLOUR: &str = "#111111";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub number: DriverNumber,
    pub country_code: String,
    pub first_name: String,
    pub last_name: String,
    pub headshot_url: String,
    pub team_name: String,
    /// `#rrggbb`, lower case
    pub team_colour: String,
    pub name_acronym: String,
}

impl Driver {
    /// Short label for legends and tables, falling back to the car number.
    pub fn label(&self) -> String {
        if self.name_acronym.is_empty() {
            self.number.to_string()
        } else {
            self.name_acronym.clone()
        }
    }
}

impl From<&DriverRecord> for Driver {
    fn from(record: &DriverRecord) -> Self {
        let text = |field: &Option<String>| field.clone().unwrap_or_default();
        Self {
            number: record.driver_number,
            country_code: text(&record.country_code),
            first_name: text(&record.first_name),
            last_name: text(&record.last_name),
            headshot_url: text(&record.headshot_url),
            team_name: text(&record.team_name),
            team_colour: team_colour_hex(record.team_colour.as_deref()),
            name_acronym: text(&record.name_acronym),
        }
    }
}

pub type DriverRegistry = BTreeMap<DriverNumber, Driver>;

pub fn team_colour_hex(colour: Option<&str>) -> String {
    match colour.map(str::trim) {
        None | Some("") => DEFAULT_TEAM_COLOUR.to_string(),
        Some(hex) => format!("#{}", hex.to_lowercase()),
    }
}

pub fn build_driver_registry(records: &[DriverRecord]) -> DriverRegistry {
    records
        .iter()
        .map(|record| (record.driver_number, Driver::from(record)))
        .collect()
}
