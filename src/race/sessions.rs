use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::api::records::SessionRecord;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub key: u32,
    pub name: String,
    pub country: String,
    pub location: String,
    pub year: Option<i32>,
    pub date_start: Option<String>,
}

impl Session {
    /// Entry shown in the race picker, e.g. `Belgium - Spa-Francorchamps - Race`.
    pub fn option_label(&self) -> String {
        format!("{} - {} - {}", self.country, self.location, self.name)
    }

    /// Chart title, e.g. `Belgium 2024 - Spa-Francorchamps`.
    pub fn title(&self) -> String {
        match self.year {
            Some(year) => format!("{} {} - {}", self.country, year, self.location),
            None => format!("{} - {}", self.country, self.location),
        }
    }
}

impl From<&SessionRecord> for Session {
    fn from(record: &SessionRecord) -> Self {
        Self {
            key: record.session_key,
            name: record.session_name.clone().unwrap_or_default(),
            country: record.country_name.clone().unwrap_or_default(),
            location: record.location.clone().unwrap_or_default(),
            year: record.year,
            date_start: record.date_start.clone(),
        }
    }
}

pub fn build_session_catalogue(records: &[SessionRecord]) -> BTreeMap<u32, Session> {
    records
        .iter()
        .map(|record| (record.session_key, Session::from(record)))
        .collect()
}
