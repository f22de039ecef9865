use std::collections::BTreeMap;

use serde::Serialize;

use crate::api::records::PositionRecord;

use super::DriverNumber;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DriverPosition {
    /// Last position seen in the feed
    pub current: u32,
    /// Every `(timestamp, position)` update, in feed order
    pub history: Vec<(String, u32)>,
}

pub type PositionTable = BTreeMap<DriverNumber, DriverPosition>;

pub fn track_positions(records: &[PositionRecord]) -> PositionTable {
    let mut table = PositionTable::new();
    for record in records {
        let driver = table
            .entry(record.driver_number)
            .or_insert_with(|| DriverPosition {
                current: record.position,
                history: Vec::new(),
            });
        driver.current = record.position;
        driver.history.push((record.date.clone(), record.position));
    }
    table
}
