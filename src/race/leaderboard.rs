use std::{cmp::Ordering, collections::BTreeSet};

use serde::Serialize;

use crate::api::records::Gap;

use super::{DriverNumber, DriverRegistry, IntervalSeries, PositionTable};

/// Gap text shown for the (projected) leader.
pub const LEADER_GAP: &str = "-";

/// A driver's last known standing as reported by the feed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StandingsEntry {
    pub position: Option<u32>,
    pub number: DriverNumber,
    pub last_name: String,
    pub gap_to_leader: Gap,
    pub interval: Gap,
}

/// A table row with gaps recomputed for the selected drivers only.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeaderboardRow {
    pub position: Option<u32>,
    pub number: DriverNumber,
    pub last_name: String,
    pub gap_to_leader: String,
    pub interval: String,
    pub included: bool,
}

/// Joins the last gap of every driver with their current position and name.
pub fn standings(
    gaps: &IntervalSeries,
    positions: &PositionTable,
    drivers: &DriverRegistry,
) -> Vec<StandingsEntry> {
    gaps.iter()
        .map(|(number, intervals)| StandingsEntry {
            position: positions.get(number).map(|p| p.current),
            number: *number,
            last_name: drivers
                .get(number)
                .map(|d| d.last_name.clone())
                .unwrap_or_else(|| number.to_string()),
            gap_to_leader: intervals.last_gap_to_leader(),
            interval: intervals.last_interval(),
        })
        .collect()
}

/// Orders `entries` and recomputes their gaps as if only `selection` were racing.
///
/// An empty selection includes everyone. The first included driver becomes the leader; later
/// included drivers are re-based on its gap, and the intervals of excluded drivers are carried
/// over to the next included one. Excluded drivers keep their row with empty gaps.
pub fn project_leaderboard(
    mut entries: Vec<StandingsEntry>,
    selection: &BTreeSet<DriverNumber>,
) -> Vec<LeaderboardRow> {
    entries.sort_by(standing_order);

    let everyone = selection.is_empty();
    let mut leader_set = false;
    let mut delta_leader = 0.;
    let mut delta_interval = 0.;

    entries
        .into_iter()
        .map(|entry| {
            let included = everyone || selection.contains(&entry.number);
            let (gap_to_leader, interval) = match (leader_set, included) {
                (false, true) => {
                    leader_set = true;
                    if let Some(seconds) = entry.gap_to_leader.seconds() {
                        delta_leader = seconds;
                    }
                    (LEADER_GAP.to_string(), LEADER_GAP.to_string())
                }
                (false, false) => (String::new(), String::new()),
                (true, true) => {
                    let gaps = (
                        format_gap(&entry.gap_to_leader, -delta_leader),
                        format_gap(&entry.interval, delta_interval),
                    );
                    delta_interval = 0.;
                    gaps
                }
                (true, false) => {
                    if let Some(seconds) = entry.interval.seconds() {
                        delta_interval += seconds;
                    }
                    (String::new(), String::new())
                }
            };
            LeaderboardRow {
                position: entry.position,
                number: entry.number,
                last_name: entry.last_name,
                gap_to_leader,
                interval,
                included,
            }
        })
        .collect()
}

fn format_gap(gap: &Gap, offset: f64) -> String {
    match gap {
        Gap::Seconds(seconds) => format!("+{:.3}", seconds + offset),
        Gap::Text(text) => format!("+{text}"),
        Gap::Missing => String::new(),
    }
}

/// Position first; drivers without one follow, ordered by their gap to the leader.
fn standing_order(a: &StandingsEntry, b: &StandingsEntry) -> Ordering {
    match (a.position, b.position) {
        (Some(a_pos), Some(b_pos)) => a_pos.cmp(&b_pos),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => gap_order(&a.gap_to_leader, &b.gap_to_leader),
    }
    .then(a.number.cmp(&b.number))
}

/// Leader (no gap) first, then gaps in seconds, then lapped cars by laps down.
fn gap_order(a: &Gap, b: &Gap) -> Ordering {
    fn rank(gap: &Gap) -> u8 {
        match gap {
            Gap::Missing => 0,
            Gap::Seconds(_) => 1,
            Gap::Text(_) => 2,
        }
    }
    fn laps_down(text: &str) -> Option<u32> {
        text.trim_start_matches('+')
            .split_whitespace()
            .next()
            .and_then(|laps| laps.parse().ok())
    }

    rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
        (Gap::Seconds(a), Gap::Seconds(b)) => a.total_cmp(b),
        (Gap::Text(a), Gap::Text(b)) => laps_down(a).cmp(&laps_down(b)).then(a.cmp(b)),
        _ => Ordering::Equal,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::{DriverIntervals, DriverPosition};

    fn entry(position: Option<u32>, number: u32, leader: Gap, interval: Gap) -> StandingsEntry {
        StandingsEntry {
            position,
            number,
            last_name: format!("Driver{number}"),
            gap_to_leader: leader,
            interval,
        }
    }

    fn gaps(rows: &[LeaderboardRow]) -> Vec<(&str, &str)> {
        rows.iter()
            .map(|row| (row.gap_to_leader.as_str(), row.interval.as_str()))
            .collect()
    }

    fn three_cars() -> Vec<StandingsEntry> {
        vec![
            entry(Some(3), 3, Gap::Seconds(12.), Gap::Seconds(7.)),
            entry(Some(1), 1, Gap::Seconds(0.), Gap::Seconds(0.)),
            entry(Some(2), 2, Gap::Seconds(5.), Gap::Seconds(5.)),
        ]
    }

    #[test]
    fn test_everyone_included_without_selection() {
        let rows = project_leaderboard(three_cars(), &BTreeSet::new());
        let order: Vec<u32> = rows.iter().map(|row| row.number).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert_eq!(
            gaps(&rows),
            vec![("-", "-"), ("+5.000", "+5.000"), ("+12.000", "+7.000")]
        );
        assert!(rows.iter().all(|row| row.included));
    }

    #[test]
    fn test_rebased_on_first_selected_driver() {
        let rows = project_leaderboard(three_cars(), &BTreeSet::from([2, 3]));
        assert_eq!(
            gaps(&rows),
            vec![("", ""), ("-", "-"), ("+7.000", "+7.000")]
        );
        assert_eq!(
            rows.iter().map(|row| row.included).collect::<Vec<_>>(),
            vec![false, true, true]
        );
        // excluded rows stay in the table
        assert_eq!(rows[0].last_name, "Driver1");
        assert_eq!(rows[0].position, Some(1));
    }

    #[test]
    fn test_interval_spans_excluded_drivers() {
        let entries = vec![
            entry(Some(1), 1, Gap::Missing, Gap::Missing),
            entry(Some(2), 2, Gap::Seconds(2.), Gap::Seconds(2.)),
            entry(Some(3), 3, Gap::Seconds(5.), Gap::Seconds(3.)),
        ];
        let rows = project_leaderboard(entries, &BTreeSet::from([1, 3]));
        assert_eq!(gaps(&rows), vec![("-", "-"), ("", ""), ("+5.000", "+5.000")]);
    }

    #[test]
    fn test_interval_delta_resets_after_included_driver() {
        let entries = vec![
            entry(Some(1), 1, Gap::Missing, Gap::Missing),
            entry(Some(2), 2, Gap::Seconds(1.), Gap::Seconds(1.)),
            entry(Some(3), 3, Gap::Seconds(3.), Gap::Seconds(2.)),
            entry(Some(4), 4, Gap::Seconds(7.), Gap::Seconds(4.)),
        ];
        let rows = project_leaderboard(entries, &BTreeSet::from([1, 3, 4]));
        assert_eq!(rows[2].interval, "+3.000");
        assert_eq!(rows[3].interval, "+4.000");
    }

    #[test]
    fn test_excluded_before_leader_not_accumulated() {
        let entries = vec![
            entry(Some(1), 1, Gap::Missing, Gap::Missing),
            entry(Some(2), 2, Gap::Seconds(2.), Gap::Seconds(2.)),
            entry(Some(3), 3, Gap::Seconds(5.), Gap::Seconds(3.)),
            entry(Some(4), 4, Gap::Seconds(6.), Gap::Seconds(1.)),
        ];
        let rows = project_leaderboard(entries, &BTreeSet::from([3, 4]));
        assert_eq!(
            gaps(&rows),
            vec![("", ""), ("", ""), ("-", "-"), ("+1.000", "+1.000")]
        );
    }

    #[test]
    fn test_lapped_cars_text_is_always_prefixed() {
        let entries = vec![
            entry(Some(1), 1, Gap::Missing, Gap::Missing),
            entry(Some(2), 2, Gap::Text("+1 LAP".into()), Gap::Text("lapped".into())),
        ];
        let rows = project_leaderboard(entries, &BTreeSet::new());
        // Feed text is shown verbatim after the prefix, even when it carries its own '+'
        assert_eq!(gaps(&rows), vec![("-", "-"), ("++1 LAP", "+lapped")]);
    }

    #[test]
    fn test_without_positions_ordered_by_gap() {
        let entries = vec![
            entry(None, 20, Gap::Text("+2 LAPS".into()), Gap::Seconds(1.)),
            entry(None, 10, Gap::Text("+10 LAPS".into()), Gap::Seconds(1.)),
            entry(None, 5, Gap::Seconds(9.5), Gap::Seconds(1.)),
            entry(None, 7, Gap::Missing, Gap::Missing),
            entry(None, 3, Gap::Seconds(1.25), Gap::Seconds(1.25)),
        ];
        let rows = project_leaderboard(entries, &BTreeSet::new());
        let order: Vec<u32> = rows.iter().map(|row| row.number).collect();
        assert_eq!(order, vec![7, 3, 5, 20, 10]);
        assert_eq!(rows[0].position, None);
    }

    #[test]
    fn test_standings_join() {
        let mut intervals = DriverIntervals::default();
        intervals.leader.insert("t0", Gap::Seconds(1.));
        intervals.leader.insert("t1", Gap::Seconds(1.5));
        intervals.interval.insert("t0", Gap::Seconds(1.));
        intervals.interval.insert("t1", Gap::Seconds(0.5));
        let series = IntervalSeries::from([(4, intervals), (81, DriverIntervals::default())]);
        let positions = PositionTable::from([(
            4,
            DriverPosition {
                current: 2,
                history: vec![("t0".to_string(), 2)],
            },
        )]);

        let entries = standings(&series, &positions, &DriverRegistry::new());
        assert_eq!(
            entries[0],
            entry(Some(2), 4, Gap::Seconds(1.5), Gap::Seconds(0.5)).with_name("4")
        );
        assert_eq!(entries[1].position, None);
        assert_eq!(entries[1].gap_to_leader, Gap::Missing);
    }

    impl StandingsEntry {
        fn with_name(mut self, name: &str) -> Self {
            self.last_name = name.to_string();
            self
        }
    }
}
