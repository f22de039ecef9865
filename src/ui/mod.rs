// Plain-text rendering of the dashboard for the terminal.

use std::{
    collections::BTreeMap,
    io::{self, Write},
};

use itertools::Itertools;
use race_engineer::{
    DashboardState,
    race::{DriverNumber, DriverRegistry, LapSeries, Session},
};

const SELECTED: &str = "[x]";
const NOT_SELECTED: &str = "[ ]";

pub(crate) fn print_dashboard(state: &DashboardState, out: &mut impl Write) -> io::Result<()> {
    if !state.title.is_empty() {
        writeln!(out, "{}", state.title)?;
    }
    writeln!(
        out,
        "{:>3}  {:<18} {:>13} {:>15}  {}",
        "Pos", "Driver", "Gap (Leader)", "Gap (Interval)", "Sel"
    )?;
    for row in &state.leaderboard {
        writeln!(
            out,
            "{:>3}  {:<18} {:>13} {:>15}  {}",
            row.position.map(|p| p.to_string()).unwrap_or_default(),
            row.last_name,
            row.gap_to_leader,
            row.interval,
            if row.included { SELECTED } else { NOT_SELECTED }
        )?;
    }
    writeln!(out)?;
    print_trace(&state.drivers, &state.cumulative_trace(), &mut *out)?;
    writeln!(out, "{}", state.status)?;
    out.flush()
}

/// Latest drift from the reference pace of every driver, best first.
pub(crate) fn print_trace(
    drivers: &DriverRegistry,
    curves: &BTreeMap<DriverNumber, LapSeries>,
    out: &mut impl Write,
) -> io::Result<()> {
    let latest = curves
        .iter()
        .filter_map(|(driver, curve)| {
            curve
                .last_key_value()
                .map(|(lap, drift)| (*driver, *lap, *drift))
        })
        .sorted_by(|a, b| a.2.total_cmp(&b.2));

    writeln!(out, "{:<6} {:<24} {:>4} {:>10}", "Driver", "Team", "Lap", "Drift (s)")?;
    for (driver, lap, drift) in latest {
        let (label, team) = drivers
            .get(&driver)
            .map(|d| (d.label(), d.team_name.as_str()))
            .unwrap_or_else(|| (driver.to_string(), ""));
        writeln!(out, "{label:<6} {team:<24} {lap:>4} {drift:>+10.3}")?;
    }
    Ok(())
}

pub(crate) fn print_races(races: &BTreeMap<u32, Session>, out: &mut impl Write) -> io::Result<()> {
    for (key, session) in races {
        writeln!(out, "{key:>6}  {}", session.option_label())?;
    }
    Ok(())
}

/// Lap-by-lap cumulative trace of a single driver, one lap per line.
pub(crate) fn print_driver_curve(curve: &LapSeries, out: &mut impl Write) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        curve
            .iter()
            .map(|(lap, drift)| format!("{lap:>3} {drift:>+9.3}"))
            .join("\n")
    )
}
