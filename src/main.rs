mod ui;

use std::{
    collections::{BTreeMap, BTreeSet},
    io::{self, Write},
    path::PathBuf,
    thread,
};

use chrono::Utc;
use clap::{Parser, Subcommand};
use log::{info, warn};
use race_engineer::{
    Aggregation, AppConfig, DashboardState, DataWindow, OpenF1Client, RaceData, RaceDataSource,
    RaceEngineerError, ReplaySource, SessionKey, Trigger, race::cumulative, refresh,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Session key, or "latest" for the live session
    #[arg(short, long, global = true)]
    session: Option<SessionKey>,

    /// Serve saved API responses from this directory instead of querying the API
    #[arg(long, global = true)]
    replay: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Refresh the leaderboard and race trace until interrupted
    Live {
        #[arg(short, long)]
        refresh_rate: Option<u64>,

        /// Minutes of gap history to request, or "off"
        #[arg(short, long)]
        window: Option<DataWindow>,

        /// mean, median, running-mean or fixed=<seconds>
        #[arg(short, long)]
        aggregation: Option<Aggregation>,

        /// Comma separated driver numbers; overrides the stored selection
        #[arg(short, long, value_delimiter = ',')]
        drivers: Option<Vec<u32>>,
    },
    /// Print the race trace once
    Trace {
        #[arg(short, long)]
        aggregation: Option<Aggregation>,

        /// Print the lap-by-lap trace of a single driver
        #[arg(short, long)]
        driver: Option<u32>,

        #[arg(long)]
        json: bool,
    },
    /// List the race sessions of a season
    Races {
        #[arg(short, long)]
        year: Option<i32>,
    },
    /// Store the drivers shown in the leaderboard; no numbers selects everyone
    Select {
        #[arg(value_delimiter = ',')]
        drivers: Vec<u32>,
    },
}

fn data_source(
    replay: Option<&PathBuf>,
    config: &AppConfig,
) -> Result<Box<dyn RaceDataSource>, RaceEngineerError> {
    Ok(match replay {
        Some(dir) => Box::new(ReplaySource::new(dir.clone())?),
        None => Box::new(OpenF1Client::new(
            config.api_base_url.clone(),
            config.request_timeout(),
        )?),
    })
}

fn live(source: &dyn RaceDataSource, config: &AppConfig) -> Result<(), RaceEngineerError> {
    info!(
        "Following session {} every {}s (window: {}, aggregation: {})",
        config.session,
        config.refresh_rate().as_secs(),
        config.data_window,
        config.aggregation
    );
    let mut state = DashboardState::default();
    let mut trigger = Trigger::SessionChanged;
    loop {
        state = refresh(source, config, state, trigger, Utc::now());
        let mut stdout = io::stdout().lock();
        ui::print_dashboard(&state, &mut stdout)
            .map_err(|e| RaceEngineerError::OutputError { source: e })?;
        trigger = Trigger::Timer;
        thread::sleep(config.refresh_rate());
    }
}

fn trace(
    source: &dyn RaceDataSource,
    config: &AppConfig,
    driver: Option<u32>,
    json: bool,
) -> Result<(), RaceEngineerError> {
    let race = RaceData::new(source, config.session.clone());
    let drivers = race.drivers();
    let curves: BTreeMap<_, _> = race
        .race_trace(config.aggregation)
        .iter()
        .filter(|(number, _)| driver.is_none_or(|d| d == **number))
        .map(|(number, deltas)| (*number, cumulative(deltas)))
        .collect();
    if curves.is_empty() {
        warn!("No lap data for session {}", config.session);
    }

    let mut stdout = io::stdout().lock();
    if json {
        serde_json::to_writer_pretty(&mut stdout, &curves)
            .map_err(|e| RaceEngineerError::JsonOutputError { source: e })?;
        writeln!(stdout).map_err(|e| RaceEngineerError::OutputError { source: e })
    } else {
        let printed = match driver.and_then(|d| curves.get(&d)) {
            Some(curve) => ui::print_driver_curve(curve, &mut stdout),
            None => ui::print_trace(&drivers, &curves, &mut stdout),
        };
        printed.map_err(|e| RaceEngineerError::OutputError { source: e })
    }
}

fn races(source: &dyn RaceDataSource, year: i32) -> Result<(), RaceEngineerError> {
    let races = RaceData::new(source, SessionKey::Latest).races_of_year(year);
    if races.is_empty() {
        warn!("No race sessions found for {}", year);
    }
    ui::print_races(&races, &mut io::stdout().lock())
        .map_err(|e| RaceEngineerError::OutputError { source: e })
}

fn select(mut config: AppConfig, drivers: Vec<u32>) -> Result<(), RaceEngineerError> {
    config.selected_drivers = drivers.into_iter().collect::<BTreeSet<_>>();
    config.save()?;
    if config.selected_drivers.is_empty() {
        info!("Showing every driver");
    } else {
        info!("Showing drivers {:?}", config.selected_drivers);
    }
    Ok(())
}

fn run(cli: Args) -> Result<(), RaceEngineerError> {
    let mut config = AppConfig::from_local_file().unwrap_or_default();
    if let Some(session) = cli.session {
        config.session = session;
    }

    match cli.command {
        Commands::Live {
            refresh_rate,
            window,
            aggregation,
            drivers,
        } => {
            if let Some(refresh_rate) = refresh_rate {
                if refresh_rate == 0 {
                    return Err(RaceEngineerError::InvalidSetting {
                        field: "refresh-rate".to_string(),
                        reason: "must be at least one second".to_string(),
                    });
                }
                config.refresh_rate_s = refresh_rate;
            }
            if let Some(window) = window {
                config.data_window = window;
            }
            if let Some(aggregation) = aggregation {
                config.aggregation = aggregation;
            }
            if let Some(drivers) = drivers {
                config.selected_drivers = drivers.into_iter().collect();
            }
            let source = data_source(cli.replay.as_ref(), &config)?;
            live(source.as_ref(), &config)
        }
        Commands::Trace {
            aggregation,
            driver,
            json,
        } => {
            if let Some(aggregation) = aggregation {
                config.aggregation = aggregation;
            }
            let source = data_source(cli.replay.as_ref(), &config)?;
            trace(source.as_ref(), &config, driver, json)
        }
        Commands::Races { year } => {
            let source = data_source(cli.replay.as_ref(), &config)?;
            races(source.as_ref(), year.unwrap_or(config.year))
        }
        Commands::Select { drivers } => select(config, drivers),
    }
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");

    // Release builds install no logger, so fatal errors go straight to stderr
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
