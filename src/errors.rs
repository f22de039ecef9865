// Error types for race-engineer

use snafu::Snafu;
use std::io;

#[derive(Debug, Snafu)]
pub enum RaceEngineerError {
    // Errors for the data source
    #[snafu(display("Could not build HTTP client"))]
    HttpClientError { source: reqwest::Error },
    #[snafu(display("Replay directory not found: {path}"))]
    MissingReplayDir { path: String },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // User input validation errors
    #[snafu(display("Invalid setting: {field} - {reason}"))]
    InvalidSetting { field: String, reason: String },

    // Output errors
    #[snafu(display("Error writing output"))]
    OutputError { source: io::Error },
    #[snafu(display("Error serializing output"))]
    JsonOutputError { source: serde_json::Error },
}
