//! Configuration and CLI argument handling

use std::time::Duration;
use clap::Parser;

use crate::state::{DurationUnit, Settings};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "focus-timer")]
#[command(about = "A drift-corrected countdown timer served over HTTP")]
#[command(version)]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Initial countdown length in minutes
    #[arg(short, long, default_value = "5")]
    pub duration: u64,

    /// Nominal tick period in milliseconds
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(1..))]
    pub tick_ms: u64,

    /// Default unit for duration requests that do not name one
    #[arg(long, value_enum, default_value_t = DurationUnit::Minutes)]
    pub unit: DurationUnit,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Settings the server starts with
    pub fn initial_settings(&self) -> Settings {
        Settings {
            unit: self.unit,
            ..Settings::default()
        }
    }
}
