use anyhow::{anyhow, Error};
use clap::Parser;
use serde::de::DeserializeOwned;
use slog::{o, Drain, Level, Logger};
use std::{env, fs};

use crate::{
    Season, SpotWxConfig, StationCode, YearRange, DEFAULT_MAX_CONCURRENT_FETCHES,
};

const DEFAULT_STATIONS_FILE: &str = "./data/weather_stations.json";
const DEFAULT_OUTPUT_DIR: &str = "./data";

#[derive(Parser, Clone, Debug, serde::Deserialize)]
#[command(author, version, about = "Fetch noon-aligned 10 day forecasts per station", long_about = None)]
pub struct Cli {
    /// Path to Settings.toml file holding the rest of the cli options
    #[arg(short, long)]
    pub config: Option<String>,

    /// Set the log level (default: info)
    #[arg(short, long)]
    pub level: Option<String>,

    /// Path to the station list (default: ./data/weather_stations.json)
    #[arg(short, long)]
    pub stations_file: Option<String>,

    /// SpotWX api endpoint (default: https://spotwx.com/services/api.php)
    #[arg(long)]
    pub spotwx_url: Option<String>,

    /// SpotWX api key
    #[arg(long, env = "SPOTWX_API_KEY")]
    pub spotwx_api_key: Option<String>,

    /// Weather model to pull from SpotWX (default: gdps)
    #[arg(long)]
    pub spotwx_model: Option<String>,

    /// Max stations fetched at the same time (default: 10)
    #[arg(short, long)]
    pub max_concurrent: Option<usize>,

    /// Folder the forecast file is written to (default: ./data)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Station codes to fetch, comma separated (default: every station in the list)
    #[arg(long, value_delimiter = ',')]
    #[serde(default)]
    pub stations: Vec<StationCode>,
}

impl Cli {
    pub fn stations_file(&self) -> String {
        self.stations_file
            .clone()
            .unwrap_or_else(|| String::from(DEFAULT_STATIONS_FILE))
    }

    pub fn output_dir(&self) -> String {
        self.output_dir
            .clone()
            .unwrap_or_else(|| String::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent.unwrap_or(DEFAULT_MAX_CONCURRENT_FETCHES)
    }

    pub fn spotwx_config(&self) -> Result<SpotWxConfig, Error> {
        let api_key = self
            .spotwx_api_key
            .clone()
            .ok_or_else(|| anyhow!("missing spotwx api key, set --spotwx-api-key or SPOTWX_API_KEY"))?;
        Ok(SpotWxConfig {
            base_url: self
                .spotwx_url
                .clone()
                .unwrap_or_else(|| String::from("https://spotwx.com/services/api.php")),
            api_key,
            model: self
                .spotwx_model
                .clone()
                .unwrap_or_else(|| String::from("gdps")),
        })
    }
}

#[derive(Parser, Clone, Debug, serde::Deserialize)]
#[command(author, version, about = "Compute per-station fire weather index percentiles", long_about = None)]
pub struct PercentileCli {
    /// Path to Settings.toml file holding the rest of the cli options
    #[arg(short, long)]
    pub config: Option<String>,

    /// Set the log level (default: info)
    #[arg(short, long)]
    pub level: Option<String>,

    /// Historical daily weather csv (default: ./DailyWeather.csv)
    #[arg(short, long)]
    pub actuals: Option<String>,

    /// Path to the station list (default: ./data/weather_stations.json)
    #[arg(short, long)]
    pub stations_file: Option<String>,

    /// Root folder for the `<start>-<end>/<code>.json` files (default: ./data)
    #[arg(short, long)]
    pub output_dir: Option<String>,

    /// Percentile as a fraction (default: 0.9)
    #[arg(short, long)]
    pub percentile: Option<f64>,

    /// Fire season, as start and end month/day (default: May 1 - Aug 31)
    #[arg(long)]
    pub season: Option<Season>,

    /// Year ranges like 2010-2019, comma separated (default: 1970-2019,2000-2019,2010-2019)
    #[arg(short, long, value_delimiter = ',')]
    #[serde(default)]
    pub ranges: Vec<YearRange>,
}

impl PercentileCli {
    pub fn actuals(&self) -> String {
        self.actuals
            .clone()
            .unwrap_or_else(|| String::from("./DailyWeather.csv"))
    }

    pub fn stations_file(&self) -> String {
        self.stations_file
            .clone()
            .unwrap_or_else(|| String::from(DEFAULT_STATIONS_FILE))
    }

    pub fn output_dir(&self) -> String {
        self.output_dir
            .clone()
            .unwrap_or_else(|| String::from(DEFAULT_OUTPUT_DIR))
    }

    pub fn percentile(&self) -> f64 {
        self.percentile.unwrap_or(0.9)
    }

    pub fn season(&self) -> Season {
        self.season.unwrap_or_default()
    }

    pub fn ranges(&self) -> Vec<YearRange> {
        if self.ranges.is_empty() {
            return vec![
                YearRange::new(1970, 2019),
                YearRange::new(2000, 2019),
                YearRange::new(2010, 2019),
            ];
        }
        self.ranges.clone()
    }
}

pub fn get_config_info() -> Result<Cli, Error> {
    let cli = Cli::parse();
    match cli.config.clone() {
        Some(config_path) => read_config_file(&config_path),
        None => Ok(cli),
    }
}

pub fn get_percentile_config_info() -> Result<PercentileCli, Error> {
    let cli = PercentileCli::parse();
    match cli.config.clone() {
        Some(config_path) => read_config_file(&config_path),
        None => Ok(cli),
    }
}

// a config file replaces the command line entirely
fn read_config_file<T: DeserializeOwned>(config_path: &str) -> Result<T, Error> {
    let content = fs::read_to_string(config_path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", config_path, e))?;
    toml::from_str(&content).map_err(|e| anyhow!("failed to deserialize config: {}", e))
}

pub fn get_log_level(level: &Option<String>) -> Level {
    let level = match level {
        Some(level) => level.to_lowercase(),
        None => env::var("RUST_LOG")
            .unwrap_or_else(|_| String::from(""))
            .to_lowercase(),
    };
    match level.as_str() {
        "trace" => Level::Trace,
        "debug" => Level::Debug,
        "info" => Level::Info,
        "warn" => Level::Warning,
        "error" => Level::Error,
        _ => Level::Info,
    }
}

pub fn setup_logger(level: &Option<String>) -> Logger {
    let log_level = get_log_level(level);
    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = drain.filter_level(log_level).fuse();
    slog::Logger::root(drain, o!("version" => env!("CARGO_PKG_VERSION")))
}
