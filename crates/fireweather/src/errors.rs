use crate::StationCode;

/// Opaque failure from the transport layer. The coordinator never looks inside it.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Failed to send request: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("Failed to read response body: {0}")]
    Body(#[from] reqwest::Error),
    #[error("Upstream responded with status {0}")]
    Status(reqwest::StatusCode),
    #[error("Failed to parse upstream data: {0}")]
    Parse(#[from] IngestError),
    #[error("{0}")]
    Other(String),
}

#[derive(thiserror::Error, Debug)]
pub enum ForecastError {
    #[error("Station {0} not found")]
    StationNotFound(StationCode),
    #[error("Not enough data to align forecast for station {0}")]
    InsufficientData(StationCode),
    #[error("Failed to fetch forecast for station {0}: {1}")]
    Fetch(StationCode, #[source] FetchError),
    #[error("Forecast task for station {0} did not complete")]
    TaskFailed(StationCode),
}

impl ForecastError {
    pub fn station_code(&self) -> StationCode {
        match self {
            ForecastError::StationNotFound(code)
            | ForecastError::InsufficientData(code)
            | ForecastError::Fetch(code, _)
            | ForecastError::TaskFailed(code) => *code,
        }
    }
}

/// Rejected aggregation parameters, raised before any per-station work happens.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Fire season {0} is not a valid window")]
    InvalidSeason(String),
    #[error("Year range {start}-{end} is empty")]
    InvalidYearRange { start: i32, end: i32 },
    #[error("Percentile {0} must be between 0 and 1")]
    InvalidPercentile(f64),
}

#[derive(thiserror::Error, Debug)]
pub enum IngestError {
    #[error("Failed to read csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing column: {0}")]
    MissingColumn(&'static str),
    #[error("Failed to parse time `{value}`: {source}")]
    TimeParse {
        value: String,
        #[source]
        source: time::error::Parse,
    },
    #[error("Invalid date `{0}`, expected yyyymmdd")]
    InvalidDate(String),
    #[error("Unknown station name: {0}")]
    UnknownStation(String),
}

#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}
