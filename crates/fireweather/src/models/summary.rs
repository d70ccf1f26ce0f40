use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt, str::FromStr};

use crate::{ConfigError, Season, StationCode, WeatherStation};

/// Inclusive range of calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    pub start: i32,
    pub end: i32,
}

impl YearRange {
    pub fn new(start: i32, end: i32) -> Self {
        YearRange { start, end }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.start > self.end {
            return Err(ConfigError::InvalidYearRange {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    pub fn contains(&self, year: i32) -> bool {
        self.start <= year && year <= self.end
    }
}

impl fmt::Display for YearRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for YearRange {
    type Err = String;

    /// Parses `2010-2019`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("expected <start>-<end>, got `{}`", s))?;
        let start = start
            .trim()
            .parse()
            .map_err(|e| format!("bad start year `{}`: {}", start, e))?;
        let end = end
            .trim()
            .parse()
            .map_err(|e| format!("bad end year `{}`: {}", end, e))?;
        Ok(YearRange { start, end })
    }
}

/// Percentile values for one station, valid only for the year range and season that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PercentileSummary {
    pub station: WeatherStation,
    pub percentile: f64,
    #[serde(rename = "FFMC")]
    pub ffmc: Option<f64>,
    #[serde(rename = "ISI")]
    pub isi: Option<f64>,
    #[serde(rename = "BUI")]
    pub bui: Option<f64>,
    pub season: Season,
    pub years: Vec<i32>,
}

/// A request for some percentile (as a whole number, e.g. 90) over a set of stations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PercentileRequest {
    pub stations: Vec<StationCode>,
    pub percentile: u8,
    pub year_range: YearRange,
}

impl PercentileRequest {
    pub fn fraction(&self) -> f64 {
        f64::from(self.percentile) / 100.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeanValues {
    pub ffmc: Option<f64>,
    pub isi: Option<f64>,
    pub bui: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculatedResponse {
    pub stations: BTreeMap<StationCode, PercentileSummary>,
    pub mean_values: MeanValues,
    pub year_range: YearRange,
    pub percentile: u8,
}
