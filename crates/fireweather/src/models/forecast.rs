use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

use crate::{ForecastField, WeatherStation};

/// One upstream sample. Fields that were not reported are simply missing from `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSeriesPoint {
    pub at: OffsetDateTime,
    pub values: BTreeMap<ForecastField, f64>,
}

impl RawSeriesPoint {
    pub fn new(at: OffsetDateTime) -> Self {
        RawSeriesPoint {
            at,
            values: BTreeMap::new(),
        }
    }

    pub fn with(mut self, field: ForecastField, value: f64) -> Self {
        self.values.insert(field, value);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastValues {
    #[serde(with = "time::serde::rfc3339")]
    pub datetime: OffsetDateTime,
    #[serde(flatten)]
    pub values: BTreeMap<ForecastField, f64>,
}

impl ForecastValues {
    pub fn get(&self, field: ForecastField) -> Option<f64> {
        self.values.get(&field).copied()
    }
}

/// Ten noon values for one station, one per day in ascending order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedForecast {
    pub station: WeatherStation,
    pub values: Vec<ForecastValues>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub forecasts: Vec<AlignedForecast>,
}
