use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::{io::Read, path::Path};
use time::{Date, Month};

use crate::{IngestError, StationCode};

/// One historical day at one station.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyActualRecord {
    pub station_code: StationCode,
    pub date: Date,
    pub ffmc: Option<f64>,
    pub isi: Option<f64>,
    pub bui: Option<f64>,
    pub dmc: Option<f64>,
    pub dc: Option<f64>,
    pub fwi: Option<f64>,
    pub temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub precipitation: Option<f64>,
}

impl DailyActualRecord {
    pub fn year(&self) -> i32 {
        self.date.year()
    }

    pub fn month_day(&self) -> (u8, u8) {
        (u8::from(self.date.month()), self.date.day())
    }
}

#[derive(Deserialize)]
struct DailyWeatherRow {
    station_code: StationCode,
    weather_date: String,
    #[serde(default)]
    ffmc: Option<f64>,
    #[serde(default)]
    isi: Option<f64>,
    #[serde(default)]
    bui: Option<f64>,
    #[serde(default)]
    dmc: Option<f64>,
    #[serde(default)]
    dc: Option<f64>,
    #[serde(default)]
    fwi: Option<f64>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    relative_humidity: Option<f64>,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    wind_direction: Option<f64>,
    #[serde(default)]
    precipitation: Option<f64>,
}

impl TryFrom<DailyWeatherRow> for DailyActualRecord {
    type Error = IngestError;
    fn try_from(row: DailyWeatherRow) -> Result<Self, Self::Error> {
        Ok(DailyActualRecord {
            station_code: row.station_code,
            date: parse_weather_date(&row.weather_date)?,
            ffmc: finite(row.ffmc),
            isi: finite(row.isi),
            bui: finite(row.bui),
            dmc: finite(row.dmc),
            dc: finite(row.dc),
            fwi: finite(row.fwi),
            temperature: finite(row.temperature),
            relative_humidity: finite(row.relative_humidity),
            wind_speed: finite(row.wind_speed),
            wind_direction: finite(row.wind_direction),
            precipitation: finite(row.precipitation),
        })
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|value| value.is_finite())
}

/// Weather dates come through as `yyyymmdd`, either as text or as an integer column.
pub fn parse_weather_date(raw: &str) -> Result<Date, IngestError> {
    let raw = raw.trim();
    let invalid = || IngestError::InvalidDate(raw.to_string());
    if raw.len() != 8 || !raw.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let year: i32 = raw[..4].parse().map_err(|_| invalid())?;
    let month: u8 = raw[4..6].parse().map_err(|_| invalid())?;
    let day: u8 = raw[6..].parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;
    Date::from_calendar_date(year, month, day).map_err(|_| invalid())
}

pub fn read_daily_actuals<R: Read>(reader: R) -> Result<Vec<DailyActualRecord>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = vec![];
    for row in rdr.deserialize::<DailyWeatherRow>() {
        records.push(row?.try_into()?);
    }
    Ok(records)
}

pub fn load_daily_actuals<P: AsRef<Path>>(path: P) -> Result<Vec<DailyActualRecord>, IngestError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_daily_actuals(file)
}
