use csv::ReaderBuilder;
use regex::Regex;
use serde::{Deserialize, Serialize};
use slog::{debug, Logger};
use std::{collections::BTreeMap, io::Read};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    parse_weather_date, IngestError, StationCode, StationDirectory, STATION_UTC_OFFSET,
};

pub const RESULTS_REPORT_ENDPOINT: &str = "Scripts/Public/Common/Results_Report.asp";

/// Report id for official station noon forecasts.
pub const NOON_FORECAST_REPORT: &str = "OSBD";

const CSV_LINK_PATTERN: &str = r"fire_weather/csv/.+\.csv";

/// After this local hour today's noon forecast is already an actual, so the query starts tomorrow.
const MORNING_CUTOFF_HOUR: u8 = 11;

const FORECAST_HORIZON_DAYS: i64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoonForecastQuery {
    /// Root of the fire weather site, with a trailing slash.
    pub base_url: String,
    /// Saved station filter to run the report against.
    pub filter_id: String,
}

pub type QueryParams = Vec<(&'static str, String)>;

impl NoonForecastQuery {
    pub fn report_url(&self) -> String {
        format!("{}{}", self.base_url, RESULTS_REPORT_ENDPOINT)
    }
}

/// Url and form body for the noon forecast report, as of `now`.
///
/// The morning cutoff is read in the fixed -08:00 offset the aligner uses, not in Pacific wall
/// clock time. While daylight time is in effect it therefore flips at 19:00 UTC (noon PDT)
/// instead of 18:00 UTC.
pub fn build_noon_forecast_query(
    config: &NoonForecastQuery,
    now: OffsetDateTime,
) -> (String, QueryParams) {
    let now = now.to_offset(time::UtcOffset::UTC);
    let local_hour = now.to_offset(STATION_UTC_OFFSET).hour();
    let start_date = if local_hour < MORNING_CUTOFF_HOUR {
        now.date()
    } else {
        now.date() + Duration::days(1)
    };
    let end_date = (now + Duration::days(FORECAST_HORIZON_DAYS)).date();

    let params = vec![
        ("Start_Date", yyyymmdd(start_date).to_string()),
        ("End_Date", yyyymmdd(end_date).to_string()),
        ("Format", String::from("CSV")),
        ("cboFilters", config.filter_id.clone()),
        ("rdoReport", String::from(NOON_FORECAST_REPORT)),
    ];
    (config.report_url(), params)
}

/// Url and params asking for a list of stations by code.
pub fn build_station_code_query(
    config: &NoonForecastQuery,
    codes: &[StationCode],
) -> (String, QueryParams) {
    let query = codes
        .iter()
        .map(|code| format!("stationCode=={}", code))
        .collect::<Vec<_>>()
        .join(" or ");
    (config.report_url(), vec![("query", query)])
}

/// The report page links the generated csv somewhere in its body.
pub fn extract_csv_url(body: &str) -> Option<String> {
    let re = Regex::new(CSV_LINK_PATTERN).ok()?;
    re.find(body).map(|found| found.as_str().to_string())
}

pub fn yyyymmdd(date: Date) -> u32 {
    // years before 0 don't come out of the report
    date.year().unsigned_abs() * 10_000
        + u32::from(u8::from(date.month())) * 100
        + u32::from(date.day())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoonForecastValue {
    pub station_code: StationCode,
    pub weather_date: Date,
    pub temp_valid: bool,
    pub temperature: Option<f64>,
    pub rh_valid: bool,
    pub relative_humidity: Option<f64>,
    pub wdir_valid: bool,
    pub wind_direction: Option<f64>,
    pub wspeed_valid: bool,
    pub wind_speed: Option<f64>,
    pub precip_valid: bool,
    pub precipitation: Option<f64>,
    pub gc: Option<f64>,
    pub ffmc: Option<f64>,
    pub dmc: Option<f64>,
    pub dc: Option<f64>,
    pub isi: Option<f64>,
    pub bui: Option<f64>,
    pub fwi: Option<f64>,
    pub danger_rating: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoonForecast {
    pub station_code: StationCode,
    pub values: Vec<NoonForecastValue>,
}

#[derive(Deserialize)]
struct NoonForecastRow {
    display_name: String,
    weather_date: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    temp_valid: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    rh_valid: Option<String>,
    #[serde(default)]
    relative_humidity: Option<f64>,
    #[serde(default)]
    wdir_valid: Option<String>,
    #[serde(default)]
    wind_direction: Option<f64>,
    #[serde(default)]
    wspeed_valid: Option<String>,
    #[serde(default)]
    wind_speed: Option<f64>,
    #[serde(default)]
    precip_valid: Option<String>,
    #[serde(default)]
    precipitation: Option<f64>,
    #[serde(default)]
    gc: Option<f64>,
    #[serde(default)]
    ffmc: Option<f64>,
    #[serde(default)]
    dmc: Option<f64>,
    #[serde(default)]
    dc: Option<f64>,
    #[serde(default)]
    isi: Option<f64>,
    #[serde(default)]
    bui: Option<f64>,
    #[serde(default)]
    fwi: Option<f64>,
    #[serde(default)]
    danger_rating: Option<i32>,
}

fn flag(raw: &Option<String>) -> bool {
    matches!(
        raw.as_deref().map(|value| value.trim().to_lowercase()).as_deref(),
        Some("true" | "t" | "y" | "yes" | "1")
    )
}

/// The report spells one station without its apostrophe.
fn station_code_for(directory: &StationDirectory, display_name: &str) -> Option<StationCode> {
    let name = display_name.trim();
    if name.eq_ignore_ascii_case("DARCY") {
        return directory.code_by_name("D'ARCY");
    }
    directory.code_by_name(name)
}

/// Reads the noon forecast report. Rows flagged as actuals are dropped and station names are
/// swapped for codes; a name the directory doesn't know fails the whole read.
pub fn parse_noon_forecasts<R: Read>(
    logger: &Logger,
    directory: &StationDirectory,
    reader: R,
) -> Result<Vec<NoonForecastValue>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut values = vec![];
    let mut actuals = 0;
    for row in rdr.deserialize::<NoonForecastRow>() {
        let row = row?;
        if row.status.as_deref() == Some("actual") {
            actuals += 1;
            continue;
        }
        let station_code = station_code_for(directory, &row.display_name)
            .ok_or_else(|| IngestError::UnknownStation(row.display_name.clone()))?;
        values.push(NoonForecastValue {
            station_code,
            weather_date: parse_weather_date(&row.weather_date)?,
            temp_valid: flag(&row.temp_valid),
            temperature: row.temperature,
            rh_valid: flag(&row.rh_valid),
            relative_humidity: row.relative_humidity,
            wdir_valid: flag(&row.wdir_valid),
            wind_direction: row.wind_direction,
            wspeed_valid: flag(&row.wspeed_valid),
            wind_speed: row.wind_speed,
            precip_valid: flag(&row.precip_valid),
            precipitation: row.precipitation,
            gc: row.gc,
            ffmc: row.ffmc,
            dmc: row.dmc,
            dc: row.dc,
            isi: row.isi,
            bui: row.bui,
            fwi: row.fwi,
            danger_rating: row.danger_rating,
        });
    }
    if actuals > 0 {
        debug!(logger, "dropped {} actual rows from the noon forecast report", actuals);
    }
    Ok(values)
}

/// One entry per station, values in date order.
pub fn group_noon_forecasts(values: Vec<NoonForecastValue>) -> Vec<NoonForecast> {
    let mut by_station: BTreeMap<StationCode, Vec<NoonForecastValue>> = BTreeMap::new();
    for value in values {
        by_station.entry(value.station_code).or_default().push(value);
    }
    by_station
        .into_iter()
        .map(|(station_code, mut values)| {
            values.sort_by_key(|value| value.weather_date);
            NoonForecast {
                station_code,
                values,
            }
        })
        .collect()
}
