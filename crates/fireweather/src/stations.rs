use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::HashMap, fmt, fs, path::Path, str::FromStr};

use crate::ConfigError;

pub type StationCode = u32;

#[derive(thiserror::Error, Debug)]
pub enum StationsError {
    #[error("Failed to read stations file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse stations file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Duplicate station code: {0}")]
    Duplicate(StationCode),
}

/// A fire season runs from a start month/day to an end month/day of the same year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Season {
    pub start_month: u8,
    pub start_day: u8,
    pub end_month: u8,
    pub end_day: u8,
}

impl Season {
    pub fn new(start_month: u8, start_day: u8, end_month: u8, end_day: u8) -> Self {
        Season {
            start_month,
            start_day,
            end_month,
            end_day,
        }
    }

    /// Windows crossing the new year are not supported, so the start must not come after the end.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let months = 1..=12;
        let days = 1..=31;
        if !months.contains(&self.start_month)
            || !months.contains(&self.end_month)
            || !days.contains(&self.start_day)
            || !days.contains(&self.end_day)
            || (self.start_month, self.start_day) > (self.end_month, self.end_day)
        {
            return Err(ConfigError::InvalidSeason(self.to_string()));
        }
        Ok(())
    }

    /// Closed on both ends.
    pub fn contains(&self, month: u8, day: u8) -> bool {
        (self.start_month, self.start_day) <= (month, day)
            && (month, day) <= (self.end_month, self.end_day)
    }
}

impl Default for Season {
    // May 1 - Aug 31
    fn default() -> Self {
        Season::new(5, 1, 8, 31)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}-{:02}..{:02}-{:02}",
            self.start_month, self.start_day, self.end_month, self.end_day
        )
    }
}

impl FromStr for Season {
    type Err = String;

    /// Parses the display form, `05-01..08-31`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once("..")
            .ok_or_else(|| format!("expected <mm-dd>..<mm-dd>, got `{}`", s))?;
        let month_day = |part: &str| -> Result<(u8, u8), String> {
            let (month, day) = part
                .trim()
                .split_once('-')
                .ok_or_else(|| format!("expected <mm-dd>, got `{}`", part))?;
            let month = month.parse().map_err(|e| format!("bad month `{}`: {}", month, e))?;
            let day = day.parse().map_err(|e| format!("bad day `{}`: {}", day, e))?;
            Ok((month, day))
        };
        let (start_month, start_day) = month_day(start)?;
        let (end_month, end_day) = month_day(end)?;
        let season = Season::new(start_month, start_day, end_month, end_day);
        season.validate().map_err(|e| e.to_string())?;
        Ok(season)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherStation {
    #[serde(deserialize_with = "station_code_from_str_or_int")]
    pub code: StationCode,
    pub name: String,
    pub lat: f64,
    pub long: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecodivision_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub core_season: Option<Season>,
}

impl fmt::Display for WeatherStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Station Code: {}, Station Name: {}, Latitude: {}, Longitude: {}",
            self.code, self.name, self.lat, self.long
        )
    }
}

// The station file has carried codes both as "331" and 331.
fn station_code_from_str_or_int<'de, D>(deserializer: D) -> Result<StationCode, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCode {
        Int(StationCode),
        Str(String),
    }

    match RawCode::deserialize(deserializer)? {
        RawCode::Int(code) => Ok(code),
        RawCode::Str(code) => code.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Deserialize)]
struct WeatherStationsFile {
    weather_stations: Vec<WeatherStation>,
}

/// Station reference data, loaded once and kept for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    stations: Vec<WeatherStation>,
    by_code: HashMap<StationCode, usize>,
}

impl StationDirectory {
    pub fn new(stations: Vec<WeatherStation>) -> Result<Self, StationsError> {
        let mut by_code = HashMap::with_capacity(stations.len());
        for (index, station) in stations.iter().enumerate() {
            if by_code.insert(station.code, index).is_some() {
                return Err(StationsError::Duplicate(station.code));
            }
        }
        Ok(StationDirectory { stations, by_code })
    }

    pub fn from_json(raw: &str) -> Result<Self, StationsError> {
        let file: WeatherStationsFile = serde_json::from_str(raw)?;
        StationDirectory::new(file.weather_stations)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StationsError> {
        let raw = fs::read_to_string(path)?;
        StationDirectory::from_json(&raw)
    }

    pub fn get(&self, code: StationCode) -> Option<&WeatherStation> {
        self.by_code.get(&code).map(|index| &self.stations[*index])
    }

    pub fn contains(&self, code: StationCode) -> bool {
        self.by_code.contains_key(&code)
    }

    /// Stations in file order.
    pub fn stations(&self) -> &[WeatherStation] {
        &self.stations
    }

    pub fn codes(&self) -> Vec<StationCode> {
        self.stations.iter().map(|station| station.code).collect()
    }

    /// Maps the display names used by the fire weather reports to station codes.
    pub fn code_by_name(&self, name: &str) -> Option<StationCode> {
        let name = name.trim();
        self.stations
            .iter()
            .find(|station| station.name.eq_ignore_ascii_case(name))
            .map(|station| station.code)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STATIONS: &str = r#"{
        "weather_stations": [
            {"code": "331", "name": "ASHNOLA", "lat": 49.13905, "long": -120.1844,
             "ecodivision_name": "SEMI-ARID STEPPE HIGHLANDS",
             "core_season": {"start_month": 5, "start_day": 1, "end_month": 9, "end_day": 15}},
            {"code": 328, "name": "PENTICTON RS", "lat": 49.5228, "long": -119.5397}
        ]
    }"#;

    #[test]
    fn loads_codes_given_as_strings_or_numbers() {
        let directory = StationDirectory::from_json(STATIONS).unwrap();
        assert_eq!(directory.len(), 2);
        assert_eq!(directory.codes(), vec![331, 328]);
        let ashnola = directory.get(331).unwrap();
        assert_eq!(ashnola.name, "ASHNOLA");
        assert_eq!(ashnola.core_season, Some(Season::new(5, 1, 9, 15)));
        assert!(directory.get(328).unwrap().core_season.is_none());
    }

    #[test]
    fn unknown_station_is_none() {
        let directory = StationDirectory::from_json(STATIONS).unwrap();
        assert!(directory.get(1).is_none());
        assert!(!directory.contains(1));
    }

    #[test]
    fn rejects_duplicate_codes() {
        let raw = r#"{"weather_stations": [
            {"code": 1, "name": "A", "lat": 0.0, "long": 0.0},
            {"code": "1", "name": "B", "lat": 0.0, "long": 0.0}
        ]}"#;
        assert!(matches!(
            StationDirectory::from_json(raw),
            Err(StationsError::Duplicate(1))
        ));
    }

    #[test]
    fn finds_code_by_display_name() {
        let directory = StationDirectory::from_json(STATIONS).unwrap();
        assert_eq!(directory.code_by_name("penticton rs"), Some(328));
        assert_eq!(directory.code_by_name("NOWHERE"), None);
    }

    #[test]
    fn season_contains_both_ends() {
        let season = Season::default();
        assert!(season.contains(5, 1));
        assert!(season.contains(8, 31));
        assert!(season.contains(6, 15));
        assert!(!season.contains(4, 30));
        assert!(!season.contains(9, 1));
    }

    #[test]
    fn season_must_not_wrap_the_year() {
        assert!(Season::default().validate().is_ok());
        assert!(Season::new(11, 1, 2, 28).validate().is_err());
        assert!(Season::new(5, 10, 5, 9).validate().is_err());
        assert!(Season::new(13, 1, 14, 1).validate().is_err());
        assert!(Season::new(5, 1, 5, 1).validate().is_ok());
    }

    #[test]
    fn season_parses_its_display_form() {
        let season: Season = "05-01..08-31".parse().unwrap();
        assert_eq!(season, Season::default());
        assert_eq!(season.to_string().parse::<Season>(), Ok(season));
        assert!("05-01".parse::<Season>().is_err());
        assert!("09-01..05-01".parse::<Season>().is_err());
    }
}
