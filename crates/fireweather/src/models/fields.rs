use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical names for every forecast value we keep. Provider column names never get past
/// ingestion; they are swapped for one of these through [`SPOTWX_FIELD_MAP`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastField {
    Temperature,
    DewPoint,
    RelativeHumidity,
    WindSpeed,
    WindDirection,
    TotalPrecipitation,
    AccumulatedRain,
    AccumulatedSnow,
    AccumulatedFreezingRain,
    AccumulatedIcePellets,
    CloudCover,
    SeaLevelPressure,
    #[serde(rename = "wind_speed_40m")]
    WindSpeed40m,
    #[serde(rename = "wind_direction_40m")]
    WindDirection40m,
    #[serde(rename = "wind_speed_80m")]
    WindSpeed80m,
    #[serde(rename = "wind_direction_80m")]
    WindDirection80m,
    #[serde(rename = "wind_speed_120m")]
    WindSpeed120m,
    #[serde(rename = "wind_direction_120m")]
    WindDirection120m,
    #[serde(rename = "wind_speed_925mb")]
    WindSpeed925mb,
    #[serde(rename = "wind_direction_925mb")]
    WindDirection925mb,
    #[serde(rename = "wind_speed_850mb")]
    WindSpeed850mb,
    #[serde(rename = "wind_direction_850mb")]
    WindDirection850mb,
}

/// Bump when a provider column is added, removed or re-pointed.
pub const FIELD_MAP_VERSION: u32 = 1;

/// The timestamp column of a SpotWX table. It is not a value field.
pub const SPOTWX_DATETIME_COLUMN: &str = "DATETIME";

/// SpotWX column name to canonical field.
pub static SPOTWX_FIELD_MAP: &[(&str, ForecastField)] = &[
    ("TMP", ForecastField::Temperature),
    ("DP", ForecastField::DewPoint),
    ("RH", ForecastField::RelativeHumidity),
    ("WSPD", ForecastField::WindSpeed),
    ("WDIR", ForecastField::WindDirection),
    ("PRECIP_ttl", ForecastField::TotalPrecipitation),
    ("RQP", ForecastField::AccumulatedRain),
    ("SQP", ForecastField::AccumulatedSnow),
    ("FQP", ForecastField::AccumulatedFreezingRain),
    ("IQP", ForecastField::AccumulatedIcePellets),
    ("CLOUD", ForecastField::CloudCover),
    ("SLP", ForecastField::SeaLevelPressure),
    ("WSPD_40M", ForecastField::WindSpeed40m),
    ("WDIR_40M", ForecastField::WindDirection40m),
    ("WSPD_80M", ForecastField::WindSpeed80m),
    ("WDIR_80M", ForecastField::WindDirection80m),
    ("WSPD_120M", ForecastField::WindSpeed120m),
    ("WDIR_120M", ForecastField::WindDirection120m),
    ("WSPD_925MB", ForecastField::WindSpeed925mb),
    ("WDIR_925MB", ForecastField::WindDirection925mb),
    ("WSPD_850MB", ForecastField::WindSpeed850mb),
    ("WDIR_850MB", ForecastField::WindDirection850mb),
];

impl ForecastField {
    pub fn from_spotwx(column: &str) -> Option<Self> {
        let column = column.trim();
        SPOTWX_FIELD_MAP
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, field)| *field)
    }

    /// Canonical name, the same string serde writes.
    pub const fn name(&self) -> &'static str {
        use ForecastField::*;
        match self {
            Temperature => "temperature",
            DewPoint => "dew_point",
            RelativeHumidity => "relative_humidity",
            WindSpeed => "wind_speed",
            WindDirection => "wind_direction",
            TotalPrecipitation => "total_precipitation",
            AccumulatedRain => "accumulated_rain",
            AccumulatedSnow => "accumulated_snow",
            AccumulatedFreezingRain => "accumulated_freezing_rain",
            AccumulatedIcePellets => "accumulated_ice_pellets",
            CloudCover => "cloud_cover",
            SeaLevelPressure => "sea_level_pressure",
            WindSpeed40m => "wind_speed_40m",
            WindDirection40m => "wind_direction_40m",
            WindSpeed80m => "wind_speed_80m",
            WindDirection80m => "wind_direction_80m",
            WindSpeed120m => "wind_speed_120m",
            WindDirection120m => "wind_direction_120m",
            WindSpeed925mb => "wind_speed_925mb",
            WindDirection925mb => "wind_direction_925mb",
            WindSpeed850mb => "wind_speed_850mb",
            WindDirection850mb => "wind_direction_850mb",
        }
    }

    pub fn unit(&self) -> Units {
        use ForecastField::*;
        match self {
            Temperature | DewPoint => Units::Celsius,
            RelativeHumidity | CloudCover => Units::Percent,
            WindSpeed | WindSpeed40m | WindSpeed80m | WindSpeed120m | WindSpeed925mb
            | WindSpeed850mb => Units::KilometersPerHour,
            WindDirection | WindDirection40m | WindDirection80m | WindDirection120m
            | WindDirection925mb | WindDirection850mb => Units::DegreesTrue,
            // 1mm of snow water equivalent is roughly 1cm of fresh snow
            TotalPrecipitation | AccumulatedRain | AccumulatedSnow | AccumulatedFreezingRain
            | AccumulatedIcePellets => Units::Millimeters,
            SeaLevelPressure => Units::Millibars,
        }
    }
}

impl fmt::Display for ForecastField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Units {
    Celsius,
    Percent,
    KilometersPerHour,
    DegreesTrue,
    Millimeters,
    Millibars,
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Celsius => write!(f, "celsius"),
            Units::Percent => write!(f, "percent"),
            Units::KilometersPerHour => write!(f, "km/h"),
            Units::DegreesTrue => write!(f, "degrees_true"),
            Units::Millimeters => write!(f, "mm"),
            Units::Millibars => write!(f, "mb"),
        }
    }
}
