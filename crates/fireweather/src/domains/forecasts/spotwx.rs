use async_trait::async_trait;
use csv::ReaderBuilder;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};
use slog::{debug, Logger};
use std::collections::HashSet;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, OffsetDateTime,
    PrimitiveDateTime,
};

use crate::{
    FetchError, ForecastField, IngestError, RawSeriesPoint, WeatherStation,
    SPOTWX_DATETIME_COLUMN,
};

/// Where raw model series come from. One implementation talks to SpotWX; tests swap in their own.
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_raw(&self, station: &WeatherStation) -> Result<Vec<RawSeriesPoint>, FetchError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotWxConfig {
    pub base_url: String,
    pub api_key: String,
    /// Weather model to request, `gdps` is the global model on 3 hour steps.
    pub model: String,
}

pub struct SpotWxSource {
    logger: Logger,
    client: ClientWithMiddleware,
    config: SpotWxConfig,
}

impl SpotWxSource {
    /// Builds the one client every station request shares. Transient failures are retried here,
    /// below the coordinator.
    pub fn new(logger: Logger, config: SpotWxConfig) -> Result<Self, reqwest::Error> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(Client::builder().user_agent("fetching_data/1.0").build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Ok(SpotWxSource {
            logger,
            client,
            config,
        })
    }

    // spotwx doesn't know about station codes, only coordinates
    pub fn url(&self, station: &WeatherStation) -> String {
        format!(
            "{}?key={}&model={}&lat={}&lon={}",
            self.config.base_url, self.config.api_key, self.config.model, station.lat, station.long
        )
    }
}

#[async_trait]
impl ForecastSource for SpotWxSource {
    async fn fetch_raw(&self, station: &WeatherStation) -> Result<Vec<RawSeriesPoint>, FetchError> {
        debug!(self.logger, "requesting spotwx forecast for station: {}", station.code);
        let response = self.client.get(self.url(station)).send().await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }
        let body = response.text().await?;
        debug!(
            self.logger,
            "retrieved spotwx response for {}, csv data: {}...",
            station.code,
            body.chars().take(20).collect::<String>()
        );
        Ok(parse_spotwx_csv(&self.logger, &body)?)
    }
}

/// Reads a SpotWX table into raw points. Column names are swapped for canonical fields right
/// here; columns that aren't in the field table are dropped. Blank or non-numeric cells count as
/// not reported.
pub fn parse_spotwx_csv(logger: &Logger, body: &str) -> Result<Vec<RawSeriesPoint>, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = rdr.headers()?.clone();
    let datetime_index = headers
        .iter()
        .position(|header| header == SPOTWX_DATETIME_COLUMN)
        .ok_or(IngestError::MissingColumn(SPOTWX_DATETIME_COLUMN))?;

    let mut skipped = HashSet::new();
    let columns: Vec<(usize, ForecastField)> = headers
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != datetime_index)
        .filter_map(|(index, header)| match ForecastField::from_spotwx(header) {
            Some(field) => Some((index, field)),
            None => {
                skipped.insert(header.to_string());
                None
            }
        })
        .collect();
    if !skipped.is_empty() {
        debug!(logger, "ignoring unmapped spotwx columns: {:?}", skipped);
    }

    let mut points = vec![];
    for record in rdr.records() {
        let record = record?;
        let Some(raw_datetime) = record.get(datetime_index) else {
            continue;
        };
        if raw_datetime.is_empty() {
            continue;
        }
        let mut point = RawSeriesPoint::new(parse_timestamp(raw_datetime)?);
        for (index, field) in &columns {
            let value = record
                .get(*index)
                .and_then(|cell| cell.parse::<f64>().ok())
                .filter(|value| value.is_finite());
            if let Some(value) = value {
                point.values.insert(*field, value);
            }
        }
        points.push(point);
    }
    Ok(points)
}

/// SpotWX times carry no offset and are UTC. Anything with an explicit offset is taken as given.
pub fn parse_timestamp(raw: &str) -> Result<OffsetDateTime, IngestError> {
    let raw = raw.trim();
    if let Ok(parsed) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Ok(parsed);
    }

    let naive_formats = [
        format_description!("[year]/[month]/[day] [hour]:[minute]"),
        format_description!("[year]/[month]/[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ];
    let mut parsed = PrimitiveDateTime::parse(raw, naive_formats[0]);
    for format in &naive_formats[1..] {
        if parsed.is_ok() {
            break;
        }
        parsed = PrimitiveDateTime::parse(raw, format);
    }
    parsed
        .map(PrimitiveDateTime::assume_utc)
        .map_err(|source| IngestError::TimeParse {
            value: raw.to_string(),
            source,
        })
}
