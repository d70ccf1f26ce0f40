use slog::{debug, error, info, warn, Logger};
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use tokio::{sync::Semaphore, task::JoinSet};

use crate::{
    align, AlignedForecast, ForecastError, ForecastSource, StationCode, StationDirectory,
    WeatherStation,
};

/// Upstream is polite to roughly this many open requests at once.
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 10;

pub struct ForecastService {
    logger: Logger,
    source: Arc<dyn ForecastSource>,
    directory: Arc<StationDirectory>,
    max_concurrent: usize,
}

impl ForecastService {
    pub fn new(
        logger: Logger,
        source: Arc<dyn ForecastSource>,
        directory: Arc<StationDirectory>,
    ) -> Self {
        ForecastService {
            logger,
            source,
            directory,
            max_concurrent: DEFAULT_MAX_CONCURRENT_FETCHES,
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    pub fn directory(&self) -> &StationDirectory {
        &self.directory
    }

    /// Fetches and aligns a single station without any of the batch machinery.
    pub async fn fetch_forecast(
        &self,
        station_code: StationCode,
    ) -> Result<AlignedForecast, ForecastError> {
        let station = self
            .directory
            .get(station_code)
            .ok_or(ForecastError::StationNotFound(station_code))?
            .clone();
        fetch_and_align(self.source.as_ref(), &self.directory, station).await
    }

    /// Fetches every requested station concurrently and returns one entry per distinct code.
    ///
    /// At most `max_concurrent` fetches are open at once; the limit belongs to this call, so
    /// two overlapping calls don't share permits. A failing station only fails its own entry.
    /// Dropping the returned future aborts whatever is still running.
    pub async fn fetch_all(
        &self,
        station_codes: &[StationCode],
    ) -> BTreeMap<StationCode, Result<AlignedForecast, ForecastError>> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut set = JoinSet::new();
        let mut results = BTreeMap::new();
        let mut requested = BTreeSet::new();

        for &code in station_codes {
            if !requested.insert(code) {
                debug!(self.logger, "station {} requested more than once", code);
                continue;
            }
            let Some(station) = self.directory.get(code).cloned() else {
                warn!(self.logger, "station {} is not in the station directory", code);
                results.insert(code, Err(ForecastError::StationNotFound(code)));
                continue;
            };

            let semaphore = Arc::clone(&semaphore);
            let source = Arc::clone(&self.source);
            let directory = Arc::clone(&self.directory);
            set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return (code, Err(ForecastError::TaskFailed(code))),
                };
                let result = fetch_and_align(source.as_ref(), &directory, station).await;
                (code, result)
            });
        }

        info!(
            self.logger,
            "fetching forecasts for {} stations, {} at a time",
            set.len(),
            self.max_concurrent
        );

        while let Some(joined) = set.join_next().await {
            match joined {
                Ok((code, Ok(forecast))) => {
                    debug!(self.logger, "completed forecast for station: {}", code);
                    results.insert(code, Ok(forecast));
                }
                Ok((code, Err(err))) => {
                    error!(self.logger, "error getting forecast for station {}: {}", code, err);
                    results.insert(code, Err(err));
                }
                Err(err) => error!(self.logger, "error with forecast task: {}", err),
            }
        }

        // a task that panicked took its station code with it
        for code in requested {
            results
                .entry(code)
                .or_insert(Err(ForecastError::TaskFailed(code)));
        }
        results
    }
}

async fn fetch_and_align(
    source: &dyn ForecastSource,
    directory: &StationDirectory,
    station: WeatherStation,
) -> Result<AlignedForecast, ForecastError> {
    let raw_series = source
        .fetch_raw(&station)
        .await
        .map_err(|err| ForecastError::Fetch(station.code, err))?;
    align(directory, station.code, raw_series)
}
