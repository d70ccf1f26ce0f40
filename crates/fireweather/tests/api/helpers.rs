use async_trait::async_trait;
use fireweather::{
    FetchError, ForecastField, ForecastSource, RawSeriesPoint, StationCode, StationDirectory,
    WeatherStation,
};
use mockall::mock;
use slog::{o, Discard, Logger};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use time::{macros::datetime, OffsetDateTime};

pub fn test_logger() -> Logger {
    Logger::root(Discard, o!())
}

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture_directory() -> StationDirectory {
    StationDirectory::load(fixture("weather_stations.json")).unwrap()
}

pub fn station(code: StationCode) -> WeatherStation {
    WeatherStation {
        code,
        name: format!("STATION {}", code),
        lat: 49.0 + f64::from(code) / 1000.0,
        long: -120.0,
        ecodivision_name: None,
        core_season: None,
    }
}

pub fn directory_of(codes: impl IntoIterator<Item = StationCode>) -> Arc<StationDirectory> {
    Arc::new(StationDirectory::new(codes.into_iter().map(station).collect()).unwrap())
}

pub const SERIES_START: OffsetDateTime = datetime!(2020-05-04 00:00 UTC);

/// Six hourly samples over eleven days, temperature climbing by one degree per sample.
pub fn six_hourly_series() -> Vec<RawSeriesPoint> {
    (0..44)
        .map(|step| {
            RawSeriesPoint::new(SERIES_START + time::Duration::hours(6 * step))
                .with(ForecastField::Temperature, step as f64)
                .with(ForecastField::RelativeHumidity, 40.0)
        })
        .collect()
}

mock! {
    pub Source {}
    #[async_trait]
    impl ForecastSource for Source {
        async fn fetch_raw(&self, station: &WeatherStation) -> Result<Vec<RawSeriesPoint>, FetchError>;
    }
}

/// Sleeps before answering and records how many fetches were open at the same time.
pub struct SlowSource {
    pub delay: Duration,
    pub in_flight: AtomicUsize,
    pub most_in_flight: AtomicUsize,
    pub calls: AtomicUsize,
}

impl SlowSource {
    pub fn new(delay: Duration) -> Self {
        SlowSource {
            delay,
            in_flight: AtomicUsize::new(0),
            most_in_flight: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ForecastSource for SlowSource {
    async fn fetch_raw(&self, _station: &WeatherStation) -> Result<Vec<RawSeriesPoint>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.most_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(six_hourly_series())
    }
}

/// Never answers. Counts fetches that started and fetches whose future was dropped.
#[derive(Default)]
pub struct HangingSource {
    pub started: Arc<AtomicUsize>,
    pub dropped: Arc<AtomicUsize>,
}

struct DropCounter(Arc<AtomicUsize>);

impl Drop for DropCounter {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ForecastSource for HangingSource {
    async fn fetch_raw(&self, _station: &WeatherStation) -> Result<Vec<RawSeriesPoint>, FetchError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let _counter = DropCounter(Arc::clone(&self.dropped));
        std::future::pending::<()>().await;
        Ok(vec![])
    }
}
