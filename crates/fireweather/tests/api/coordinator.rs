use fireweather::{FetchError, ForecastError, ForecastField, ForecastService, FORECAST_DAYS};
use std::{
    sync::{atomic::Ordering, Arc},
    time::Duration,
};

use crate::helpers::{
    directory_of, six_hourly_series, test_logger, HangingSource, MockSource, SlowSource,
};

#[tokio::test]
async fn failing_station_does_not_sink_the_batch() {
    let mut source = MockSource::new();
    source.expect_fetch_raw().times(3).returning(|station| {
        if station.code == 2 {
            Err(FetchError::Other(String::from("connection reset")))
        } else {
            Ok(six_hourly_series())
        }
    });
    let service = ForecastService::new(test_logger(), Arc::new(source), directory_of([1, 2, 3]));

    let results = service.fetch_all(&[1, 2, 3]).await;

    assert_eq!(results.len(), 3);
    for code in [1, 3] {
        let forecast = results[&code].as_ref().unwrap();
        assert_eq!(forecast.station.code, code);
        assert_eq!(forecast.values.len(), FORECAST_DAYS);
    }
    assert!(matches!(results[&2], Err(ForecastError::Fetch(2, _))));
}

#[tokio::test]
async fn aligned_values_come_back_at_noon() {
    let mut source = MockSource::new();
    source
        .expect_fetch_raw()
        .times(1)
        .returning(|_| Ok(six_hourly_series()));
    let service = ForecastService::new(test_logger(), Arc::new(source), directory_of([7]));

    let forecast = service.fetch_forecast(7).await.unwrap();

    assert_eq!(forecast.values.len(), FORECAST_DAYS);
    for (day, value) in forecast.values.iter().enumerate() {
        assert_eq!(value.datetime.hour(), 20);
        let expected = 3.0 + 4.0 * day as f64 + 2.0 / 6.0;
        let temperature = value.get(ForecastField::Temperature).unwrap();
        assert!((temperature - expected).abs() < 1e-9);
        assert_eq!(value.get(ForecastField::RelativeHumidity), Some(40.0));
    }
}

#[tokio::test]
async fn unknown_codes_are_reported_without_fetching() {
    let mut source = MockSource::new();
    source
        .expect_fetch_raw()
        .times(1)
        .returning(|_| Ok(six_hourly_series()));
    let service = ForecastService::new(test_logger(), Arc::new(source), directory_of([1]));

    let results = service.fetch_all(&[1, 404]).await;

    assert!(results[&1].is_ok());
    assert!(matches!(
        results[&404],
        Err(ForecastError::StationNotFound(404))
    ));
}

#[tokio::test]
async fn repeated_codes_are_fetched_once() {
    let mut source = MockSource::new();
    source
        .expect_fetch_raw()
        .times(1)
        .returning(|_| Ok(six_hourly_series()));
    let service = ForecastService::new(test_logger(), Arc::new(source), directory_of([1]));

    let results = service.fetch_all(&[1, 1, 1]).await;

    assert_eq!(results.len(), 1);
    assert!(results[&1].is_ok());
}

#[tokio::test]
async fn empty_upstream_series_is_insufficient_data() {
    let mut source = MockSource::new();
    source.expect_fetch_raw().returning(|_| Ok(vec![]));
    let service = ForecastService::new(test_logger(), Arc::new(source), directory_of([5]));

    let results = service.fetch_all(&[5]).await;

    assert!(matches!(
        results[&5],
        Err(ForecastError::InsufficientData(5))
    ));
}

#[tokio::test]
async fn empty_request_returns_empty_map() {
    let source = MockSource::new();
    let service = ForecastService::new(test_logger(), Arc::new(source), directory_of([1]));

    assert!(service.fetch_all(&[]).await.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn never_more_fetches_open_than_the_cap() {
    let source = Arc::new(SlowSource::new(Duration::from_millis(20)));
    let service = ForecastService::new(test_logger(), source.clone(), directory_of(1..=12))
        .with_max_concurrent(3);

    let codes: Vec<_> = (1..=12).collect();
    let results = service.fetch_all(&codes).await;

    assert_eq!(results.len(), 12);
    assert!(results.values().all(|result| result.is_ok()));
    assert_eq!(source.calls.load(Ordering::SeqCst), 12);
    let most = source.most_in_flight.load(Ordering::SeqCst);
    assert!(most <= 3, "saw {} fetches at once", most);
    assert!(most >= 1);
}

#[tokio::test]
async fn default_cap_is_ten() {
    let service = ForecastService::new(
        test_logger(),
        Arc::new(MockSource::new()),
        directory_of([1]),
    );
    assert_eq!(service.max_concurrent(), 10);
    assert_eq!(service.with_max_concurrent(0).max_concurrent(), 1);
}

#[tokio::test]
async fn dropping_the_batch_aborts_in_flight_fetches() {
    let source = Arc::new(HangingSource::default());
    let started = Arc::clone(&source.started);
    let dropped = Arc::clone(&source.dropped);
    let service = ForecastService::new(test_logger(), source, directory_of(1..=5))
        .with_max_concurrent(2);

    let codes: Vec<_> = (1..=5).collect();
    let outcome = tokio::time::timeout(Duration::from_millis(50), service.fetch_all(&codes)).await;
    assert!(outcome.is_err());

    // aborted tasks are torn down the next time the runtime gets to them
    for _ in 0..100 {
        if dropped.load(Ordering::SeqCst) == started.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(started.load(Ordering::SeqCst), 2);
    assert_eq!(dropped.load(Ordering::SeqCst), 2);
}
