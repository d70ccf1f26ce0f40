use fireweather::{
    align, load_daily_actuals, parse_spotwx_csv, summarize, write_summaries, ForecastField,
    Season, YearRange, FORECAST_DAYS,
};
use std::fs;
use time::macros::datetime;

use crate::helpers::{fixture, fixture_directory, test_logger};

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap();
    assert!((actual - expected).abs() < 1e-9, "{} != {}", actual, expected);
}

#[test]
fn spotwx_table_aligns_to_ten_noons() {
    let body = fs::read_to_string(fixture("spotwx_gdps.csv")).unwrap();
    let raw_series = parse_spotwx_csv(&test_logger(), &body).unwrap();
    assert_eq!(raw_series.len(), 88);

    let forecast = align(&fixture_directory(), 331, raw_series).unwrap();

    assert_eq!(forecast.station.name, "ASHNOLA");
    assert_eq!(forecast.values.len(), FORECAST_DAYS);
    assert_eq!(forecast.values[0].datetime, datetime!(2020-05-04 20:00 UTC));
    assert_eq!(forecast.values[9].datetime, datetime!(2020-05-13 20:00 UTC));
    for (day, value) in forecast.values.iter().enumerate() {
        // temperature in the fixture is a tenth of the hours since the first row
        let hours = 20.0 + 24.0 * day as f64;
        assert_close(value.get(ForecastField::Temperature), hours / 10.0);
        assert_close(value.get(ForecastField::DewPoint), -1.5);
        assert_close(value.get(ForecastField::WindDirection), 270.0);
        assert_eq!(value.get(ForecastField::CloudCover), None);
    }
}

#[test]
fn forecast_serializes_with_canonical_names() {
    let body = fs::read_to_string(fixture("spotwx_gdps.csv")).unwrap();
    let raw_series = parse_spotwx_csv(&test_logger(), &body).unwrap();
    let forecast = align(&fixture_directory(), 331, raw_series).unwrap();

    let json = serde_json::to_value(&forecast).unwrap();
    let first = &json["values"][0];
    assert_eq!(first["datetime"], "2020-05-04T20:00:00Z");
    assert!(first.get("relative_humidity").is_some());
    assert!(first.get("total_precipitation").is_some());
    assert!(first.get("TMP").is_none());
    assert!(first.get("HGT_0C").is_none());
}

#[test]
fn daily_actuals_summarize_into_station_files() {
    let directory = fixture_directory();
    let actuals = load_daily_actuals(fixture("daily_weather.csv")).unwrap();
    assert_eq!(actuals.len(), 10);

    let year_range = YearRange::new(2010, 2019);
    let summaries = summarize(
        &actuals,
        &directory,
        year_range,
        Season::default(),
        0.9,
        &test_logger(),
    )
    .unwrap();

    // 328 only has data from 2005, 999 is not a known station
    assert_eq!(summaries.keys().copied().collect::<Vec<_>>(), vec![331]);
    let summary = &summaries[&331];
    assert_close(summary.ffmc, 93.5);
    assert_close(summary.isi, 7.4);
    assert_close(summary.bui, 57.0);
    assert_eq!(summary.years, vec![2010, 2012, 2019]);

    let root = std::env::temp_dir().join(format!("fireweather_pipeline_{}", std::process::id()));
    let _ = fs::remove_dir_all(&root);
    let written = write_summaries(&test_logger(), &root, year_range, &summaries).unwrap();
    assert_eq!(written, vec![root.join("2010-2019").join("331.json")]);

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
    assert_eq!(json["years"], serde_json::json!([2010, 2012, 2019]));
    assert_eq!(json["station"]["name"], "ASHNOLA");
    fs::remove_dir_all(&root).unwrap();
}
