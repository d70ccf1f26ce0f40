use std::collections::BTreeMap;
use time::{macros::offset, macros::time, Duration, OffsetDateTime, Time, UtcOffset};

use crate::{
    AlignedForecast, ForecastError, ForecastField, ForecastValues, RawSeriesPoint, StationCode,
    StationDirectory,
};

/// Number of daily noon values in an aligned forecast.
pub const FORECAST_DAYS: usize = 10;

/// Every station is treated as Pacific Standard Time all year round: no DST and no
/// per-station time zone, so local noon is always 20:00 UTC.
pub const STATION_UTC_OFFSET: UtcOffset = offset!(-8);

const LOCAL_NOON: Time = time!(12:00);

struct AlignRow {
    at: OffsetDateTime,
    values: BTreeMap<ForecastField, f64>,
    grid: bool,
}

/// Resamples an irregular model series onto ten daily local-noon points.
///
/// Grid values are interpolated linearly against elapsed time between the nearest known samples
/// on either side. A grid point without a known sample on both sides keeps the field unset, so
/// short series still yield ten rows with gaps at the ends. A series that can't fill any grid
/// point at all is `InsufficientData`.
pub fn align(
    directory: &StationDirectory,
    station_code: StationCode,
    raw_series: Vec<RawSeriesPoint>,
) -> Result<AlignedForecast, ForecastError> {
    let station = directory
        .get(station_code)
        .ok_or(ForecastError::StationNotFound(station_code))?
        .clone();

    let mut rows: Vec<AlignRow> = raw_series
        .into_iter()
        .map(|point| AlignRow {
            at: point.at.to_offset(UtcOffset::UTC),
            values: point.values,
            grid: false,
        })
        .collect();
    // stable: duplicate timestamps keep their feed order
    rows.sort_by_key(|row| row.at);

    let first = rows
        .first()
        .ok_or(ForecastError::InsufficientData(station_code))?;
    let grid = noon_grid(first.at);

    // grid rows go in after the raw rows, so a raw sample at the same instant sorts ahead of them
    rows.extend(grid.into_iter().map(|at| AlignRow {
        at,
        values: BTreeMap::new(),
        grid: true,
    }));
    rows.sort_by_key(|row| row.at);

    let fields: Vec<ForecastField> = {
        let mut fields: Vec<ForecastField> = rows
            .iter()
            .flat_map(|row| row.values.keys().copied())
            .collect();
        fields.sort();
        fields.dedup();
        fields
    };
    for field in fields {
        interpolate_field(&mut rows, field);
    }

    // too sparse when no grid row got a single value
    if rows.iter().all(|row| !row.grid || row.values.is_empty()) {
        return Err(ForecastError::InsufficientData(station_code));
    }

    let values: Vec<ForecastValues> = rows
        .into_iter()
        .filter(|row| row.grid)
        .map(|row| ForecastValues {
            datetime: row.at,
            values: row.values,
        })
        .collect();

    Ok(AlignedForecast { station, values })
}

/// Ten local-noon instants in UTC, starting on the UTC calendar day of `first_sample`.
pub fn noon_grid(first_sample: OffsetDateTime) -> Vec<OffsetDateTime> {
    let first_noon = first_sample
        .to_offset(UtcOffset::UTC)
        .date()
        .with_time(LOCAL_NOON)
        .assume_offset(STATION_UTC_OFFSET)
        .to_offset(UtcOffset::UTC);
    (0..FORECAST_DAYS as i64)
        .map(|day| first_noon + Duration::days(day))
        .collect()
}

fn interpolate_field(rows: &mut [AlignRow], field: ForecastField) {
    // values reported upstream, one per instant with the later-sorted duplicate kept
    let mut known: Vec<(OffsetDateTime, f64)> = vec![];
    for row in rows.iter().filter(|row| !row.grid) {
        let Some(value) = row.values.get(&field) else {
            continue;
        };
        match known.last_mut() {
            Some(last) if last.0 == row.at => last.1 = *value,
            _ => known.push((row.at, *value)),
        }
    }
    if known.is_empty() {
        return;
    }

    for row in rows.iter_mut().filter(|row| row.grid) {
        let after = known.partition_point(|(at, _)| *at <= row.at);
        if after == 0 {
            continue;
        }
        let (t0, v0) = known[after - 1];
        let value = if t0 == row.at {
            Some(v0)
        } else {
            known
                .get(after)
                .map(|(t1, v1)| interpolate(t0, v0, *t1, *v1, row.at))
        };
        if let Some(value) = value {
            row.values.insert(field, value);
        }
    }
}

/// `v0 + (v1 - v0) * (t - t0) / (t1 - t0)`, with time measured in seconds.
pub fn interpolate(
    t0: OffsetDateTime,
    v0: f64,
    t1: OffsetDateTime,
    v1: f64,
    t: OffsetDateTime,
) -> f64 {
    let span = (t1 - t0).as_seconds_f64();
    if span == 0.0 {
        return v1;
    }
    v0 + (v1 - v0) * (t - t0).as_seconds_f64() / span
}
