use slog::{debug, info, warn, Logger};
use std::collections::{BTreeMap, BTreeSet};

use crate::{
    CalculatedResponse, ConfigError, DailyActualRecord, MeanValues, PercentileRequest,
    PercentileSummary, Season, StationCode, StationDirectory, YearRange,
};

#[derive(Default)]
struct StationGroup {
    ffmc: Vec<f64>,
    isi: Vec<f64>,
    bui: Vec<f64>,
    years: BTreeSet<i32>,
}

/// Linear interpolation between the closest ranks, `h = (n - 1) * p`. `sorted` must be ascending.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = last as f64 * p;
    let lower = h.floor() as usize;
    let upper = (lower + 1).min(last);
    let weight = h - lower as f64;
    Some(sorted[lower] + weight * (sorted[upper] - sorted[lower]))
}

fn sorted_percentile(mut values: Vec<f64>, p: f64) -> Option<f64> {
    values.sort_by(f64::total_cmp);
    percentile(&values, p)
}

fn validate(year_range: &YearRange, season: &Season, p: f64) -> Result<(), ConfigError> {
    year_range.validate()?;
    season.validate()?;
    if !(0.0..=1.0).contains(&p) {
        return Err(ConfigError::InvalidPercentile(p));
    }
    Ok(())
}

/// Per-station percentiles of FFMC, ISI and BUI over the days that fall inside both the year
/// range and the season.
///
/// Directory stations with no days left after filtering are logged and left out. Days recorded
/// against a code the directory doesn't know are skipped with a warning.
pub fn summarize(
    actuals: &[DailyActualRecord],
    directory: &StationDirectory,
    year_range: YearRange,
    season: Season,
    percentile: f64,
    logger: &Logger,
) -> Result<BTreeMap<StationCode, PercentileSummary>, ConfigError> {
    validate(&year_range, &season, percentile)?;
    Ok(aggregate(
        actuals,
        directory,
        |_| true,
        year_range,
        season,
        percentile,
        logger,
    ))
}

fn aggregate(
    actuals: &[DailyActualRecord],
    directory: &StationDirectory,
    wanted: impl Fn(StationCode) -> bool,
    year_range: YearRange,
    season: Season,
    p: f64,
    logger: &Logger,
) -> BTreeMap<StationCode, PercentileSummary> {
    let mut groups: BTreeMap<StationCode, StationGroup> = BTreeMap::new();
    let mut unknown = BTreeSet::new();

    for record in actuals {
        if !wanted(record.station_code) || !year_range.contains(record.year()) {
            continue;
        }
        let (month, day) = record.month_day();
        if !season.contains(month, day) {
            continue;
        }
        if !directory.contains(record.station_code) {
            unknown.insert(record.station_code);
            continue;
        }
        let group = groups.entry(record.station_code).or_default();
        group.ffmc.extend(record.ffmc);
        group.isi.extend(record.isi);
        group.bui.extend(record.bui);
        group.years.insert(record.year());
    }
    if !unknown.is_empty() {
        warn!(
            logger,
            "skipping records for stations missing from the directory: {:?}", unknown
        );
    }

    let mut summaries = BTreeMap::new();
    for station in directory.stations() {
        if !wanted(station.code) {
            continue;
        }
        let Some(group) = groups.remove(&station.code) else {
            info!(
                logger,
                "no data for station {} in {} during {}", station.code, year_range, season
            );
            continue;
        };
        summaries.insert(
            station.code,
            PercentileSummary {
                station: station.clone(),
                percentile: p,
                ffmc: sorted_percentile(group.ffmc, p),
                isi: sorted_percentile(group.isi, p),
                bui: sorted_percentile(group.bui, p),
                season,
                years: group.years.into_iter().collect(),
            },
        );
    }
    debug!(
        logger,
        "summarized {} stations for {}", summaries.len(), year_range
    );
    summaries
}

/// Answers a percentile request for a handful of stations, plus the average of each index across
/// the stations that had data.
pub fn calculate(
    request: &PercentileRequest,
    actuals: &[DailyActualRecord],
    directory: &StationDirectory,
    season: Season,
    logger: &Logger,
) -> Result<CalculatedResponse, ConfigError> {
    let p = request.fraction();
    validate(&request.year_range, &season, p)?;

    let requested: BTreeSet<StationCode> = request.stations.iter().copied().collect();
    for code in requested.iter().filter(|code| !directory.contains(**code)) {
        warn!(logger, "requested station {} is not in the directory", code);
    }

    let stations = aggregate(
        actuals,
        directory,
        |code| requested.contains(&code),
        request.year_range,
        season,
        p,
        logger,
    );
    let mean_values = MeanValues {
        ffmc: mean(stations.values().filter_map(|summary| summary.ffmc)),
        isi: mean(stations.values().filter_map(|summary| summary.isi)),
        bui: mean(stations.values().filter_map(|summary| summary.bui)),
    };

    Ok(CalculatedResponse {
        stations,
        mean_values,
        year_range: request.year_range,
        percentile: request.percentile,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        return None;
    }
    Some(sum / count as f64)
}
