use serde::Serialize;
use slog::{debug, info, Logger};
use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{ForecastResponse, OutputError, PercentileSummary, StationCode, YearRange};

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), OutputError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    Ok(())
}

/// Writes one file per station under `<root>/<start>-<end>/<code>.json`, replacing whatever a
/// previous run left there.
pub fn write_summaries(
    logger: &Logger,
    root: &Path,
    year_range: YearRange,
    summaries: &BTreeMap<StationCode, PercentileSummary>,
) -> Result<Vec<PathBuf>, OutputError> {
    let folder = root.join(year_range.to_string());
    fs::create_dir_all(&folder)?;

    let mut written = Vec::with_capacity(summaries.len());
    for (code, summary) in summaries {
        let path = folder.join(format!("{}.json", code));
        write_json(&path, summary)?;
        debug!(logger, "wrote summary: {}", path.display());
        written.push(path);
    }
    info!(
        logger,
        "wrote {} station summaries to {}",
        written.len(),
        folder.display()
    );
    Ok(written)
}

/// Writes `forecasts_<timestamp>.json` into `root` and hands back its path.
pub fn write_forecasts(
    logger: &Logger,
    root: &Path,
    generated_at: OffsetDateTime,
    response: &ForecastResponse,
) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(root)?;
    // only fails outside years 0-9999
    let stamp = generated_at
        .format(&Rfc3339)
        .unwrap_or_else(|_| generated_at.unix_timestamp().to_string());
    let path = root.join(format!("forecasts_{}.json", stamp));
    write_json(&path, response)?;
    info!(
        logger,
        "wrote {} forecasts to {}",
        response.forecasts.len(),
        path.display()
    );
    Ok(path)
}
