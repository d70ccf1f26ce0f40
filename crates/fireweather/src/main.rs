use fireweather::{
    get_config_info, setup_logger, write_forecasts, ForecastResponse, ForecastService, SpotWxSource,
    StationDirectory,
};
use slog::{error, info, warn};
use std::{path::Path, sync::Arc};
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = get_config_info()?;
    let logger = setup_logger(&cli.level);

    let directory = Arc::new(StationDirectory::load(cli.stations_file())?);
    info!(logger, "loaded {} weather stations", directory.len());

    let source = Arc::new(SpotWxSource::new(logger.clone(), cli.spotwx_config()?)?);
    let service = ForecastService::new(logger.clone(), source, Arc::clone(&directory))
        .with_max_concurrent(cli.max_concurrent());

    let station_codes = if cli.stations.is_empty() {
        directory.codes()
    } else {
        cli.stations.clone()
    };

    let results = tokio::select! {
        results = service.fetch_all(&station_codes) => results,
        _ = tokio::signal::ctrl_c() => {
            warn!(logger, "interrupted, dropping in-flight forecast requests");
            return Ok(());
        }
    };

    let mut response = ForecastResponse::default();
    let mut failed = 0;
    for (code, result) in results {
        match result {
            Ok(forecast) => response.forecasts.push(forecast),
            Err(err) => {
                failed += 1;
                error!(logger, "no forecast for station {}: {}", code, err);
            }
        }
    }
    info!(
        logger,
        "aligned {} forecasts, {} stations failed",
        response.forecasts.len(),
        failed
    );

    let output_dir = cli.output_dir();
    write_forecasts(
        &logger,
        Path::new(&output_dir),
        OffsetDateTime::now_utc(),
        &response,
    )?;
    Ok(())
}
