use fireweather::{
    get_percentile_config_info, load_daily_actuals, setup_logger, summarize, write_summaries,
    StationDirectory,
};
use slog::info;
use std::path::Path;

fn main() -> Result<(), anyhow::Error> {
    let cli = get_percentile_config_info()?;
    let logger = setup_logger(&cli.level);

    let directory = StationDirectory::load(cli.stations_file())?;
    let actuals = load_daily_actuals(cli.actuals())?;
    info!(
        logger,
        "loaded {} daily records for {} stations",
        actuals.len(),
        directory.len()
    );

    let season = cli.season();
    let percentile = cli.percentile();
    let output_dir = cli.output_dir();
    for year_range in cli.ranges() {
        info!(logger, "summarizing {} for season {}", year_range, season);
        let summaries = summarize(&actuals, &directory, year_range, season, percentile, &logger)?;
        write_summaries(&logger, Path::new(&output_dir), year_range, &summaries)?;
    }
    Ok(())
}
