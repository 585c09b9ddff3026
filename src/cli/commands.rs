use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::analyzers::{
    HourlyStatsAggregator, MonthlyReportGenerator, TrendDetector, YearOverYearComparator,
};
use crate::cli::args::{Cli, Commands};
use crate::error::{MonitorError, Result};
use crate::models::{Pollutant, RegionTrends};
use crate::processors::Ingestor;
use crate::readers::RequestReader;
use crate::services::{CityService, JsonCityInformationClient};
use crate::settings::AppConfig;
use crate::store::{CityDirectory, CsvMeasurementStore, JsonCityDirectory, MeasurementStore};
use crate::utils::filename::default_report_path;
use crate::utils::logging::init_logging;
use crate::utils::progress::ProgressReporter;
use crate::windowing::CalendarMonth;

/// How a successful command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The query ran but matched no data.
    NotFound,
}

/// Process exit status for a command result: 0 done, 1 rejected input,
/// 2 infrastructure failure, 3 nothing found.
pub fn exit_code(result: &Result<Outcome>) -> u8 {
    match result {
        Ok(Outcome::Completed) => 0,
        Ok(Outcome::NotFound) => 3,
        Err(e) if e.is_infrastructure() => 2,
        Err(_) => 1,
    }
}

pub async fn run(cli: Cli) -> Result<Outcome> {
    init_logging(cli.verbose, cli.log_file.as_deref())?;

    let mut config = AppConfig::load(Some(&cli.config))?;
    if let Some(data_dir) = cli.data_dir {
        config = config.with_data_dir(data_dir);
    }
    let now = cli.now.unwrap_or_else(Utc::now);

    info!(data_dir = %config.data_dir.display(), %now, "Starting");

    let store: Arc<dyn MeasurementStore> =
        Arc::new(CsvMeasurementStore::open(&config.measurements_path())?);
    let directory: Arc<dyn CityDirectory> = Arc::new(JsonCityDirectory::new(&config.cities_path()));

    match cli.command {
        Commands::Ingest {
            input,
            delimiter,
            max_workers,
        } => {
            let delimiter = u8::try_from(delimiter).map_err(|_| {
                MonitorError::InvalidInput(format!("Delimiter must be ASCII, got '{}'", delimiter))
            })?;

            let progress = ProgressReporter::new_spinner("Reading input...", false);
            let requests = RequestReader::with_delimiter(delimiter).read_requests(&input)?;

            progress.set_message(&format!("Validating {} readings...", requests.len()));
            let ingest_store = Arc::clone(&store);
            let report = tokio::task::spawn_blocking(move || {
                Ingestor::new()
                    .with_max_workers(max_workers)
                    .ingest_batch(ingest_store.as_ref(), requests)
            })
            .await??;

            progress.finish_with_message(&format!(
                "Stored {} of {} readings",
                report.accepted, report.total_entries
            ));
            print_json(&report)?;
        }

        Commands::Stats { city_id, hours } => {
            let aggregator = HourlyStatsAggregator::new();
            let stats = aggregator.city_stats(store.as_ref(), city_id, now)?;
            if stats.is_none() {
                eprintln!("No readings for city {} in the hour before {}", city_id, now);
            }

            match hours {
                Some(hours) => {
                    let mut series = serde_json::Map::new();
                    for pollutant in Pollutant::ALL {
                        let buckets = aggregator.recent_hourly_averages(
                            store.as_ref(),
                            city_id,
                            pollutant,
                            hours,
                            now,
                        )?;
                        series.insert(pollutant.to_string(), serde_json::to_value(buckets)?);
                    }
                    print_json(&serde_json::json!({ "stats": stats, "hourly": series }))?;
                }
                None => {
                    if let Some(stats) = &stats {
                        print_json(stats)?;
                    }
                }
            }

            if stats.is_none() {
                return Ok(Outcome::NotFound);
            }
        }

        Commands::Trends { region_id, months } => {
            let trends = rising_trends(&store, &directory, region_id, months, now).await?;
            print_json(&trends)?;
        }

        Commands::Report { output, limit } => {
            let month = CalendarMonth::previous(now)?;
            let path = output.unwrap_or_else(|| default_report_path(&config.report_location, month));

            let rows = MonthlyReportGenerator::with_limit(limit).generate(
                store.as_ref(),
                directory.as_ref(),
                month,
                &path,
            )?;

            info!(path = %path.display(), rows = rows.len(), "Report published");
            print_json(&rows)?;
        }

        Commands::YearOverYear => {
            let rising =
                YearOverYearComparator::new().rising_no2(store.as_ref(), directory.as_ref(), now)?;
            print_json(&rising)?;
        }

        Commands::SyncCities { source } => {
            let client = JsonCityInformationClient::new(&source);
            let written = CityService::refresh_city_information(&client, directory.as_ref())?;
            print_json(&serde_json::json!({ "cities": written }))?;
        }
    }

    Ok(Outcome::Completed)
}

/// CO and PM10 trends computed on separate blocking tasks.
async fn rising_trends(
    store: &Arc<dyn MeasurementStore>,
    directory: &Arc<dyn CityDirectory>,
    region_id: uuid::Uuid,
    months: u32,
    now: DateTime<Utc>,
) -> Result<RegionTrends> {
    let spawn = |pollutant: Pollutant| {
        let store = Arc::clone(store);
        let directory = Arc::clone(directory);
        tokio::task::spawn_blocking(move || {
            TrendDetector::with_months(months).rising_cities(
                store.as_ref(),
                directory.as_ref(),
                region_id,
                pollutant,
                now,
            )
        })
    };

    let (co, pm10) = tokio::try_join!(spawn(Pollutant::Co), spawn(Pollutant::Pm10))?;

    Ok(RegionTrends {
        rising_co: co?.into_iter().collect(),
        rising_pm10: pm10?.into_iter().collect(),
    })
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
