use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{City, Pollutant, ReportRow};
use crate::store::{CityDirectory, MeasurementStore, ScanFilter};
use crate::utils::constants::TOP_N_REPORT_SIZE;
use crate::utils::round_half_up;
use crate::windowing::{bucketize_by_city, CalendarMonth, Granularity};
use crate::writers::CsvReportWriter;

/// Ranks cities by their monthly average PM10.
///
/// Only cities with at least one reading on every calendar day of the month
/// are ranked. Ties on the rounded average are broken by city name, then
/// region, ascending.
pub struct MonthlyReportGenerator {
    limit: usize,
}

impl MonthlyReportGenerator {
    pub fn new() -> Self {
        Self {
            limit: TOP_N_REPORT_SIZE,
        }
    }

    pub fn with_limit(limit: usize) -> Self {
        Self { limit }
    }

    pub fn top_pm10(
        &self,
        store: &dyn MeasurementStore,
        directory: &dyn CityDirectory,
        month: CalendarMonth,
    ) -> Result<Vec<ReportRow>> {
        let window = month.window()?;
        let readings = store.scan(&ScanFilter::all().within(window))?;
        let cities: HashMap<Uuid, City> = directory
            .cities()?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let daily = bucketize_by_city(&readings, Pollutant::Pm10, Granularity::Day, window)?;
        let monthly = bucketize_by_city(&readings, Pollutant::Pm10, Granularity::Month, window)?;

        let mut rows: Vec<ReportRow> = Vec::new();
        for (city_id, days) in &daily {
            if !days.iter().all(|d| d.has_data()) {
                debug!(%city_id, %month, "Incomplete daily coverage, city skipped");
                continue;
            }
            let Some(city) = cities.get(city_id) else {
                debug!(%city_id, "Reading for unknown city skipped");
                continue;
            };
            let average = monthly
                .get(city_id)
                .and_then(|buckets| buckets.first())
                .and_then(|bucket| bucket.average);

            if let Some(average) = average {
                rows.push(ReportRow {
                    city_name: city.name.clone(),
                    region: city.region.clone(),
                    avg_pm10: round_half_up(average),
                });
            }
        }

        rows.sort_by(compare_rows);
        rows.truncate(self.limit);

        info!(%month, ranked = rows.len(), "Monthly PM10 ranking computed");
        Ok(rows)
    }

    /// Compute the ranking and publish it as a CSV file at `path`.
    pub fn generate(
        &self,
        store: &dyn MeasurementStore,
        directory: &dyn CityDirectory,
        month: CalendarMonth,
        path: &Path,
    ) -> Result<Vec<ReportRow>> {
        let rows = self.top_pm10(store, directory, month)?;
        CsvReportWriter::new().write_report(&rows, path)?;
        Ok(rows)
    }
}

impl Default for MonthlyReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_rows(a: &ReportRow, b: &ReportRow) -> Ordering {
    b.avg_pm10
        .cmp(&a.avg_pm10)
        .then_with(|| a.city_name.cmp(&b.city_name))
        .then_with(|| a.region.cmp(&b.region))
}
