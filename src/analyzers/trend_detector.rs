use chrono::{DateTime, Utc};
use rayon::prelude::*;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{City, Pollutant, Reading, RegionTrends, TrendResult};
use crate::store::{CityDirectory, MeasurementStore, ScanFilter};
use crate::utils::constants::TREND_MONTHS;
use crate::windowing::{bucketize_by_city, Bucket, Granularity, TimeWindow};

/// True when every value is strictly greater than the one before it.
pub fn is_strictly_rising(values: &[Decimal]) -> bool {
    values.windows(2).all(|pair| pair[1] > pair[0])
}

/// Detects cities whose monthly average rose in every month-over-month
/// transition of the trailing complete months.
pub struct TrendDetector {
    months: u32,
}

impl TrendDetector {
    pub fn new() -> Self {
        Self {
            months: TREND_MONTHS,
        }
    }

    pub fn with_months(months: u32) -> Self {
        Self { months }
    }

    /// Complete months before the month containing `now`.
    pub fn window(&self, now: DateTime<Utc>) -> Result<TimeWindow> {
        TimeWindow::preceding_units(now, Granularity::Month, self.months)
    }

    /// Classify one city's monthly buckets. `None` unless there is exactly one
    /// populated bucket per month of the window.
    pub fn classify(&self, buckets: &[Bucket]) -> Option<TrendResult> {
        let first = buckets.first()?;
        if buckets.len() != self.months as usize {
            return None;
        }
        let averages: Option<Vec<Decimal>> = buckets.iter().map(|b| b.average).collect();

        Some(TrendResult {
            city_id: first.city_id,
            pollutant: first.pollutant,
            is_rising: is_strictly_rising(&averages?),
        })
    }

    /// Names of rising cities in `region_id` for one pollutant.
    pub fn rising_cities(
        &self,
        store: &dyn MeasurementStore,
        directory: &dyn CityDirectory,
        region_id: Uuid,
        pollutant: Pollutant,
        now: DateTime<Utc>,
    ) -> Result<BTreeSet<String>> {
        let window = self.window(now)?;
        let cities = directory.cities_in_region(region_id)?;
        let readings = self.scan_region(store, &cities, window)?;

        self.rising_from_readings(&readings, &cities, pollutant, window)
    }

    /// CO and PM10 rising lists for a region from a single scan.
    pub fn region_trends(
        &self,
        store: &dyn MeasurementStore,
        directory: &dyn CityDirectory,
        region_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<RegionTrends> {
        let window = self.window(now)?;
        let cities = directory.cities_in_region(region_id)?;
        let readings = self.scan_region(store, &cities, window)?;

        let rising_co = self.rising_from_readings(&readings, &cities, Pollutant::Co, window)?;
        let rising_pm10 = self.rising_from_readings(&readings, &cities, Pollutant::Pm10, window)?;

        Ok(RegionTrends {
            rising_co: rising_co.into_iter().collect(),
            rising_pm10: rising_pm10.into_iter().collect(),
        })
    }

    fn scan_region(
        &self,
        store: &dyn MeasurementStore,
        cities: &[City],
        window: TimeWindow,
    ) -> Result<Vec<Reading>> {
        if cities.is_empty() {
            return Ok(Vec::new());
        }
        store.scan(&ScanFilter::for_cities(cities.iter().map(|c| c.id)).within(window))
    }

    fn rising_from_readings(
        &self,
        readings: &[Reading],
        cities: &[City],
        pollutant: Pollutant,
        window: TimeWindow,
    ) -> Result<BTreeSet<String>> {
        let names: HashMap<Uuid, &str> = cities.iter().map(|c| (c.id, c.name.as_str())).collect();
        let per_city = bucketize_by_city(readings, pollutant, Granularity::Month, window)?;

        let results: Vec<TrendResult> = per_city
            .par_iter()
            .filter_map(|(_, buckets)| self.classify(buckets))
            .collect();

        debug!(
            %pollutant,
            candidates = per_city.len(),
            complete = results.len(),
            "Classified monthly trends"
        );

        let rising: BTreeSet<String> = results
            .iter()
            .filter(|r| r.is_rising)
            .filter_map(|r| names.get(&r.city_id))
            .map(|name| name.to_string())
            .collect();

        info!(%pollutant, %window, rising = rising.len(), "Rising-trend detection finished");
        Ok(rising)
    }
}

impl Default for TrendDetector {
    fn default() -> Self {
        Self::new()
    }
}
