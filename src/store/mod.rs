//! Storage capabilities consumed by the analyzers.
//!
//! Analyzers only ever read through [`MeasurementStore::scan`] and the
//! [`CityDirectory`] lookups, so any backend that can filter by city and
//! half-open time range can sit behind them.
pub mod csv_file;
pub mod json_directory;
pub mod memory;

pub use csv_file::CsvMeasurementStore;
pub use json_directory::JsonCityDirectory;
pub use memory::InMemoryStore;

use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{City, Reading};
use crate::windowing::TimeWindow;

/// Predicate for [`MeasurementStore::scan`]. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanFilter {
    pub city_ids: Option<BTreeSet<Uuid>>,
    pub window: Option<TimeWindow>,
}

impl ScanFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_city(city_id: Uuid) -> Self {
        Self::for_cities([city_id])
    }

    pub fn for_cities<I: IntoIterator<Item = Uuid>>(city_ids: I) -> Self {
        Self {
            city_ids: Some(city_ids.into_iter().collect()),
            window: None,
        }
    }

    pub fn within(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    pub fn matches(&self, reading: &Reading) -> bool {
        let city_ok = self
            .city_ids
            .as_ref()
            .map_or(true, |ids| ids.contains(&reading.city_id));
        let time_ok = self
            .window
            .as_ref()
            .map_or(true, |w| w.contains(reading.timestamp));
        city_ok && time_ok
    }
}

/// Append-friendly, time-indexed store of readings.
pub trait MeasurementStore: Send + Sync {
    /// All stored readings matching `filter`, in no particular order.
    fn scan(&self, filter: &ScanFilter) -> Result<Vec<Reading>>;

    fn append(&self, reading: Reading) -> Result<()>;

    /// Appends the whole batch or nothing.
    fn append_batch(&self, readings: Vec<Reading>) -> Result<()>;
}

/// City metadata keyed by id, at most one city per id.
pub trait CityDirectory: Send + Sync {
    fn cities(&self) -> Result<Vec<City>>;

    /// Insert new cities; for known ids replace name, country and region.
    /// Returns the number of cities written.
    fn upsert_all(&self, cities: Vec<City>) -> Result<usize>;

    fn city(&self, id: Uuid) -> Result<Option<City>> {
        Ok(self.cities()?.into_iter().find(|c| c.id == id))
    }

    fn cities_in_region(&self, region_id: Uuid) -> Result<Vec<City>> {
        Ok(self
            .cities()?
            .into_iter()
            .filter(|c| c.in_region(region_id))
            .collect())
    }
}
