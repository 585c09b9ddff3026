use std::collections::BTreeMap;
use std::sync::RwLock;
use uuid::Uuid;

use super::{CityDirectory, MeasurementStore, ScanFilter};
use crate::error::{MonitorError, Result};
use crate::models::{City, Reading};

fn poisoned<T>(_: T) -> MonitorError {
    MonitorError::Datastore("In-memory store lock poisoned".to_string())
}

/// Process-local store for readings and city metadata.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    readings: RwLock<Vec<Reading>>,
    cities: RwLock<BTreeMap<Uuid, City>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(readings: Vec<Reading>, cities: Vec<City>) -> Self {
        Self {
            readings: RwLock::new(readings),
            cities: RwLock::new(cities.into_iter().map(|c| (c.id, c)).collect()),
        }
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.readings.read().map_err(poisoned)?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl MeasurementStore for InMemoryStore {
    fn scan(&self, filter: &ScanFilter) -> Result<Vec<Reading>> {
        let readings = self.readings.read().map_err(poisoned)?;
        Ok(readings
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn append(&self, reading: Reading) -> Result<()> {
        self.readings.write().map_err(poisoned)?.push(reading);
        Ok(())
    }

    fn append_batch(&self, readings: Vec<Reading>) -> Result<()> {
        self.readings.write().map_err(poisoned)?.extend(readings);
        Ok(())
    }
}

impl CityDirectory for InMemoryStore {
    fn cities(&self) -> Result<Vec<City>> {
        Ok(self.cities.read().map_err(poisoned)?.values().cloned().collect())
    }

    fn upsert_all(&self, cities: Vec<City>) -> Result<usize> {
        let mut known = self.cities.write().map_err(poisoned)?;
        let written = cities.len();
        for city in cities {
            match known.get_mut(&city.id) {
                Some(existing) => existing.merge_update(city),
                None => {
                    known.insert(city.id, city);
                }
            }
        }
        Ok(written)
    }

    fn city(&self, id: Uuid) -> Result<Option<City>> {
        Ok(self.cities.read().map_err(poisoned)?.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn reading(city_id: Uuid) -> Reading {
        Reading::new(Uuid::new_v4(), city_id, dec!(23.1), dec!(12.4), dec!(0.39), Utc::now())
    }

    #[test]
    fn test_append_and_scan() {
        let store = InMemoryStore::new();
        let city = Uuid::new_v4();

        store.append(reading(city)).unwrap();
        store
            .append_batch(vec![reading(city), reading(Uuid::new_v4())])
            .unwrap();

        assert_eq!(store.len().unwrap(), 3);
        assert_eq!(store.scan(&ScanFilter::for_city(city)).unwrap().len(), 2);
    }

    #[test]
    fn test_concurrent_batches_lose_no_writes() {
        let store = Arc::new(InMemoryStore::new());
        let city = Uuid::new_v4();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .append_batch((0..50).map(|_| reading(city)).collect())
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len().unwrap(), 400);
    }

    #[test]
    fn test_upsert_keeps_one_city_per_id() {
        let store = InMemoryStore::new();
        let region = Uuid::new_v4();
        let city = City::new(
            Uuid::new_v4(),
            "Radom".to_string(),
            "Poland".to_string(),
            "Mazowieckie".to_string(),
            region,
        );

        store.upsert_all(vec![city.clone()]).unwrap();
        let mut renamed = city.clone();
        renamed.name = "Radom City".to_string();
        store.upsert_all(vec![renamed]).unwrap();

        let cities = store.cities().unwrap();
        assert_eq!(cities.len(), 1);
        assert_eq!(cities[0].name, "Radom City");
        assert_eq!(store.cities_in_region(region).unwrap().len(), 1);
        assert_eq!(store.city(city.id).unwrap().unwrap().name, "Radom City");
    }
}
