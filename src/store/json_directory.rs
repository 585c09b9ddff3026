use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use uuid::Uuid;

use super::CityDirectory;
use crate::error::{MonitorError, Result};
use crate::models::City;
use crate::writers::write_atomically;

/// City metadata persisted as a JSON array, rewritten atomically on upsert.
pub struct JsonCityDirectory {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonCityDirectory {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<BTreeMap<Uuid, City>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        let cities: Vec<City> = serde_json::from_str(&content)?;
        Ok(cities.into_iter().map(|c| (c.id, c)).collect())
    }
}

impl CityDirectory for JsonCityDirectory {
    fn cities(&self) -> Result<Vec<City>> {
        Ok(self.load()?.into_values().collect())
    }

    fn upsert_all(&self, cities: Vec<City>) -> Result<usize> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| MonitorError::Datastore("City directory lock poisoned".to_string()))?;

        let mut known = self.load()?;
        let written = cities.len();
        for city in cities {
            match known.get_mut(&city.id) {
                Some(existing) => existing.merge_update(city),
                None => {
                    known.insert(city.id, city);
                }
            }
        }

        let all: Vec<&City> = known.values().collect();
        write_atomically(&self.path, |out| {
            serde_json::to_writer_pretty(out, &all)?;
            Ok(())
        })?;

        Ok(written)
    }
}
