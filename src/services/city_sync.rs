use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{MonitorError, Result};
use crate::models::City;
use crate::store::CityDirectory;

/// Source of the authoritative city list.
pub trait CityInformationClient: Send + Sync {
    fn fetch_full_city_information(&self) -> Result<Vec<City>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CityInfoList {
    #[allow(dead_code)]
    last_update: Option<NaiveDateTime>,
    #[serde(default)]
    cities: Vec<CityInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CityInfo {
    country: String,
    city: String,
    city_id: Uuid,
    region: String,
    region_id: Uuid,
}

impl From<CityInfo> for City {
    fn from(info: CityInfo) -> Self {
        City::new(info.city_id, info.city, info.country, info.region, info.region_id)
    }
}

/// Reads the upstream city-information payload from a JSON document.
pub struct JsonCityInformationClient {
    source: PathBuf,
}

impl JsonCityInformationClient {
    pub fn new(source: &Path) -> Self {
        Self {
            source: source.to_path_buf(),
        }
    }

    pub fn parse(content: &str) -> Result<Vec<City>> {
        let payload: CityInfoList = serde_json::from_str(content)?;
        if payload.cities.is_empty() {
            return Err(MonitorError::Integration(
                "City information payload contains no cities".to_string(),
            ));
        }

        let cities: Vec<City> = payload.cities.into_iter().map(City::from).collect();
        for city in &cities {
            city.validate()?;
        }
        Ok(cities)
    }
}

impl CityInformationClient for JsonCityInformationClient {
    fn fetch_full_city_information(&self) -> Result<Vec<City>> {
        info!(source = %self.source.display(), "Fetching full list of cities");
        let content = fs::read_to_string(&self.source).map_err(|e| {
            MonitorError::Integration(format!(
                "Cannot read city information from {}: {}",
                self.source.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }
}

pub struct CityService;

impl CityService {
    /// Pull the full city list and upsert it into the directory.
    pub fn refresh_city_information(
        client: &dyn CityInformationClient,
        directory: &dyn CityDirectory,
    ) -> Result<usize> {
        let cities = client.fetch_full_city_information()?;
        let written = directory.upsert_all(cities)?;
        info!(cities = written, "City directory refreshed");
        Ok(written)
    }
}
