use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Pollutant;

/// Min/avg/max of one pollutant, rounded to two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollutantSummary {
    #[serde(with = "rust_decimal::serde::str")]
    pub min: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub max: Decimal,
}

/// Trailing-hour statistics for one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CityStats {
    pub city_id: Uuid,
    pub readings: usize,
    pub no2: PollutantSummary,
    pub co: PollutantSummary,
    pub pm10: PollutantSummary,
}

impl CityStats {
    pub fn summary(&self, pollutant: Pollutant) -> &PollutantSummary {
        match pollutant {
            Pollutant::Pm10 => &self.pm10,
            Pollutant::Co => &self.co,
            Pollutant::No2 => &self.no2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub city_id: Uuid,
    pub pollutant: Pollutant,
    pub is_rising: bool,
}

/// Rising-trend lists for the two pollutants exposed by the region query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionTrends {
    pub rising_co: Vec<String>,
    pub rising_pm10: Vec<String>,
}

/// One row of the monthly PM10 report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRow {
    pub city_name: String,
    pub region: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_pm10: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct No2YearOverYear {
    pub city_name: String,
    pub city_id: Uuid,
    pub country: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_no2_current: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub avg_no2_year_before: Decimal,
}
