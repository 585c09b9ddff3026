use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::{MonitorError, Result};
use crate::utils::constants::MAX_POLLUTANT_VALUE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pollutant {
    Pm10,
    Co,
    No2,
}

impl Pollutant {
    pub const ALL: [Pollutant; 3] = [Pollutant::Pm10, Pollutant::Co, Pollutant::No2];

    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::Pm10 => "pm10",
            Pollutant::Co => "co",
            Pollutant::No2 => "no2",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Pollutant {
    type Err = MonitorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pm10" => Ok(Pollutant::Pm10),
            "co" => Ok(Pollutant::Co),
            "no2" => Ok(Pollutant::No2),
            other => Err(MonitorError::InvalidInput(format!(
                "Unknown pollutant: '{}'",
                other
            ))),
        }
    }
}

/// A single sensor reading. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: Uuid,
    pub city_id: Uuid,
    #[serde(with = "rust_decimal::serde::str")]
    pub pm10: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub co: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub no2: Decimal,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(
        sensor_id: Uuid,
        city_id: Uuid,
        pm10: Decimal,
        co: Decimal,
        no2: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sensor_id,
            city_id,
            pm10,
            co,
            no2,
            timestamp,
        }
    }

    pub fn value(&self, pollutant: Pollutant) -> Decimal {
        match pollutant {
            Pollutant::Pm10 => self.pm10,
            Pollutant::Co => self.co,
            Pollutant::No2 => self.no2,
        }
    }
}

/// Inbound reading as submitted by a sensor gateway, before validation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReadingRequest {
    #[validate(length(min = 1, message = "sensorId is required"))]
    pub sensor_id: String,

    #[validate(length(min = 1, message = "cityId is required"))]
    pub city_id: String,

    #[validate(required(message = "PM10 is required"))]
    pub pm10: Option<Decimal>,

    #[validate(required(message = "CO is required"))]
    pub co: Option<Decimal>,

    #[validate(required(message = "NO2 is required"))]
    pub no2: Option<Decimal>,

    /// Epoch seconds.
    #[validate(required(message = "timestamp is required"))]
    pub timestamp: Option<i64>,
}

impl TryFrom<ReadingRequest> for Reading {
    type Error = MonitorError;

    fn try_from(request: ReadingRequest) -> Result<Self> {
        request.validate()?;

        let sensor_id = parse_id("sensorId", &request.sensor_id)?;
        let city_id = parse_id("cityId", &request.city_id)?;

        // `validate` above guarantees presence
        let pm10 = in_range("pm10", request.pm10.unwrap_or_default())?;
        let co = in_range("co", request.co.unwrap_or_default())?;
        let no2 = in_range("no2", request.no2.unwrap_or_default())?;

        let seconds = request.timestamp.unwrap_or_default();
        let timestamp = Utc.timestamp_opt(seconds, 0).single().ok_or_else(|| {
            MonitorError::InvalidInput(format!("Invalid timestamp: {}", seconds))
        })?;

        Ok(Reading::new(sensor_id, city_id, pm10, co, no2, timestamp))
    }
}

fn parse_id(field: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|e| {
        MonitorError::InvalidInput(format!("Incorrect {} '{}': {}", field, value, e))
    })
}

fn in_range(field: &str, value: Decimal) -> Result<Decimal> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(MonitorError::InvalidInput(format!(
            "{} must not be negative, got {}",
            field, value
        )));
    }
    if value > Decimal::from(MAX_POLLUTANT_VALUE) {
        return Err(MonitorError::InvalidInput(format!(
            "{} must not exceed {}, got {}",
            field, MAX_POLLUTANT_VALUE, value
        )));
    }
    Ok(value)
}
