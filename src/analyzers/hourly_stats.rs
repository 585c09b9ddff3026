use chrono::{DateTime, Duration, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CityStats, Pollutant, PollutantSummary, Reading};
use crate::store::{MeasurementStore, ScanFilter};
use crate::utils::constants::RECENT_STATS_HOURS;
use crate::utils::{round_half_up, Accumulator};
use crate::windowing::{bucketize, Bucket, Granularity, TimeWindow};

/// Min/avg/max of every pollutant over a trailing window for one city.
pub struct HourlyStatsAggregator {
    window: Duration,
}

impl HourlyStatsAggregator {
    pub fn new() -> Self {
        Self {
            window: Duration::hours(RECENT_STATS_HOURS),
        }
    }

    /// Statistics over `[now - window, now)`, or `None` when the city has no
    /// readings in that range.
    pub fn city_stats(
        &self,
        store: &dyn MeasurementStore,
        city_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<CityStats>> {
        let window = TimeWindow::trailing(now, self.window)?;
        let readings = store.scan(&ScanFilter::for_city(city_id).within(window))?;

        debug!(%city_id, %window, readings = readings.len(), "Computing recent city stats");

        summarize(city_id, &readings)
    }

    /// Hour buckets for the `hours` complete clock hours before the current
    /// one, oldest first. Hours without readings carry no average.
    pub fn recent_hourly_averages(
        &self,
        store: &dyn MeasurementStore,
        city_id: Uuid,
        pollutant: Pollutant,
        hours: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bucket>> {
        let window = TimeWindow::preceding_units(now, Granularity::Hour, hours)?;
        let readings = store.scan(&ScanFilter::for_city(city_id).within(window))?;

        bucketize(&readings, city_id, pollutant, Granularity::Hour, window)
    }
}

impl Default for HourlyStatsAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn pollutant_summary(readings: &[Reading], pollutant: Pollutant) -> Result<Option<PollutantSummary>> {
    let acc = Accumulator::try_from_values(readings.iter().map(|r| r.value(pollutant)))?;
    let (Some(min), Some(avg), Some(max)) = (acc.min(), acc.mean(), acc.max()) else {
        return Ok(None);
    };
    Ok(Some(PollutantSummary {
        min: round_half_up(min),
        avg: round_half_up(avg),
        max: round_half_up(max),
    }))
}

/// All three pollutants come from the same reading set.
fn summarize(city_id: Uuid, readings: &[Reading]) -> Result<Option<CityStats>> {
    let (Some(no2), Some(co), Some(pm10)) = (
        pollutant_summary(readings, Pollutant::No2)?,
        pollutant_summary(readings, Pollutant::Co)?,
        pollutant_summary(readings, Pollutant::Pm10)?,
    ) else {
        return Ok(None);
    };
    Ok(Some(CityStats {
        city_id,
        readings: readings.len(),
        no2,
        co,
        pm10,
    }))
}
