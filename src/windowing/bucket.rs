use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use super::{Granularity, TimeWindow};
use crate::error::Result;
use crate::models::{Pollutant, Reading};
use crate::utils::Accumulator;

/// Aggregated value of one pollutant for one city over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub city_id: Uuid,
    pub pollutant: Pollutant,
    /// Exact mean; `None` when no reading fell in the bucket.
    pub average: Option<Decimal>,
    pub count: usize,
}

impl Bucket {
    pub fn has_data(&self) -> bool {
        self.count > 0
    }
}

/// Index of the interval holding `instant`. Intervals must be sorted and contiguous.
fn slot(intervals: &[TimeWindow], instant: DateTime<Utc>) -> Option<usize> {
    let idx = intervals.partition_point(|iv| iv.start <= instant);
    if idx == 0 {
        return None;
    }
    let candidate = idx - 1;
    intervals[candidate].contains(instant).then_some(candidate)
}

fn into_buckets(
    intervals: &[TimeWindow],
    accumulators: Vec<Accumulator>,
    city_id: Uuid,
    pollutant: Pollutant,
) -> Vec<Bucket> {
    intervals
        .iter()
        .zip(accumulators)
        .map(|(iv, acc)| Bucket {
            start: iv.start,
            end: iv.end,
            city_id,
            pollutant,
            average: acc.mean(),
            count: acc.count(),
        })
        .collect()
}

/// Bucket one city's readings. Returns one bucket per calendar unit of
/// `window`, ascending, including empty ones. Readings outside the window or
/// belonging to other cities are ignored.
pub fn bucketize(
    readings: &[Reading],
    city_id: Uuid,
    pollutant: Pollutant,
    granularity: Granularity,
    window: TimeWindow,
) -> Result<Vec<Bucket>> {
    let intervals = window.intervals(granularity)?;
    let mut accumulators = vec![Accumulator::new(); intervals.len()];

    for reading in readings {
        if reading.city_id != city_id || !window.contains(reading.timestamp) {
            continue;
        }
        if let Some(idx) = slot(&intervals, reading.timestamp) {
            accumulators[idx].push(reading.value(pollutant))?;
        }
    }

    Ok(into_buckets(&intervals, accumulators, city_id, pollutant))
}

/// Bucket readings of every city present in `readings`, in a single pass.
/// Cities without any reading inside `window` are absent from the result.
pub fn bucketize_by_city(
    readings: &[Reading],
    pollutant: Pollutant,
    granularity: Granularity,
    window: TimeWindow,
) -> Result<BTreeMap<Uuid, Vec<Bucket>>> {
    let intervals = window.intervals(granularity)?;
    let mut per_city: BTreeMap<Uuid, Vec<Accumulator>> = BTreeMap::new();

    for reading in readings {
        if !window.contains(reading.timestamp) {
            continue;
        }
        if let Some(idx) = slot(&intervals, reading.timestamp) {
            per_city
                .entry(reading.city_id)
                .or_insert_with(|| vec![Accumulator::new(); intervals.len()])[idx]
                .push(reading.value(pollutant))?;
        }
    }

    tracing::debug!(
        cities = per_city.len(),
        buckets_per_city = intervals.len(),
        %window,
        "Bucketized readings"
    );

    Ok(per_city
        .into_iter()
        .map(|(city_id, accs)| (city_id, into_buckets(&intervals, accs, city_id, pollutant)))
        .collect())
}
