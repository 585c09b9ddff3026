use crate::error::{MonitorError, Result};
use crate::models::{Reading, ReadingRequest};
use crate::store::MeasurementStore;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestReport {
    pub total_entries: usize,
    pub accepted: usize,
    pub rejected: Vec<RejectedEntry>,
}

impl IngestReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// A batch entry that failed validation, with its position in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedEntry {
    pub index: usize,
    pub reason: String,
}

/// Validates inbound readings and appends them to a measurement store.
pub struct Ingestor {
    max_workers: usize,
    min_parallel_batch: usize,
}

impl Ingestor {
    pub fn new() -> Self {
        Self {
            max_workers: num_cpus::get(),
            min_parallel_batch: 1024,
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Batches smaller than this are validated on the calling thread.
    pub fn with_min_parallel_batch(mut self, min_parallel_batch: usize) -> Self {
        self.min_parallel_batch = min_parallel_batch.max(1);
        self
    }

    /// Validate and store a single reading.
    pub fn ingest(&self, store: &dyn MeasurementStore, request: ReadingRequest) -> Result<Reading> {
        let reading = Reading::try_from(request)?;
        store.append(reading.clone())?;

        info!(
            sensor_id = %reading.sensor_id,
            city_id = %reading.city_id,
            ts = %reading.timestamp,
            "Reading stored"
        );
        Ok(reading)
    }

    /// Validate a batch and store every valid entry in one append.
    ///
    /// Invalid entries are reported, not fatal. A store failure fails the
    /// whole call and nothing from the batch is reported as accepted.
    pub fn ingest_batch(
        &self,
        store: &dyn MeasurementStore,
        requests: Vec<ReadingRequest>,
    ) -> Result<IngestReport> {
        let total_entries = requests.len();

        let outcomes: Vec<(usize, Result<Reading>)> = if total_entries >= self.min_parallel_batch {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.max_workers)
                .build()
                .map_err(|e| MonitorError::WorkerPool(e.to_string()))?;

            pool.install(|| {
                requests
                    .into_par_iter()
                    .enumerate()
                    .map(|(index, request)| (index, Reading::try_from(request)))
                    .collect()
            })
        } else {
            requests
                .into_iter()
                .enumerate()
                .map(|(index, request)| (index, Reading::try_from(request)))
                .collect()
        };

        let mut accepted = Vec::with_capacity(total_entries);
        let mut rejected = Vec::new();
        for (index, outcome) in outcomes {
            match outcome {
                Ok(reading) => accepted.push(reading),
                Err(e) => {
                    warn!(index, error = %e, "Rejected reading");
                    rejected.push(RejectedEntry {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let accepted_count = accepted.len();
        if !accepted.is_empty() {
            store.append_batch(accepted)?;
        }

        info!(
            total = total_entries,
            accepted = accepted_count,
            rejected = rejected.len(),
            "Batch ingested"
        );

        Ok(IngestReport {
            total_entries,
            accepted: accepted_count,
            rejected,
        })
    }
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new()
    }
}
