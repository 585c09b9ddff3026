use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

use super::{MeasurementStore, ScanFilter};
use crate::error::{MonitorError, Result};
use crate::models::Reading;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;

const HEADER: [&str; 6] = ["sensor_id", "city_id", "pm10", "co", "no2", "timestamp"];

/// Readings kept in an append-only CSV file, one row per reading.
///
/// Appends are serialised through a mutex and each batch is written with a
/// single `write_all`, so concurrent batches never interleave rows.
pub struct CsvMeasurementStore {
    path: PathBuf,
    append_lock: Mutex<()>,
}

impl CsvMeasurementStore {
    /// Open the store, creating the file with its header when missing.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        if !path.exists() {
            let mut writer = csv::Writer::from_path(path)?;
            writer.write_record(HEADER)?;
            writer.flush()?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            append_lock: Mutex::new(()),
        })
    }

    fn encode(readings: &[Reading]) -> Result<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::new());
        for reading in readings {
            writer.serialize(reading)?;
        }
        writer
            .into_inner()
            .map_err(|e| MonitorError::Datastore(format!("Failed to encode readings: {}", e)))
    }

    /// Length of the file up to and including its last newline. Bytes after
    /// it belong to an append still in progress.
    fn committed_len(file: &mut File, len: u64) -> Result<u64> {
        let mut end = len;
        let mut chunk = vec![0u8; DEFAULT_BUFFER_SIZE];

        while end > 0 {
            let start = end.saturating_sub(chunk.len() as u64);
            let buf = &mut chunk[..(end - start) as usize];
            file.seek(SeekFrom::Start(start))?;
            file.read_exact(buf)?;
            if let Some(pos) = buf.iter().rposition(|&b| b == b'\n') {
                return Ok(start + pos as u64 + 1);
            }
            end = start;
        }

        Ok(0)
    }

    fn write_rows(&self, rows: &[u8]) -> Result<()> {
        let _guard = self
            .append_lock
            .lock()
            .map_err(|_| MonitorError::Datastore("Append lock poisoned".to_string()))?;

        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(rows)?;
        file.sync_data()?;
        Ok(())
    }
}

impl MeasurementStore for CsvMeasurementStore {
    fn scan(&self, filter: &ScanFilter) -> Result<Vec<Reading>> {
        let mut file = File::open(&self.path)?;
        let total_len = file.metadata()?.len();
        let committed = Self::committed_len(&mut file, total_len)?;
        if committed < total_len {
            debug!(
                pending_bytes = total_len - committed,
                path = %self.path.display(),
                "Skipping incomplete trailing row"
            );
        }
        file.seek(SeekFrom::Start(0))?;

        let mut reader = csv::Reader::from_reader(BufReader::with_capacity(
            DEFAULT_BUFFER_SIZE,
            file.take(committed),
        ));

        let mut matched = Vec::new();
        let mut scanned = 0usize;
        for row in reader.deserialize::<Reading>() {
            let reading = row?;
            scanned += 1;
            if filter.matches(&reading) {
                matched.push(reading);
            }
        }

        debug!(scanned, matched = matched.len(), path = %self.path.display(), "Scanned measurements");
        Ok(matched)
    }

    fn append(&self, reading: Reading) -> Result<()> {
        self.append_batch(vec![reading])
    }

    fn append_batch(&self, readings: Vec<Reading>) -> Result<()> {
        if readings.is_empty() {
            return Ok(());
        }
        let rows = Self::encode(&readings)?;
        self.write_rows(&rows)
    }
}
