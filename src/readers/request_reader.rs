use crate::error::{MonitorError, Result};
use crate::models::ReadingRequest;
use crate::utils::constants::DEFAULT_BUFFER_SIZE;
use csv::StringRecord;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// Loads reading submissions from a CSV or JSON file.
///
/// CSV files need a header naming the columns `sensorId`, `cityId`, `pm10`,
/// `co`, `no2` and `timestamp` (epoch seconds), in any order. Empty cells
/// become missing fields and are reported later by validation. JSON files
/// hold an array of objects with the same keys.
pub struct RequestReader {
    delimiter: u8,
}

struct Columns {
    sensor_id: Option<usize>,
    city_id: Option<usize>,
    pm10: Option<usize>,
    co: Option<usize>,
    no2: Option<usize>,
    timestamp: Option<usize>,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Self {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        Self {
            sensor_id: find("sensorId"),
            city_id: find("cityId"),
            pm10: find("pm10"),
            co: find("co"),
            no2: find("no2"),
            timestamp: find("timestamp"),
        }
    }
}

impl RequestReader {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self { delimiter }
    }

    /// Dispatch on the file extension (`.json`, anything else is CSV).
    pub fn read_requests(&self, path: &Path) -> Result<Vec<ReadingRequest>> {
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        if is_json {
            self.read_json(path)
        } else {
            self.read_csv(path)
        }
    }

    pub fn read_json(&self, path: &Path) -> Result<Vec<ReadingRequest>> {
        let file = File::open(path)?;
        let requests = serde_json::from_reader(BufReader::new(file))?;
        Ok(requests)
    }

    pub fn read_csv(&self, path: &Path) -> Result<Vec<ReadingRequest>> {
        let file = File::open(path)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file));

        let columns = Columns::locate(reader.headers()?);
        let mut requests = Vec::new();

        for (index, record) in reader.records().enumerate() {
            let record = record?;
            // data rows start on line 2
            let line = index + 2;

            if record.iter().all(|field| field.is_empty()) {
                continue;
            }

            requests.push(self.parse_record(&record, &columns, line)?);
        }

        Ok(requests)
    }

    fn parse_record(
        &self,
        record: &StringRecord,
        columns: &Columns,
        line: usize,
    ) -> Result<ReadingRequest> {
        let text = |col: Option<usize>| -> Option<&str> {
            col.and_then(|i| record.get(i)).filter(|s| !s.is_empty())
        };

        let decimal = |col: Option<usize>, name: &str| -> Result<Option<Decimal>> {
            text(col)
                .map(|s| {
                    Decimal::from_str(s).map_err(|_| {
                        MonitorError::InvalidFormat(format!(
                            "Line {}: invalid {} value '{}'",
                            line, name, s
                        ))
                    })
                })
                .transpose()
        };

        let timestamp = text(columns.timestamp)
            .map(|s| {
                s.parse::<i64>().map_err(|_| {
                    MonitorError::InvalidFormat(format!(
                        "Line {}: invalid timestamp '{}'",
                        line, s
                    ))
                })
            })
            .transpose()?;

        Ok(ReadingRequest {
            sensor_id: text(columns.sensor_id).unwrap_or_default().to_string(),
            city_id: text(columns.city_id).unwrap_or_default().to_string(),
            pm10: decimal(columns.pm10, "pm10")?,
            co: decimal(columns.co, "co")?,
            no2: decimal(columns.no2, "no2")?,
            timestamp,
        })
    }
}

impl Default for RequestReader {
    fn default() -> Self {
        Self::new()
    }
}
