use crate::error::Result;
use crate::models::ReportRow;
use crate::utils::constants::REPORT_HEADER;
use crate::utils::round_half_up;
use crate::writers::atomic::write_atomically;
use csv::{QuoteStyle, WriterBuilder};
use std::path::Path;
use tracing::{info, warn};

/// Writes the monthly PM10 ranking as a plain comma-separated file.
///
/// Fields are emitted unquoted, matching the published report format. Names
/// that contain the delimiter, a quote or a line break would corrupt the row;
/// they are logged, not escaped.
pub struct CsvReportWriter {
    delimiter: u8,
}

impl CsvReportWriter {
    pub fn new() -> Self {
        Self { delimiter: b',' }
    }

    /// Write header plus rows; the header is written even with no rows.
    pub fn write_report(&self, rows: &[ReportRow], path: &Path) -> Result<()> {
        for row in rows {
            self.check_field(&row.city_name);
            self.check_field(&row.region);
        }

        write_atomically(path, |out| {
            let mut writer = WriterBuilder::new()
                .delimiter(self.delimiter)
                .quote_style(QuoteStyle::Never)
                .from_writer(out);

            writer.write_record(REPORT_HEADER)?;
            for row in rows {
                let pm10 = round_half_up(row.avg_pm10).to_string();
                writer.write_record([row.city_name.as_str(), row.region.as_str(), pm10.as_str()])?;
            }
            writer.flush()?;
            Ok(())
        })?;

        info!(rows = rows.len(), path = %path.display(), "Report published");
        Ok(())
    }

    fn check_field(&self, value: &str) {
        let unsafe_field = value
            .bytes()
            .any(|b| b == self.delimiter || b == b'"' || b == b'\n' || b == b'\r');
        if unsafe_field {
            warn!(field = value, "Report field contains a delimiter or quote and is written unescaped");
        }
    }
}

impl Default for CsvReportWriter {
    fn default() -> Self {
        Self::new()
    }
}
