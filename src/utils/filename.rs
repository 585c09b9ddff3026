use crate::utils::constants::REPORT_FILE_PREFIX;
use crate::windowing::CalendarMonth;
use std::path::{Path, PathBuf};

/// Report file name for a month: WORST_CITIES_PM10_{YYYYMM}.csv
pub fn report_filename(month: CalendarMonth) -> String {
    format!(
        "{}{:04}{:02}.csv",
        REPORT_FILE_PREFIX,
        month.year(),
        month.month()
    )
}

pub fn default_report_path(report_location: &Path, month: CalendarMonth) -> PathBuf {
    report_location.join(report_filename(month))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_filename() {
        let month = CalendarMonth::new(2026, 1).unwrap();
        assert_eq!(report_filename(month), "WORST_CITIES_PM10_202601.csv");
    }

    #[test]
    fn test_default_report_path() {
        let month = CalendarMonth::new(2025, 12).unwrap();
        let path = default_report_path(Path::new("reports"), month);

        let parts: Vec<String> = path
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        assert_eq!(parts, vec!["reports", "WORST_CITIES_PM10_202512.csv"]);
    }
}
