pub mod hourly_stats;
pub mod monthly_report;
pub mod trend_detector;
pub mod year_over_year;

pub use hourly_stats::HourlyStatsAggregator;
pub use monthly_report::MonthlyReportGenerator;
pub use trend_detector::{is_strictly_rising, TrendDetector};
pub use year_over_year::YearOverYearComparator;
