/// File names inside the data directory
pub const MEASUREMENTS_FILE: &str = "measurements.csv";
pub const CITIES_FILE: &str = "cities.json";
pub const CONFIG_FILE: &str = "air-quality-monitor.toml";

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "AIRQ";

/// Analysis windows
pub const TREND_MONTHS: u32 = 5;
pub const TOP_N_REPORT_SIZE: usize = 10;
pub const RECENT_STATS_HOURS: i64 = 1;

/// Upper bound accepted for any pollutant value on ingest
pub const MAX_POLLUTANT_VALUE: u64 = 1_000_000;

/// Decimal places used for every rounded average
pub const DISPLAY_SCALE: u32 = 2;

/// Monthly PM10 report artifact
pub const REPORT_FILE_PREFIX: &str = "WORST_CITIES_PM10_";
pub const REPORT_HEADER: [&str; 3] = ["CITY", "REGION", "PM10"];

/// Processing defaults
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_REPORT_LOCATION: &str = "reports";
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB
