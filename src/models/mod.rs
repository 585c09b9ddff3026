pub mod city;
pub mod reading;
pub mod stats;

pub use city::City;
pub use reading::{Pollutant, Reading, ReadingRequest};
pub use stats::{
    CityStats, No2YearOverYear, PollutantSummary, RegionTrends, ReportRow, TrendResult,
};
