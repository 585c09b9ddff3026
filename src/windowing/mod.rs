pub mod bucket;
pub mod calendar;

pub use bucket::{bucketize, bucketize_by_city, Bucket};
pub use calendar::{CalendarMonth, Granularity, TimeWindow};
