pub mod constants;
pub mod decimal;
pub mod filename;
pub mod logging;
pub mod progress;

pub use constants::*;
pub use decimal::{round_half_up, Accumulator};
pub use filename::{default_report_path, report_filename};
pub use logging::init_logging;
pub use progress::ProgressReporter;
