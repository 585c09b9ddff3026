pub mod atomic;
pub mod csv_report_writer;

pub use atomic::write_atomically;
pub use csv_report_writer::CsvReportWriter;
