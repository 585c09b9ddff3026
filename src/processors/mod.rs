pub mod ingest;

pub use ingest::{IngestReport, Ingestor, RejectedEntry};
