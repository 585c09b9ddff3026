use thiserror::Error;

pub type Result<T> = std::result::Result<T, MonitorError>;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Datastore error: {0}")]
    Datastore(String),

    #[error("Integration error: {0}")]
    Integration(String),

    #[error("Failed to publish report {path}: {source}")]
    ReportPublish {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Worker pool error: {0}")]
    WorkerPool(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl MonitorError {
    /// Infrastructure failures, as opposed to rejected input.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            MonitorError::Io(_)
                | MonitorError::Csv(_)
                | MonitorError::Datastore(_)
                | MonitorError::Integration(_)
                | MonitorError::ReportPublish { .. }
                | MonitorError::WorkerPool(_)
                | MonitorError::TaskJoin(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use std::io;

    fn io_error() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "disk unavailable")
    }

    #[test]
    fn test_infrastructure_failures() {
        let failures = vec![
            MonitorError::Io(io_error()),
            MonitorError::Csv(csv::Error::from(io_error())),
            MonitorError::Datastore("lock poisoned".to_string()),
            MonitorError::Integration("no cities".to_string()),
            MonitorError::ReportPublish {
                path: "reports/WORST_CITIES_PM10_202601.csv".to_string(),
                source: io_error(),
            },
            MonitorError::WorkerPool("no threads".to_string()),
        ];

        for error in failures {
            assert!(error.is_infrastructure(), "{} should be infrastructure", error);
        }
    }

    #[test]
    fn test_rejected_input_is_not_infrastructure() {
        let rejected = vec![
            MonitorError::Json(serde_json::from_str::<u32>("pm10").unwrap_err()),
            MonitorError::DateParse("yesterday".parse::<DateTime<Utc>>().unwrap_err()),
            MonitorError::Config(config::ConfigError::Message("bad key".to_string())),
            MonitorError::Validation(validator::ValidationErrors::new()),
            MonitorError::InvalidInput("negative pm10".to_string()),
            MonitorError::InvalidFormat("Line 3: missing column".to_string()),
        ];

        for error in rejected {
            assert!(!error.is_infrastructure(), "{} should be rejected input", error);
        }
    }

    #[tokio::test]
    async fn test_join_failure_is_infrastructure() {
        let join_error = tokio::spawn(async { panic!("worker died") })
            .await
            .unwrap_err();

        assert!(MonitorError::from(join_error).is_infrastructure());
    }
}
