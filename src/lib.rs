pub mod analyzers;
pub mod cli;
pub mod error;
pub mod models;
pub mod processors;
pub mod readers;
pub mod services;
pub mod settings;
pub mod store;
pub mod utils;
pub mod windowing;
pub mod writers;

pub use error::{MonitorError, Result};
