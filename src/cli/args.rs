use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

use crate::utils::constants::CONFIG_FILE;

#[derive(Parser)]
#[command(name = "air-quality-monitor")]
#[command(about = "Air-quality analytics over PM10, CO and NO2 sensor readings")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Log file path")]
    pub log_file: Option<PathBuf>,

    #[arg(long, global = true, default_value = CONFIG_FILE, help = "Optional TOML configuration file")]
    pub config: PathBuf,

    #[arg(long, global = true, help = "Directory holding measurements and cities")]
    pub data_dir: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Evaluate as of this RFC 3339 instant [default: current time]"
    )]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate and store readings from a CSV or JSON file
    Ingest {
        #[arg(short, long, help = "Input file (.csv or .json)")]
        input: PathBuf,

        #[arg(long, default_value = ",", help = "CSV field delimiter")]
        delimiter: char,

        #[arg(long, default_value_t = num_cpus::get())]
        max_workers: usize,
    },

    /// Min, average and max per pollutant for a city over the last hour
    Stats {
        #[arg(long)]
        city_id: Uuid,

        #[arg(
            long,
            help = "Also list hourly averages for this many complete hours"
        )]
        hours: Option<u32>,
    },

    /// Cities with a rising CO or PM10 trend in a region
    Trends {
        #[arg(long)]
        region_id: Uuid,

        #[arg(long, default_value = "5", help = "Number of complete months compared")]
        months: u32,
    },

    /// Write the monthly top-10 PM10 report for the previous month
    Report {
        #[arg(
            short,
            long,
            help = "Report path [default: <report_location>/WORST_CITIES_PM10_{YYYYMM}.csv]"
        )]
        output: Option<PathBuf>,

        #[arg(long, default_value = "10")]
        limit: usize,
    },

    /// Cities whose NO2 average rose against the same month a year earlier
    YearOverYear,

    /// Refresh the city directory from an upstream JSON payload
    SyncCities {
        #[arg(short, long, help = "Upstream city information JSON file")]
        source: PathBuf,
    },
}
