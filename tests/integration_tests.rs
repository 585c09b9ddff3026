use air_quality_monitor::analyzers::{
    HourlyStatsAggregator, MonthlyReportGenerator, TrendDetector, YearOverYearComparator,
};
use air_quality_monitor::cli::{exit_code, run, Cli, Commands, Outcome};
use air_quality_monitor::models::{ReadingRequest, RegionTrends};
use air_quality_monitor::processors::Ingestor;
use air_quality_monitor::readers::RequestReader;
use air_quality_monitor::services::{CityService, JsonCityInformationClient};
use air_quality_monitor::store::{CityDirectory, CsvMeasurementStore, JsonCityDirectory};
use air_quality_monitor::utils::report_filename;
use air_quality_monitor::windowing::CalendarMonth;
use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use uuid::Uuid;

const MAZOWIECKIE: &str = "0b5b7a8e-8f3c-4c8e-9a63-5d2b8d1f4e22";
const WARSZAWA: &str = "6f1c9c3e-3b0e-4a55-9d1c-2b8f8f0e6a11";
const RADOM: &str = "2a9e4c71-6b3d-4f2a-8c1e-5d7f9b0a3c55";
const PLOCK: &str = "9c3b1e57-7d2f-4a6b-b8e0-1f4c6a2d8e66";

const CITY_PAYLOAD: &str = r#"{
    "lastUpdate": "2026-01-31T22:15:00",
    "cities": [
        {"country": "Poland", "city": "Warszawa", "cityId": "6f1c9c3e-3b0e-4a55-9d1c-2b8f8f0e6a11",
         "region": "Mazowieckie", "regionId": "0b5b7a8e-8f3c-4c8e-9a63-5d2b8d1f4e22"},
        {"country": "Poland", "city": "Radom", "cityId": "2a9e4c71-6b3d-4f2a-8c1e-5d7f9b0a3c55",
         "region": "Mazowieckie", "regionId": "0b5b7a8e-8f3c-4c8e-9a63-5d2b8d1f4e22"},
        {"country": "Poland", "city": "Plock", "cityId": "9c3b1e57-7d2f-4a6b-b8e0-1f4c6a2d8e66",
         "region": "Mazowieckie", "regionId": "0b5b7a8e-8f3c-4c8e-9a63-5d2b8d1f4e22"}
    ]
}"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 3, 8, 30, 0).unwrap()
}

fn request(city_id: &str, pm10: Decimal, no2: Decimal, ts: DateTime<Utc>) -> ReadingRequest {
    ReadingRequest {
        sensor_id: Uuid::new_v4().to_string(),
        city_id: city_id.to_string(),
        pm10: Some(pm10),
        co: Some(dec!(0.5)),
        no2: Some(no2),
        timestamp: Some(ts.timestamp()),
    }
}

/// One noon reading per day of January 2026. Plock misses January 31st.
fn january_requests() -> Vec<ReadingRequest> {
    let mut requests = Vec::new();
    for day in 1..=31u32 {
        let noon = Utc.with_ymd_and_hms(2026, 1, day, 12, 0, 0).unwrap();
        let radom_pm10 = if day % 2 == 1 { dec!(10) } else { dec!(11) };
        requests.push(request(WARSZAWA, dec!(20), dec!(0.30), noon));
        requests.push(request(RADOM, radom_pm10, dec!(0.10), noon));
        if day < 31 {
            requests.push(request(PLOCK, dec!(90), dec!(0.10), noon));
        }
    }
    let last_january = Utc.with_ymd_and_hms(2025, 1, 15, 12, 0, 0).unwrap();
    requests.push(request(WARSZAWA, dec!(20), dec!(0.25), last_january));
    requests.push(request(RADOM, dec!(20), dec!(0.20), last_january));
    requests
}

fn seed(data_dir: &Path) -> (CsvMeasurementStore, JsonCityDirectory) {
    let store = CsvMeasurementStore::open(&data_dir.join("measurements.csv")).unwrap();
    let directory = JsonCityDirectory::new(&data_dir.join("cities.json"));

    let source = data_dir.join("upstream.json");
    fs::write(&source, CITY_PAYLOAD).unwrap();
    let written =
        CityService::refresh_city_information(&JsonCityInformationClient::new(&source), &directory)
            .unwrap();
    assert_eq!(written, 3);

    let report = Ingestor::new().ingest_batch(&store, january_requests()).unwrap();
    assert!(report.is_clean());

    (store, directory)
}

#[test]
fn test_monthly_report_end_to_end() {
    let dir = TempDir::new().unwrap();
    let (store, directory) = seed(dir.path());
    let month = CalendarMonth::previous(now()).unwrap();
    let path = dir.path().join("reports").join(report_filename(month));

    let generator = MonthlyReportGenerator::new();
    generator.generate(&store, &directory, month, &path).unwrap();
    let first = fs::read_to_string(&path).unwrap();

    assert_eq!(
        first,
        "CITY,REGION,PM10\nWarszawa,Mazowieckie,20.00\nRadom,Mazowieckie,10.48\n"
    );

    // Regenerating over the same data yields identical content
    generator.generate(&store, &directory, month, &path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), first);
}

#[test]
fn test_report_without_data_is_header_only() {
    let dir = TempDir::new().unwrap();
    let store = CsvMeasurementStore::open(&dir.path().join("measurements.csv")).unwrap();
    let directory = JsonCityDirectory::new(&dir.path().join("cities.json"));
    let path = dir.path().join("WORST_CITIES_PM10_202601.csv");

    let rows = MonthlyReportGenerator::new()
        .generate(&store, &directory, CalendarMonth::new(2026, 1).unwrap(), &path)
        .unwrap();

    assert!(rows.is_empty());
    assert_eq!(fs::read_to_string(&path).unwrap(), "CITY,REGION,PM10\n");
}

#[test]
fn test_year_over_year_after_reopen() {
    let dir = TempDir::new().unwrap();
    drop(seed(dir.path()));

    // Fresh handles read everything back from disk
    let store = CsvMeasurementStore::open(&dir.path().join("measurements.csv")).unwrap();
    let directory = JsonCityDirectory::new(&dir.path().join("cities.json"));
    assert_eq!(directory.cities().unwrap().len(), 3);

    let rising = YearOverYearComparator::new()
        .rising_no2(&store, &directory, now())
        .unwrap();

    assert_eq!(rising.len(), 1);
    assert_eq!(rising[0].city_name, "Warszawa");
    assert_eq!(rising[0].avg_no2_current, dec!(0.30));
    assert_eq!(rising[0].avg_no2_year_before, dec!(0.25));
}

#[test]
fn test_stats_and_trends_over_csv_store() {
    let dir = TempDir::new().unwrap();
    let (store, directory) = seed(dir.path());
    let warszawa = Uuid::parse_str(WARSZAWA).unwrap();
    let region = Uuid::parse_str(MAZOWIECKIE).unwrap();

    let at_noon = Utc.with_ymd_and_hms(2026, 1, 20, 12, 30, 0).unwrap();
    let stats = HourlyStatsAggregator::new()
        .city_stats(&store, warszawa, at_noon)
        .unwrap()
        .unwrap();
    assert_eq!(stats.readings, 1);
    assert_eq!(stats.pm10.avg, dec!(20.00));

    let quiet = HourlyStatsAggregator::new()
        .city_stats(&store, warszawa, now())
        .unwrap();
    assert!(quiet.is_none());

    // Only January has data, so no city has five complete months
    let trends = TrendDetector::new()
        .region_trends(&store, &directory, region, now())
        .unwrap();
    assert_eq!(trends, RegionTrends::default());
}

#[test]
fn test_ingest_from_csv_file_reports_bad_rows() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("batch.csv");
    fs::write(
        &input,
        format!(
            "sensorId,cityId,pm10,co,no2,timestamp\n\
             {sensor},{city},12.345,0.4,0.02,1767268800\n\
             {sensor},not-a-uuid,12.3,0.4,0.02,1767268800\n\
             {sensor},{city},,0.4,0.02,1767268800\n",
            sensor = Uuid::new_v4(),
            city = WARSZAWA
        ),
    )
    .unwrap();
    let store = CsvMeasurementStore::open(&dir.path().join("measurements.csv")).unwrap();

    let requests = RequestReader::new().read_requests(&input).unwrap();
    let report = Ingestor::new().ingest_batch(&store, requests).unwrap();

    assert_eq!(report.total_entries, 3);
    assert_eq!(report.accepted, 1);
    let rejected: Vec<usize> = report.rejected.iter().map(|r| r.index).collect();
    assert_eq!(rejected, vec![1, 2]);
}

#[tokio::test]
async fn test_cli_sync_and_report() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("upstream.json");
    fs::write(&source, CITY_PAYLOAD).unwrap();
    let output = dir.path().join("out").join("report.csv");

    let cli = |command: Commands| Cli {
        command,
        verbose: false,
        log_file: None,
        config: dir.path().join("absent.toml"),
        data_dir: Some(dir.path().to_path_buf()),
        now: Some(now()),
    };

    let synced = run(cli(Commands::SyncCities { source })).await.unwrap();
    let reported = run(cli(Commands::Report {
        output: Some(output.clone()),
        limit: 10,
    }))
    .await
    .unwrap();

    assert_eq!(synced, Outcome::Completed);
    assert_eq!(reported, Outcome::Completed);

    assert!(dir.path().join("cities.json").exists());
    assert_eq!(fs::read_to_string(&output).unwrap(), "CITY,REGION,PM10\n");
}

#[tokio::test]
async fn test_cli_stats_without_data_is_not_found() {
    let dir = TempDir::new().unwrap();
    let (store, _directory) = seed(dir.path());
    drop(store);

    let stats_at = |now: DateTime<Utc>| Cli {
        command: Commands::Stats {
            city_id: Uuid::parse_str(WARSZAWA).unwrap(),
            hours: None,
        },
        verbose: false,
        log_file: None,
        config: dir.path().join("absent.toml"),
        data_dir: Some(dir.path().to_path_buf()),
        now: Some(now),
    };

    let quiet = run(stats_at(now())).await;
    assert_eq!(quiet.as_ref().ok(), Some(&Outcome::NotFound));
    assert_eq!(exit_code(&quiet), 3);

    let busy = run(stats_at(Utc.with_ymd_and_hms(2026, 1, 20, 12, 30, 0).unwrap())).await;
    assert_eq!(busy.as_ref().ok(), Some(&Outcome::Completed));
    assert_eq!(exit_code(&busy), 0);
}
