use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{No2YearOverYear, Pollutant};
use crate::store::{CityDirectory, MeasurementStore, ScanFilter};
use crate::windowing::{bucketize_by_city, CalendarMonth, Granularity};

/// Compares last month's NO2 average per city with the same month a year
/// earlier.
pub struct YearOverYearComparator;

impl YearOverYearComparator {
    pub fn new() -> Self {
        Self
    }

    /// Cities whose previous-month NO2 average is strictly above the average
    /// of the same month one year before. Cities lacking data in either month
    /// are left out. Ordered by city name, then id.
    pub fn rising_no2(
        &self,
        store: &dyn MeasurementStore,
        directory: &dyn CityDirectory,
        now: DateTime<Utc>,
    ) -> Result<Vec<No2YearOverYear>> {
        let current = CalendarMonth::previous(now)?;
        self.rising_no2_for_month(store, directory, current)
    }

    pub fn rising_no2_for_month(
        &self,
        store: &dyn MeasurementStore,
        directory: &dyn CityDirectory,
        current: CalendarMonth,
    ) -> Result<Vec<No2YearOverYear>> {
        let year_before = current.minus_years(1)?;

        let current_avg = self.monthly_no2(store, current)?;
        let before_avg = self.monthly_no2(store, year_before)?;

        let mut rising = Vec::new();
        for city in directory.cities()? {
            let (Some(now_avg), Some(then_avg)) =
                (current_avg.get(&city.id), before_avg.get(&city.id))
            else {
                continue;
            };
            if now_avg > then_avg {
                rising.push(No2YearOverYear {
                    city_name: city.name,
                    city_id: city.id,
                    country: city.country,
                    avg_no2_current: *now_avg,
                    avg_no2_year_before: *then_avg,
                });
            }
        }

        rising.sort_by(|a, b| {
            a.city_name
                .cmp(&b.city_name)
                .then_with(|| a.city_id.cmp(&b.city_id))
        });

        info!(%current, %year_before, rising = rising.len(), "Year-over-year NO2 comparison finished");
        Ok(rising)
    }

    /// Exact NO2 mean per city over one calendar month.
    fn monthly_no2(
        &self,
        store: &dyn MeasurementStore,
        month: CalendarMonth,
    ) -> Result<BTreeMap<Uuid, Decimal>> {
        let window = month.window()?;
        let readings = store.scan(&ScanFilter::all().within(window))?;
        let per_city = bucketize_by_city(&readings, Pollutant::No2, Granularity::Month, window)?;

        Ok(per_city
            .into_iter()
            .filter_map(|(city_id, buckets)| {
                buckets
                    .first()
                    .and_then(|b| b.average)
                    .map(|avg| (city_id, avg))
            })
            .collect())
    }
}

impl Default for YearOverYearComparator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{City, Reading};
    use crate::store::InMemoryStore;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 10, 6, 0, 0).unwrap()
    }

    fn city(name: &str) -> City {
        City::new(
            Uuid::new_v4(),
            name.to_string(),
            "Poland".to_string(),
            "Mazowieckie".to_string(),
            Uuid::new_v4(),
        )
    }

    fn no2_in(month: CalendarMonth, city_id: Uuid, values: &[Decimal]) -> Vec<Reading> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let ts = month.start() + Duration::days(i as i64) + Duration::hours(3);
                Reading::new(Uuid::new_v4(), city_id, dec!(1), dec!(1), *v, ts)
            })
            .collect()
    }

    #[test]
    fn test_compares_january_with_previous_january() {
        let jan_2026 = CalendarMonth::new(2026, 1).unwrap();
        let jan_2025 = CalendarMonth::new(2025, 1).unwrap();
        let worse = city("Warszawa");
        let better = city("Radom");
        let equal = city("Plock");
        let new_city = city("Siedlce");

        let mut readings = Vec::new();
        readings.extend(no2_in(jan_2026, worse.id, &[dec!(0.40), dec!(0.50)]));
        readings.extend(no2_in(jan_2025, worse.id, &[dec!(0.39)]));
        readings.extend(no2_in(jan_2026, better.id, &[dec!(0.10)]));
        readings.extend(no2_in(jan_2025, better.id, &[dec!(0.20)]));
        readings.extend(no2_in(jan_2026, equal.id, &[dec!(1), dec!(3)]));
        readings.extend(no2_in(jan_2025, equal.id, &[dec!(2)]));
        readings.extend(no2_in(jan_2026, new_city.id, &[dec!(9)]));
        let store = InMemoryStore::with_data(readings, vec![worse.clone(), better, equal, new_city]);

        let rising = YearOverYearComparator::new().rising_no2(&store, &store, now()).unwrap();

        assert_eq!(rising.len(), 1);
        assert_eq!(rising[0].city_id, worse.id);
        assert_eq!(rising[0].avg_no2_current, dec!(0.45));
        assert_eq!(rising[0].avg_no2_year_before, dec!(0.39));
        assert_eq!(rising[0].country, "Poland");
    }

    #[test]
    fn test_other_months_are_ignored() {
        let c = city("Ostroleka");
        let mut readings = Vec::new();
        // December 2025 and February 2025 are not compared
        readings.extend(no2_in(CalendarMonth::new(2025, 12).unwrap(), c.id, &[dec!(50)]));
        readings.extend(no2_in(CalendarMonth::new(2025, 2).unwrap(), c.id, &[dec!(1)]));
        let store = InMemoryStore::with_data(readings, vec![c]);

        let rising = YearOverYearComparator::new().rising_no2(&store, &store, now()).unwrap();

        assert!(rising.is_empty());
    }

    #[test]
    fn test_ordering_is_stable() {
        let jan_2026 = CalendarMonth::new(2026, 1).unwrap();
        let jan_2025 = CalendarMonth::new(2025, 1).unwrap();
        let mut readings = Vec::new();
        let mut cities = Vec::new();
        for name in ["Zamosc", "Bialystok", "Lodz"] {
            let c = city(name);
            readings.extend(no2_in(jan_2026, c.id, &[dec!(2)]));
            readings.extend(no2_in(jan_2025, c.id, &[dec!(1)]));
            cities.push(c);
        }
        let store = InMemoryStore::with_data(readings, cities);
        let comparator = YearOverYearComparator::new();

        let first = comparator.rising_no2(&store, &store, now()).unwrap();
        let second = comparator.rising_no2(&store, &store, now()).unwrap();

        let names: Vec<&str> = first.iter().map(|r| r.city_name.as_str()).collect();
        assert_eq!(names, vec!["Bialystok", "Lodz", "Zamosc"]);
        assert_eq!(first, second);
    }
}
