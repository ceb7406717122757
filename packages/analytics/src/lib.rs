#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregations over a cleaned [`RecordSet`].
//!
//! All functions are pure: they read the record set (and, for rates, the
//! population table) and return freshly built rows. Groups with no
//! incidents are omitted rather than reported as zero.

use std::collections::BTreeMap;

use chrono::{Datelike as _, Month, Weekday};
use shooting_map_analytics_models::{MonthCount, StateRate, Summary, WeekdayCount};
use shooting_map_incident_models::{PopulationTable, RecordSet};

/// Per-state victims and deaths per million residents.
///
/// Records without a state are skipped, as are states missing from the
/// population table. Rows are sorted by state name.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rates_per_state(records: &RecordSet, population: &PopulationTable) -> Vec<StateRate> {
    let mut by_state: BTreeMap<&str, (u64, u64, u64)> = BTreeMap::new();

    for record in records {
        let Some(state) = record.state.as_deref() else {
            continue;
        };
        let entry = by_state.entry(state).or_default();
        entry.0 += 1;
        entry.1 += u64::from(record.total);
        entry.2 += u64::from(record.dead);
    }

    by_state
        .into_iter()
        .filter_map(|(state, (incidents, total, dead))| {
            let Some(population) = population.get(state).filter(|p| *p > 0) else {
                log::debug!("No population for '{state}', skipping");
                return None;
            };
            Some(StateRate {
                state: state.to_owned(),
                incidents,
                total,
                dead,
                population,
                victims_per_1m: total as f64 * 1_000_000.0 / population as f64,
                deaths_per_1m: dead as f64 * 1_000_000.0 / population as f64,
            })
        })
        .collect()
}

/// Incident counts per calendar month, pooled across years.
#[must_use]
pub fn shootings_by_month(records: &RecordSet) -> Vec<MonthCount> {
    let mut counts: BTreeMap<u32, u64> = BTreeMap::new();
    for record in records {
        *counts.entry(record.occurred_on.month()).or_default() += 1;
    }

    counts
        .into_iter()
        .filter_map(|(month_number, shootings)| {
            let month = u8::try_from(month_number)
                .ok()
                .and_then(|m| Month::try_from(m).ok())?;
            Some(MonthCount {
                month_number,
                month: month.name().to_owned(),
                shootings,
            })
        })
        .collect()
}

/// Incident counts per day of the week, Monday first.
#[must_use]
pub fn shootings_by_weekday(records: &RecordSet) -> Vec<WeekdayCount> {
    let mut counts: BTreeMap<u32, (Weekday, u64)> = BTreeMap::new();
    for record in records {
        let weekday = record.occurred_on.weekday();
        counts
            .entry(weekday.number_from_monday())
            .or_insert((weekday, 0))
            .1 += 1;
    }

    counts
        .into_iter()
        .map(|(weekday_number, (weekday, shootings))| WeekdayCount {
            weekday_number,
            weekday: weekday_name(weekday).to_owned(),
            shootings,
        })
        .collect()
}

const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Headline totals.
#[must_use]
pub fn summary(records: &RecordSet) -> Summary {
    records.iter().fold(Summary::default(), |mut s, record| {
        s.incidents += 1;
        s.dead += u64::from(record.dead);
        s.injured += u64::from(record.injured);
        s.total += u64::from(record.total);
        if record.coordinates().is_some() {
            s.geocoded += 1;
        }
        if record.state.is_some() {
            s.with_state += 1;
        }
        s.first_date = Some(s.first_date.map_or(record.occurred_on, |d| d.min(record.occurred_on)));
        s.last_date = Some(s.last_date.map_or(record.occurred_on, |d| d.max(record.occurred_on)));
        s
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use shooting_map_incident_models::NormalizedRecord;

    use super::*;

    fn record(date: (i32, u32, u32), state: Option<&str>, dead: u32, total: u32) -> NormalizedRecord {
        NormalizedRecord {
            occurred_on: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            location: state.map_or_else(String::new, |s| format!("Somewhere, {s}")),
            state: state.map(String::from),
            dead,
            injured: total - dead,
            total,
            latitude: None,
            longitude: None,
        }
    }

    fn texas_ohio() -> RecordSet {
        vec![
            record((2019, 8, 3), Some("Texas"), 4, 6),
            record((2019, 8, 31), Some("Texas"), 6, 8),
            record((2019, 8, 4), Some("Ohio"), 3, 5),
            record((2020, 1, 1), None, 5, 9),
        ]
        .into_iter()
        .collect()
    }

    fn population() -> PopulationTable {
        [
            ("Texas".to_string(), 30_000_000),
            ("Ohio".to_string(), 10_000_000),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn computes_deaths_per_million() {
        let rates = rates_per_state(&texas_ohio(), &population());
        assert_eq!(rates.len(), 2);

        assert_eq!(rates[0].state, "Ohio");
        assert!((rates[0].deaths_per_1m - 0.3).abs() < 1e-9);
        assert!((rates[0].victims_per_1m - 0.5).abs() < 1e-9);

        assert_eq!(rates[1].state, "Texas");
        assert_eq!(rates[1].dead, 10);
        assert_eq!(rates[1].incidents, 2);
        assert!((rates[1].deaths_per_1m - 10.0 / 30.0).abs() < 1e-9);
    }

    #[test]
    fn skips_states_without_population() {
        let mut records = texas_ohio();
        records.push(record((2021, 6, 1), Some("Puerto Rico"), 1, 3));
        let rates = rates_per_state(&records, &population());
        assert!(rates.iter().all(|r| r.state != "Puerto Rico"));
    }

    #[test]
    fn counts_by_month_in_calendar_order() {
        let months = shootings_by_month(&texas_ohio());
        assert_eq!(
            months,
            vec![
                MonthCount {
                    month_number: 1,
                    month: "January".to_string(),
                    shootings: 1,
                },
                MonthCount {
                    month_number: 8,
                    month: "August".to_string(),
                    shootings: 3,
                },
            ]
        );
    }

    #[test]
    fn counts_by_weekday_monday_first() {
        // 2019-08-03 Sat, 2019-08-31 Sat, 2019-08-04 Sun, 2020-01-01 Wed.
        let days = shootings_by_weekday(&texas_ohio());
        let names: Vec<_> = days.iter().map(|d| (d.weekday.as_str(), d.shootings)).collect();
        assert_eq!(names, vec![("Wednesday", 1), ("Saturday", 2), ("Sunday", 1)]);
    }

    #[test]
    fn summarizes_record_set() {
        let s = summary(&texas_ohio());
        assert_eq!(s.incidents, 4);
        assert_eq!(s.dead, 18);
        assert_eq!(s.total, 28);
        assert_eq!(s.injured, 10);
        assert_eq!(s.with_state, 3);
        assert_eq!(s.geocoded, 0);
        assert_eq!(s.first_date, NaiveDate::from_ymd_opt(2019, 8, 3));
        assert_eq!(s.last_date, NaiveDate::from_ymd_opt(2020, 1, 1));
    }

    #[test]
    fn empty_set_aggregates_to_nothing() {
        let empty = RecordSet::default();
        assert!(rates_per_state(&empty, &population()).is_empty());
        assert!(shootings_by_month(&empty).is_empty());
        assert!(shootings_by_weekday(&empty).is_empty());
        assert_eq!(summary(&empty), Summary::default());
    }
}
