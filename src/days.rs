use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::models::{NutritionEntry, TravelDay};

/// Buckets entries by the calendar date of their own UTC offset.
///
/// A travel day can therefore span more or less than 24 hours of real time
/// when the user crosses time zones. Dates in the output strictly increase
/// and every entry lands in exactly one day.
pub fn group_travel_days(entries: &[NutritionEntry]) -> Vec<TravelDay> {
    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|entry| entry.logged_at);

    let mut by_date: BTreeMap<NaiveDate, Vec<NutritionEntry>> = BTreeMap::new();
    for entry in sorted {
        by_date.entry(entry.local_date()).or_default().push(entry);
    }

    by_date
        .into_iter()
        .filter_map(|(date, entries)| {
            let start = entries.first()?.logged_at;
            let end = entries.last()?.logged_at;
            Some(TravelDay {
                date,
                entries,
                start,
                end,
            })
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::MacroBundle;
    use chrono::{DateTime, FixedOffset};
    use proptest::prelude::*;

    pub(crate) fn entry(logged_at: &str, calories: Option<f64>) -> NutritionEntry {
        NutritionEntry {
            logged_at: DateTime::parse_from_rfc3339(logged_at).unwrap(),
            macros: MacroBundle {
                calories,
                ..MacroBundle::default()
            },
            note: None,
        }
    }

    #[test]
    fn empty_input_yields_no_days() {
        assert!(group_travel_days(&[]).is_empty());
    }

    #[test]
    fn same_day_entries_share_one_travel_day() {
        let entries = vec![
            entry("2026-02-03T20:00:00+01:00", Some(700.0)),
            entry("2026-02-03T08:00:00+01:00", Some(500.0)),
        ];
        let days = group_travel_days(&entries);
        assert_eq!(days.len(), 1);
        let day = &days[0];
        assert_eq!(day.date, NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert_eq!(day.start.to_rfc3339(), "2026-02-03T08:00:00+01:00");
        assert_eq!(day.end.to_rfc3339(), "2026-02-03T20:00:00+01:00");
        let total: f64 = day.entries.iter().filter_map(|e| e.macros.calories).sum();
        assert_eq!(total, 1200.0);
    }

    #[test]
    fn single_entry_day_has_zero_duration() {
        let days = group_travel_days(&[entry("2026-02-03T12:00:00Z", None)]);
        assert_eq!(days[0].start, days[0].end);
        assert_eq!(days[0].duration().num_seconds(), 0);
    }

    #[test]
    fn date_follows_each_entry_own_offset() {
        // Berlin late evening and Tokyo breakfast are 1.5 real hours apart
        // but fall on different local dates.
        let entries = vec![
            entry("2026-02-03T23:30:00+01:00", Some(300.0)),
            entry("2026-02-04T09:00:00+09:00", Some(400.0)),
        ];
        let days = group_travel_days(&entries);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 2, 3).unwrap());
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2026, 2, 4).unwrap());
    }

    #[test]
    fn westward_flight_stretches_a_day_past_24_hours() {
        let entries = vec![
            entry("2026-02-03T07:00:00+01:00", Some(300.0)),
            entry("2026-02-03T22:00:00-08:00", Some(600.0)),
        ];
        let days = group_travel_days(&entries);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].duration().num_hours(), 24);
    }

    #[test]
    fn interleaved_local_dates_stay_in_one_bucket() {
        // Tokyo just after midnight, then back across the date line to the
        // evening before in Honolulu.
        let entries = vec![
            entry("2026-02-03T22:00:00+09:00", Some(100.0)),
            entry("2026-02-04T00:30:00+09:00", Some(200.0)),
            entry("2026-02-03T18:00:00-10:00", Some(300.0)),
        ];
        let days = group_travel_days(&entries);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].entries.len(), 2);
        assert!(days[0].start <= days[0].end);
    }

    fn arb_entry() -> impl Strategy<Value = NutritionEntry> {
        (0i64..60 * 24 * 60, -12i32..=14, proptest::option::of(0u32..2000)).prop_map(
            |(minutes, hours, kcal)| {
                let offset = FixedOffset::east_opt(hours * 3600).unwrap();
                let base = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap();
                NutritionEntry {
                    logged_at: (base + chrono::Duration::minutes(minutes)).with_timezone(&offset),
                    macros: MacroBundle {
                        calories: kcal.map(f64::from),
                        ..MacroBundle::default()
                    },
                    note: None,
                }
            },
        )
    }

    proptest! {
        #[test]
        fn grouping_partitions_entries(entries in proptest::collection::vec(arb_entry(), 0..60)) {
            let days = group_travel_days(&entries);
            let grouped: usize = days.iter().map(|d| d.entries.len()).sum();
            prop_assert_eq!(grouped, entries.len());

            for pair in days.windows(2) {
                prop_assert!(pair[0].date < pair[1].date);
            }
            for day in &days {
                prop_assert!(day.start <= day.end);
                for window in day.entries.windows(2) {
                    prop_assert!(window[0].logged_at <= window[1].logged_at);
                }
                for e in &day.entries {
                    prop_assert_eq!(e.local_date(), day.date);
                }
            }
        }
    }
}
