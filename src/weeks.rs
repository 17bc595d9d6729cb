use chrono::{Datelike, Days, NaiveDate, Weekday};
use tracing::debug;

use crate::adherence::{self, one_day};
use crate::change::change_indicator;
use crate::error::OverviewError;
use crate::models::{Nutrient, NutrientWeek, TargetsSet, TravelDay, WeekBucket, WeekSummary};
use crate::totals::{daily_total, weighted_average};

/// Week conventions and the reference date used to decide which weeks are over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalendar {
    pub first_day: Weekday,
    pub today: NaiveDate,
}

impl WeekCalendar {
    pub fn new(first_day: Weekday, today: NaiveDate) -> Self {
        Self { first_day, today }
    }

    pub fn last_day(&self) -> Weekday {
        self.first_day.pred()
    }

    pub fn week_start(&self, date: NaiveDate) -> NaiveDate {
        start_of_week(date, self.first_day)
    }
}

fn days_into_week(date: NaiveDate, first_day: Weekday) -> u64 {
    let offset = (7 + date.weekday().num_days_from_monday() - first_day.num_days_from_monday()) % 7;
    u64::from(offset)
}

pub fn start_of_week(date: NaiveDate, first_day: Weekday) -> NaiveDate {
    date - Days::new(days_into_week(date, first_day))
}

/// Start of the week containing `today - since_days`; `None` past the calendar's range.
pub fn window_start(today: NaiveDate, since_days: i64, first_day: Weekday) -> Option<NaiveDate> {
    let days = u64::try_from(since_days.max(1)).ok()?;
    let cutoff = today.checked_sub_days(Days::new(days))?;
    cutoff.checked_sub_days(Days::new(days_into_week(cutoff, first_day)))
}

pub fn parse_weekday(value: &str) -> Result<Weekday, OverviewError> {
    value
        .trim()
        .parse::<Weekday>()
        .map_err(|_| OverviewError::UnknownWeekday(value.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosingRule {
    /// Last weekday of the locale week, and that day is already over.
    TrailingPastWeek,
    /// The next logged day belongs to another week.
    WeekRollover,
    /// Data ends in a week that finished before the current one started.
    DanglingHistory,
}

pub fn closing_rule(
    day: &TravelDay,
    next: Option<&TravelDay>,
    calendar: &WeekCalendar,
) -> Option<ClosingRule> {
    if day.date.weekday() == calendar.last_day() && day.date < calendar.today {
        return Some(ClosingRule::TrailingPastWeek);
    }
    match next {
        Some(next) if calendar.week_start(next.date) != calendar.week_start(day.date) => {
            Some(ClosingRule::WeekRollover)
        }
        None if day.date < calendar.week_start(calendar.today) => {
            Some(ClosingRule::DanglingHistory)
        }
        _ => None,
    }
}

enum Step {
    Accumulate(Vec<TravelDay>),
    Close(WeekBucket),
}

fn step(
    mut buffer: Vec<TravelDay>,
    day: &TravelDay,
    next: Option<&TravelDay>,
    calendar: &WeekCalendar,
) -> Step {
    buffer.push(day.clone());
    match closing_rule(day, next, calendar) {
        Some(rule) => {
            let week_start = calendar.week_start(buffer[0].date);
            debug!(%week_start, days = buffer.len(), ?rule, "closing week");
            Step::Close(WeekBucket::close(week_start, buffer))
        }
        None => Step::Accumulate(buffer),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekScan {
    /// Finished weeks, oldest first.
    pub closed: Vec<WeekBucket>,
    /// Days of the week still in progress.
    pub open: Vec<TravelDay>,
}

/// Splits chronologically ordered travel days into finished weeks.
pub fn close_weeks(days: &[TravelDay], calendar: &WeekCalendar) -> WeekScan {
    days.iter()
        .enumerate()
        .fold(WeekScan::default(), |scan, (i, day)| {
            let WeekScan { mut closed, open } = scan;
            match step(open, day, days.get(i + 1), calendar) {
                Step::Accumulate(open) => WeekScan { closed, open },
                Step::Close(bucket) => {
                    closed.push(bucket);
                    WeekScan {
                        closed,
                        open: Vec::new(),
                    }
                }
            }
        })
}

pub fn summarize_week(
    bucket: &WeekBucket,
    targets: &TargetsSet,
    previous: Option<&WeekSummary>,
) -> WeekSummary {
    let totals: Vec<_> = bucket.days().iter().map(daily_total).collect();
    let average = weighted_average(&totals);
    let adherence = adherence::score(&average, targets, one_day());

    let nutrients = Nutrient::ALL
        .iter()
        .map(|nutrient| {
            let value = average.get(*nutrient);
            let target = targets.get(*nutrient);
            let previous_value = previous.and_then(|p| p.average.get(*nutrient));
            NutrientWeek {
                nutrient: *nutrient,
                average: value,
                progress: target.and_then(|t| adherence::progress(value, t, one_day())),
                score: adherence.get(*nutrient),
                change: change_indicator(value, previous_value),
            }
        })
        .collect();

    let adherence_change = change_indicator(
        Some(adherence.overall),
        previous.map(|p| p.adherence.overall),
    );

    WeekSummary {
        week_start: bucket.week_start(),
        day_count: bucket.days().len(),
        average,
        nutrients,
        adherence_percent: adherence.percent(),
        adherence,
        adherence_change,
    }
}

/// Summaries in the same order as the buckets, each compared with the one before.
pub fn summarize_weeks(buckets: &[WeekBucket], targets: &TargetsSet) -> Vec<WeekSummary> {
    buckets.iter().fold(Vec::new(), |mut summaries, bucket| {
        let summary = summarize_week(bucket, targets, summaries.last());
        summaries.push(summary);
        summaries
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::days::{group_travel_days, tests::entry};
    use crate::models::{Direction, Target};

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn days_on(dates: &[(u32, u32)]) -> Vec<TravelDay> {
        let entries: Vec<_> = dates
            .iter()
            .map(|(m, d)| entry(&format!("2026-{m:02}-{d:02}T12:00:00Z"), Some(2000.0)))
            .collect();
        group_travel_days(&entries)
    }

    fn starts(scan: &WeekScan) -> Vec<NaiveDate> {
        scan.closed.iter().map(|b| b.week_start()).collect()
    }

    #[test]
    fn week_start_respects_locale() {
        // 2026-02-04 is a Wednesday.
        assert_eq!(start_of_week(date(2, 4), Weekday::Mon), date(2, 2));
        assert_eq!(start_of_week(date(2, 4), Weekday::Sun), date(2, 1));
        assert_eq!(start_of_week(date(2, 1), Weekday::Sun), date(2, 1));
        assert_eq!(start_of_week(date(2, 1), Weekday::Mon), date(1, 26));
        assert_eq!(start_of_week(date(2, 4), Weekday::Sat), date(1, 31));
    }

    #[test]
    fn window_widens_back_to_week_start() {
        assert_eq!(window_start(date(2, 18), 14, Weekday::Mon), Some(date(2, 2)));
        assert_eq!(window_start(date(2, 18), 14, Weekday::Sun), Some(date(2, 1)));
        assert_eq!(window_start(date(2, 18), 0, Weekday::Mon), Some(date(2, 16)));
        assert_eq!(window_start(date(2, 18), -5, Weekday::Mon), Some(date(2, 16)));
    }

    #[test]
    fn window_beyond_calendar_range_is_none() {
        assert_eq!(window_start(date(2, 18), i64::MAX, Weekday::Mon), None);
        assert_eq!(window_start(NaiveDate::MIN, 1, Weekday::Mon), None);
    }

    #[test]
    fn weekday_names_parse() {
        assert_eq!(parse_weekday("sunday"), Ok(Weekday::Sun));
        assert_eq!(parse_weekday("Mon"), Ok(Weekday::Mon));
        assert_eq!(
            parse_weekday("someday"),
            Err(OverviewError::UnknownWeekday("someday".into()))
        );
    }

    #[test]
    fn no_days_no_weeks() {
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 18));
        assert_eq!(close_weeks(&[], &calendar), WeekScan::default());
    }

    #[test]
    fn past_weeks_close_and_current_week_stays_open() {
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 18));
        let days = days_on(&[(2, 2), (2, 3), (2, 8), (2, 9), (2, 10), (2, 16), (2, 17)]);
        let scan = close_weeks(&days, &calendar);

        assert_eq!(starts(&scan), vec![date(2, 2), date(2, 9)]);
        assert_eq!(scan.closed[0].days().len(), 3);
        assert_eq!(scan.closed[1].days().len(), 2);
        let open: Vec<_> = scan.open.iter().map(|d| d.date).collect();
        assert_eq!(open, vec![date(2, 16), date(2, 17)]);
    }

    #[test]
    fn rules_pick_the_right_reason() {
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 18));
        let days = days_on(&[(2, 8), (2, 10), (2, 11), (2, 17)]);
        assert_eq!(
            closing_rule(&days[0], Some(&days[1]), &calendar),
            Some(ClosingRule::TrailingPastWeek)
        );
        assert_eq!(closing_rule(&days[1], Some(&days[2]), &calendar), None);
        assert_eq!(
            closing_rule(&days[2], Some(&days[3]), &calendar),
            Some(ClosingRule::WeekRollover)
        );
        assert_eq!(
            closing_rule(&days[2], None, &calendar),
            Some(ClosingRule::DanglingHistory)
        );
        assert_eq!(closing_rule(&days[3], None, &calendar), None);
    }

    #[test]
    fn history_ending_mid_week_is_closed() {
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 18));
        let scan = close_weeks(&days_on(&[(2, 3), (2, 4)]), &calendar);
        assert_eq!(starts(&scan), vec![date(2, 2)]);
        assert!(scan.open.is_empty());
    }

    #[test]
    fn trailing_and_dangling_together_close_once() {
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 18));
        let scan = close_weeks(&days_on(&[(2, 8)]), &calendar);
        assert_eq!(scan.closed.len(), 1);
        assert!(scan.open.is_empty());
    }

    #[test]
    fn last_weekday_that_is_today_stays_open() {
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 22));
        let scan = close_weeks(&days_on(&[(2, 20), (2, 22)]), &calendar);
        assert!(scan.closed.is_empty());
        assert_eq!(scan.open.len(), 2);
    }

    #[test]
    fn sunday_first_locale_splits_differently() {
        let days = days_on(&[(2, 7), (2, 8)]);

        let sunday_first = WeekCalendar::new(Weekday::Sun, date(2, 18));
        let scan = close_weeks(&days, &sunday_first);
        assert_eq!(starts(&scan), vec![date(2, 1), date(2, 8)]);

        let monday_first = WeekCalendar::new(Weekday::Mon, date(2, 18));
        let scan = close_weeks(&days, &monday_first);
        assert_eq!(starts(&scan), vec![date(2, 2)]);
        assert_eq!(scan.closed[0].days().len(), 2);
    }

    #[test]
    fn rollover_across_new_year() {
        let next_year = |day: u32| NaiveDate::from_ymd_opt(2027, 1, day).unwrap();
        let calendar = WeekCalendar::new(Weekday::Mon, next_year(20));
        let days = group_travel_days(&[
            entry("2026-12-31T12:00:00Z", Some(1800.0)),
            entry("2027-01-01T12:00:00Z", Some(2100.0)),
            entry("2027-01-05T12:00:00Z", Some(1900.0)),
        ]);
        let scan = close_weeks(&days, &calendar);

        let weeks: Vec<_> = scan
            .closed
            .iter()
            .map(|b| (b.week_start(), b.days().len()))
            .collect();
        assert_eq!(
            weeks,
            vec![
                (date(12, 28), 2),
                (next_year(4), 1),
            ]
        );
        assert!(scan.open.is_empty());
    }

    fn calorie_targets() -> TargetsSet {
        TargetsSet {
            calories: Target::range(Some(2000.0), Some(2200.0)),
            ..TargetsSet::default()
        }
    }

    #[test]
    fn summaries_compare_with_previous_week() {
        let entries = vec![
            entry("2026-02-02T08:00:00+01:00", Some(1000.0)),
            entry("2026-02-02T20:00:00+01:00", Some(1000.0)),
            entry("2026-02-09T08:00:00+01:00", Some(1200.0)),
            entry("2026-02-09T20:00:00+01:00", Some(1300.0)),
        ];
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 18));
        let scan = close_weeks(&group_travel_days(&entries), &calendar);
        let summaries = summarize_weeks(&scan.closed, &calorie_targets());

        assert_eq!(summaries.len(), 2);
        let first = &summaries[0];
        assert_eq!(first.average.calories, Some(2000.0));
        assert_eq!(first.adherence_percent, 100);
        assert_eq!(first.adherence_change.direction, Direction::Neutral);
        assert!(first.adherence_change.label.is_empty());

        let second = &summaries[1];
        assert_eq!(second.week_start, date(2, 9));
        assert_eq!(second.average.calories, Some(2500.0));
        assert_eq!(second.adherence_percent, 86);
        assert_eq!(second.adherence_change.direction, Direction::Down);
        assert_eq!(second.adherence_change.label, "-14%");

        let calories = &second.nutrients[0];
        assert_eq!(calories.nutrient, Nutrient::Calories);
        assert_eq!(calories.change.direction, Direction::Up);
        assert_eq!(calories.change.label, "+25%");
        assert!((calories.progress.unwrap() - 2500.0 / 2200.0).abs() < 1e-9);
    }

    #[test]
    fn week_average_scores_against_daily_target() {
        let entries = vec![entry("2026-02-03T12:00:00Z", Some(1200.0))];
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 18));
        let scan = close_weeks(&group_travel_days(&entries), &calendar);
        let summary = summarize_week(&scan.closed[0], &calorie_targets(), None);
        let score = summary.adherence.get(Nutrient::Calories).unwrap();
        assert!((score - 0.6).abs() < 1e-9);
        assert_eq!(summary.adherence_percent, 60);
    }

    #[test]
    fn empty_days_do_not_dilute_the_week() {
        let entries = vec![
            entry("2026-02-03T12:00:00Z", Some(1800.0)),
            entry("2026-02-04T12:00:00Z", None),
        ];
        let calendar = WeekCalendar::new(Weekday::Mon, date(2, 18));
        let scan = close_weeks(&group_travel_days(&entries), &calendar);
        let summary = summarize_week(&scan.closed[0], &calorie_targets(), None);
        assert_eq!(summary.day_count, 2);
        assert_eq!(summary.average.calories, Some(1800.0));
        assert!(summary.has_data());
    }
}
