use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::adherence::{self, one_day};
use crate::days::group_travel_days;
use crate::models::{
    DayOverview, Nutrient, NutrientProgress, NutritionEntry, TargetsSet, TravelDay, WeekSummary,
};
use crate::totals::daily_total;
use crate::weeks::{close_weeks, summarize_weeks, WeekCalendar};

/// Everything the presentation layer needs, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Overview {
    pub days: Vec<DayOverview>,
    pub weeks: Vec<WeekSummary>,
    /// Dates of the week that has not finished yet.
    pub open_week: Vec<NaiveDate>,
}

pub fn day_overview(day: &TravelDay, targets: &TargetsSet) -> DayOverview {
    let total = daily_total(day);
    let progress = Nutrient::TARGETED
        .iter()
        .map(|nutrient| {
            let value = total.totals.get(*nutrient);
            NutrientProgress {
                nutrient: *nutrient,
                value,
                progress: targets
                    .get(*nutrient)
                    .and_then(|t| adherence::progress(value, t, one_day())),
            }
        })
        .collect();

    DayOverview {
        date: day.date,
        start: day.start,
        end: day.end,
        entry_count: day.entries.len(),
        adherence: adherence::score(&total.totals, targets, one_day()),
        totals: total.totals,
        progress,
    }
}

pub fn build_overview(
    entries: &[NutritionEntry],
    targets: &TargetsSet,
    calendar: &WeekCalendar,
) -> Overview {
    let travel_days = group_travel_days(entries);
    let scan = close_weeks(&travel_days, calendar);
    let weeks = summarize_weeks(&scan.closed, targets);
    debug!(
        entries = entries.len(),
        days = travel_days.len(),
        weeks = weeks.len(),
        open = scan.open.len(),
        "built overview"
    );

    Overview {
        days: travel_days
            .iter()
            .map(|day| day_overview(day, targets))
            .collect(),
        weeks,
        open_week: scan.open.iter().map(|day| day.date).collect(),
    }
}
