use chrono::Duration;

use crate::models::{DailyTotal, MacroBundle, Nutrient, TravelDay};

/// A nutrient that no entry recorded stays `None` for the day.
pub fn daily_total(day: &TravelDay) -> DailyTotal {
    let mut totals = MacroBundle::default();
    for nutrient in Nutrient::ALL {
        let sum = day
            .entries
            .iter()
            .filter_map(|entry| entry.macros.get(nutrient))
            .fold(None, |acc: Option<f64>, value| Some(acc.unwrap_or(0.0) + value));
        totals.set(nutrient, sum);
    }

    DailyTotal {
        date: day.date,
        totals,
        duration: day.duration(),
    }
}

pub fn day_weight(duration: Duration) -> f64 {
    duration.num_hours().max(1) as f64
}

/// Days without any data drop out of every numerator and denominator.
pub fn weighted_average(days: &[DailyTotal]) -> MacroBundle {
    let mut average = MacroBundle::default();
    for nutrient in Nutrient::ALL {
        let (weighted_sum, total_weight) = days
            .iter()
            .filter(|day| day.has_data())
            .filter_map(|day| {
                day.totals
                    .get(nutrient)
                    .map(|value| (value, day_weight(day.duration)))
            })
            .fold((0.0, 0.0), |(sum, weights), (value, weight)| {
                (sum + value * weight, weights + weight)
            });

        if total_weight > 0.0 {
            average.set(nutrient, Some(weighted_sum / total_weight));
        }
    }
    average
}
