use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{DayOverview, Nutrient, WeekSummary};
use crate::overview::Overview;

fn format_amount(nutrient: Nutrient, value: Option<f64>) -> String {
    match (nutrient, value) {
        (_, None) => "-".to_string(),
        (Nutrient::Calories, Some(v)) => format!("{v:.0} kcal"),
        (Nutrient::Salt, Some(v)) => format!("{v:.2} g"),
        (n, Some(v)) => format!("{v:.1} {}", n.unit()),
    }
}

fn format_progress(progress: Option<f64>) -> String {
    progress
        .map(|p| format!(" ({:.0}% of target)", p * 100.0))
        .unwrap_or_default()
}

pub fn week_line(summary: &WeekSummary) -> String {
    let mut line = format!(
        "Week of {}: adherence {}% across {} days",
        summary.week_start, summary.adherence_percent, summary.day_count
    );
    if !summary.adherence_change.label.is_empty() {
        let _ = write!(
            line,
            " {} {}",
            summary.adherence_change.arrow(),
            summary.adherence_change.label
        );
    }
    line
}

pub fn day_line(day: &DayOverview) -> String {
    format!(
        "{}: {} over {} entries, adherence {}%",
        day.date,
        format_amount(Nutrient::Calories, day.totals.calories),
        day.entry_count,
        day.adherence.percent()
    )
}

/// Markdown report; weeks are listed newest first.
pub fn build_report(since: NaiveDate, overview: &Overview) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Nutrition Overview");
    let _ = writeln!(output, "Generated for entries since {}", since);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Summaries");

    if overview.weeks.iter().all(|w| !w.has_data()) {
        let _ = writeln!(output, "No finished weeks with nutrition data in this window.");
    } else {
        for summary in overview.weeks.iter().rev().filter(|w| w.has_data()) {
            let _ = writeln!(output);
            let _ = writeln!(output, "### {}", week_line(summary));
            for nutrient in &summary.nutrients {
                if nutrient.average.is_none() {
                    continue;
                }
                let mut line = format!(
                    "- {}: {}{}",
                    nutrient.nutrient,
                    format_amount(nutrient.nutrient, nutrient.average),
                    format_progress(nutrient.progress)
                );
                if let Some(score) = nutrient.score {
                    let _ = write!(line, ", score {:.2}", score);
                }
                if !nutrient.change.label.is_empty() {
                    let _ = write!(
                        line,
                        ", {} {}",
                        nutrient.change.arrow(),
                        nutrient.change.label
                    );
                }
                let _ = writeln!(output, "{}", line);
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Current Week");

    let current: Vec<&DayOverview> = overview
        .days
        .iter()
        .filter(|day| overview.open_week.contains(&day.date))
        .collect();

    if current.is_empty() {
        let _ = writeln!(output, "Nothing logged yet this week.");
    } else {
        for day in current.iter().rev() {
            let _ = writeln!(output, "- {}", day_line(day));
            for progress in day.progress.iter().filter(|p| p.value.is_some()) {
                let _ = writeln!(
                    output,
                    "  - {}: {}{}",
                    progress.nutrient,
                    format_amount(progress.nutrient, progress.value),
                    format_progress(progress.progress)
                );
            }
        }
    }

    output
}
