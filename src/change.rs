use crate::models::{ChangeIndicator, Direction};

/// Changes within this many percent either way count as noise.
const DEAD_ZONE_PERCENT: f64 = 2.0;

pub fn change_indicator(current: Option<f64>, previous: Option<f64>) -> ChangeIndicator {
    let (current, previous) = match (current, previous) {
        (Some(c), Some(p)) if c != 0.0 && p != 0.0 => (c, p),
        _ => return ChangeIndicator::neutral(),
    };

    let percent = (current - previous) / previous * 100.0;
    let direction = if percent > DEAD_ZONE_PERCENT {
        Direction::Up
    } else if percent < -DEAD_ZONE_PERCENT {
        Direction::Down
    } else {
        Direction::Neutral
    };

    ChangeIndicator {
        direction,
        label: format_percent(percent),
    }
}

fn format_percent(percent: f64) -> String {
    let rounded = percent.round() as i64;
    if rounded == 0 {
        "0%".to_string()
    } else {
        format!("{rounded:+}%")
    }
}
