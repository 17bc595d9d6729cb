use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::error::OverviewError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    Fat,
    SaturatedFat,
    Carbs,
    Sugar,
    AddedSugar,
    Salt,
    Fibre,
}

impl Nutrient {
    pub const ALL: [Nutrient; 9] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::SaturatedFat,
        Nutrient::Carbs,
        Nutrient::Sugar,
        Nutrient::AddedSugar,
        Nutrient::Salt,
        Nutrient::Fibre,
    ];

    pub const TARGETED: [Nutrient; 8] = [
        Nutrient::Calories,
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::SaturatedFat,
        Nutrient::Carbs,
        Nutrient::Sugar,
        Nutrient::Salt,
        Nutrient::Fibre,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Nutrient::Calories => "calories",
            Nutrient::Protein => "protein",
            Nutrient::Fat => "fat",
            Nutrient::SaturatedFat => "saturated_fat",
            Nutrient::Carbs => "carbs",
            Nutrient::Sugar => "sugar",
            Nutrient::AddedSugar => "added_sugar",
            Nutrient::Salt => "salt",
            Nutrient::Fibre => "fibre",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Nutrient::Calories => "kcal",
            _ => "g",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Nutrient {
    type Err = OverviewError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "calories" | "kcal" => Ok(Nutrient::Calories),
            "protein" => Ok(Nutrient::Protein),
            "fat" => Ok(Nutrient::Fat),
            "saturated_fat" | "saturated" => Ok(Nutrient::SaturatedFat),
            "carbs" | "carbohydrates" => Ok(Nutrient::Carbs),
            "sugar" => Ok(Nutrient::Sugar),
            "added_sugar" => Ok(Nutrient::AddedSugar),
            "salt" => Ok(Nutrient::Salt),
            "fibre" | "fiber" => Ok(Nutrient::Fibre),
            other => Err(OverviewError::UnknownNutrient(other.to_string())),
        }
    }
}

/// Macro values where `None` means "not recorded", never zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MacroBundle {
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub fat: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub carbs: Option<f64>,
    pub sugar: Option<f64>,
    pub added_sugar: Option<f64>,
    pub salt: Option<f64>,
    pub fibre: Option<f64>,
}

impl MacroBundle {
    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => self.calories,
            Nutrient::Protein => self.protein,
            Nutrient::Fat => self.fat,
            Nutrient::SaturatedFat => self.saturated_fat,
            Nutrient::Carbs => self.carbs,
            Nutrient::Sugar => self.sugar,
            Nutrient::AddedSugar => self.added_sugar,
            Nutrient::Salt => self.salt,
            Nutrient::Fibre => self.fibre,
        }
    }

    pub fn set(&mut self, nutrient: Nutrient, value: Option<f64>) {
        let slot = match nutrient {
            Nutrient::Calories => &mut self.calories,
            Nutrient::Protein => &mut self.protein,
            Nutrient::Fat => &mut self.fat,
            Nutrient::SaturatedFat => &mut self.saturated_fat,
            Nutrient::Carbs => &mut self.carbs,
            Nutrient::Sugar => &mut self.sugar,
            Nutrient::AddedSugar => &mut self.added_sugar,
            Nutrient::Salt => &mut self.salt,
            Nutrient::Fibre => &mut self.fibre,
        };
        *slot = value;
    }

    pub fn has_data(&self) -> bool {
        Nutrient::ALL.iter().any(|n| self.get(*n).is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionEntry {
    pub logged_at: DateTime<FixedOffset>,
    pub macros: MacroBundle,
    pub note: Option<String>,
}

impl NutritionEntry {
    pub fn local_date(&self) -> NaiveDate {
        self.logged_at.date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TravelDay {
    pub date: NaiveDate,
    pub entries: Vec<NutritionEntry>,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TravelDay {
    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeekBucket {
    week_start: NaiveDate,
    days: Vec<TravelDay>,
}

impl WeekBucket {
    pub(crate) fn close(week_start: NaiveDate, days: Vec<TravelDay>) -> Self {
        Self { week_start, days }
    }

    pub fn week_start(&self) -> NaiveDate {
        self.week_start
    }

    pub fn days(&self) -> &[TravelDay] {
        &self.days
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Target {
    pub enabled: bool,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Target {
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            enabled: true,
            min,
            max,
        }
    }

    pub fn is_bounded(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TargetsSet {
    pub calories: Target,
    pub protein: Target,
    pub fat: Target,
    pub saturated_fat: Target,
    pub carbs: Target,
    pub sugar: Target,
    pub salt: Target,
    pub fibre: Target,
}

impl TargetsSet {
    pub fn get(&self, nutrient: Nutrient) -> Option<&Target> {
        match nutrient {
            Nutrient::Calories => Some(&self.calories),
            Nutrient::Protein => Some(&self.protein),
            Nutrient::Fat => Some(&self.fat),
            Nutrient::SaturatedFat => Some(&self.saturated_fat),
            Nutrient::Carbs => Some(&self.carbs),
            Nutrient::Sugar => Some(&self.sugar),
            Nutrient::AddedSugar => None,
            Nutrient::Salt => Some(&self.salt),
            Nutrient::Fibre => Some(&self.fibre),
        }
    }

    pub fn get_mut(&mut self, nutrient: Nutrient) -> Option<&mut Target> {
        match nutrient {
            Nutrient::Calories => Some(&mut self.calories),
            Nutrient::Protein => Some(&mut self.protein),
            Nutrient::Fat => Some(&mut self.fat),
            Nutrient::SaturatedFat => Some(&mut self.saturated_fat),
            Nutrient::Carbs => Some(&mut self.carbs),
            Nutrient::Sugar => Some(&mut self.sugar),
            Nutrient::AddedSugar => None,
            Nutrient::Salt => Some(&mut self.salt),
            Nutrient::Fibre => Some(&mut self.fibre),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub totals: MacroBundle,
    pub duration: Duration,
}

impl DailyTotal {
    pub fn has_data(&self) -> bool {
        self.totals.has_data()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutrientScore {
    pub nutrient: Nutrient,
    pub score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AdherenceScore {
    pub scores: Vec<NutrientScore>,
    pub overall: f64,
}

impl AdherenceScore {
    pub fn get(&self, nutrient: Nutrient) -> Option<f64> {
        self.scores
            .iter()
            .find(|s| s.nutrient == nutrient)
            .map(|s| s.score)
    }

    pub fn percent(&self) -> i64 {
        (self.overall * 100.0).round() as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeIndicator {
    pub direction: Direction,
    pub label: String,
}

impl ChangeIndicator {
    pub fn neutral() -> Self {
        Self {
            direction: Direction::Neutral,
            label: String::new(),
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self.direction {
            Direction::Up => "▲",
            Direction::Down => "▼",
            Direction::Neutral => "=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientProgress {
    pub nutrient: Nutrient,
    pub value: Option<f64>,
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayOverview {
    pub date: NaiveDate,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub entry_count: usize,
    pub totals: MacroBundle,
    pub progress: Vec<NutrientProgress>,
    pub adherence: AdherenceScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientWeek {
    pub nutrient: Nutrient,
    pub average: Option<f64>,
    pub progress: Option<f64>,
    pub score: Option<f64>,
    pub change: ChangeIndicator,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekSummary {
    pub week_start: NaiveDate,
    pub day_count: usize,
    pub average: MacroBundle,
    pub nutrients: Vec<NutrientWeek>,
    pub adherence: AdherenceScore,
    pub adherence_percent: i64,
    pub adherence_change: ChangeIndicator,
}

impl WeekSummary {
    pub fn has_data(&self) -> bool {
        self.average.has_data()
    }
}
