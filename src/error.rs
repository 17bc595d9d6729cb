use thiserror::Error;

/// Errors raised while turning user input into domain values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum OverviewError {
    #[error("unknown nutrient: {0}")]
    UnknownNutrient(String),

    #[error("unknown weekday: {0}")]
    UnknownWeekday(String),

    #[error("UTC offset out of range: {0} seconds")]
    InvalidOffset(i32),

    #[error("nutrient {0} cannot have a target")]
    UntargetedNutrient(String),
}
