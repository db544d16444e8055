use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GradeError {
    #[error("graded item {item_id}: score must be a finite non-negative number, got {score}")]
    InvalidScore { item_id: i64, score: f64 },

    #[error("graded item {item_id}: max score must be a finite positive number, got {max_score}")]
    InvalidMaxScore { item_id: i64, max_score: f64 },

    #[error("category '{category}': weight must be within [0, 1], got {weight}")]
    InvalidWeight { category: String, weight: f64 },

    #[error("percentage must be finite, got {0}")]
    InvalidPercentage(f64),

    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    #[error("month {month} of {year} is not a calendar month")]
    InvalidMonth { year: i32, month: u32 },

    #[error("invalid date format '{0}'")]
    InvalidFormat(String),
}

pub type Result<T> = std::result::Result<T, GradeError>;
