use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ForecastError {
    #[error("team not found: {0}")]
    TeamNotFound(String),

    #[error("no games found for {0}")]
    NoGamesOnDate(NaiveDate),

    #[error("game index {index} out of range ({available} games on {date})")]
    GameIndexOutOfRange {
        date: NaiveDate,
        index: usize,
        available: usize,
    },

    #[error("strength total {total} for {home} vs {away} cannot produce probabilities")]
    DegenerateStrength {
        home: String,
        away: String,
        total: f64,
    },

    #[error("invalid simulation input: {0}")]
    InvalidSimulation(String),
}

pub type Result<T> = std::result::Result<T, ForecastError>;
