use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use crate::error::ForecastError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledGame {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "HomeTeam")]
    pub home_team: String,
    #[serde(rename = "AwayTeam")]
    pub away_team: String,
    #[serde(rename = "HomeGoals", default, deserialize_with = "de_goals")]
    pub home_goals: Option<u32>,
    #[serde(rename = "AwayGoals", default, deserialize_with = "de_goals")]
    pub away_goals: Option<u32>,
}

impl ScheduledGame {
    /// Final score when both sides have one recorded.
    pub fn final_score(&self) -> Option<(u32, u32)> {
        match (self.home_goals, self.away_goals) {
            (Some(h), Some(a)) => Some((h, a)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    games: Vec<ScheduledGame>,
}

impl Schedule {
    pub fn from_games(games: Vec<ScheduledGame>) -> Self {
        Self { games }
    }

    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open schedule csv: {}", path.display()))?;

        let mut games = Vec::new();
        for (idx, record) in reader.deserialize::<ScheduledGame>().enumerate() {
            games.push(record.with_context(|| format!("schedule csv line {}", idx + 2))?);
        }
        let played = games.iter().filter(|g| g.final_score().is_some()).count();
        info!(games = games.len(), played, path = %path.display(), "loaded schedule");
        Ok(Self { games })
    }

    pub fn games(&self) -> &[ScheduledGame] {
        &self.games
    }

    /// Games on a date, in file order.
    pub fn games_on(&self, date: NaiveDate) -> Vec<&ScheduledGame> {
        self.games.iter().filter(|g| g.date == date).collect()
    }

    pub fn select(&self, date: NaiveDate, index: usize) -> Result<&ScheduledGame, ForecastError> {
        let games = self.games_on(date);
        if games.is_empty() {
            return Err(ForecastError::NoGamesOnDate(date));
        }
        games
            .get(index)
            .copied()
            .ok_or(ForecastError::GameIndexOutOfRange {
                date,
                index,
                available: games.len(),
            })
    }
}

// Exports sometimes write goals as floats ("3.0") once a column has blanks.
fn de_goals<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| v.round() as u32))
}
