use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

/// One cleaned season line for an active skater.
///
/// Column names follow the league's short headers so the CSV written by the
/// ingest step loads back without a mapping table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Rookie", default)]
    pub rookie: Option<String>,
    #[serde(rename = "JN", default)]
    pub jersey_number: Option<String>,
    #[serde(rename = "BD", default)]
    pub birthdate: Option<String>,
    #[serde(rename = "BD_Y", default)]
    pub birth_year: Option<f64>,
    #[serde(rename = "Hgt", default)]
    pub height: Option<String>,
    #[serde(rename = "Wgt", default)]
    pub weight: Option<String>,
    #[serde(rename = "Pos")]
    pub position: String,
    #[serde(rename = "Team")]
    pub team: String,
    #[serde(rename = "GP", deserialize_with = "de_count")]
    pub games_played: u32,
    #[serde(rename = "G", deserialize_with = "de_count")]
    pub goals: u32,
    #[serde(rename = "A", deserialize_with = "de_count")]
    pub assists: u32,
    #[serde(rename = "PTS", deserialize_with = "de_count")]
    pub points: u32,
    /// Absent when the cell is blank or unparsable.
    #[serde(rename = "Pts/G", default, deserialize_with = "de_opt_float")]
    pub points_per_game: Option<f64>,
    #[serde(rename = "+/-", deserialize_with = "de_signed")]
    pub plus_minus: i32,
    #[serde(rename = "PPG", default, deserialize_with = "de_count")]
    pub power_play_goals: u32,
    #[serde(rename = "PPA", default, deserialize_with = "de_count")]
    pub power_play_assists: u32,
    #[serde(rename = "GWG", default, deserialize_with = "de_count")]
    pub game_winning_goals: u32,
    #[serde(rename = "ENG", default, deserialize_with = "de_count")]
    pub empty_net_goals: u32,
    #[serde(rename = "PIM", deserialize_with = "de_count")]
    pub penalty_minutes: u32,
    #[serde(rename = "PPP", default, deserialize_with = "de_count")]
    pub power_play_points: u32,
    #[serde(rename = "PPP_Percentage", default)]
    pub power_play_pct: Option<f64>,
    #[serde(rename = "RNK", default)]
    pub rank: Option<f64>,
}

impl PlayerRecord {
    /// Stored RNK when the table carried one, otherwise computed from the line.
    pub fn rank(&self) -> f64 {
        self.rank.unwrap_or_else(|| {
            rank_score(
                self.goals,
                self.assists,
                self.plus_minus,
                self.penalty_minutes,
            )
        })
    }

    pub fn is_goalie(&self) -> bool {
        self.position.trim().eq_ignore_ascii_case("G")
    }
}

/// RNK = 2·G + 1.5·A + (+/-) − PIM
pub fn rank_score(goals: u32, assists: u32, plus_minus: i32, penalty_minutes: u32) -> f64 {
    2.0 * goals as f64 + 1.5 * assists as f64 + plus_minus as f64 - penalty_minutes as f64
}

#[derive(Debug, Clone, Default)]
pub struct StatsTable {
    rows: Vec<PlayerRecord>,
}

impl StatsTable {
    pub fn from_rows(rows: Vec<PlayerRecord>) -> Self {
        Self { rows }
    }

    pub fn load_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("failed to open stats csv: {}", path.display()))?;

        let mut rows = Vec::new();
        let mut goalies = 0usize;
        for (idx, record) in reader.deserialize::<PlayerRecord>().enumerate() {
            // Header is line 1.
            let row = record.with_context(|| format!("stats csv line {}", idx + 2))?;
            if row.is_goalie() {
                goalies += 1;
                continue;
            }
            rows.push(row);
        }
        if goalies > 0 {
            debug!(goalies, "dropped goalie rows from stats table");
        }
        info!(players = rows.len(), path = %path.display(), "loaded stats table");
        Ok(Self { rows })
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create {}", parent.display()))?;
            }
        }
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("failed to create stats csv: {}", path.display()))?;
        for row in &self.rows {
            writer.serialize(row).context("write stats row")?;
        }
        writer.flush().context("flush stats csv")?;
        Ok(())
    }

    pub fn rows(&self) -> &[PlayerRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows for one team, in table order.
    pub fn team_rows<'a>(&'a self, team: &'a str) -> impl Iterator<Item = &'a PlayerRecord> + 'a {
        self.rows.iter().filter(move |row| row.team == team)
    }

    pub fn teams(&self) -> BTreeSet<&str> {
        self.rows.iter().map(|row| row.team.as_str()).collect()
    }
}

fn de_count<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite())
        .map(|v| v.max(0.0).round() as u32)
        .unwrap_or(0))
}

fn de_signed<'de, D>(deserializer: D) -> std::result::Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value
        .filter(|v| v.is_finite())
        .map(|v| v.round() as i32)
        .unwrap_or(0))
}

fn de_opt_float<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite()))
}
