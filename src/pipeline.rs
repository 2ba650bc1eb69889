use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use anyhow::Result as AnyResult;
use chrono::NaiveDate;
use tracing::info;

use crate::aggregate::{TeamSummary, summarize_teams};
use crate::error::{ForecastError, Result};
use crate::projection::{DEFAULT_TOP_PLAYERS, project_top_players};
use crate::records::{TeamRecord, TiePolicy, compute_team_records};
use crate::report::GameReport;
use crate::schedule::Schedule;
use crate::simulate::{SimConfig, simulate};
use crate::stats::StatsTable;
use crate::strength::predict;

/// Loaded season inputs plus everything derived from them once up front.
#[derive(Debug, Clone)]
pub struct Forecaster {
    stats: StatsTable,
    schedule: Schedule,
    summaries: BTreeMap<String, TeamSummary>,
    records: HashMap<String, TeamRecord>,
    top_players: usize,
}

impl Forecaster {
    pub fn new(stats: StatsTable, schedule: Schedule, ties: TiePolicy) -> Self {
        let summaries = summarize_teams(&stats);
        let records = compute_team_records(schedule.games(), ties);
        info!(
            teams = summaries.len(),
            teams_with_record = records.len(),
            tie_policy = %ties,
            "forecaster ready"
        );
        Self {
            stats,
            schedule,
            summaries,
            records,
            top_players: DEFAULT_TOP_PLAYERS,
        }
    }

    pub fn load(stats_path: &Path, schedule_path: &Path, ties: TiePolicy) -> AnyResult<Self> {
        let stats = StatsTable::load_csv(stats_path)?;
        let schedule = Schedule::load_csv(schedule_path)?;
        Ok(Self::new(stats, schedule, ties))
    }

    pub fn with_top_players(mut self, n: usize) -> Self {
        self.top_players = n;
        self
    }

    pub fn stats(&self) -> &StatsTable {
        &self.stats
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn summaries(&self) -> &BTreeMap<String, TeamSummary> {
        &self.summaries
    }

    pub fn records(&self) -> &HashMap<String, TeamRecord> {
        &self.records
    }

    /// Predict, simulate and project one pairing. Both names are checked
    /// before any simulation runs.
    pub fn forecast_matchup(
        &self,
        home_team: &str,
        away_team: &str,
        date: Option<NaiveDate>,
        sim: &SimConfig,
    ) -> Result<GameReport> {
        for team in [home_team, away_team] {
            if !self.summaries.contains_key(team) {
                return Err(ForecastError::TeamNotFound(team.to_string()));
            }
        }

        let prediction = predict(home_team, away_team, &self.summaries, &self.records)?;
        let simulation = simulate(prediction.home_prob, prediction.away_prob, sim)?;
        info!(
            home = home_team,
            away = away_team,
            home_prob = prediction.home_prob,
            seed = simulation.seed,
            "matchup forecast"
        );

        Ok(GameReport {
            date,
            home_top_players: project_top_players(&self.stats, home_team, self.top_players),
            away_top_players: project_top_players(&self.stats, away_team, self.top_players),
            prediction,
            simulation,
        })
    }

    /// Forecast the `index`-th game scheduled on `date`.
    pub fn forecast_game(&self, date: NaiveDate, index: usize, sim: &SimConfig) -> Result<GameReport> {
        let game = self.schedule.select(date, index)?;
        self.forecast_matchup(&game.home_team, &game.away_team, Some(date), sim)
    }
}
