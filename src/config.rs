use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::projection::DEFAULT_TOP_PLAYERS;
use crate::records::TiePolicy;
use crate::simulate::{DEFAULT_GOAL_SCALE, DEFAULT_TOP_SCORELINES, DEFAULT_TRIALS, SimConfig};
use crate::stats_fetch::{DEFAULT_FEED_KEY, DEFAULT_SEASON_ID, feed_url};

pub const DEFAULT_STATS_PATH: &str = "data/LeagueStats.csv";
pub const DEFAULT_SCHEDULE_PATH: &str = "data/Schedule.csv";

/// Forecast one scheduled game.
#[derive(Debug, Clone, Parser)]
#[command(name = "ohl_forecast", version)]
pub struct ForecastArgs {
    /// Cleaned player stats CSV.
    #[arg(long, env = "OHL_STATS_PATH", default_value = DEFAULT_STATS_PATH)]
    pub stats: PathBuf,

    /// Season schedule CSV (Date, HomeTeam, AwayTeam, HomeGoals, AwayGoals).
    #[arg(long, env = "OHL_SCHEDULE_PATH", default_value = DEFAULT_SCHEDULE_PATH)]
    pub schedule: PathBuf,

    /// Game date, YYYY-MM-DD.
    #[arg(long)]
    pub date: NaiveDate,

    /// Index into the games on `--date`. Omit to list them.
    #[arg(long)]
    pub game: Option<usize>,

    #[arg(long, env = "SIM_TRIALS", default_value_t = DEFAULT_TRIALS)]
    pub trials: usize,

    #[arg(long, env = "SIM_GOAL_SCALE", default_value_t = DEFAULT_GOAL_SCALE)]
    pub goal_scale: f64,

    #[arg(long, env = "SIM_SEED")]
    pub seed: Option<u64>,

    #[arg(long, default_value_t = DEFAULT_TOP_SCORELINES)]
    pub top_scorelines: usize,

    #[arg(long, default_value_t = DEFAULT_TOP_PLAYERS)]
    pub top_players: usize,

    /// How tied finals count toward records: credit-loss or exclude.
    #[arg(long, env = "TIE_POLICY", default_value_t = TiePolicy::CreditLoss)]
    pub tie_policy: TiePolicy,

    #[arg(long, env = "REPORT_DIR", default_value = ".")]
    pub out_dir: PathBuf,

    /// Print only; skip the text report file.
    #[arg(long)]
    pub no_file: bool,

    #[arg(long)]
    pub json: bool,

    #[arg(long)]
    pub xlsx: bool,
}

impl ForecastArgs {
    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            trials: self.trials,
            goal_scale: self.goal_scale,
            seed: self.seed,
            top_n: self.top_scorelines,
        }
    }
}

/// Pull the season's stats feed and write the cleaned table.
#[derive(Debug, Clone, Parser)]
#[command(name = "stats_ingest", version)]
pub struct IngestArgs {
    /// Full feed url; overrides --key/--season.
    #[arg(long, env = "OHL_FEED_URL")]
    pub url: Option<String>,

    #[arg(long, env = "OHL_FEED_KEY", default_value = DEFAULT_FEED_KEY)]
    pub key: String,

    #[arg(long, env = "OHL_SEASON_ID", default_value_t = DEFAULT_SEASON_ID)]
    pub season: u32,

    #[arg(long, env = "OHL_STATS_PATH", default_value = DEFAULT_STATS_PATH)]
    pub out: PathBuf,
}

impl IngestArgs {
    pub fn feed_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| feed_url(&self.key, self.season))
    }
}

/// `.env.local` wins over `.env`; neither is required.
pub fn load_env() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Logs go to stderr so stdout carries only the report.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_args_defaults() {
        let args = ForecastArgs::try_parse_from(["ohl_forecast", "--date", "2024-11-02"]).unwrap();
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 11, 2).unwrap());
        assert_eq!(args.game, None);
        assert_eq!(args.tie_policy, TiePolicy::CreditLoss);
        let sim = args.sim_config();
        assert_eq!(sim.top_n, 3);
        assert!(sim.goal_scale > 0.0);
    }

    #[test]
    fn forecast_args_overrides() {
        let args = ForecastArgs::try_parse_from([
            "ohl_forecast",
            "--date",
            "2024-11-02",
            "--game",
            "2",
            "--trials",
            "5000",
            "--goal-scale",
            "3.5",
            "--seed",
            "99",
            "--tie-policy",
            "exclude",
            "--xlsx",
        ])
        .unwrap();
        assert_eq!(args.game, Some(2));
        assert_eq!(args.tie_policy, TiePolicy::Exclude);
        assert!(args.xlsx);
        let sim = args.sim_config();
        assert_eq!(sim.trials, 5000);
        assert_eq!(sim.goal_scale, 3.5);
        assert_eq!(sim.seed, Some(99));
    }

    #[test]
    fn bad_date_is_rejected() {
        assert!(ForecastArgs::try_parse_from(["ohl_forecast", "--date", "11/02/2024"]).is_err());
    }

    #[test]
    fn ingest_url_prefers_explicit() {
        let args = IngestArgs::try_parse_from([
            "stats_ingest",
            "--url",
            "http://localhost/feed",
        ])
        .unwrap();
        assert_eq!(args.feed_url(), "http://localhost/feed");

        let args = IngestArgs::try_parse_from(["stats_ingest", "--season", "81"]).unwrap();
        assert!(args.feed_url().contains("season_id=81"));
    }
}
