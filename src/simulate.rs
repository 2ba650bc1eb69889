use std::cmp::Reverse;
use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ForecastError, Result};

pub const DEFAULT_TRIALS: usize = 100_000;
pub const DEFAULT_GOAL_SCALE: f64 = 5.0;
pub const DEFAULT_TOP_SCORELINES: usize = 3;

// Fixed chunking keeps a seeded run identical whatever the rayon pool size.
const CHUNK_TRIALS: usize = 8_192;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub trials: usize,
    /// Expected goals for a side with win probability 1.0.
    pub goal_scale: f64,
    pub seed: Option<u64>,
    pub top_n: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            goal_scale: DEFAULT_GOAL_SCALE,
            seed: None,
            top_n: DEFAULT_TOP_SCORELINES,
        }
    }
}

impl SimConfig {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    HomeWin,
    AwayWin,
    Draw,
}

pub fn classify_outcome(home_goals: u32, away_goals: u32) -> Outcome {
    if home_goals > away_goals {
        Outcome::HomeWin
    } else if away_goals > home_goals {
        Outcome::AwayWin
    } else {
        Outcome::Draw
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoreline {
    pub home_goals: u32,
    pub away_goals: u32,
    pub count: u64,
    pub probability_pct: f64,
}

impl Scoreline {
    /// (winning side, losing side); draws come back as-is.
    pub fn winner_first(&self) -> (u32, u32) {
        (
            self.home_goals.max(self.away_goals),
            self.home_goals.min(self.away_goals),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub trials: usize,
    pub seed: u64,
    pub goal_scale: f64,
    pub home_expected_goals: f64,
    pub away_expected_goals: f64,
    pub top_home_scorelines: Vec<Scoreline>,
    pub top_away_scorelines: Vec<Scoreline>,
    pub home_win_pct: f64,
    pub away_win_pct: f64,
    pub draw_pct: f64,
    pub home_shutout_pct: f64,
    pub away_shutout_pct: f64,
}

type Histogram = HashMap<(u32, u32), u64>;

/// Draw `trials` independent final scores with
/// `home ~ Poisson(home_prob * goal_scale)` and `away ~ Poisson(away_prob * goal_scale)`
/// and summarize them.
///
/// Top scorelines are ordered by count, then lower combined score, then lower
/// winning-side score, so equal counts always come out in the same order.
pub fn simulate(home_prob: f64, away_prob: f64, cfg: &SimConfig) -> Result<SimulationResult> {
    if cfg.trials == 0 {
        return Err(ForecastError::InvalidSimulation(
            "trial count must be positive".to_string(),
        ));
    }
    if !(cfg.goal_scale.is_finite() && cfg.goal_scale >= 0.0) {
        return Err(ForecastError::InvalidSimulation(format!(
            "goal scale {} must be finite and non-negative",
            cfg.goal_scale
        )));
    }
    for (side, p) in [("home", home_prob), ("away", away_prob)] {
        if !(p.is_finite() && p >= 0.0) {
            return Err(ForecastError::InvalidSimulation(format!(
                "{side} probability {p} must be finite and non-negative"
            )));
        }
    }

    let seed = cfg.seed.unwrap_or_else(rand::random::<u64>);
    let home_lambda = home_prob * cfg.goal_scale;
    let away_lambda = away_prob * cfg.goal_scale;
    let home = GoalSampler::new(home_lambda)?;
    let away = GoalSampler::new(away_lambda)?;

    let chunks = cfg.trials.div_ceil(CHUNK_TRIALS);
    let hist = (0..chunks)
        .into_par_iter()
        .map(|chunk| {
            let len = CHUNK_TRIALS.min(cfg.trials - chunk * CHUNK_TRIALS);
            let mut rng = StdRng::seed_from_u64(chunk_seed(seed, chunk as u64));
            let mut hist = Histogram::new();
            for _ in 0..len {
                let h = home.draw(&mut rng);
                let a = away.draw(&mut rng);
                *hist.entry((h, a)).or_insert(0) += 1;
            }
            hist
        })
        .reduce(Histogram::new, merge_histograms);

    debug!(
        trials = cfg.trials,
        seed,
        home_lambda,
        away_lambda,
        distinct_scores = hist.len(),
        "simulation finished"
    );

    Ok(summarize(&hist, cfg, seed, home_lambda, away_lambda))
}

fn summarize(
    hist: &Histogram,
    cfg: &SimConfig,
    seed: u64,
    home_expected_goals: f64,
    away_expected_goals: f64,
) -> SimulationResult {
    let mut home_wins = 0u64;
    let mut away_wins = 0u64;
    let mut draws = 0u64;
    let mut home_shutouts = 0u64;
    let mut away_shutouts = 0u64;

    for (&(h, a), &count) in hist {
        match classify_outcome(h, a) {
            Outcome::HomeWin => home_wins += count,
            Outcome::AwayWin => away_wins += count,
            Outcome::Draw => draws += count,
        }
        if a == 0 && h > 0 {
            home_shutouts += count;
        }
        if h == 0 && a > 0 {
            away_shutouts += count;
        }
    }

    let trials = cfg.trials;
    SimulationResult {
        trials,
        seed,
        goal_scale: cfg.goal_scale,
        home_expected_goals,
        away_expected_goals,
        top_home_scorelines: top_scorelines(hist, Outcome::HomeWin, cfg.top_n, trials),
        top_away_scorelines: top_scorelines(hist, Outcome::AwayWin, cfg.top_n, trials),
        home_win_pct: pct(home_wins, trials),
        away_win_pct: pct(away_wins, trials),
        draw_pct: pct(draws, trials),
        home_shutout_pct: pct(home_shutouts, trials),
        away_shutout_pct: pct(away_shutouts, trials),
    }
}

fn top_scorelines(hist: &Histogram, side: Outcome, n: usize, trials: usize) -> Vec<Scoreline> {
    let mut rows: Vec<Scoreline> = hist
        .iter()
        .filter(|&(&(h, a), _)| classify_outcome(h, a) == side)
        .map(|(&(h, a), &count)| Scoreline {
            home_goals: h,
            away_goals: a,
            count,
            probability_pct: pct(count, trials),
        })
        .collect();
    rows.sort_by_key(|s| {
        let (winner, _) = s.winner_first();
        (Reverse(s.count), s.home_goals + s.away_goals, winner)
    });
    rows.truncate(n);
    rows
}

fn merge_histograms(mut into: Histogram, from: Histogram) -> Histogram {
    if into.len() < from.len() {
        return merge_histograms(from, into);
    }
    for (key, count) in from {
        *into.entry(key).or_insert(0) += count;
    }
    into
}

fn chunk_seed(seed: u64, chunk: u64) -> u64 {
    seed ^ chunk.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn pct(count: u64, trials: usize) -> f64 {
    round2(count as f64 / trials as f64 * 100.0)
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Poisson goal draw; a zero rate always scores nothing.
struct GoalSampler(Option<Poisson<f64>>);

impl GoalSampler {
    fn new(lambda: f64) -> Result<Self> {
        if lambda <= 0.0 {
            return Ok(Self(None));
        }
        Poisson::new(lambda)
            .map(|dist| Self(Some(dist)))
            .map_err(|err| ForecastError::InvalidSimulation(format!("poisson({lambda}): {err}")))
    }

    fn draw(&self, rng: &mut StdRng) -> u32 {
        match &self.0 {
            Some(dist) => {
                let goals: f64 = dist.sample(rng);
                goals as u32
            }
            None => 0,
        }
    }
}
