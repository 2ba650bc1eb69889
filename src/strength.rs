use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::aggregate::TeamSummary;
use crate::error::{ForecastError, Result};
use crate::records::{TeamRecord, record_for};

const RANK_WEIGHT: f64 = 10.0;
const WIN_RATIO_WEIGHT: f64 = 100.0;
// Keeps exact decimal ratios (0.6 / 0.4 = 1.5) from flooring one unit low.
const ODDS_FLOOR_EPS: f64 = 1e-9;

/// Signed American moneyline. Negative is the favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AmericanOdds(pub i64);

impl AmericanOdds {
    pub const EVEN: AmericanOdds = AmericanOdds(100);

    /// Odds for the side expected to win with probability `p` (> 0.5).
    pub fn favorite(p: f64) -> Self {
        AmericanOdds(-floor_tolerant(100.0 / p))
    }

    /// Odds for the side expected to win with probability `p` (< 0.5).
    pub fn underdog(p: f64) -> Self {
        AmericanOdds(floor_tolerant(100.0 * (1.0 - p) / p))
    }

    pub fn is_favorite(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for AmericanOdds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Favorite {
    Home,
    Away,
    /// Exactly equal probabilities.
    PickEm,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupPrediction {
    pub home_team: String,
    pub away_team: String,
    pub home_strength: f64,
    pub away_strength: f64,
    pub favorite: Favorite,
    pub home_prob: f64,
    pub away_prob: f64,
    pub home_odds: AmericanOdds,
    pub away_odds: AmericanOdds,
}

impl MatchupPrediction {
    pub fn winner(&self) -> Option<&str> {
        match self.favorite {
            Favorite::Home => Some(self.home_team.as_str()),
            Favorite::Away => Some(self.away_team.as_str()),
            Favorite::PickEm => None,
        }
    }
}

/// total points + 10 × average rank + 100 × win ratio
pub fn team_strength(summary: &TeamSummary, record: &TeamRecord) -> f64 {
    summary.total_points as f64
        + summary.avg_rank * RANK_WEIGHT
        + record.win_ratio() * WIN_RATIO_WEIGHT
}

pub fn predict(
    home_team: &str,
    away_team: &str,
    summaries: &BTreeMap<String, TeamSummary>,
    records: &HashMap<String, TeamRecord>,
) -> Result<MatchupPrediction> {
    let home = summaries
        .get(home_team)
        .ok_or_else(|| ForecastError::TeamNotFound(home_team.to_string()))?;
    let away = summaries
        .get(away_team)
        .ok_or_else(|| ForecastError::TeamNotFound(away_team.to_string()))?;

    let home_strength = team_strength(home, &record_for(records, home_team));
    let away_strength = team_strength(away, &record_for(records, away_team));
    debug!(home_team, away_team, home_strength, away_strength, "team strengths");

    predict_from_strengths(home_team, away_team, home_strength, away_strength)
}

/// Probabilities and odds for a pair of already-computed strengths.
pub fn predict_from_strengths(
    home_team: &str,
    away_team: &str,
    home_strength: f64,
    away_strength: f64,
) -> Result<MatchupPrediction> {
    let total = home_strength + away_strength;
    if !(home_strength > 0.0 && away_strength > 0.0 && total.is_finite()) {
        return Err(ForecastError::DegenerateStrength {
            home: home_team.to_string(),
            away: away_team.to_string(),
            total,
        });
    }

    let home_prob = home_strength / total;
    let away_prob = 1.0 - home_prob;
    let (favorite, home_odds, away_odds) = price(home_prob, away_prob);

    Ok(MatchupPrediction {
        home_team: home_team.to_string(),
        away_team: away_team.to_string(),
        home_strength,
        away_strength,
        favorite,
        home_prob,
        away_prob,
        home_odds,
        away_odds,
    })
}

fn price(home_prob: f64, away_prob: f64) -> (Favorite, AmericanOdds, AmericanOdds) {
    if home_prob > away_prob {
        (
            Favorite::Home,
            AmericanOdds::favorite(home_prob),
            AmericanOdds::underdog(away_prob),
        )
    } else if away_prob > home_prob {
        (
            Favorite::Away,
            AmericanOdds::underdog(home_prob),
            AmericanOdds::favorite(away_prob),
        )
    } else {
        (Favorite::PickEm, AmericanOdds::EVEN, AmericanOdds::EVEN)
    }
}

fn floor_tolerant(v: f64) -> i64 {
    (v + ODDS_FLOOR_EPS).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(team: &str, total_points: u32, avg_rank: f64) -> TeamSummary {
        TeamSummary {
            team_id: team.to_string(),
            players: 1,
            total_goals: 0,
            total_assists: 0,
            total_points,
            avg_points_per_game: 0.0,
            total_power_play_goals: 0,
            total_power_play_assists: 0,
            total_penalty_minutes: 0,
            avg_rank,
        }
    }

    #[test]
    fn strengths_150_vs_100() {
        let p = predict_from_strengths("H", "A", 150.0, 100.0).unwrap();
        assert!((p.home_prob - 0.6).abs() < 1e-12);
        assert!((p.away_prob - 0.4).abs() < 1e-12);
        assert_eq!(p.home_odds, AmericanOdds(-166));
        assert_eq!(p.away_odds, AmericanOdds(150));
        assert_eq!(p.home_odds.to_string(), "-166");
        assert_eq!(p.away_odds.to_string(), "+150");
        assert_eq!(p.winner(), Some("H"));
    }

    #[test]
    fn away_favorite_gets_negative_line() {
        let p = predict_from_strengths("H", "A", 100.0, 300.0).unwrap();
        assert_eq!(p.favorite, Favorite::Away);
        assert_eq!(p.away_odds, AmericanOdds(-133));
        assert_eq!(p.home_odds, AmericanOdds(300));
        assert_eq!(p.winner(), Some("A"));
    }

    #[test]
    fn exact_tie_is_pick_em_at_even_money() {
        let p = predict_from_strengths("H", "A", 120.0, 120.0).unwrap();
        assert_eq!(p.favorite, Favorite::PickEm);
        assert_eq!(p.winner(), None);
        assert_eq!(p.home_odds, AmericanOdds::EVEN);
        assert_eq!(p.away_odds.to_string(), "+100");
    }

    #[test]
    fn probabilities_sum_to_one_and_one_side_is_favored() {
        for (h, a) in [(1.0, 7.0), (33.3, 12.1), (999.0, 998.5), (0.5, 1e6)] {
            let p = predict_from_strengths("H", "A", h, a).unwrap();
            assert!((p.home_prob + p.away_prob - 1.0).abs() < 1e-12);
            assert!(p.home_odds.is_favorite() ^ p.away_odds.is_favorite());
        }
    }

    #[test]
    fn non_positive_strength_is_rejected() {
        let err = predict_from_strengths("H", "A", -10.0, 5.0).unwrap_err();
        assert!(matches!(err, ForecastError::DegenerateStrength { .. }));
        assert!(predict_from_strengths("H", "A", 0.0, 5.0).is_err());
    }

    #[test]
    fn predict_uses_records_and_defaults() {
        let mut summaries = BTreeMap::new();
        summaries.insert("H".to_string(), summary("H", 100, 2.0));
        summaries.insert("A".to_string(), summary("A", 100, 2.0));
        let mut records = HashMap::new();
        records.insert(
            "H".to_string(),
            TeamRecord {
                wins: 1,
                losses: 1,
                total_games: 2,
            },
        );

        let p = predict("H", "A", &summaries, &records).unwrap();
        // H: 100 + 20 + 50, A has no record: 100 + 20 + 0
        assert_eq!(p.home_strength, 170.0);
        assert_eq!(p.away_strength, 120.0);
        assert_eq!(p.favorite, Favorite::Home);
    }

    #[test]
    fn unknown_team_is_not_found() {
        let summaries = BTreeMap::new();
        let err = predict("Nowhere", "A", &summaries, &HashMap::new()).unwrap_err();
        assert_eq!(err, ForecastError::TeamNotFound("Nowhere".to_string()));
    }
}
