use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schedule::ScheduledGame;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub wins: u32,
    pub losses: u32,
    pub total_games: u32,
}

impl TeamRecord {
    /// Stand-in for a team with no completed games. `total_games` is 1 so the
    /// win ratio is a plain 0.0.
    pub const UNPLAYED: TeamRecord = TeamRecord {
        wins: 0,
        losses: 0,
        total_games: 1,
    };

    pub fn win_ratio(&self) -> f64 {
        if self.total_games == 0 {
            return 0.0;
        }
        self.wins as f64 / self.total_games as f64
    }

    fn empty() -> Self {
        Self {
            wins: 0,
            losses: 0,
            total_games: 0,
        }
    }

    fn credit_win(&mut self) {
        self.wins += 1;
        self.total_games += 1;
    }

    fn credit_loss(&mut self) {
        self.losses += 1;
        self.total_games += 1;
    }
}

/// How a level final score is booked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TiePolicy {
    /// Neither side outscored the other, so both are charged a loss.
    #[default]
    CreditLoss,
    /// Tied games do not count toward either record.
    Exclude,
}

impl FromStr for TiePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "credit-loss" | "loss" => Ok(TiePolicy::CreditLoss),
            "exclude" | "skip" => Ok(TiePolicy::Exclude),
            other => Err(format!(
                "unknown tie policy '{other}' (expected credit-loss or exclude)"
            )),
        }
    }
}

impl fmt::Display for TiePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiePolicy::CreditLoss => f.write_str("credit-loss"),
            TiePolicy::Exclude => f.write_str("exclude"),
        }
    }
}

/// Fold completed games into per-team records, in input order. Games without
/// a final score are skipped.
pub fn compute_team_records<'a, I>(games: I, ties: TiePolicy) -> HashMap<String, TeamRecord>
where
    I: IntoIterator<Item = &'a ScheduledGame>,
{
    let mut records: HashMap<String, TeamRecord> = HashMap::new();
    for game in games {
        let Some((home_goals, away_goals)) = game.final_score() else {
            continue;
        };
        if home_goals == away_goals && ties == TiePolicy::Exclude {
            continue;
        }

        for (team, goals_for, goals_against) in [
            (&game.home_team, home_goals, away_goals),
            (&game.away_team, away_goals, home_goals),
        ] {
            let record = records
                .entry(team.clone())
                .or_insert_with(TeamRecord::empty);
            if goals_for > goals_against {
                record.credit_win();
            } else {
                record.credit_loss();
            }
        }
    }
    records
}

/// Record for a team, falling back to [`TeamRecord::UNPLAYED`].
pub fn record_for(records: &HashMap<String, TeamRecord>, team: &str) -> TeamRecord {
    records.get(team).copied().unwrap_or(TeamRecord::UNPLAYED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn game(home: &str, away: &str, score: Option<(u32, u32)>) -> ScheduledGame {
        ScheduledGame {
            date: NaiveDate::from_ymd_opt(2024, 10, 1).unwrap(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals: score.map(|s| s.0),
            away_goals: score.map(|s| s.1),
        }
    }

    #[test]
    fn strict_winner_gets_the_win() {
        let games = vec![game("H", "A", Some((4, 1))), game("A", "H", Some((2, 3)))];
        let records = compute_team_records(&games, TiePolicy::default());
        assert_eq!(
            records["H"],
            TeamRecord {
                wins: 2,
                losses: 0,
                total_games: 2
            }
        );
        assert_eq!(
            records["A"],
            TeamRecord {
                wins: 0,
                losses: 2,
                total_games: 2
            }
        );
    }

    #[test]
    fn tie_policies() {
        let games = vec![game("H", "A", Some((2, 2)))];

        let loss = compute_team_records(&games, TiePolicy::CreditLoss);
        assert_eq!(loss["H"].losses, 1);
        assert_eq!(loss["A"].losses, 1);
        assert_eq!(loss["H"].wins + loss["H"].losses, loss["H"].total_games);

        let excluded = compute_team_records(&games, TiePolicy::Exclude);
        assert!(excluded.is_empty());
        assert_eq!(record_for(&excluded, "H"), TeamRecord::UNPLAYED);
    }

    #[test]
    fn unplayed_games_are_skipped() {
        let games = vec![game("H", "A", None), game("H", "B", Some((1, 0)))];
        let records = compute_team_records(&games, TiePolicy::CreditLoss);
        assert_eq!(records["H"].total_games, 1);
        assert!(!records.contains_key("A"));
        assert_eq!(record_for(&records, "A").win_ratio(), 0.0);
    }

    #[test]
    fn tie_policy_parses() {
        assert_eq!("exclude".parse::<TiePolicy>(), Ok(TiePolicy::Exclude));
        assert_eq!("Credit-Loss".parse::<TiePolicy>(), Ok(TiePolicy::CreditLoss));
        assert!("coin-flip".parse::<TiePolicy>().is_err());
        assert_eq!(TiePolicy::Exclude.to_string(), "exclude");
    }
}
