use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::stats::StatsTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub team_id: String,
    pub players: usize,
    pub total_goals: u32,
    pub total_assists: u32,
    pub total_points: u32,
    pub avg_points_per_game: f64,
    pub total_power_play_goals: u32,
    pub total_power_play_assists: u32,
    pub total_penalty_minutes: u32,
    pub avg_rank: f64,
}

#[derive(Default)]
struct Accum {
    players: usize,
    goals: u32,
    assists: u32,
    points: u32,
    points_per_game: f64,
    points_per_game_rows: usize,
    power_play_goals: u32,
    power_play_assists: u32,
    penalty_minutes: u32,
    rank: f64,
}

/// One summary per team: counting columns summed, points-per-game and rank
/// averaged over the team's skaters.
///
/// Missing points-per-game cells are left out of that mean; a team with none
/// reports 0.
pub fn summarize_teams(table: &StatsTable) -> BTreeMap<String, TeamSummary> {
    let mut acc: BTreeMap<&str, Accum> = BTreeMap::new();
    for row in table.rows() {
        let a = acc.entry(row.team.as_str()).or_default();
        a.players += 1;
        a.goals += row.goals;
        a.assists += row.assists;
        a.points += row.points;
        if let Some(ppg) = row.points_per_game {
            a.points_per_game += ppg;
            a.points_per_game_rows += 1;
        }
        a.power_play_goals += row.power_play_goals;
        a.power_play_assists += row.power_play_assists;
        a.penalty_minutes += row.penalty_minutes;
        a.rank += row.rank();
    }

    acc.into_iter()
        .map(|(team, a)| {
            let n = a.players as f64;
            let summary = TeamSummary {
                team_id: team.to_string(),
                players: a.players,
                total_goals: a.goals,
                total_assists: a.assists,
                total_points: a.points,
                avg_points_per_game: if a.points_per_game_rows > 0 {
                    a.points_per_game / a.points_per_game_rows as f64
                } else {
                    0.0
                },
                total_power_play_goals: a.power_play_goals,
                total_power_play_assists: a.power_play_assists,
                total_penalty_minutes: a.penalty_minutes,
                avg_rank: a.rank / n,
            };
            (team.to_string(), summary)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::PlayerRecord;

    fn skater(team: &str, g: u32, a: u32, pm: i32, pim: u32) -> PlayerRecord {
        PlayerRecord {
            name: format!("{team}-{g}-{a}"),
            position: "C".to_string(),
            team: team.to_string(),
            games_played: 10,
            goals: g,
            assists: a,
            points: g + a,
            points_per_game: Some((g + a) as f64 / 10.0),
            plus_minus: pm,
            penalty_minutes: pim,
            ..Default::default()
        }
    }

    #[test]
    fn two_player_team_totals_and_mean_rank() {
        let table = StatsTable::from_rows(vec![skater("X", 10, 5, 2, 4), skater("X", 3, 7, -1, 2)]);
        let summaries = summarize_teams(&table);
        let x = &summaries["X"];
        assert_eq!(x.total_goals, 13);
        assert_eq!(x.total_assists, 12);
        assert_eq!(x.total_points, 25);
        assert_eq!(x.total_penalty_minutes, 6);
        assert_eq!(x.players, 2);
        // (25.5 + 13.5) / 2
        assert!((x.avg_rank - 19.5).abs() < 1e-12);
        assert!((x.avg_points_per_game - 1.25).abs() < 1e-12);
    }

    #[test]
    fn single_player_team_mirrors_the_row() {
        let row = skater("Solo", 7, 2, 0, 0);
        let table = StatsTable::from_rows(vec![row.clone(), skater("Other", 1, 1, 1, 1)]);
        let summaries = summarize_teams(&table);
        assert_eq!(summaries.len(), 2);
        let solo = &summaries["Solo"];
        assert_eq!(solo.total_goals, row.goals);
        assert_eq!(solo.avg_rank, row.rank());
        assert_eq!(Some(solo.avg_points_per_game), row.points_per_game);
    }

    #[test]
    fn blank_points_per_game_is_left_out_of_the_mean() {
        let blank = PlayerRecord {
            points_per_game: None,
            ..skater("X", 0, 0, 0, 0)
        };
        let table = StatsTable::from_rows(vec![skater("X", 6, 4, 0, 0), blank]);
        let x = &summarize_teams(&table)["X"];
        assert_eq!(x.players, 2);
        assert!((x.avg_points_per_game - 1.0).abs() < 1e-12);

        let none = StatsTable::from_rows(vec![PlayerRecord {
            points_per_game: None,
            ..skater("Y", 1, 1, 0, 0)
        }]);
        assert_eq!(summarize_teams(&none)["Y"].avg_points_per_game, 0.0);
    }

    #[test]
    fn empty_table_has_no_summaries() {
        assert!(summarize_teams(&StatsTable::default()).is_empty());
    }
}
