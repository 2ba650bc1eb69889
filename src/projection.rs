use serde::{Deserialize, Serialize};

use crate::stats::{PlayerRecord, StatsTable};

pub const DEFAULT_TOP_PLAYERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerProjection {
    pub name: String,
    pub position: String,
    /// Games played, with 0 replaced by 1.
    pub games_played: u32,
    pub goals: u32,
    pub assists: u32,
    pub points: u32,
    /// Per-game chance of a goal, percent with one decimal, capped at 100.
    pub goal_prob: f64,
    pub assist_prob: f64,
}

pub fn project_player(row: &PlayerRecord) -> PlayerProjection {
    let games_played = if row.games_played > 0 {
        row.games_played
    } else {
        1
    };
    PlayerProjection {
        name: row.name.clone(),
        position: row.position.clone(),
        games_played,
        goals: row.goals,
        assists: row.assists,
        points: row.points,
        goal_prob: per_game_pct(row.goals, games_played),
        assist_prob: per_game_pct(row.assists, games_played),
    }
}

/// Top `n` players of a team by points. Equal points keep table order.
pub fn project_top_players(table: &StatsTable, team: &str, n: usize) -> Vec<PlayerProjection> {
    let mut rows: Vec<&PlayerRecord> = table.team_rows(team).collect();
    rows.sort_by(|a, b| b.points.cmp(&a.points));
    rows.into_iter().take(n).map(project_player).collect()
}

fn per_game_pct(count: u32, games_played: u32) -> f64 {
    let rate = (count as f64 / games_played as f64).min(1.0);
    (rate * 100.0 * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, team: &str, gp: u32, g: u32, a: u32) -> PlayerRecord {
        PlayerRecord {
            name: name.to_string(),
            position: "C".to_string(),
            team: team.to_string(),
            games_played: gp,
            goals: g,
            assists: a,
            points: g + a,
            ..Default::default()
        }
    }

    #[test]
    fn zero_games_counts_as_one() {
        let p = project_player(&row("Z", "T", 0, 2, 0));
        assert_eq!(p.games_played, 1);
        assert_eq!(p.goal_prob, 100.0);
        assert_eq!(p.assist_prob, 0.0);
    }

    #[test]
    fn rates_round_to_one_decimal() {
        let p = project_player(&row("R", "T", 30, 10, 7));
        assert_eq!(p.goal_prob, 33.3);
        assert_eq!(p.assist_prob, 23.3);
    }

    #[test]
    fn top_players_sorted_by_points_stable_on_ties() {
        let table = StatsTable::from_rows(vec![
            row("first-8", "T", 10, 4, 4),
            row("other-team", "U", 10, 20, 20),
            row("top-12", "T", 10, 6, 6),
            row("second-8", "T", 10, 8, 0),
            row("low-1", "T", 10, 1, 0),
        ]);
        let names: Vec<_> = project_top_players(&table, "T", 3)
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["top-12", "first-8", "second-8"]);
    }

    #[test]
    fn unknown_team_projects_nobody() {
        let table = StatsTable::from_rows(vec![row("a", "T", 1, 1, 1)]);
        assert!(project_top_players(&table, "Nope", 3).is_empty());
    }
}
