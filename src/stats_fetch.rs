use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{info, warn};

use crate::http_client::fetch_text;
use crate::stats::{PlayerRecord, StatsTable, rank_score};

const HOCKEYTECH_FEED_BASE: &str = "https://lscluster.hockeytech.com/feed/";
pub const DEFAULT_FEED_KEY: &str = "2976319eb44abe94";
pub const DEFAULT_SEASON_ID: u32 = 79;

/// Top-scorer feed for every player in a season, unpaged.
pub fn feed_url(key: &str, season_id: u32) -> String {
    format!(
        "{HOCKEYTECH_FEED_BASE}?feed=modulekit&view=statviewtype&type=topscorers&key={key}\
         &fmt=json&client_code=ohl&lang=en&league_code=&season_id={season_id}\
         &first=0&limit=50000&sort=active&stat=all&order_direction="
    )
}

pub fn fetch_league_stats(url: &str) -> Result<StatsTable> {
    info!(url, "fetching league stats feed");
    let body = fetch_text(url).context("stats feed request failed")?;
    parse_stat_feed_json(&body)
}

/// Clean the raw feed into the skater table: active players only, goalies
/// dropped, numeric columns coerced, derived PPP / PPP% / RNK columns added.
pub fn parse_stat_feed_json(raw: &str) -> Result<StatsTable> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Err(anyhow!("empty stats feed response"));
    }
    let v: Value = serde_json::from_str(trimmed).context("invalid stats feed json")?;
    let arr = v
        .get("SiteKit")
        .and_then(|x| x.get("Statviewtype"))
        .and_then(|x| x.as_array())
        .ok_or_else(|| anyhow!("stats feed missing SiteKit.Statviewtype"))?;

    let mut rows = Vec::new();
    let mut coerced = 0usize;
    for item in arr {
        if num(item, "active") != Some(1.0) {
            continue;
        }
        let Some(row) = parse_player_row(item, &mut coerced) else {
            continue;
        };
        if row.is_goalie() {
            continue;
        }
        rows.push(row);
    }

    if coerced > 0 {
        warn!(coerced, "stats feed had unparsable numeric cells; treated as 0");
    }
    info!(players = rows.len(), feed_rows = arr.len(), "cleaned stats feed");
    Ok(StatsTable::from_rows(rows))
}

fn parse_player_row(v: &Value, coerced: &mut usize) -> Option<PlayerRecord> {
    let name = text(v, "name")?;
    let team = text(v, "team_name")?;
    let position = text(v, "position").unwrap_or_default();

    // Unparsable cells count as missing and are tallied for the warning.
    let mut stat = |key: &str| -> Option<f64> {
        let n = num(v, key);
        if n.is_none() && v.get(key).is_some_and(|x| !x.is_null()) {
            *coerced += 1;
        }
        n
    };

    let games_played = to_count(stat("games_played"));
    let goals = to_count(stat("goals"));
    let assists = to_count(stat("assists"));
    let points = to_count(stat("points"));
    let power_play_goals = to_count(stat("power_play_goals"));
    let power_play_assists = to_count(stat("power_play_assists"));
    let game_winning_goals = to_count(stat("game_winning_goals"));
    let empty_net_goals = to_count(stat("empty_net_goals"));
    let penalty_minutes = to_count(stat("penalty_minutes"));

    let plus_minus = stat("plus_minus").map(|n| n.round() as i32).unwrap_or(0);
    let points_per_game = stat("points_per_game");

    let power_play_points = power_play_goals + power_play_assists;
    let power_play_pct = if points > 0 {
        Some(round1(power_play_points as f64 / points as f64 * 100.0))
    } else {
        None
    };

    let rookie = num(v, "rookie").map(|n| if n == 1.0 { "YES" } else { "NO" }.to_string());

    Some(PlayerRecord {
        name,
        rookie,
        jersey_number: text(v, "jersey_number"),
        birthdate: text(v, "birthdate").and_then(|s| parse_birthdate(&s)),
        birth_year: text(v, "birthdate_year").and_then(|s| parse_birth_year(&s)),
        height: text(v, "height"),
        weight: text(v, "weight"),
        position,
        team,
        games_played,
        goals,
        assists,
        points,
        points_per_game,
        plus_minus,
        power_play_goals,
        power_play_assists,
        game_winning_goals,
        empty_net_goals,
        penalty_minutes,
        power_play_points,
        power_play_pct,
        rank: Some(rank_score(goals, assists, plus_minus, penalty_minutes)),
    })
}

fn to_count(n: Option<f64>) -> u32 {
    n.map(|n| n.max(0.0).round() as u32).unwrap_or(0)
}

fn text(v: &Value, key: &str) -> Option<String> {
    let s = match v.get(key)? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

/// The feed sends most numbers as strings; anything unparsable is missing.
fn num(v: &Value, key: &str) -> Option<f64> {
    match v.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn parse_birthdate(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw.trim(), "%B %d %Y")
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}

// "'05" -> 2005
fn parse_birth_year(raw: &str) -> Option<f64> {
    let yy = raw.split('\'').nth(1)?.trim().parse::<f64>().ok()?;
    Some(yy + 2000.0)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_year_uses_two_digit_suffix() {
        assert_eq!(parse_birth_year("'06"), Some(2006.0));
        assert_eq!(parse_birth_year("2006"), None);
    }

    #[test]
    fn birthdate_parses_long_month() {
        assert_eq!(
            parse_birthdate("March 4 2005").as_deref(),
            Some("2005-03-04")
        );
        assert!(parse_birthdate("n/a").is_none());
    }

    #[test]
    fn num_coerces_strings_and_rejects_garbage() {
        let v: Value = serde_json::json!({"a": "12", "b": 3, "c": "-", "d": null});
        assert_eq!(num(&v, "a"), Some(12.0));
        assert_eq!(num(&v, "b"), Some(3.0));
        assert_eq!(num(&v, "c"), None);
        assert_eq!(num(&v, "d"), None);
        assert_eq!(num(&v, "missing"), None);
    }

    #[test]
    fn unparsable_signed_and_rate_cells_are_tallied() {
        let v: Value = serde_json::json!({
            "name": "Owen Allard",
            "team_name": "Sault Ste. Marie Greyhounds",
            "position": "C",
            "goals": "3",
            "plus_minus": "-",
            "points_per_game": "n/a",
            "penalty_minutes": null
        });
        let mut coerced = 0;
        let row = parse_player_row(&v, &mut coerced).unwrap();
        assert_eq!(coerced, 2);
        assert_eq!(row.goals, 3);
        assert_eq!(row.plus_minus, 0);
        assert_eq!(row.points_per_game, None);
        assert_eq!(row.penalty_minutes, 0);
    }

    #[test]
    fn feed_url_carries_season() {
        let url = feed_url("k", 81);
        assert!(url.contains("season_id=81"));
        assert!(url.contains("key=k&"));
    }

    #[test]
    fn empty_body_is_an_error() {
        assert!(parse_stat_feed_json("  ").is_err());
        assert!(parse_stat_feed_json("{\"SiteKit\":{}}").is_err());
    }
}
