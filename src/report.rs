use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::projection::PlayerProjection;
use crate::simulate::{Scoreline, SimulationResult};
use crate::strength::MatchupPrediction;

/// Everything needed to present one forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameReport {
    pub date: Option<NaiveDate>,
    pub prediction: MatchupPrediction,
    pub simulation: SimulationResult,
    pub home_top_players: Vec<PlayerProjection>,
    pub away_top_players: Vec<PlayerProjection>,
}

pub fn render_text(report: &GameReport) -> String {
    let p = &report.prediction;
    let sim = &report.simulation;
    let mut out = String::new();

    let _ = writeln!(
        out,
        "Game Prediction Report: {} vs {}",
        p.home_team, p.away_team
    );
    if let Some(date) = report.date {
        let _ = writeln!(out, "Date: {date}");
    }
    match p.winner() {
        Some(winner) => {
            let _ = writeln!(out, "Prediction: {winner} is more likely to win.");
        }
        None => {
            let _ = writeln!(out, "Prediction: toss-up, neither side is favored.");
        }
    }
    let _ = writeln!(
        out,
        "Odds: {}: {}, {}: {}",
        p.home_team, p.home_odds, p.away_team, p.away_odds
    );
    let _ = writeln!(
        out,
        "Win probability: {}: {:.1}%, {}: {:.1}%",
        p.home_team,
        p.home_prob * 100.0,
        p.away_team,
        p.away_prob * 100.0
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Most Likely Scenarios for Home Team Winning:");
    write_scorelines(&mut out, &sim.top_home_scorelines);
    let _ = writeln!(out);

    let _ = writeln!(out, "Most Likely Scenarios for Away Team Winning:");
    write_scorelines(&mut out, &sim.top_away_scorelines);
    let _ = writeln!(out);

    let _ = writeln!(out, "Shutout Probabilities:");
    let _ = writeln!(
        out,
        "  {} shuts out {}: {:.2}%",
        p.home_team, p.away_team, sim.home_shutout_pct
    );
    let _ = writeln!(
        out,
        "  {} shuts out {}: {:.2}%",
        p.away_team, p.home_team, sim.away_shutout_pct
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "Top Players for {}:", p.home_team);
    write_player_table(&mut out, &report.home_top_players);
    let _ = writeln!(out);

    let _ = writeln!(out, "Top Players for {}:", p.away_team);
    write_player_table(&mut out, &report.away_top_players);

    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "({} simulations, seed {}, goal scale {})",
        sim.trials, sim.seed, sim.goal_scale
    );
    out
}

// Winner's goals first, as a bettor reads a scoreline.
fn write_scorelines(out: &mut String, rows: &[Scoreline]) {
    if rows.is_empty() {
        let _ = writeln!(out, "  (none simulated)");
        return;
    }
    for row in rows {
        let (w, l) = row.winner_first();
        let _ = writeln!(
            out,
            "  {w} - {l}: {:.2}% ({} simulations)",
            row.probability_pct, row.count
        );
    }
}

const PLAYER_HEADERS: [&str; 7] = ["Name", "Pos", "GP", "G", "A", "GoalProb", "AssistProb"];

fn player_cells(p: &PlayerProjection) -> [String; 7] {
    [
        p.name.clone(),
        p.position.clone(),
        p.games_played.to_string(),
        p.goals.to_string(),
        p.assists.to_string(),
        format!("{:.1}", p.goal_prob),
        format!("{:.1}", p.assist_prob),
    ]
}

fn write_player_table(out: &mut String, players: &[PlayerProjection]) {
    let rows: Vec<[String; 7]> = players.iter().map(player_cells).collect();
    let mut widths = PLAYER_HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row.iter()) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let header: Vec<String> = PLAYER_HEADERS
        .iter()
        .zip(widths.iter())
        .enumerate()
        .map(|(idx, (h, w))| pad(h, *w, idx < 2))
        .collect();
    let _ = writeln!(out, "{}", header.join(" ").trim_end());

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .zip(widths.iter())
            .enumerate()
            .map(|(idx, (cell, w))| pad(cell, *w, idx < 2))
            .collect();
        let _ = writeln!(out, "{}", cells.join(" ").trim_end());
    }
}

fn pad(cell: &str, width: usize, left: bool) -> String {
    if left {
        format!("{cell:<width$}")
    } else {
        format!("{cell:>width$}")
    }
}

/// `{home}_vs_{away}_Report_{date}.txt`
pub fn report_file_stem(report: &GameReport) -> String {
    let date = report
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "undated".to_string());
    format!(
        "{}_vs_{}_Report_{}",
        file_safe(&report.prediction.home_team),
        file_safe(&report.prediction.away_team),
        date
    )
}

fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '-' } else { c })
        .collect()
}

pub fn write_text_report(dir: &Path, report: &GameReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(format!("{}.txt", report_file_stem(report)));
    fs::write(&path, render_text(report))
        .with_context(|| format!("failed writing report to {}", path.display()))?;
    info!(path = %path.display(), "wrote text report");
    Ok(path)
}

pub fn write_json_report(dir: &Path, report: &GameReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(format!("{}.json", report_file_stem(report)));
    let json = serde_json::to_string_pretty(report).context("serialize report")?;
    fs::write(&path, json).with_context(|| format!("failed writing report to {}", path.display()))?;
    info!(path = %path.display(), "wrote json report");
    Ok(path)
}

pub fn export_xlsx(dir: &Path, report: &GameReport) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(format!("{}.xlsx", report_file_stem(report)));
    let p = &report.prediction;
    let sim = &report.simulation;

    let summary_rows = vec![
        vec!["Field".to_string(), "Value".to_string()],
        vec!["Home".to_string(), p.home_team.clone()],
        vec!["Away".to_string(), p.away_team.clone()],
        vec![
            "Date".to_string(),
            report.date.map(|d| d.to_string()).unwrap_or_default(),
        ],
        vec![
            "Winner".to_string(),
            p.winner().unwrap_or("toss-up").to_string(),
        ],
        vec!["Home Strength".to_string(), format!("{:.2}", p.home_strength)],
        vec!["Away Strength".to_string(), format!("{:.2}", p.away_strength)],
        vec!["Home Win Prob".to_string(), format!("{:.4}", p.home_prob)],
        vec!["Away Win Prob".to_string(), format!("{:.4}", p.away_prob)],
        vec!["Home Odds".to_string(), p.home_odds.to_string()],
        vec!["Away Odds".to_string(), p.away_odds.to_string()],
        vec!["Sim Home Win %".to_string(), format!("{:.2}", sim.home_win_pct)],
        vec!["Sim Away Win %".to_string(), format!("{:.2}", sim.away_win_pct)],
        vec!["Sim Draw %".to_string(), format!("{:.2}", sim.draw_pct)],
        vec![
            "Home Shutout %".to_string(),
            format!("{:.2}", sim.home_shutout_pct),
        ],
        vec![
            "Away Shutout %".to_string(),
            format!("{:.2}", sim.away_shutout_pct),
        ],
        vec!["Trials".to_string(), sim.trials.to_string()],
        vec!["Seed".to_string(), sim.seed.to_string()],
    ];

    let mut scoreline_rows = vec![vec![
        "Side".to_string(),
        "Home Goals".to_string(),
        "Away Goals".to_string(),
        "Count".to_string(),
        "Probability %".to_string(),
    ]];
    for (side, rows) in [
        ("Home", &sim.top_home_scorelines),
        ("Away", &sim.top_away_scorelines),
    ] {
        for s in rows {
            scoreline_rows.push(vec![
                side.to_string(),
                s.home_goals.to_string(),
                s.away_goals.to_string(),
                s.count.to_string(),
                format!("{:.2}", s.probability_pct),
            ]);
        }
    }

    let mut player_rows = vec![
        std::iter::once("Team")
            .chain(PLAYER_HEADERS)
            .map(str::to_string)
            .collect::<Vec<_>>(),
    ];
    for (team, players) in [
        (&p.home_team, &report.home_top_players),
        (&p.away_team, &report.away_top_players),
    ] {
        for player in players {
            let mut row = vec![team.clone()];
            row.extend(player_cells(player));
            player_rows.push(row);
        }
    }

    let mut workbook = Workbook::new();
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Summary")?;
        write_rows(sheet, &summary_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Scorelines")?;
        write_rows(sheet, &scoreline_rows)?;
    }
    {
        let sheet = workbook.add_worksheet();
        sheet.set_name("Players")?;
        write_rows(sheet, &player_rows)?;
    }

    workbook
        .save(&path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    info!(path = %path.display(), "wrote xlsx report");
    Ok(path)
}

fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<String>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, value) in row.iter().enumerate() {
            worksheet
                .write_string(row_idx as u32, col_idx as u16, value)
                .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
