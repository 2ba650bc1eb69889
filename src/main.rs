use anyhow::{Context, Result};
use clap::Parser;

use ohl_forecast::Forecaster;
use ohl_forecast::config::{self, ForecastArgs};
use ohl_forecast::report;

fn main() -> Result<()> {
    config::load_env();
    config::init_logging();
    let args = ForecastArgs::parse();

    let forecaster = Forecaster::load(&args.stats, &args.schedule, args.tie_policy)
        .context("failed to load season data")?
        .with_top_players(args.top_players);

    let games = forecaster.schedule().games_on(args.date);
    if games.is_empty() {
        println!("No games found for {}.", args.date);
        return Ok(());
    }

    let Some(index) = args.game else {
        println!("Games on {}:", args.date);
        for (idx, game) in games.iter().enumerate() {
            println!("{idx}: {} vs {}", game.home_team, game.away_team);
        }
        println!("\nRe-run with --game <index> to forecast one of them.");
        return Ok(());
    };

    let report = forecaster.forecast_game(args.date, index, &args.sim_config())?;
    print!("{}", report::render_text(&report));

    if !args.no_file {
        let path = report::write_text_report(&args.out_dir, &report)?;
        println!("\nResults written to {}", path.display());
    }
    if args.json {
        let path = report::write_json_report(&args.out_dir, &report)?;
        println!("JSON written to {}", path.display());
    }
    if args.xlsx {
        let path = report::export_xlsx(&args.out_dir, &report)?;
        println!("Workbook written to {}", path.display());
    }
    Ok(())
}
