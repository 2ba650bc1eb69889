use anyhow::{Context, Result};
use clap::Parser;

use ohl_forecast::config::{self, IngestArgs};
use ohl_forecast::stats_fetch;

fn main() -> Result<()> {
    config::load_env();
    config::init_logging();
    let args = IngestArgs::parse();

    let url = args.feed_url();
    let table = stats_fetch::fetch_league_stats(&url)?;
    table
        .write_csv(&args.out)
        .with_context(|| format!("unable to save stats to {}", args.out.display()))?;

    println!("Stats ingest complete");
    println!("Players: {}", table.len());
    println!("Teams: {}", table.teams().len());
    println!("Saved: {}", args.out.display());
    Ok(())
}
