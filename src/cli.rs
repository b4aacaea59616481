use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{self, CommandReport};

#[derive(Parser, Debug)]
#[command(name = "papershelf", version, about = "Ingest and rank a bibliographic shelf")]
struct Cli {
    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pull every paper from a source and upsert it into the shelf.
    Ingest {
        /// Export file (JSON array or JSON Lines) or http(s) URL.
        #[arg(long, env = "PAPERSHELF_SOURCE")]
        source: String,
        #[arg(long)]
        dry_run: bool,
    },
    /// Rank the shelf and print one page.
    Rank {
        /// search | time | random
        #[arg(long)]
        rank: Option<String>,
        /// Free-text query; a non-empty query always ranks by search.
        #[arg(long, short = 'q')]
        query: Option<String>,
        /// Only keep papers newer than this many days.
        #[arg(long)]
        time_filter: Option<String>,
        #[arg(long, short = 'p')]
        page_number: Option<String>,
    },
    /// Show one paper by id.
    Show { id: String },
    /// Corpus size, date range and recent arrivals.
    Stats,
    /// Paths, effective config and store health.
    Status,
    /// Rewrite both stores without shadowed lines.
    Compact,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!(
        "{}: {}",
        report.command,
        if report.ok { "ok" } else { "issues" }
    );
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  ! {issue}");
    }
    Ok(())
}

/// Returns whether the command finished without issues.
pub fn run() -> Result<bool> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Ingest { source, dry_run } => {
            commands::ingest::run(&commands::ingest::IngestOptions { source, dry_run })?
        }
        Command::Rank {
            rank,
            query,
            time_filter,
            page_number,
        } => {
            let page = commands::rank::run(&commands::rank::RankOptions {
                rank,
                query,
                time_filter,
                page_number,
            })?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print!("{}", commands::rank::render_text(&page));
            }
            return Ok(true);
        }
        Command::Show { id } => commands::show::run(&id)?,
        Command::Stats => commands::stats::run()?,
        Command::Status => commands::status::run()?,
        Command::Compact => commands::compact::run()?,
    };

    print_report(&report, cli.json)?;
    Ok(report.ok)
}
