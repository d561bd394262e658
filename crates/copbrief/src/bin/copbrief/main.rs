//! USD/COP daily briefing CLI.
//!
//! Usage:
//! - `copbrief daily [--date today|YYYY-MM-DD] [--config PATH] [--skip-llm]`
//! - `copbrief relations [--prices PATH] [--output PATH]`
//! - `copbrief scrape --sources PATH [--keywords K ...] --out DIR`
//! - `copbrief send [--date ..] [--briefing-dir DIR] [--draft-only] [--dry-run]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use copbrief::primitives::Date;
use tracing_subscriber::EnvFilter;

mod commands;
mod daily;
mod settings;

use settings::DEFAULT_SETTINGS;

#[derive(Parser)]
#[command(name = "copbrief")]
#[command(about = "USD/COP daily briefing: prices, factor relations, news and newsletter")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the complete daily pipeline
    Daily(DailyArgs),

    /// Compute factor relations from a processed price file
    Relations(RelationsArgs),

    /// Scrape news sources and keep relevant articles
    Scrape(ScrapeArgs),

    /// Send a generated briefing through Buttondown
    Send(SendArgs),
}

#[derive(Debug, Args)]
struct DailyArgs {
    /// Date in YYYY-MM-DD format or 'today'
    #[arg(long, default_value = "today")]
    date: String,

    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS)]
    config: PathBuf,

    /// Write a placeholder instead of generating the briefing
    #[arg(long)]
    skip_llm: bool,
}

#[derive(Debug, Args)]
struct RelationsArgs {
    /// Processed price parquet
    #[arg(long, default_value = "data/processed/market_daily.parquet")]
    prices: PathBuf,

    /// CSV output; defaults to reports/relations/relations_<today>.csv
    #[arg(long)]
    output: Option<PathBuf>,

    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS)]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct ScrapeArgs {
    /// CSV with `source,url` rows
    #[arg(long)]
    sources: PathBuf,

    /// Link keywords, replacing the configured ones
    #[arg(long, num_args = 1..)]
    keywords: Vec<String>,

    /// Directory receiving articles.jsonl
    #[arg(long)]
    out: PathBuf,

    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS)]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct SendArgs {
    /// Date in YYYY-MM-DD format or 'today'
    #[arg(long, default_value = "today")]
    date: String,

    /// Directory holding briefing_<date>.md
    #[arg(long, default_value = "reports/briefings")]
    briefing_dir: PathBuf,

    /// Email subject; defaults to a dated subject
    #[arg(long)]
    subject: Option<String>,

    /// Newsletter override; defaults to BUTTONDOWN_NEWSLETTER
    #[arg(long)]
    newsletter: Option<String>,

    /// Create the draft without queueing it
    #[arg(long)]
    draft_only: bool,

    /// Print the payload without calling the API
    #[arg(long)]
    dry_run: bool,

    /// Settings file
    #[arg(long, default_value = DEFAULT_SETTINGS)]
    config: PathBuf,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json);

    if let Err(e) = run(cli.command).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "copbrief=info".into());
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Daily(args) => daily::run(args).await,
        Commands::Relations(args) => commands::relations(args),
        Commands::Scrape(args) => commands::scrape(args).await,
        Commands::Send(args) => commands::send(args).await,
    }
}

/// Parse `today` or an ISO date.
fn resolve_date(value: &str) -> Result<Date> {
    if value.eq_ignore_ascii_case("today") {
        return Ok(chrono::Local::now().date_naive());
    }
    Date::parse_from_str(value, "%Y-%m-%d").with_context(|| format!("invalid date '{value}'"))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("2024-07-01", Some((2024, 7, 1)))]
    #[case("2025-12-31", Some((2025, 12, 31)))]
    #[case("01/07/2024", None)]
    #[case("2024-02-30", None)]
    fn explicit_dates(#[case] value: &str, #[case] expected: Option<(i32, u32, u32)>) {
        let expected = expected.map(|(y, m, d)| Date::from_ymd_opt(y, m, d).unwrap());
        assert_eq!(resolve_date(value).ok(), expected);
    }

    #[test]
    fn today_is_local_date() {
        assert_eq!(resolve_date("today").unwrap(), chrono::Local::now().date_naive());
    }

    #[test]
    fn daily_defaults() {
        let cli = Cli::try_parse_from(["copbrief", "daily"]).unwrap();
        let Commands::Daily(args) = cli.command else { panic!("expected daily") };
        assert_eq!(args.date, "today");
        assert_eq!(args.config, PathBuf::from(DEFAULT_SETTINGS));
        assert!(!args.skip_llm);
        assert!(!cli.json);
    }

    #[test]
    fn scrape_takes_keyword_list() {
        let cli = Cli::try_parse_from([
            "copbrief", "--json", "scrape", "--sources", "s.csv", "--keywords", "peso", "dolar", "--out",
            "news",
        ])
        .unwrap();
        let Commands::Scrape(args) = cli.command else { panic!("expected scrape") };
        assert_eq!(args.keywords, vec!["peso", "dolar"]);
        assert_eq!(args.out, PathBuf::from("news"));
        assert!(cli.json);
    }

    #[test]
    fn scrape_requires_sources() {
        assert!(Cli::try_parse_from(["copbrief", "scrape", "--out", "news"]).is_err());
    }
}
