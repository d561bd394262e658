//! Single-stage subcommands.

use std::{fs, time::Duration};

use anyhow::{Context, Result, bail};
use copbrief::{
    data::read_parquet,
    model::RelationsEngine,
    news::{KeywordConfig, NewsScraper, load_sources_csv},
    primitives::Date,
    report::{
        ButtondownClient, DEFAULT_TAGS, RelationsSnapshot, default_subject, discover_preheader,
        export_relations_csv, export_relations_json, newsletter_slug,
    },
    traits::Newsletter,
};
use serde_json::json;
use tracing::info;

use crate::{RelationsArgs, ScrapeArgs, SendArgs, resolve_date, settings::Settings};

pub(crate) fn relations(args: RelationsArgs) -> Result<()> {
    let settings = Settings::load_or_default(&args.config)?;
    let today = chrono::Local::now().date_naive();
    let output = args.output.unwrap_or_else(|| {
        settings.reports.relations_dir.join(format!("relations_{today}.csv"))
    });

    let prices = read_parquet(&args.prices)
        .with_context(|| format!("failed to read {}", args.prices.display()))?;
    let report = RelationsEngine::with_config(settings.relations).run(&prices)?;
    let rows = export_relations_csv(&output, &report.tables(), report.summary())?;
    export_relations_json(output.with_extension("json"), &RelationsSnapshot::from_report(today, &report))?;

    info!(rows, path = %output.display(), "relations metrics saved");
    for table in report.tables() {
        table.print_summary();
    }
    println!("{}", report.summary());
    Ok(())
}

pub(crate) async fn scrape(args: ScrapeArgs) -> Result<()> {
    let settings = Settings::load_or_default(&args.config)?;
    let keywords = if args.keywords.is_empty() {
        settings.news.keywords
    } else {
        KeywordConfig { link_keywords: args.keywords, ..settings.news.keywords }
    };
    let sources = load_sources_csv(&args.sources)
        .with_context(|| format!("failed to load {}", args.sources.display()))?;
    let scraper = NewsScraper::with_timeout(sources, keywords, Duration::from_secs(settings.news.timeout_secs))?
        .with_max_per_source(settings.news.max_per_source)
        .with_delay(Duration::from_millis(settings.news.delay_ms))
        .with_output_dir(&args.out);

    let articles = scraper.scrape().await?;
    info!(count = articles.len(), out = %args.out.display(), "articles saved");
    for article in &articles {
        println!("[{:>3}] {} ({})", article.relevance_score, article.headline(), article.url);
    }
    Ok(())
}

/// Run identifier from CI, if any.
fn run_id() -> Option<String> {
    ["GITHUB_RUN_ID", "GITHUB_RUN_NUMBER"]
        .into_iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Subject from the flag, the settings file or the dated default, in that order.
fn subject_for(date: Date, flag: Option<String>, configured: Option<String>) -> String {
    flag.or(configured).unwrap_or_else(|| default_subject(date))
}

pub(crate) async fn send(args: SendArgs) -> Result<()> {
    let settings = Settings::load_or_default(&args.config)?;
    let date = resolve_date(&args.date)?;
    let briefing_path = args.briefing_dir.join(format!("briefing_{date}.md"));
    if !briefing_path.exists() {
        bail!("briefing not found: {}", briefing_path.display());
    }
    let body = fs::read_to_string(&briefing_path)
        .with_context(|| format!("failed to read {}", briefing_path.display()))?;

    let subject = subject_for(date, args.subject, settings.newsletter.subject);
    let newsletter = args
        .newsletter
        .or_else(|| env_var("BUTTONDOWN_NEWSLETTER"))
        .or(settings.newsletter.newsletter);
    let run_id = run_id();

    if args.dry_run {
        let preview = json!({
            "newsletter": newsletter,
            "subject": subject,
            "slug": newsletter_slug(date, run_id.as_deref()),
            "preheader": discover_preheader(&body),
            "tags": DEFAULT_TAGS,
        });
        println!("DRY RUN -- would send newsletter with payload:");
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    let Some(api_key) = env_var("BUTTONDOWN_API_KEY") else {
        bail!("BUTTONDOWN_API_KEY environment variable is required");
    };
    let base_url = env_var("BUTTONDOWN_API_BASE");
    let mut client = ButtondownClient::try_new(&api_key, base_url.as_deref())?.with_run_id(run_id);
    if let Some(newsletter) = newsletter {
        client = client.with_newsletter(newsletter);
    }

    let issue = Newsletter { subject, body, draft_only: args.draft_only };
    let email = client.create_email(&client.draft_for(&issue, date)).await?;
    info!(id = %email.id, "draft created");
    if issue.draft_only {
        return Ok(());
    }
    let queued = client.queue_email(&email.id).await?;
    let status = queued.get("status").and_then(|s| s.as_str()).unwrap_or("unknown");
    info!(id = %email.id, status, "newsletter queued for delivery");
    Ok(())
}
