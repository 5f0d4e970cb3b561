use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use vel_storage::{load_snapshot, open_store, PgFactStore};
use vel_sync::{maybe_build_scheduler, IngestionJobs, IngestionPipeline, SyncConfig, TargetRegistry};
use vel_web::{AppState, WebConfig};

mod logging;

#[derive(Debug, Parser)]
#[command(name = "vel")]
#[command(about = "Velocity grounded competitive intelligence")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the JSON API (and the scrape scheduler when enabled).
    Serve,
    /// Run one ingestion in the foreground; no targets means the registry defaults.
    Scrape { targets: Vec<String> },
    /// Apply the PostgreSQL migrations.
    Migrate,
    /// Print SWOT findings and the strategic headline.
    Report {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    logging::init_logging(logging::LogFormat::from_env());

    let cli = Cli::parse();
    let config = SyncConfig::from_env();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let store = open_store(config.database_url.as_deref()).await?;
            let registry = TargetRegistry::load(&config.targets_file).await?;
            let pipeline = IngestionPipeline::from_config(&config, store.clone())?;
            let jobs = IngestionJobs::new(Arc::new(pipeline), Arc::new(registry));
            let scheduler = maybe_build_scheduler(&config, jobs.clone()).await?;
            if let Some(sched) = &scheduler {
                sched.start().await.context("starting scheduler")?;
            }
            vel_web::serve(&WebConfig::from_env(), AppState::new(store, jobs)).await?;
        }
        Commands::Scrape { targets } => {
            let store = open_store(config.database_url.as_deref()).await?;
            let registry = TargetRegistry::load(&config.targets_file).await?;
            let resolved = registry.resolve_all(&targets)?;
            tracing::info!(targets = resolved.len(), "running foreground ingestion");
            let pipeline = IngestionPipeline::from_config(&config, store)?;
            let summary = pipeline.run(&resolved).await?;
            println!(
                "scrape complete: run_id={} items={} created={} matched={} prices={} sentiments={} errors={}",
                summary.run_id,
                summary.items_scraped,
                summary.products_created,
                summary.products_matched,
                summary.prices_added,
                summary.sentiments_added,
                summary.errors.len()
            );
            for error in &summary.errors {
                eprintln!("  {error}");
            }
        }
        Commands::Migrate => {
            let Some(url) = config.database_url.as_deref() else {
                bail!("DATABASE_URL is not set; the in-memory store needs no migrations");
            };
            let store = PgFactStore::connect(url)
                .await
                .context("connecting to the fact database")?;
            store.migrate().await.context("applying migrations")?;
            println!("migrations applied");
        }
        Commands::Report { json } => {
            let store = open_store(config.database_url.as_deref()).await?;
            if json {
                let value = vel_web::report_json(store.as_ref()).await?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let snapshot = load_snapshot(store.as_ref()).await?;
                let report = vel_insights::analyze(&snapshot);
                let text = vel_insights::swot_text(&report.swot);
                for (title, lines) in [
                    ("Strengths", &text.strengths),
                    ("Weaknesses", &text.weaknesses),
                    ("Opportunities", &text.opportunities),
                    ("Threats", &text.threats),
                ] {
                    println!("{title}:");
                    for line in lines {
                        println!("  - {line}");
                    }
                }
                println!();
                println!("{}", report.headline());
            }
        }
    }

    Ok(())
}
