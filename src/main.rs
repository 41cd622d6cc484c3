//! TFT Coach - AI build advisor for Teamfight Tactics
//!
//! A CLI tool that answers build questions by combining locally aggregated
//! Challenger match statistics with on-demand web search, mediated by an
//! Ollama model with tool-calling.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (connection, config, corrupt dataset, etc.)

mod agent;
mod cli;
mod config;
mod meta;
mod models;
mod reference;
mod riot;
mod search;

use anyhow::{Context, Result};
use cli::Args;
use config::Config;
use meta::MetaEngine;
use reference::ReferenceTable;
use search::SearchClient;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("TFT Coach v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run_coach(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Coach failed: {}", e);
            eprintln!("\n❌ Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .tftcoach.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(".tftcoach.toml");

    if path.exists() {
        eprintln!("⚠️  .tftcoach.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .tftcoach.toml")?;

    println!("✅ Created .tftcoach.toml with default settings.");
    println!("   Edit it to customize model, data paths, regions, and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the requested workflow: refresh, direct stats, or a coach question.
async fn run_coach(args: Args) -> Result<()> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // The aggregator: loads the dataset, or starts empty when it is missing.
    // A corrupt dataset file is a hard error here.
    let engine = Arc::new(MetaEngine::new(config.data.dataset.clone())?);

    if args.refresh {
        let api_key = args
            .riot_api_key
            .clone()
            .context("Riot API key missing")?;

        println!("📥 Refreshing match data from the Riot API...");
        let client = riot::RiotClient::new(api_key, config.riot.timeout_seconds)?;
        let count =
            riot::run_refresh(&client, &config.riot, Path::new(&config.data.dataset)).await?;
        println!("   Saved {} match records.", count);

        engine.reload()?;
    }

    if let Some(ref unit) = args.stats {
        return handle_stats(&engine, unit);
    }

    let Some(ref question) = args.question else {
        // --refresh alone is a complete run.
        return Ok(());
    };

    // Step 1: Static reference tables (missing files degrade to empty)
    let unit_table = ReferenceTable::load("unit", Path::new(&config.data.units_csv))?;
    let item_table = ReferenceTable::load("item", Path::new(&config.data.items_csv))?;
    debug!(
        "Reference tables: {} unit rows, {} item rows",
        unit_table.len(),
        item_table.len()
    );

    // Step 2: Web search, if a key is available
    let search_client = match args.tavily_api_key.clone().filter(|k| !k.is_empty()) {
        Some(key) => Some(SearchClient::new(
            key,
            config.search.max_results,
            config.search.timeout_seconds,
        )?),
        None => {
            warn!("No Tavily API key set; the web search tool is disabled");
            None
        }
    };

    // Step 3: The agent
    println!("🤖 Asking the coach...");
    println!("   Model: {}", config.model.name);
    println!("   Local data: {} match records", engine.record_count());

    let agent_config = agent::AgentConfig {
        ollama_url: config.model.ollama_url.clone(),
        model_name: config.model.name.clone(),
        temperature: config.model.temperature,
        max_iterations: config.model.max_iterations,
        timeout_seconds: config.model.timeout_seconds,
        max_context_messages: 10,
    };

    let executor = agent::tools::ToolExecutor::new(
        Arc::clone(&engine),
        unit_table,
        item_table,
        search_client,
    );

    let mut coach = agent::CoachAgent::new(agent_config, executor)?;
    let answer = coach.answer(question).await?;

    println!("\n{}", answer.response);
    if !answer.tools_used.is_empty() {
        println!("\n   (consulted: {})", answer.tools_used.join(", "));
    }

    Ok(())
}

/// Handle --stats: query the aggregator directly and print the summary.
fn handle_stats(engine: &MetaEngine, unit: &str) -> Result<()> {
    match engine.analyze(unit)? {
        Some(summary) => {
            println!("📊 Stats for '{}':", unit);
            println!(
                "   Data snapshot: {} records, loaded {}",
                engine.record_count(),
                engine.loaded_at().format("%Y-%m-%d %H:%M UTC")
            );
            println!("   Sample size: {}", summary.sample_size);
            println!("   Average placement: {:.2}", summary.average_placement);
            if summary.top_items.is_empty() {
                println!("   No items recorded.");
            } else {
                println!("   Top items:");
                for item in &summary.top_items {
                    println!("     {} x{}", item.name, item.count);
                }
            }
        }
        None => {
            println!(
                "No local data for '{}'. Run --refresh to fetch fresh match data.",
                unit
            );
        }
    }
    Ok(())
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .tftcoach.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
