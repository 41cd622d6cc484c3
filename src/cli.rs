//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// TFT Coach - LLM-powered Teamfight Tactics build advisor
///
/// Ask build questions against locally aggregated Challenger match data,
/// with web search as a fallback. Local AI via Ollama.
///
/// Examples:
///   tftcoach "what items should I put on Zoe?"
///   tftcoach --refresh
///   tftcoach --stats zoe
///   tftcoach "best Ahri build" --model qwen2.5:14b
///   tftcoach --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Question for the coach
    ///
    /// Not required when using --refresh, --stats, or --init-config.
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Ollama model to use
    ///
    /// Needs tool-calling support. Recommended: llama3.2:latest, qwen2.5:14b.
    /// Can also be set via TFTCOACH_MODEL env var or .tftcoach.toml config.
    #[arg(short, long, default_value = "llama3.2:latest", env = "TFTCOACH_MODEL")]
    pub model: String,

    /// Ollama API endpoint URL
    #[arg(long, default_value = "http://localhost:11434", env = "OLLAMA_URL")]
    pub ollama_url: String,

    /// Temperature for LLM responses (0.0 - 1.0)
    ///
    /// Lower values produce more consistent/deterministic output
    #[arg(long, default_value = "0.0")]
    pub temperature: f32,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .tftcoach.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the match dataset file
    #[arg(long, value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Path to the unit reference CSV
    #[arg(long, value_name = "FILE")]
    pub units_csv: Option<PathBuf>,

    /// Path to the item reference CSV
    #[arg(long, value_name = "FILE")]
    pub items_csv: Option<PathBuf>,

    /// Refresh the match dataset from the Riot API before answering
    ///
    /// Requires RIOT_API_KEY. Can be used alone to refresh and exit.
    #[arg(long)]
    pub refresh: bool,

    /// Platform region for the refresh (e.g. na1, euw1)
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Routing region for the refresh (e.g. americas, europe)
    #[arg(long, value_name = "ROUTING")]
    pub routing: Option<String>,

    /// Query the local aggregator directly, no LLM call
    ///
    /// Prints sample size, average placement, and top items for the unit.
    #[arg(long, value_name = "UNIT")]
    pub stats: Option<String>,

    /// Riot API key (for --refresh)
    #[arg(long, env = "RIOT_API_KEY", hide_env_values = true)]
    pub riot_api_key: Option<String>,

    /// Tavily API key (enables the web search tool)
    #[arg(long, env = "TAVILY_API_KEY", hide_env_values = true)]
    pub tavily_api_key: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .tftcoach.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        // Something must be asked for
        if self.question.is_none() && self.stats.is_none() && !self.refresh {
            return Err(
                "Nothing to do: pass a question, or use --stats, --refresh, or --init-config"
                    .to_string(),
            );
        }

        if let Some(ref question) = self.question {
            if question.trim().is_empty() {
                return Err("Question must not be empty".to_string());
            }
        }

        if let Some(ref unit) = self.stats {
            if unit.trim().is_empty() {
                return Err("--stats unit name must not be empty".to_string());
            }
        }

        // Ollama URL only matters when a question will reach the LLM
        if self.question.is_some()
            && !self.ollama_url.starts_with("http://")
            && !self.ollama_url.starts_with("https://")
        {
            return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
        }

        // Validate temperature range
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err("Temperature must be between 0.0 and 1.0".to_string());
        }

        // Refresh needs credentials
        if self.refresh && self.riot_api_key.as_deref().unwrap_or("").is_empty() {
            return Err("--refresh requires a Riot API key (set RIOT_API_KEY)".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        // Validate timeout if provided
        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
