//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.tftcoach.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Model settings.
    #[serde(default)]
    pub model: ModelConfig,

    /// Local data file locations.
    #[serde(default)]
    pub data: DataConfig,

    /// Riot API pipeline settings.
    #[serde(default)]
    pub riot: RiotConfig,

    /// Web search settings.
    #[serde(default)]
    pub search: SearchConfig,
}

/// LLM model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model name.
    #[serde(default = "default_model")]
    pub name: String,

    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Temperature for generation.
    #[serde(default)]
    pub temperature: f32,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Maximum tool-call iterations per question.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model(),
            ollama_url: default_ollama_url(),
            temperature: 0.0,
            timeout_seconds: default_timeout(),
            max_iterations: default_max_iterations(),
        }
    }
}

fn default_model() -> String {
    "llama3.2:latest".to_string()
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_timeout() -> u64 {
    300
}

fn default_max_iterations() -> usize {
    10
}

/// Locations of the local data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Persisted match dataset (written by --refresh).
    #[serde(default = "default_dataset_path")]
    pub dataset: String,

    /// Static unit reference table (CSV).
    #[serde(default = "default_units_csv")]
    pub units_csv: String,

    /// Static item reference table (CSV).
    #[serde(default = "default_items_csv")]
    pub items_csv: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dataset: default_dataset_path(),
            units_csv: default_units_csv(),
            items_csv: default_items_csv(),
        }
    }
}

fn default_dataset_path() -> String {
    "tft_challenger_data.json".to_string()
}

fn default_units_csv() -> String {
    "unit_info.csv".to_string()
}

fn default_items_csv() -> String {
    "item_info.csv".to_string()
}

/// Riot API pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiotConfig {
    /// Platform region for league endpoints (e.g. "na1").
    #[serde(default = "default_region")]
    pub region: String,

    /// Routing region for match endpoints (e.g. "americas").
    #[serde(default = "default_routing")]
    pub routing: String,

    /// How many top Challengers to crawl.
    #[serde(default = "default_top_players")]
    pub top_players: usize,

    /// Recent matches fetched per player.
    #[serde(default = "default_matches_per_player")]
    pub matches_per_player: usize,

    /// Delay between Riot API requests in milliseconds.
    #[serde(default = "default_pacing_ms")]
    pub request_pacing_ms: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_riot_timeout")]
    pub timeout_seconds: u64,
}

impl Default for RiotConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            routing: default_routing(),
            top_players: default_top_players(),
            matches_per_player: default_matches_per_player(),
            request_pacing_ms: default_pacing_ms(),
            timeout_seconds: default_riot_timeout(),
        }
    }
}

fn default_region() -> String {
    "na1".to_string()
}

fn default_routing() -> String {
    "americas".to_string()
}

fn default_top_players() -> usize {
    5
}

fn default_matches_per_player() -> usize {
    10
}

fn default_pacing_ms() -> u64 {
    1000
}

fn default_riot_timeout() -> u64 {
    30
}

/// Web search settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Maximum results per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Request timeout in seconds.
    #[serde(default = "default_search_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            timeout_seconds: default_search_timeout(),
        }
    }
}

fn default_max_results() -> usize {
    3
}

fn default_search_timeout() -> u64 {
    30
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but
    /// can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(".tftcoach.toml");

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings. This method
    /// only overrides config when CLI provides explicit values.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        // Model settings - always override since they have defaults in CLI
        self.model.name = args.model.clone();
        self.model.ollama_url = args.ollama_url.clone();
        self.model.temperature = args.temperature;

        if let Some(timeout) = args.timeout {
            self.model.timeout_seconds = timeout;
        }

        // Data paths - only override if provided
        if let Some(ref dataset) = args.data {
            self.data.dataset = dataset.display().to_string();
        }
        if let Some(ref units_csv) = args.units_csv {
            self.data.units_csv = units_csv.display().to_string();
        }
        if let Some(ref items_csv) = args.items_csv {
            self.data.items_csv = items_csv.display().to_string();
        }

        // Pipeline settings - only override if provided
        if let Some(ref region) = args.region {
            self.riot.region = region.clone();
        }
        if let Some(ref routing) = args.routing {
            self.riot.routing = routing.clone();
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.model.name, "llama3.2:latest");
        assert_eq!(config.data.dataset, "tft_challenger_data.json");
        assert_eq!(config.riot.region, "na1");
        assert_eq!(config.search.max_results, 3);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[model]
name = "qwen2.5:14b"
temperature = 0.2

[data]
dataset = "data/matches.json"

[riot]
region = "euw1"
routing = "europe"
top_players = 10
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.model.name, "qwen2.5:14b");
        assert_eq!(config.model.temperature, 0.2);
        assert_eq!(config.data.dataset, "data/matches.json");
        assert_eq!(config.riot.region, "euw1");
        assert_eq!(config.riot.top_players, 10);
        // Untouched sections keep defaults
        assert_eq!(config.riot.matches_per_player, 10);
        assert_eq!(config.search.max_results, 3);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(!toml_str.is_empty());
        assert!(toml_str.contains("[model]"));
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[riot]"));
        assert!(toml_str.contains("[search]"));
    }
}
