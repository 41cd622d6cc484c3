//! The dataset refresh pipeline.
//!
//! Fetch Challengers -> collect match IDs -> crawl match details -> flatten
//! into match records -> persist as JSON. Individual match fetches may fail
//! without aborting the batch, and requests are paced to stay inside the
//! Riot API rate limits.

use crate::config::RiotConfig;
use crate::models::{MatchRecord, TraitEntry, UnitEntry};
use crate::riot::client::{MatchDetail, RiotClient};
use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Run the full refresh and persist the dataset to `output_path`.
///
/// Returns the number of match records written.
pub async fn run_refresh(
    client: &RiotClient,
    config: &RiotConfig,
    output_path: &Path,
) -> Result<usize> {
    info!("Starting Riot data pipeline");

    let players = client.challenger_players(&config.region).await?;
    info!("Found {} Challenger players", players.len());

    let top_players: Vec<_> = players.into_iter().take(config.top_players).collect();
    let pacing = Duration::from_millis(config.request_pacing_ms);

    // BTreeSet both deduplicates (players share lobbies) and keeps the crawl
    // order stable across runs.
    let mut match_ids: BTreeSet<String> = BTreeSet::new();
    for (i, player) in top_players.iter().enumerate() {
        match client
            .match_ids_by_puuid(&config.routing, &player.puuid, config.matches_per_player)
            .await
        {
            Ok(ids) => {
                info!(
                    "Fetched {} match IDs for player {}/{}",
                    ids.len(),
                    i + 1,
                    top_players.len()
                );
                match_ids.extend(ids);
            }
            Err(e) => {
                warn!("Skipping player {}: {}", player.puuid, e);
            }
        }
        tokio::time::sleep(pacing).await;
    }

    info!("Retrieved {} unique match IDs", match_ids.len());

    let progress = ProgressBar::new(match_ids.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("Crawling matches {bar:30} {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut records: Vec<MatchRecord> = Vec::new();
    for match_id in &match_ids {
        match client.match_by_id(&config.routing, match_id).await {
            Ok(detail) => records.extend(flatten_match(match_id, &detail)),
            Err(e) => warn!("Skipping match {}: {}", match_id, e),
        }
        progress.inc(1);
        tokio::time::sleep(pacing).await;
    }
    progress.finish_and_clear();

    persist_dataset(&records, output_path)?;
    info!(
        "Data refresh complete: {} records saved to {}",
        records.len(),
        output_path.display()
    );

    Ok(records.len())
}

/// Flatten one raw match detail into per-participant records, keeping only
/// the fields the aggregator and the agent consume. Traits with no active
/// tier are dropped.
pub fn flatten_match(match_id: &str, detail: &MatchDetail) -> Vec<MatchRecord> {
    detail
        .info
        .participants
        .iter()
        .map(|player| MatchRecord {
            puuid: player.puuid.clone(),
            match_id: match_id.to_string(),
            placement: player.placement,
            level: player.level,
            traits: player
                .traits
                .iter()
                .filter(|t| t.tier_current > 0)
                .map(|t| TraitEntry {
                    name: t.name.clone(),
                    num_units: t.num_units,
                    tier: t.tier_current,
                })
                .collect(),
            units: player
                .units
                .iter()
                .map(|u| UnitEntry {
                    name: u.character_id.clone(),
                    tier: u.tier,
                    items: u.item_names.clone(),
                })
                .collect(),
        })
        .collect()
}

/// Write the dataset via a temp file in the same directory, then rename into
/// place. A reader reloading mid-refresh sees either the old file or the new
/// one, never a partial write.
fn persist_dataset(records: &[MatchRecord], path: &Path) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }

    let dir = parent.unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .context("Failed to create temporary dataset file")?;

    let json = serde_json::to_string(records).context("Failed to serialize dataset")?;
    tmp.write_all(json.as_bytes())
        .context("Failed to write dataset")?;

    tmp.persist(path)
        .with_context(|| format!("Failed to move dataset into place at {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_detail() -> MatchDetail {
        serde_json::from_str(
            r#"{
                "info": {
                    "participants": [
                        {
                            "puuid": "winner",
                            "placement": 1,
                            "level": 9,
                            "traits": [
                                {"name": "Sorcerer", "num_units": 6, "tier_current": 3},
                                {"name": "Bench", "num_units": 1, "tier_current": 0}
                            ],
                            "units": [
                                {"character_id": "TFT16_Zoe", "tier": 3, "itemNames": ["ItemA"]}
                            ]
                        },
                        {
                            "puuid": "loser",
                            "placement": 8,
                            "level": 6,
                            "traits": [],
                            "units": []
                        }
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_flatten_match_one_record_per_participant() {
        let records = flatten_match("NA1_42", &sample_detail());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].match_id, "NA1_42");
        assert_eq!(records[0].placement, 1);
        assert_eq!(records[1].placement, 8);
    }

    #[test]
    fn test_flatten_match_drops_inactive_traits() {
        let records = flatten_match("NA1_42", &sample_detail());
        assert_eq!(records[0].traits.len(), 1);
        assert_eq!(records[0].traits[0].name, "Sorcerer");
    }

    #[test]
    fn test_flatten_match_keeps_unit_items() {
        let records = flatten_match("NA1_42", &sample_detail());
        assert_eq!(records[0].units[0].name, "TFT16_Zoe");
        assert_eq!(records[0].units[0].items, vec!["ItemA"]);
    }

    #[test]
    fn test_persist_dataset_readable_by_engine() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        let records = flatten_match("NA1_42", &sample_detail());

        persist_dataset(&records, &path).unwrap();

        let engine = crate::meta::MetaEngine::new(&path).unwrap();
        assert_eq!(engine.record_count(), 2);
        let summary = engine.analyze("zoe").unwrap().unwrap();
        assert_eq!(summary.sample_size, 1);
        assert_eq!(summary.average_placement, 1.0);
    }
}
