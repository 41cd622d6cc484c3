//! The meta engine: per-unit statistics over historical match records.
//!
//! The engine loads the persisted dataset once at construction and answers
//! read-only queries against it. Refreshing the data builds a new dataset
//! off to the side and publishes it with a single atomic swap, so in-flight
//! queries always see a complete snapshot and never block.

use crate::models::{ItemCount, MatchRecord, UnitSummary};
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from loading or querying the dataset.
#[derive(Debug, Error)]
pub enum MetaError {
    /// The dataset file exists but is not a valid sequence of match records.
    ///
    /// A missing file is not an error (the engine degrades to an empty
    /// dataset); corrupt content is surfaced so it doesn't pass for "no
    /// data yet".
    #[error("dataset {path} is not valid match data: {source}")]
    SourceMalformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The dataset file exists but could not be read.
    #[error("failed to read dataset {path}: {source}")]
    SourceUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A blank unit query. Scanning for "" would match every entry.
    #[error("unit query must not be empty")]
    InvalidQuery,
}

/// An immutable snapshot of the loaded match records.
#[derive(Debug)]
pub struct Dataset {
    records: Vec<MatchRecord>,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    fn empty() -> Self {
        Self {
            records: Vec::new(),
            loaded_at: Utc::now(),
        }
    }

    fn from_records(records: Vec<MatchRecord>) -> Self {
        Self {
            records,
            loaded_at: Utc::now(),
        }
    }
}

/// Aggregates per-unit statistics from the local Challenger dataset.
///
/// Construction loads the dataset from `path`. Queries are pure read-only
/// scans; any number may run concurrently against the same snapshot.
pub struct MetaEngine {
    dataset: ArcSwap<Dataset>,
    path: PathBuf,
}

impl MetaEngine {
    /// Load the dataset at `path`.
    ///
    /// A missing file degrades to an empty dataset with a warning, keeping
    /// the coach usable on web search alone. A present-but-malformed file is
    /// an error.
    pub fn new<P: Into<PathBuf>>(path: P) -> Result<Self, MetaError> {
        let path = path.into();
        let dataset = Self::load_dataset(&path)?;
        Ok(Self {
            dataset: ArcSwap::from_pointee(dataset),
            path,
        })
    }

    /// Re-read the dataset file and atomically replace the current snapshot.
    ///
    /// Parsing happens entirely before the swap; a failed reload leaves the
    /// previous snapshot in place.
    pub fn reload(&self) -> Result<(), MetaError> {
        let dataset = Self::load_dataset(&self.path)?;
        self.dataset.store(Arc::new(dataset));
        Ok(())
    }

    fn load_dataset(path: &Path) -> Result<Dataset, MetaError> {
        if !path.exists() {
            warn!(
                "No match dataset at {}; starting empty (run --refresh to fetch data)",
                path.display()
            );
            return Ok(Dataset::empty());
        }

        let content =
            std::fs::read_to_string(path).map_err(|source| MetaError::SourceUnreadable {
                path: path.display().to_string(),
                source,
            })?;

        let records: Vec<MatchRecord> =
            serde_json::from_str(&content).map_err(|source| MetaError::SourceMalformed {
                path: path.display().to_string(),
                source,
            })?;

        info!("Loaded {} match records from {}", records.len(), path.display());
        Ok(Dataset::from_records(records))
    }

    /// Number of match records in the current snapshot.
    pub fn record_count(&self) -> usize {
        self.dataset.load().records.len()
    }

    /// When the current snapshot was loaded.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.dataset.load().loaded_at
    }

    /// Aggregate statistics for every unit whose name contains `unit_query`
    /// (case-insensitive).
    ///
    /// Returns `Ok(None)` when no unit entry matches, so callers can tell
    /// "no local data" from a small sample. Counting is per matching unit
    /// entry: a record with two matching entries contributes its placement
    /// twice and adds 2 to the sample size.
    pub fn analyze(&self, unit_query: &str) -> Result<Option<UnitSummary>, MetaError> {
        let (placements, item_counts) = self.scan(unit_query)?;

        if placements.is_empty() {
            return Ok(None);
        }

        let sample_size = placements.len();
        let mean = placements.iter().map(|&p| p as f64).sum::<f64>() / sample_size as f64;
        // Round half away from zero, 2 decimals.
        let average_placement = (mean * 100.0).round() / 100.0;

        Ok(Some(UnitSummary {
            sample_size,
            average_placement,
            top_items: top_items(item_counts, 5),
        }))
    }

    /// The most common items for matching units, without placement stats.
    ///
    /// A convenience projection over the same scan as [`analyze`], for
    /// callers that only want the build.
    ///
    /// [`analyze`]: MetaEngine::analyze
    pub fn best_items(&self, unit_query: &str) -> Result<Option<Vec<ItemCount>>, MetaError> {
        let (placements, item_counts) = self.scan(unit_query)?;

        if placements.is_empty() {
            return Ok(None);
        }

        Ok(Some(top_items(item_counts, 5)))
    }

    /// Scan every unit entry in every record, collecting the placements and
    /// item frequencies of entries whose name contains the query.
    fn scan(&self, unit_query: &str) -> Result<(Vec<u8>, HashMap<String, usize>), MetaError> {
        if unit_query.trim().is_empty() {
            return Err(MetaError::InvalidQuery);
        }

        let needle = unit_query.to_lowercase();
        let dataset = self.dataset.load();

        let mut placements = Vec::new();
        let mut item_counts: HashMap<String, usize> = HashMap::new();

        for record in &dataset.records {
            for unit in &record.units {
                if !unit.name.to_lowercase().contains(&needle) {
                    continue;
                }

                placements.push(record.placement);
                for item in &unit.items {
                    *item_counts.entry(item.clone()).or_insert(0) += 1;
                }
            }
        }

        Ok((placements, item_counts))
    }
}

/// Rank items by descending count, breaking ties by ascending name, and keep
/// the top `n`.
fn top_items(counts: HashMap<String, usize>, n: usize) -> Vec<ItemCount> {
    let mut ranked: Vec<ItemCount> = counts
        .into_iter()
        .map(|(name, count)| ItemCount { name, count })
        .collect();

    ranked.sort_by(|a, b| (Reverse(a.count), &a.name).cmp(&(Reverse(b.count), &b.name)));
    ranked.truncate(n);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UnitEntry;
    use tempfile::TempDir;

    fn record(placement: u8, units: Vec<UnitEntry>) -> MatchRecord {
        MatchRecord {
            puuid: "p".to_string(),
            match_id: "NA1_1".to_string(),
            placement,
            level: 8,
            traits: Vec::new(),
            units,
        }
    }

    fn unit(name: &str, items: &[&str]) -> UnitEntry {
        UnitEntry {
            name: name.to_string(),
            tier: 2,
            items: items.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn engine_with(records: Vec<MatchRecord>) -> (MetaEngine, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();
        (MetaEngine::new(&path).unwrap(), dir)
    }

    #[test]
    fn test_analyze_concrete_scenario() {
        let (engine, _dir) = engine_with(vec![
            record(2, vec![unit("TFT16_Zoe", &["ItemA", "ItemB"])]),
            record(5, vec![unit("TFT16_Zoe", &["ItemA"])]),
        ]);

        let summary = engine.analyze("zoe").unwrap().unwrap();
        assert_eq!(summary.sample_size, 2);
        assert_eq!(summary.average_placement, 3.5);
        assert_eq!(
            summary.top_items,
            vec![
                ItemCount {
                    name: "ItemA".to_string(),
                    count: 2
                },
                ItemCount {
                    name: "ItemB".to_string(),
                    count: 1
                },
            ]
        );
    }

    #[test]
    fn test_analyze_not_found() {
        let (engine, _dir) = engine_with(vec![record(1, vec![unit("TFT16_Ahri", &[])])]);
        assert!(engine.analyze("zoe").unwrap().is_none());
    }

    #[test]
    fn test_analyze_empty_dataset_not_found() {
        let (engine, _dir) = engine_with(Vec::new());
        assert!(engine.analyze("anything").unwrap().is_none());
    }

    #[test]
    fn test_analyze_case_insensitive() {
        let (engine, _dir) = engine_with(vec![record(4, vec![unit("TFT16_Zoe", &["ItemA"])])]);

        let lower = engine.analyze("zoe").unwrap().unwrap();
        let upper = engine.analyze("ZOE").unwrap().unwrap();
        let mixed = engine.analyze("Zoe").unwrap().unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower, mixed);
    }

    #[test]
    fn test_analyze_counts_per_entry_not_per_record() {
        // One record fielding two Zoes counts twice, placement contributed twice.
        let (engine, _dir) = engine_with(vec![
            record(
                1,
                vec![unit("TFT16_Zoe", &["ItemA"]), unit("TFT16_Zoe", &["ItemB"])],
            ),
            record(4, vec![unit("TFT16_Zoe", &[])]),
        ]);

        let summary = engine.analyze("zoe").unwrap().unwrap();
        assert_eq!(summary.sample_size, 3);
        assert_eq!(summary.average_placement, 2.0); // (1 + 1 + 4) / 3
    }

    #[test]
    fn test_analyze_rounds_half_away_from_zero() {
        // Placements 1 and 2: mean 1.5, stays 1.5. Placements 1,1,2: 1.333... -> 1.33.
        let (engine, _dir) = engine_with(vec![
            record(1, vec![unit("TFT16_Zoe", &[])]),
            record(1, vec![unit("TFT16_Zoe", &[])]),
            record(2, vec![unit("TFT16_Zoe", &[])]),
        ]);

        let summary = engine.analyze("zoe").unwrap().unwrap();
        assert_eq!(summary.average_placement, 1.33);
    }

    #[test]
    fn test_top_items_capped_at_five_with_deterministic_ties() {
        let (engine, _dir) = engine_with(vec![record(
            3,
            vec![
                unit("TFT16_Zoe", &["F", "E", "D"]),
                unit("TFT16_Zoe", &["C", "B", "A"]),
                unit("TFT16_Zoe", &["F"]),
            ],
        )]);

        let summary = engine.analyze("zoe").unwrap().unwrap();
        assert_eq!(summary.top_items.len(), 5);
        // F leads with 2; the five singles tie and resolve lexicographically.
        assert_eq!(summary.top_items[0].name, "F");
        assert_eq!(summary.top_items[0].count, 2);
        let rest: Vec<&str> = summary.top_items[1..]
            .iter()
            .map(|i| i.name.as_str())
            .collect();
        assert_eq!(rest, vec!["A", "B", "C", "D"]);
    }

    #[test]
    fn test_analyze_idempotent() {
        let (engine, _dir) = engine_with(vec![record(2, vec![unit("TFT16_Zoe", &["ItemA"])])]);
        let first = engine.analyze("zoe").unwrap();
        let second = engine.analyze("zoe").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_blank_query_rejected() {
        let (engine, _dir) = engine_with(Vec::new());
        assert!(matches!(engine.analyze(""), Err(MetaError::InvalidQuery)));
        assert!(matches!(engine.analyze("   "), Err(MetaError::InvalidQuery)));
    }

    #[test]
    fn test_missing_file_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let engine = MetaEngine::new(dir.path().join("nope.json")).unwrap();
        assert_eq!(engine.record_count(), 0);
        assert!(engine.analyze("zoe").unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        std::fs::write(&path, "not json at all").unwrap();

        match MetaEngine::new(&path) {
            Err(MetaError::SourceMalformed { .. }) => {}
            other => panic!("expected SourceMalformed, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_best_items_projection() {
        let (engine, _dir) = engine_with(vec![
            record(2, vec![unit("TFT16_Zoe", &["ItemA", "ItemB"])]),
            record(5, vec![unit("TFT16_Zoe", &["ItemA"])]),
        ]);

        let items = engine.best_items("zoe").unwrap().unwrap();
        assert_eq!(items[0].name, "ItemA");
        assert_eq!(items[0].count, 2);

        assert!(engine.best_items("ahri").unwrap().is_none());
    }

    #[test]
    fn test_reload_swaps_dataset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        std::fs::write(
            &path,
            serde_json::to_string(&vec![record(2, vec![unit("TFT16_Zoe", &[])])]).unwrap(),
        )
        .unwrap();

        let engine = MetaEngine::new(&path).unwrap();
        assert_eq!(engine.analyze("zoe").unwrap().unwrap().sample_size, 1);

        std::fs::write(
            &path,
            serde_json::to_string(&vec![
                record(2, vec![unit("TFT16_Zoe", &[])]),
                record(6, vec![unit("TFT16_Zoe", &[])]),
            ])
            .unwrap(),
        )
        .unwrap();

        engine.reload().unwrap();
        assert_eq!(engine.analyze("zoe").unwrap().unwrap().sample_size, 2);
    }

    #[test]
    fn test_failed_reload_keeps_previous_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        std::fs::write(
            &path,
            serde_json::to_string(&vec![record(3, vec![unit("TFT16_Zoe", &[])])]).unwrap(),
        )
        .unwrap();

        let engine = MetaEngine::new(&path).unwrap();
        std::fs::write(&path, "{broken").unwrap();

        assert!(engine.reload().is_err());
        assert_eq!(engine.analyze("zoe").unwrap().unwrap().sample_size, 1);
    }
}
