//! Data models for the TFT coach.
//!
//! This module contains the core data structures shared across the
//! application: the persisted match dataset shape produced by the Riot
//! pipeline, and the aggregated query results returned by the meta engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One player's result in one ranked match.
///
/// This is the unit of the persisted dataset: one record per participant,
/// flattened from the raw Riot match detail by the refresh pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Riot player identifier.
    pub puuid: String,
    /// Match identifier (e.g. "NA1_1234567890").
    pub match_id: String,
    /// Final placement, 1 (best) through 8 (worst).
    pub placement: u8,
    /// Player level at the end of the match.
    pub level: u32,
    /// Active traits (tier > 0 only).
    #[serde(default)]
    pub traits: Vec<TraitEntry>,
    /// Units fielded at the end of the match.
    #[serde(default)]
    pub units: Vec<UnitEntry>,
}

/// One fielded character instance within a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitEntry {
    /// Internal character code (e.g. "TFT16_Zoe").
    pub name: String,
    /// Star level of the unit.
    pub tier: u8,
    /// Equipped item identifiers. The game caps this at 3; the dataset
    /// does not enforce it.
    #[serde(default)]
    pub items: Vec<String>,
}

/// One active trait on a player's board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitEntry {
    pub name: String,
    pub num_units: u32,
    pub tier: u32,
}

/// An item identifier paired with how often it appeared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemCount {
    pub name: String,
    pub count: usize,
}

/// Aggregated statistics for one unit query.
///
/// Distinct from "no data": callers that get a `UnitSummary` always have
/// `sample_size >= 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSummary {
    /// Number of matching unit entries across the whole dataset.
    pub sample_size: usize,
    /// Mean placement over the matching entries, rounded to 2 decimals.
    pub average_placement: f64,
    /// Up to 5 most frequent items, descending count.
    pub top_items: Vec<ItemCount>,
}

impl fmt::Display for UnitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sample_size={}, average_placement={:.2}",
            self.sample_size, self.average_placement
        )?;
        if !self.top_items.is_empty() {
            write!(f, ", top_items=[")?;
            for (i, item) in self.top_items.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{} x{}", item.name, item.count)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Final answer from the agent, plus which tools it invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachAnswer {
    pub response: String,
    /// Tool names in invocation order; empty if the model answered directly.
    pub tools_used: Vec<String>,
}
