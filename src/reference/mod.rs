//! Static reference data lookup.
//!
//! CSV-backed read-only tables for unit and item facts (stats, traits,
//! recipes). Tables are loaded once at construction and handed to whoever
//! needs them; a missing file yields an explicit empty table rather than a
//! hidden global or a crash.

use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Errors from loading a reference table.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("reference table {path} is not valid CSV: {source}")]
    Malformed {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// A read-only tabular dataset searchable by substring.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    /// Short label used in logs and search misses (e.g. "unit").
    label: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReferenceTable {
    /// Load a table from a CSV file with a header row.
    ///
    /// A missing file produces an empty table with a warning; searches
    /// against it report "empty" to the caller. Malformed CSV is an error.
    pub fn load(label: &str, path: &Path) -> Result<Self, ReferenceError> {
        if !path.exists() {
            warn!(
                "No {} reference data at {}; lookups will report an empty table",
                label,
                path.display()
            );
            return Ok(Self::empty(label));
        }

        let mut reader =
            csv::ReaderBuilder::new()
                .has_headers(true)
                .from_path(path)
                .map_err(|source| ReferenceError::Malformed {
                    path: path.display().to_string(),
                    source,
                })?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(|source| ReferenceError::Malformed {
                path: path.display().to_string(),
                source,
            })?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|source| ReferenceError::Malformed {
                path: path.display().to_string(),
                source,
            })?;
            rows.push(record.iter().map(|f| f.trim().to_string()).collect());
        }

        info!(
            "Loaded {} {} reference rows from {}",
            rows.len(),
            label,
            path.display()
        );

        Ok(Self {
            label: label.to_string(),
            headers,
            rows,
        })
    }

    /// An empty table (no data available).
    pub fn empty(label: &str) -> Self {
        Self {
            label: label.to_string(),
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Case-insensitive substring search across every column.
    ///
    /// Matching rows are rendered as a JSON array of header-keyed objects,
    /// which is what the LLM consumes as tool output. Distinguishes "table
    /// is empty" from "no row matched".
    pub fn search(&self, query: &str) -> SearchResult {
        if self.is_empty() {
            return SearchResult::EmptyTable {
                label: self.label.clone(),
            };
        }

        let needle = query.to_lowercase();
        let matches: Vec<&Vec<String>> = self
            .rows
            .iter()
            .filter(|row| row.iter().any(|cell| cell.to_lowercase().contains(&needle)))
            .collect();

        if matches.is_empty() {
            return SearchResult::NoMatch {
                label: self.label.clone(),
                query: query.to_string(),
            };
        }

        let records: Vec<serde_json::Value> = matches
            .iter()
            .map(|row| {
                let mut object = serde_json::Map::new();
                for (header, cell) in self.headers.iter().zip(row.iter()) {
                    object.insert(header.clone(), serde_json::Value::String(cell.clone()));
                }
                serde_json::Value::Object(object)
            })
            .collect();

        SearchResult::Found(serde_json::Value::Array(records).to_string())
    }
}

/// Outcome of a reference table search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// Matching rows as a JSON array string.
    Found(String),
    /// The table loaded but nothing matched.
    NoMatch { label: String, query: String },
    /// The table had no data to search.
    EmptyTable { label: String },
}

impl SearchResult {
    /// Render as tool output text for the LLM.
    pub fn into_tool_output(self) -> String {
        match self {
            SearchResult::Found(json) => json,
            SearchResult::NoMatch { label, query } => {
                format!("No {} found matching '{}'.", label, query)
            }
            SearchResult::EmptyTable { label } => {
                format!("The {} reference table is empty.", label)
            }
        }
    }
}
