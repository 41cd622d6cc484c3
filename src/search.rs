//! Web search via the Tavily API.
//!
//! The fallback data source when the local dataset has nothing on a unit:
//! guides, meta snapshots, patch notes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// One web search result.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub content: String,
}

/// Client for the Tavily search API.
pub struct SearchClient {
    http_client: reqwest::Client,
    api_key: String,
    max_results: usize,
}

impl SearchClient {
    pub fn new(api_key: String, max_results: usize, timeout_seconds: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            api_key,
            max_results,
        })
    }

    /// Run a search and return the raw hits.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        debug!("Web search: {}", query);

        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
        };

        let response = self
            .http_client
            .post(TAVILY_SEARCH_URL)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Web search timed out")
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot reach the search API")
                } else {
                    anyhow::anyhow!("Failed to send search request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Search API error {}: {}", status, body));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .context("Failed to parse search response")?;

        Ok(parsed.results)
    }

    /// Run a search and render the hits as tool output text.
    pub async fn search_as_text(&self, query: &str) -> Result<String> {
        let hits = self.search(query).await?;
        Ok(render_hits(&hits))
    }
}

fn render_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No web results found.".to_string();
    }

    let mut output = String::new();
    for (i, hit) in hits.iter().enumerate() {
        if i > 0 {
            output.push_str("\n\n");
        }
        output.push_str(&format!("[{}] {}\n{}\n{}", i + 1, hit.title, hit.url, hit.content));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_response() {
        let json = r#"{
            "results": [
                {"title": "TFT Zoe build", "url": "https://example.com/zoe", "content": "Best items...", "score": 0.9}
            ],
            "response_time": 0.4
        }"#;

        let parsed: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].title, "TFT Zoe build");
    }

    #[test]
    fn test_render_hits() {
        let hits = vec![
            SearchHit {
                title: "Guide".to_string(),
                url: "https://example.com".to_string(),
                content: "Build AP items.".to_string(),
            },
            SearchHit {
                title: "Patch notes".to_string(),
                url: "https://example.com/patch".to_string(),
                content: "Zoe buffed.".to_string(),
            },
        ];

        let text = render_hits(&hits);
        assert!(text.starts_with("[1] Guide"));
        assert!(text.contains("[2] Patch notes"));
    }

    #[test]
    fn test_render_no_hits() {
        assert_eq!(render_hits(&[]), "No web results found.");
    }
}
