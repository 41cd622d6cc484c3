//! Typed client for the Riot TFT API endpoints the pipeline needs.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Challenger league response.
#[derive(Debug, Deserialize)]
pub struct LeagueList {
    pub entries: Vec<LeagueEntry>,
}

/// One ranked player in a league listing.
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueEntry {
    pub puuid: String,
    #[serde(rename = "leaguePoints")]
    pub league_points: i64,
}

/// Raw match detail, trimmed to the fields the pipeline consumes.
#[derive(Debug, Deserialize)]
pub struct MatchDetail {
    pub info: MatchInfo,
}

#[derive(Debug, Deserialize)]
pub struct MatchInfo {
    pub participants: Vec<Participant>,
}

#[derive(Debug, Deserialize)]
pub struct Participant {
    pub puuid: String,
    pub placement: u8,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub traits: Vec<RawTrait>,
    #[serde(default)]
    pub units: Vec<RawUnit>,
}

#[derive(Debug, Deserialize)]
pub struct RawTrait {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub num_units: u32,
    #[serde(default)]
    pub tier_current: u32,
}

#[derive(Debug, Deserialize)]
pub struct RawUnit {
    #[serde(default)]
    pub character_id: String,
    #[serde(default = "default_unit_tier")]
    pub tier: u8,
    #[serde(rename = "itemNames", default)]
    pub item_names: Vec<String>,
}

fn default_unit_tier() -> u8 {
    1
}

/// HTTP client for the Riot TFT API.
///
/// Platform endpoints (league) use a region host like `na1`; match endpoints
/// use a routing host like `americas`. Rate limiting is the caller's
/// concern; this client just makes single requests.
pub struct RiotClient {
    http_client: reqwest::Client,
    api_key: String,
}

impl RiotClient {
    pub fn new(api_key: String, timeout_seconds: u64) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            api_key,
        })
    }

    /// Challenger league entries for a platform region, sorted by league
    /// points (highest first).
    pub async fn challenger_players(&self, region: &str) -> Result<Vec<LeagueEntry>> {
        let url = format!(
            "https://{}.api.riotgames.com/tft/league/v1/challenger",
            region.to_lowercase()
        );

        let league: LeagueList = self.get_json(&url).await?;
        let mut entries = league.entries;
        entries.sort_by_key(|e| std::cmp::Reverse(e.league_points));
        Ok(entries)
    }

    /// Recent match IDs for a player.
    pub async fn match_ids_by_puuid(
        &self,
        routing: &str,
        puuid: &str,
        count: usize,
    ) -> Result<Vec<String>> {
        let url = format!(
            "https://{}.api.riotgames.com/tft/match/v1/matches/by-puuid/{}/ids?count={}",
            routing.to_lowercase(),
            puuid,
            count
        );

        self.get_json(&url).await
    }

    /// Full detail for one match.
    pub async fn match_by_id(&self, routing: &str, match_id: &str) -> Result<MatchDetail> {
        let url = format!(
            "https://{}.api.riotgames.com/tft/match/v1/matches/{}",
            routing.to_lowercase(),
            match_id
        );

        self.get_json(&url).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!("GET {}", url);

        let response = self
            .http_client
            .get(url)
            .header("X-Riot-Token", &self.api_key)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!("Riot API request timed out: {}", url)
                } else if e.is_connect() {
                    anyhow::anyhow!("Cannot reach the Riot API: {}", url)
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Riot API error {}: {}", status, body));
        }

        response
            .json()
            .await
            .context("Failed to parse Riot API response")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_league_list() {
        let json = r#"{
            "entries": [
                {"puuid": "low", "leaguePoints": 900, "wins": 100, "losses": 50},
                {"puuid": "high", "leaguePoints": 1400, "wins": 200, "losses": 40}
            ]
        }"#;

        let league: LeagueList = serde_json::from_str(json).unwrap();
        assert_eq!(league.entries.len(), 2);
        assert_eq!(league.entries[1].puuid, "high");
        assert_eq!(league.entries[1].league_points, 1400);
    }

    #[test]
    fn test_parse_match_detail() {
        let json = r#"{
            "metadata": {"match_id": "NA1_42"},
            "info": {
                "participants": [{
                    "puuid": "abc",
                    "placement": 1,
                    "level": 9,
                    "traits": [
                        {"name": "Sorcerer", "num_units": 6, "tier_current": 3},
                        {"name": "Inactive", "num_units": 1, "tier_current": 0}
                    ],
                    "units": [
                        {"character_id": "TFT16_Zoe", "tier": 3, "itemNames": ["ItemA", "ItemB"]}
                    ]
                }]
            }
        }"#;

        let detail: MatchDetail = serde_json::from_str(json).unwrap();
        let player = &detail.info.participants[0];
        assert_eq!(player.placement, 1);
        assert_eq!(player.units[0].character_id, "TFT16_Zoe");
        assert_eq!(player.units[0].item_names, vec!["ItemA", "ItemB"]);
        assert_eq!(player.traits[1].tier_current, 0);
    }

    #[test]
    fn test_parse_unit_without_items_or_tier() {
        let json = r#"{"character_id": "TFT16_Ahri"}"#;
        let unit: RawUnit = serde_json::from_str(json).unwrap();
        assert_eq!(unit.tier, 1);
        assert!(unit.item_names.is_empty());
    }
}
