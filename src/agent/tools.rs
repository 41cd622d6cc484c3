//! Tool definitions for the coach agent.
//!
//! This module defines the tools the LLM can call: the local meta engine,
//! the static reference tables, and web search.

use crate::meta::{MetaEngine, MetaError};
use crate::reference::ReferenceTable;
use crate::search::SearchClient;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Tool definition for Ollama's tool-calling API.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String,
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A tool call made by the LLM.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
    pub function: FunctionCall,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    pub arguments: Value,
}

/// Result of executing a tool.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn success(output: String) -> Self {
        Self {
            success: true,
            output,
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(message),
        }
    }
}

/// Executes tool calls against the injected data sources.
pub struct ToolExecutor {
    engine: Arc<MetaEngine>,
    unit_table: ReferenceTable,
    item_table: ReferenceTable,
    /// None when no search API key is configured; the tool then reports
    /// that web search is unavailable.
    search: Option<SearchClient>,
}

impl ToolExecutor {
    pub fn new(
        engine: Arc<MetaEngine>,
        unit_table: ReferenceTable,
        item_table: ReferenceTable,
        search: Option<SearchClient>,
    ) -> Self {
        Self {
            engine,
            unit_table,
            item_table,
            search,
        }
    }

    /// Execute a tool call and return the result.
    pub async fn execute(&self, tool_call: &ToolCall) -> ToolResult {
        let name = &tool_call.function.name;
        let args = &tool_call.function.arguments;

        debug!("Executing tool: {} with args: {:?}", name, args);

        match name.as_str() {
            "analyze_meta" => self.analyze_meta(args),
            "best_items" => self.best_items(args),
            "search_web" => self.search_web(args).await,
            "lookup_unit" => self.lookup(&self.unit_table, args),
            "lookup_item" => self.lookup(&self.item_table, args),
            _ => ToolResult::error(format!("Unknown tool: {}", name)),
        }
    }

    /// Challenger statistics for a unit: sample size, mean placement, top
    /// items. "NO LOCAL DATA" tells the model to fall back to web search.
    fn analyze_meta(&self, args: &Value) -> ToolResult {
        let unit_name = match args.get("unit_name").and_then(|v| v.as_str()) {
            Some(u) => u,
            None => return ToolResult::error("Missing required parameter: unit_name".to_string()),
        };

        match self.engine.analyze(unit_name) {
            Ok(Some(summary)) => ToolResult::success(format!("LOCAL DATA FOUND: {}", summary)),
            Ok(None) => ToolResult::success(format!("NO LOCAL DATA FOUND for '{}'.", unit_name)),
            Err(MetaError::InvalidQuery) => {
                ToolResult::error("unit_name must not be empty".to_string())
            }
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    /// Just the most common items for a unit, no placement stats.
    fn best_items(&self, args: &Value) -> ToolResult {
        let unit_name = match args.get("unit_name").and_then(|v| v.as_str()) {
            Some(u) => u,
            None => return ToolResult::error("Missing required parameter: unit_name".to_string()),
        };

        match self.engine.best_items(unit_name) {
            Ok(Some(items)) => {
                let rendered: Vec<String> = items
                    .iter()
                    .map(|i| format!("{} x{}", i.name, i.count))
                    .collect();
                ToolResult::success(format!("Most common items: {}", rendered.join(", ")))
            }
            Ok(None) => ToolResult::success(format!("NO LOCAL DATA FOUND for '{}'.", unit_name)),
            Err(MetaError::InvalidQuery) => {
                ToolResult::error("unit_name must not be empty".to_string())
            }
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    async fn search_web(&self, args: &Value) -> ToolResult {
        let query = match args.get("query").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolResult::error("Missing required parameter: query".to_string()),
        };

        let Some(client) = &self.search else {
            return ToolResult::error(
                "Web search is not configured (set TAVILY_API_KEY).".to_string(),
            );
        };

        match client.search_as_text(query).await {
            Ok(text) => ToolResult::success(text),
            Err(e) => ToolResult::error(e.to_string()),
        }
    }

    fn lookup(&self, table: &ReferenceTable, args: &Value) -> ToolResult {
        let query = match args.get("query").and_then(|v| v.as_str()) {
            Some(q) => q,
            None => return ToolResult::error("Missing required parameter: query".to_string()),
        };

        ToolResult::success(table.search(query).into_tool_output())
    }
}

/// Get the tool definitions for the Ollama API.
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "analyze_meta".to_string(),
                description: "Check local Challenger data for a unit's statistics (sample size, average placement, top items). ALWAYS use this tool FIRST before searching the web.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "unit_name": {
                            "type": "string",
                            "description": "Unit name or a fragment of it (e.g. 'Zoe' matches 'TFT16_Zoe')"
                        }
                    },
                    "required": ["unit_name"]
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "best_items".to_string(),
                description: "Get only the most common items Challengers put on a unit, without placement statistics.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "unit_name": {
                            "type": "string",
                            "description": "Unit name or a fragment of it"
                        }
                    },
                    "required": ["unit_name"]
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "search_web".to_string(),
                description: "Search the internet for TFT guides, meta snapshots, or patch notes. Use this ONLY if local data is missing or insufficient.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Free-text search query"
                        }
                    },
                    "required": ["query"]
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "lookup_unit".to_string(),
                description: "Look up static unit information (stats, traits, role, cost) by name, trait, or role.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Unit name (e.g. 'Ahri') or a trait (e.g. 'Sorcerer')"
                        }
                    },
                    "required": ["query"]
                }),
            },
        },
        ToolDefinition {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: "lookup_item".to_string(),
                description: "Look up static item information (components, effects) by name or component.".to_string(),
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Item name or component name"
                        }
                    },
                    "required": ["query"]
                }),
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchRecord, UnitEntry};
    use tempfile::TempDir;

    fn executor_with_dataset(records: Vec<MatchRecord>) -> (ToolExecutor, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("matches.json");
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let executor = ToolExecutor::new(
            Arc::new(MetaEngine::new(&path).unwrap()),
            ReferenceTable::empty("unit"),
            ReferenceTable::empty("item"),
            None,
        );
        (executor, dir)
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall {
            function: FunctionCall {
                name: name.to_string(),
                arguments: args,
            },
        }
    }

    #[tokio::test]
    async fn test_analyze_meta_found() {
        let (executor, _dir) = executor_with_dataset(vec![MatchRecord {
            puuid: "p".to_string(),
            match_id: "NA1_1".to_string(),
            placement: 2,
            level: 8,
            traits: Vec::new(),
            units: vec![UnitEntry {
                name: "TFT16_Zoe".to_string(),
                tier: 2,
                items: vec!["ItemA".to_string()],
            }],
        }]);

        let result = executor
            .execute(&call("analyze_meta", json!({"unit_name": "zoe"})))
            .await;
        assert!(result.success);
        assert!(result.output.starts_with("LOCAL DATA FOUND"));
        assert!(result.output.contains("sample_size=1"));
    }

    #[tokio::test]
    async fn test_analyze_meta_no_data_is_explicit() {
        let (executor, _dir) = executor_with_dataset(Vec::new());

        let result = executor
            .execute(&call("analyze_meta", json!({"unit_name": "zoe"})))
            .await;
        assert!(result.success);
        assert!(result.output.contains("NO LOCAL DATA FOUND"));
    }

    #[tokio::test]
    async fn test_analyze_meta_blank_query_fails() {
        let (executor, _dir) = executor_with_dataset(Vec::new());

        let result = executor
            .execute(&call("analyze_meta", json!({"unit_name": "  "})))
            .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_search_web_unconfigured() {
        let (executor, _dir) = executor_with_dataset(Vec::new());

        let result = executor
            .execute(&call("search_web", json!({"query": "zoe build"})))
            .await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (executor, _dir) = executor_with_dataset(Vec::new());

        let result = executor.execute(&call("fly_to_the_moon", json!({}))).await;
        assert!(!result.success);
    }

    #[test]
    fn test_tool_definitions() {
        let tools = get_tool_definitions();
        assert_eq!(tools.len(), 5);

        let names: Vec<_> = tools.iter().map(|t| t.function.name.as_str()).collect();
        assert!(names.contains(&"analyze_meta"));
        assert!(names.contains(&"best_items"));
        assert!(names.contains(&"search_web"));
        assert!(names.contains(&"lookup_unit"));
        assert!(names.contains(&"lookup_item"));
    }
}
