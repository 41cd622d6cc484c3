//! The coach agent loop.
//!
//! One question in, one answer out: the LLM decides per turn whether to
//! reply or to call a tool (local meta data, reference tables, web search),
//! and the loop feeds tool results back until it produces a final answer.

use crate::agent::tools::{get_tool_definitions, ToolCall, ToolExecutor};
use crate::models::CoachAnswer;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Configuration for the agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_iterations: usize,
    pub timeout_seconds: u64,
    /// Max tool results to keep in context (sliding window).
    pub max_context_messages: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "llama3.2:latest".to_string(),
            temperature: 0.0,
            max_iterations: 10,
            timeout_seconds: 300,
            max_context_messages: 10,
        }
    }
}

/// Message in the chat history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCallMessage>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallMessage {
    pub function: ToolCallFunction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    pub arguments: Value,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallMessage>>,
}

/// The TFT coach agent.
pub struct CoachAgent {
    config: AgentConfig,
    http_client: reqwest::Client,
    tool_executor: ToolExecutor,
    messages: Vec<ChatMessage>,
    tools_used: Vec<String>,
}

impl CoachAgent {
    pub fn new(config: AgentConfig, tool_executor: ToolExecutor) -> Result<Self> {
        info!(
            "Initializing coach agent with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            config,
            http_client,
            tool_executor,
            messages: Vec::new(),
            tools_used: Vec::new(),
        })
    }

    /// Answer one user question, consulting tools as the model sees fit.
    pub async fn answer(&mut self, question: &str) -> Result<CoachAnswer> {
        self.messages.push(ChatMessage {
            role: "system".to_string(),
            content: COACH_SYSTEM_PROMPT.to_string(),
            tool_calls: None,
        });

        self.messages.push(ChatMessage {
            role: "user".to_string(),
            content: question.to_string(),
            tool_calls: None,
        });

        for iteration in 0..self.config.max_iterations {
            debug!("Agent iteration {}", iteration + 1);

            let response = self.chat_with_tools().await?;

            let Some(tool_calls) = response.tool_calls else {
                // No tool calls: this is the final answer.
                return Ok(CoachAnswer {
                    response: response.content,
                    tools_used: self.tools_used.clone(),
                });
            };

            for tool_call in tool_calls {
                let call = ToolCall {
                    function: crate::agent::tools::FunctionCall {
                        name: tool_call.function.name.clone(),
                        arguments: tool_call.function.arguments.clone(),
                    },
                };

                let result = self.tool_executor.execute(&call).await;
                self.tools_used.push(tool_call.function.name.clone());

                self.messages.push(ChatMessage {
                    role: "tool".to_string(),
                    content: if result.success {
                        result.output
                    } else {
                        format!("Error: {}", result.error.unwrap_or_default())
                    },
                    tool_calls: None,
                });

                self.prune_old_messages();

                info!("Tool {} executed", tool_call.function.name);
            }
        }

        warn!(
            "Agent hit the iteration limit ({}) without a final answer",
            self.config.max_iterations
        );
        Ok(CoachAnswer {
            response: "I couldn't put together an answer from the available data. \
                       Try asking about a specific unit."
                .to_string(),
            tools_used: self.tools_used.clone(),
        })
    }

    /// Prune old tool messages to keep context small (sliding window).
    fn prune_old_messages(&mut self) {
        // Keep the system prompt and the user question, plus the last N.
        let keep_start = 2;
        let max_keep = self.config.max_context_messages + keep_start;

        if self.messages.len() > max_keep {
            let remove_count = self.messages.len() - max_keep;
            if self.messages.len() > keep_start + remove_count {
                self.messages.drain(keep_start..keep_start + remove_count);
                debug!("Pruned {} old messages to save context", remove_count);
            }
        }
    }

    /// Send a chat request with tools to Ollama.
    async fn chat_with_tools(&mut self) -> Result<ResponseMessage> {
        let url = format!("{}/api/chat", self.config.ollama_url);

        let tools = get_tool_definitions();
        let tools_json: Vec<Value> = tools
            .iter()
            .filter_map(|t| serde_json::to_value(t).ok())
            .collect();

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages: self.messages.clone(),
            tools: tools_json,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Sending chat request with {} messages", self.messages.len());

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow::anyhow!(
                        "Request timed out after {}s. Try a different model.",
                        self.config.timeout_seconds
                    )
                } else if e.is_connect() {
                    anyhow::anyhow!(
                        "Cannot connect to Ollama at {}. Is Ollama running?",
                        self.config.ollama_url
                    )
                } else {
                    anyhow::anyhow!("Failed to send request: {}", e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama API error {}: {}", status, body));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        self.messages.push(ChatMessage {
            role: "assistant".to_string(),
            content: chat_response.message.content.clone(),
            tool_calls: chat_response.message.tool_calls.clone(),
        });

        Ok(chat_response.message)
    }
}

/// System prompt for the coach.
const COACH_SYSTEM_PROMPT: &str = r#"You are a top-class Teamfight Tactics (TFT) pro player and coach for the LATEST SET. Help the user win TFT games. Don't guess. Use the data.

STRATEGY:
1. FIRST, check 'analyze_meta' to see what Challengers are playing in our database.
2. IF the database has good data (sample size > 0), suggest builds based on that.
3. IF the database is empty (or the unit is new), use 'search_web' to find the latest guides.
4. Use 'lookup_unit' and 'lookup_item' for static facts (traits, costs, recipes).
5. When answering, be specific: "Based on 50 Challenger matches..." or "I found a guide online...".
6. Replace internal item ids with display names before responding:
   TFT_Item_PowerGauntlet -> Striker Flail
   TFT_Item_FrozenHeart -> Protector's Vow
   TFT_Item_Redemption -> Spirit Visage
   TFT_Item_SpectralGauntlet -> Evenshroud
   TFT_Item_NightHarvester -> Steadfast Heart
   TFT_Item_StatikkShiv -> Void Staff
   TFT_Item_UnstableConcoction -> Hand of Justice
   TFT_Item_MadredsBloodrazor -> Giant Slayer
   TFT_Item_RapidFireCannon -> Red Buff
   TFT_Item_Leviathan -> Nashor's Tooth
   TFT_Item_GuardianAngel -> Edge of Night
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_config_default() {
        let config = AgentConfig::default();
        assert_eq!(config.model_name, "llama3.2:latest");
        assert_eq!(config.max_iterations, 10);
    }

    #[test]
    fn test_chat_message_serialization_skips_empty_tool_calls() {
        let message = ChatMessage {
            role: "user".to_string(),
            content: "hi".to_string(),
            tool_calls: None,
        };
        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("tool_calls"));
    }
}
