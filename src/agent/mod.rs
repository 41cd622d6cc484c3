//! LLM agent modules for the TFT coach.
//!
//! This module provides the tool-calling agent that answers build questions
//! from local match data, reference tables, and web search.

pub mod agent_loop;
pub mod tools;

pub use agent_loop::{AgentConfig, CoachAgent};
