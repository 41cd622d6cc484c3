//! Riot TFT API client and the dataset refresh pipeline.

pub mod client;
pub mod pipeline;

pub use client::RiotClient;
pub use pipeline::run_refresh;
