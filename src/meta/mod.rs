//! Match statistics aggregation over the local Challenger dataset.

pub mod engine;

pub use engine::{MetaEngine, MetaError};
