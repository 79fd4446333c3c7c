//! byov: bring-your-own-vector ingestion and verification.
//!
//! Loads a tabular numeric dataset into a vector-search store using vectors
//! built directly from the rows (no embedding model involved), then checks
//! retrieval correctness with nearest-vector queries: once with a known
//! sample row, once with a synthetic vector drawn from the observed
//! per-column value ranges.

pub mod config;
pub mod dataset;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod reconcile;
pub mod store;
pub mod vector;
pub mod verify;

pub use config::PipelineConfig;
pub use error::{Error, Result};
