//! cfa-align library interface
//!
//! Structural-alignment scheduling: pending-work resolution, per-cluster
//! task enqueuing, pairwise multi-backend execution, result merging, and
//! idempotent persistence.

pub mod aligners;
pub mod config;
pub mod db;
pub mod enqueue;
pub mod merge;
pub mod pending;
pub mod pipeline;
pub mod queue;
pub mod registry;
pub mod store;
pub mod types;

pub use config::AlignConfig;
pub use pipeline::AlignmentPipeline;
pub use registry::AlignerRegistry;
pub use store::{AlignmentStore, MemoryStore};
