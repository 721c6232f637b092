//! # Collectors Module
//!
//! Turns issue tracker data into [`ContentMetrics`](crate::metrics::ContentMetrics) snapshots.
//!
//! - **`Collector` trait**: interface the refresh controller drives
//! - **`WorkspaceCollector`**: fetches the issues of one workspace and computes its metrics
//! - **`Orchestrator`**: dispatches single workspaces and fans the aggregate view out over every active workspace

pub mod collector;
pub mod orchestrator;
pub mod workspace_collector;

// Re-export the main types for easy access
pub use collector::Collector;
pub use orchestrator::Orchestrator;
pub use workspace_collector::WorkspaceCollector;
