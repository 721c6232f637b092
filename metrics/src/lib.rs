//! # Content Pipeline Metrics
//!
//! Turns issue tracker data from several workspaces into the numbers a content team watches: counts per status,
//! completion rate, author leaderboard, monthly growth, upcoming and overdue pieces and the workflow state
//! distribution.
//!
//! ## Architecture
//!
//! - **`source`**: boundary trait to the issue tracker and the per-workspace caches in front of it
//! - **`classify`**: maps workflow state names onto the four semantic categories
//! - **`compute`**: derives [`ContentMetrics`] from the resolved issues of one workspace
//! - **`aggregate`**: merges per-workspace metrics into the cross-workspace view
//! - **`collectors`**: glue between source and computation, including the fan-out for the `all` workspace
//! - **`refresh`**: cached snapshots, staleness and rate limit back-off for the presentation layer
//!
//! ## Usage
//!
//! ```no_run
//! # async fn run(config: content_pipeline_config::Config) -> eyre::Result<()> {
//! use content_pipeline_metrics::*;
//! use std::sync::Arc;
//!
//! let registry = content_pipeline_config::WorkspaceRegistry::from_config(&config);
//! let client = LinearClient::new(config.api_url.clone(), config.request_timeout)?;
//! let context = SourceContext::new(client, registry).with_page_size(config.page_size);
//! let orchestrator = Orchestrator::new(context, MetricsOptions::from_config(&config));
//! let controller = RefreshController::new(orchestrator, SystemClock, RefreshSettings::from_config(&config)?);
//!
//! let view = controller.refresh("all", false).await?;
//! println!("{} pieces tracked", view.metrics.map(|m| m.total).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

pub mod aggregate;
pub mod classify;
pub mod collectors;
pub mod compute;
mod error;
pub mod metrics;
pub mod refresh;
pub mod source;

#[cfg(test)]
mod testing;

pub use aggregate::{
    combine,
    tag_workspace,
};
pub use classify::classify;
pub use collectors::*;
pub use compute::{
    compute_metrics,
    MetricsOptions,
};
pub use error::*;
pub use metrics::*;
pub use refresh::{
    Clock,
    DashboardView,
    ManualClock,
    RefreshController,
    RefreshSettings,
    RefreshState,
    SystemClock,
};
pub use source::{
    IssueSource,
    LinearClient,
    RawIssue,
    SourceContext,
};
