use crate::{
    metrics::ContentMetrics,
    FetchError,
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    future::Future,
    pin::Pin,
};

/// Produces the metrics snapshot of one workspace
pub trait Collector: Send + Sync {
    /// Collect metrics for `workspace` as of `now`
    fn collect<'a>(
        &'a self,
        workspace: &'a str,
        now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<ContentMetrics, FetchError>> + Send + 'a>>;

    /// Get the name of this collector
    fn name(&self) -> &'static str;
}
