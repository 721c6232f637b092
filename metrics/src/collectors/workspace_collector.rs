use crate::{
    collectors::Collector,
    compute::{
        compute_metrics,
        MetricsOptions,
    },
    metrics::ContentMetrics,
    source::{
        IssueSource,
        SourceContext,
    },
    FetchError,
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
};

/// Collects the metrics of a single configured workspace
pub struct WorkspaceCollector<S> {
    context: Arc<SourceContext<S>>,
    options: MetricsOptions,
}

impl<S: IssueSource> WorkspaceCollector<S> {
    pub fn new(context: Arc<SourceContext<S>>, options: MetricsOptions) -> Self {
        Self { context, options }
    }

    async fn collect_workspace(&self, workspace: &str, now: DateTime<Utc>) -> Result<ContentMetrics, FetchError> {
        let issues = self.context.fetch_issues(workspace).await?;
        let metrics = compute_metrics(&issues, now, &self.options);
        info!(
            workspace,
            total = metrics.total,
            completed = metrics.completed,
            "collected content metrics"
        );
        Ok(metrics)
    }
}

impl<S: IssueSource + 'static> Collector for WorkspaceCollector<S> {
    fn collect<'a>(
        &'a self,
        workspace: &'a str,
        now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<ContentMetrics, FetchError>> + Send + 'a>> {
        Box::pin(self.collect_workspace(workspace, now))
    }

    fn name(&self) -> &'static str {
        "workspace"
    }
}
