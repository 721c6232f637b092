use crate::{
    aggregate::{
        combine,
        tag_workspace,
    },
    collectors::{
        Collector,
        WorkspaceCollector,
    },
    compute::MetricsOptions,
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
use content_pipeline_config::ALL_WORKSPACES;
use futures::future::join_all;
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
};

/// Coordinates the per-workspace collector and the aggregate fan-out
pub struct Orchestrator<S> {
    context: Arc<SourceContext<S>>,
    workspace_collector: WorkspaceCollector<S>,
}

impl<S: IssueSource + 'static> Orchestrator<S> {
    pub fn new(context: SourceContext<S>, options: MetricsOptions) -> Self {
        let context = Arc::new(context);
        let workspace_collector = WorkspaceCollector::new(context.clone(), options);
        Self {
            context,
            workspace_collector,
        }
    }

    /// Collect every active workspace concurrently and merge the results.
    ///
    /// Workspaces failing for any reason other than throttling are skipped. A throttled workspace fails the whole
    /// aggregate, and so does a run in which every workspace failed.
    pub async fn collect_all(&self, now: DateTime<Utc>) -> Result<ContentMetrics, FetchError> {
        let workspaces = self.context.registry().active_workspaces();
        if workspaces.is_empty() {
            warn!("no workspace has an API key configured, the aggregate view is empty");
            return Ok(ContentMetrics::default());
        }

        // join_all yields results in input order, independent of completion order
        let results = join_all(workspaces.iter().map(|workspace| async move {
            let result = self.workspace_collector.collect(&workspace.id, now).await;
            (workspace.id.as_str(), result)
        }))
        .await;

        let mut collected = Vec::with_capacity(results.len());
        let mut rate_limit = None;
        let mut first_error = None;
        for (workspace, result) in results {
            match result {
                Ok(metrics) => collected.push(tag_workspace(metrics, workspace)),
                Err(FetchError::RateLimit(err)) => {
                    warn!(workspace, detail = %err.detail, "workspace is rate limited");
                    rate_limit.get_or_insert(err);
                }
                Err(err) => {
                    warn!(workspace, error = %err, "skipping workspace in aggregate view");
                    first_error.get_or_insert(err);
                }
            }
        }

        if let Some(err) = rate_limit {
            return Err(FetchError::RateLimit(err));
        }
        if collected.is_empty() {
            if let Some(err) = first_error {
                return Err(err);
            }
        }

        info!(
            workspaces = collected.len(),
            skipped = workspaces.len() - collected.len(),
            "aggregated content metrics"
        );
        Ok(combine(collected))
    }
}

impl<S: IssueSource + 'static> Collector for Orchestrator<S> {
    fn collect<'a>(
        &'a self,
        workspace: &'a str,
        now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<ContentMetrics, FetchError>> + Send + 'a>> {
        if workspace == ALL_WORKSPACES {
            Box::pin(self.collect_all(now))
        } else {
            self.workspace_collector.collect(workspace, now)
        }
    }

    fn name(&self) -> &'static str {
        "orchestrator"
    }
}
