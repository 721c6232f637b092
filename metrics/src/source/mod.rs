//! # Issue Source Adapter
//!
//! - **`IssueSource`**: boundary to the issue tracker transport, implemented for [`LinearClient`]
//! - **`SourceContext`**: owns the per-workspace client handles and the team id / workflow state caches, and
//!   resolves the lazy references of every issue before handing it to the metrics computer

mod context;
mod linear;

use chrono::{
    DateTime,
    NaiveDate,
    Utc,
};
pub use content_pipeline_config::Credential;
pub use context::{
    SourceContext,
    WorkspaceClient,
};
use futures::future::BoxFuture;
pub use linear_client::{
    IssueNode,
    LinearClient,
    NodeRef,
    PaginationOrderBy,
    Project,
    Team,
    User,
    WorkflowState,
};

use crate::SourceError;

pub type TeamId = String;

/// Issues fetched per workspace.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Transport to the issue tracker. Every call is scoped by the workspace credential.
///
/// Issues come back with unresolved references, the `resolve_*` calls turn them into full records.
pub trait IssueSource: Send + Sync {
    fn list_teams<'a>(&'a self, credential: &'a Credential) -> BoxFuture<'a, Result<Vec<Team>, SourceError>>;

    fn list_workflow_states<'a>(
        &'a self,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Vec<WorkflowState>, SourceError>>;

    fn list_issues<'a>(
        &'a self,
        credential: &'a Credential,
        team_id: &'a str,
        page_size: u32,
        order_by: PaginationOrderBy,
    ) -> BoxFuture<'a, Result<Vec<IssueNode>, SourceError>>;

    fn resolve_state<'a>(
        &'a self,
        credential: &'a Credential,
        id: &'a str,
    ) -> BoxFuture<'a, Result<WorkflowState, SourceError>>;

    fn resolve_user<'a>(&'a self, credential: &'a Credential, id: &'a str) -> BoxFuture<'a, Result<User, SourceError>>;

    fn resolve_project<'a>(
        &'a self,
        credential: &'a Credential,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Project, SourceError>>;
}

/// Issue with state, assignee and project resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIssue {
    pub id: String,
    pub title: String,
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub state: Option<WorkflowState>,
    pub assignee: Option<User>,
    pub project: Option<Project>,
}

impl RawIssue {
    pub fn state_name(&self) -> Option<&str> {
        self.state.as_ref().map(|state| state.name.as_str())
    }

    pub fn assignee_name(&self) -> Option<&str> {
        self.assignee.as_ref().map(|user| user.name.as_str())
    }

    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().map(|project| project.name.as_str())
    }
}
