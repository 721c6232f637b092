use super::{
    Credential,
    IssueNode,
    IssueSource,
    PaginationOrderBy,
    Project,
    RawIssue,
    Team,
    TeamId,
    User,
    WorkflowState,
    DEFAULT_PAGE_SIZE,
};
use crate::{
    FetchError,
    SourceError,
};
use content_pipeline_config::{
    WorkspaceRegistry,
    ALL_WORKSPACES,
};
use futures::future::try_join_all;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        Mutex,
        PoisonError,
    },
};
use tokio::sync::OnceCell;

type CellMap<T> = Mutex<HashMap<String, Arc<OnceCell<T>>>>;

/// The cell caching `T` for one workspace, created on first access.
fn cell_for<T>(map: &CellMap<T>, workspace: &str) -> Arc<OnceCell<T>> {
    map.lock()
        .unwrap_or_else(PoisonError::into_inner)
        .entry(workspace.to_string())
        .or_default()
        .clone()
}

/// Handle to the issue tracker bound to one workspace credential.
#[derive(Debug)]
pub struct WorkspaceClient<S> {
    workspace: String,
    credential: Credential,
    source: Arc<S>,
}

impl<S: IssueSource> WorkspaceClient<S> {
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub async fn teams(&self) -> Result<Vec<Team>, SourceError> {
        self.source.list_teams(&self.credential).await
    }

    pub async fn workflow_states(&self) -> Result<Vec<WorkflowState>, SourceError> {
        self.source.list_workflow_states(&self.credential).await
    }

    pub async fn issues(&self, team_id: &str, page_size: u32) -> Result<Vec<IssueNode>, SourceError> {
        self.source
            .list_issues(&self.credential, team_id, page_size, PaginationOrderBy::UpdatedAt)
            .await
    }

    pub async fn state(&self, id: &str) -> Result<WorkflowState, SourceError> {
        self.source.resolve_state(&self.credential, id).await
    }

    pub async fn user(&self, id: &str) -> Result<User, SourceError> {
        self.source.resolve_user(&self.credential, id).await
    }

    pub async fn project(&self, id: &str) -> Result<Project, SourceError> {
        self.source.resolve_project(&self.credential, id).await
    }
}

/// Process-lifetime state of the issue source adapter.
///
/// Every cache is partitioned by workspace id. First population happens exactly once per workspace, even when the
/// aggregate view asks for all workspaces at the same time. Failed lookups are not cached.
pub struct SourceContext<S> {
    source: Arc<S>,
    registry: WorkspaceRegistry,
    page_size: u32,
    clients: Mutex<HashMap<String, Arc<WorkspaceClient<S>>>>,
    team_ids: CellMap<TeamId>,
    workflow_states: CellMap<Arc<Vec<WorkflowState>>>,
}

impl<S: IssueSource> SourceContext<S> {
    pub fn new(source: S, registry: WorkspaceRegistry) -> Self {
        Self {
            source: Arc::new(source),
            registry,
            page_size: DEFAULT_PAGE_SIZE,
            clients: Default::default(),
            team_ids: Default::default(),
            workflow_states: Default::default(),
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn registry(&self) -> &WorkspaceRegistry {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// The client handle for `workspace`, built on first use.
    pub fn client(&self, workspace: &str) -> Result<Arc<WorkspaceClient<S>>, FetchError> {
        if workspace == ALL_WORKSPACES || self.registry.get(workspace).is_none() {
            return Err(FetchError::UnknownWorkspace(workspace.to_string()));
        }
        let credential = self
            .registry
            .credential(workspace)
            .ok_or_else(|| FetchError::MissingCredential(workspace.to_string()))?;

        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);
        let client = clients.entry(workspace.to_string()).or_insert_with(|| {
            debug!(workspace, "creating issue tracker client");
            Arc::new(WorkspaceClient {
                workspace: workspace.to_string(),
                credential: credential.clone(),
                source: self.source.clone(),
            })
        });
        Ok(client.clone())
    }

    /// First team visible to the workspace credential.
    #[instrument(level = "debug", skip(self))]
    pub async fn team_id(&self, workspace: &str) -> Result<TeamId, FetchError> {
        let client = self.client(workspace)?;
        let cell = cell_for(&self.team_ids, workspace);
        let team_id = cell
            .get_or_try_init(|| async {
                let teams = client
                    .teams()
                    .await
                    .map_err(|err| FetchError::from_source(workspace, err))?;
                let team = teams.into_iter().next().ok_or_else(|| FetchError::NoTeamFound {
                    workspace: workspace.to_string(),
                })?;
                debug!(workspace, team = %team.name, "resolved team");
                Ok::<_, FetchError>(team.id)
            })
            .await?;
        Ok(team_id.clone())
    }

    /// Workflow states of the workspace, fetched once and kept for the lifetime of the context.
    #[instrument(level = "debug", skip(self))]
    pub async fn workflow_states(&self, workspace: &str) -> Result<Arc<Vec<WorkflowState>>, FetchError> {
        let client = self.client(workspace)?;
        let cell = cell_for(&self.workflow_states, workspace);
        let states = cell
            .get_or_try_init(|| async {
                let states = client
                    .workflow_states()
                    .await
                    .map_err(|err| FetchError::from_source(workspace, err))?;
                debug!(workspace, count = states.len(), "cached workflow states");
                Ok::<_, FetchError>(Arc::new(states))
            })
            .await?;
        Ok(states.clone())
    }

    /// Most recently updated issues of the workspace team, with every reference resolved. Source order is kept.
    #[instrument(level = "debug", skip(self))]
    pub async fn fetch_issues(&self, workspace: &str) -> Result<Vec<RawIssue>, FetchError> {
        let client = self.client(workspace)?;
        let (team_id, states) = tokio::try_join!(self.team_id(workspace), self.workflow_states(workspace))?;

        let nodes = client
            .issues(&team_id, self.page_size)
            .await
            .map_err(|err| FetchError::from_source(workspace, err))?;
        debug!(workspace, count = nodes.len(), "fetched issues");

        try_join_all(nodes.into_iter().map(|node| resolve_issue(&client, &states, node)))
            .await
            .map_err(|err| FetchError::from_source(workspace, err))
    }
}

/// Resolve the three references of one issue concurrently. Known states come from the cache.
async fn resolve_issue<S: IssueSource>(
    client: &WorkspaceClient<S>,
    states: &[WorkflowState],
    node: IssueNode,
) -> Result<RawIssue, SourceError> {
    let state = async {
        match &node.state {
            None => Ok(None),
            Some(reference) => match states.iter().find(|state| state.id == reference.id) {
                Some(state) => Ok(Some(state.clone())),
                None => client.state(&reference.id).await.map(Some),
            },
        }
    };
    let assignee = async {
        match &node.assignee {
            None => Ok(None),
            Some(reference) => client.user(&reference.id).await.map(Some),
        }
    };
    let project = async {
        match &node.project {
            None => Ok(None),
            Some(reference) => client.project(&reference.id).await.map(Some),
        }
    };
    let (state, assignee, project) = tokio::try_join!(state, assignee, project)?;

    Ok(RawIssue {
        id: node.id,
        title: node.title,
        due_date: node.due_date,
        created_at: node.created_at,
        state,
        assignee,
        project,
    })
}
