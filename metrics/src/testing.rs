//! In-memory fakes shared by the unit tests.

use crate::{
    collectors::Collector,
    metrics::ContentMetrics,
    source::{
        Credential,
        IssueNode,
        IssueSource,
        NodeRef,
        PaginationOrderBy,
        Project,
        RawIssue,
        Team,
        User,
        WorkflowState,
    },
    FetchError,
    SourceError,
};
use chrono::{
    DateTime,
    NaiveDate,
    TimeZone,
    Utc,
};
use content_pipeline_config::{
    Config,
    WorkspaceConfig,
    WorkspaceRegistry,
};
use futures::{
    future::BoxFuture,
    FutureExt,
};
use std::{
    collections::{
        HashMap,
        VecDeque,
    },
    future::Future,
    pin::Pin,
    sync::{
        atomic::{
            AtomicUsize,
            Ordering,
        },
        Mutex,
    },
    time::Duration,
};

fn created_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
}

pub fn issue_node(id: &str, state: Option<&str>, assignee: Option<&str>, project: Option<&str>) -> IssueNode {
    let reference = |id: Option<&str>| id.map(|id| NodeRef { id: id.to_string() });
    IssueNode {
        id: id.to_string(),
        title: format!("Issue {id}"),
        due_date: None,
        created_at: created_at(),
        state: reference(state),
        assignee: reference(assignee),
        project: reference(project),
    }
}

pub fn dated_issue_node(id: &str, due: NaiveDate) -> IssueNode {
    IssueNode {
        due_date: Some(due),
        ..issue_node(id, None, None, None)
    }
}

/// Resolved issue without state, assignee, project or due date. Refine it with the builder methods below.
pub fn raw_issue(id: &str) -> RawIssue {
    RawIssue {
        id: id.to_string(),
        title: format!("Issue {id}"),
        due_date: None,
        created_at: created_at(),
        state: None,
        assignee: None,
        project: None,
    }
}

impl RawIssue {
    pub fn state(mut self, name: &str) -> Self {
        self.state = Some(WorkflowState {
            id: format!("state-{name}"),
            name: name.to_string(),
            kind: "unstarted".to_string(),
        });
        self
    }

    pub fn assignee(mut self, name: &str) -> Self {
        self.assignee = Some(User {
            id: format!("user-{name}"),
            name: name.to_string(),
            display_name: None,
        });
        self
    }

    pub fn project(mut self, name: &str) -> Self {
        self.project = Some(Project {
            id: format!("project-{name}"),
            name: name.to_string(),
        });
        self
    }

    pub fn due(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn created(mut self, year: i32, month: u32, day: u32) -> Self {
        self.created_at = Utc.with_ymd_and_hms(year, month, day, 10, 0, 0).unwrap();
        self
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub list_teams: usize,
    pub list_workflow_states: usize,
    pub list_issues: usize,
    pub resolve_state: usize,
    pub resolve_user: usize,
    pub resolve_project: usize,
}

#[derive(Debug, Clone, Copy)]
enum FailureKind {
    RateLimited,
    Generic,
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    kind: FailureKind,
    /// `None` fails forever.
    remaining: Option<usize>,
}

/// Issue tracker with canned data per workspace. The credential `key-<workspace>` selects the workspace.
#[derive(Debug, Default)]
pub struct FakeIssueSource {
    teams: HashMap<String, Vec<Team>>,
    states: HashMap<String, Vec<WorkflowState>>,
    remote_states: HashMap<String, WorkflowState>,
    users: HashMap<String, User>,
    projects: HashMap<String, Project>,
    issues: HashMap<String, Vec<IssueNode>>,
    latency: HashMap<String, Duration>,
    lookup_latency: Option<Duration>,
    failures: Mutex<HashMap<String, Failure>>,
    calls: Mutex<CallCounts>,
}

impl FakeIssueSource {
    /// Registry with one credentialed workspace per id.
    pub fn registry(ids: &[&str]) -> WorkspaceRegistry {
        let mut config = Config::from_yaml_str("{}").unwrap();
        config.workspaces = ids
            .iter()
            .map(|id| WorkspaceConfig::new(id).with_api_key(format!("key-{id}")))
            .collect();
        WorkspaceRegistry::from_config_with_env(&config, |_| None)
    }

    pub fn with_team(mut self, workspace: &str, team_id: &str) -> Self {
        self.teams.entry(workspace.to_string()).or_default().push(Team {
            id: team_id.to_string(),
            name: format!("Team {team_id}"),
            key: None,
        });
        self
    }

    pub fn with_state(mut self, workspace: &str, id: &str, name: &str) -> Self {
        self.states.entry(workspace.to_string()).or_default().push(WorkflowState {
            id: id.to_string(),
            name: name.to_string(),
            kind: "started".to_string(),
        });
        self
    }

    /// A state missing from the workflow state listing, only reachable by id.
    pub fn with_remote_state(mut self, id: &str, name: &str) -> Self {
        self.remote_states.insert(
            id.to_string(),
            WorkflowState {
                id: id.to_string(),
                name: name.to_string(),
                kind: "completed".to_string(),
            },
        );
        self
    }

    pub fn with_user(mut self, id: &str, name: &str) -> Self {
        self.users.insert(
            id.to_string(),
            User {
                id: id.to_string(),
                name: name.to_string(),
                display_name: None,
            },
        );
        self
    }

    pub fn with_project(mut self, id: &str, name: &str) -> Self {
        self.projects.insert(
            id.to_string(),
            Project {
                id: id.to_string(),
                name: name.to_string(),
            },
        );
        self
    }

    pub fn with_issues(mut self, workspace: &str, issues: Vec<IssueNode>) -> Self {
        self.issues.insert(workspace.to_string(), issues);
        self
    }

    /// Delay issue listing of `workspace`.
    pub fn with_latency(mut self, workspace: &str, latency: Duration) -> Self {
        self.latency.insert(workspace.to_string(), latency);
        self
    }

    /// Delay every team, workflow state and reference lookup.
    pub fn with_lookup_latency(mut self, latency: Duration) -> Self {
        self.lookup_latency = Some(latency);
        self
    }

    async fn lookup_delay(&self) {
        if let Some(latency) = self.lookup_latency {
            tokio::time::sleep(latency).await;
        }
    }

    fn fail(self, workspace: &str, kind: FailureKind, remaining: Option<usize>) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(workspace.to_string(), Failure { kind, remaining });
        self
    }

    /// Issue listing of `workspace` is throttled once, then succeeds.
    pub fn rate_limited_once(self, workspace: &str) -> Self {
        self.fail(workspace, FailureKind::RateLimited, Some(1))
    }

    pub fn rate_limited(self, workspace: &str) -> Self {
        self.fail(workspace, FailureKind::RateLimited, None)
    }

    pub fn failing(self, workspace: &str) -> Self {
        self.fail(workspace, FailureKind::Generic, None)
    }

    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap()
    }

    fn record(&self, update: impl FnOnce(&mut CallCounts)) {
        update(&mut self.calls.lock().unwrap());
    }

    fn workspace(credential: &Credential) -> String {
        credential
            .expose()
            .strip_prefix("key-")
            .unwrap_or(credential.expose())
            .to_string()
    }

    fn take_failure(&self, workspace: &str) -> Option<SourceError> {
        let mut failures = self.failures.lock().unwrap();
        let failure = failures.get_mut(workspace)?;
        match &mut failure.remaining {
            Some(0) => return None,
            Some(remaining) => *remaining -= 1,
            None => {}
        }
        Some(match failure.kind {
            FailureKind::RateLimited => SourceError::RateLimited("Rate limit exceeded".to_string()),
            FailureKind::Generic => SourceError::other(eyre::eyre!("connection reset")),
        })
    }
}

fn not_found(entity: &str, id: &str) -> SourceError {
    SourceError::other(eyre::eyre!("{entity} {id} not found"))
}

impl IssueSource for FakeIssueSource {
    fn list_teams<'a>(&'a self, credential: &'a Credential) -> BoxFuture<'a, Result<Vec<Team>, SourceError>> {
        self.record(|calls| calls.list_teams += 1);
        let teams = self.teams.get(&Self::workspace(credential)).cloned().unwrap_or_default();
        async move {
            self.lookup_delay().await;
            Ok(teams)
        }
        .boxed()
    }

    fn list_workflow_states<'a>(
        &'a self,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Vec<WorkflowState>, SourceError>> {
        self.record(|calls| calls.list_workflow_states += 1);
        let states = self.states.get(&Self::workspace(credential)).cloned().unwrap_or_default();
        async move {
            self.lookup_delay().await;
            Ok(states)
        }
        .boxed()
    }

    fn list_issues<'a>(
        &'a self,
        credential: &'a Credential,
        _team_id: &'a str,
        page_size: u32,
        _order_by: PaginationOrderBy,
    ) -> BoxFuture<'a, Result<Vec<IssueNode>, SourceError>> {
        self.record(|calls| calls.list_issues += 1);
        let workspace = Self::workspace(credential);
        async move {
            if let Some(latency) = self.latency.get(&workspace) {
                tokio::time::sleep(*latency).await;
            }
            if let Some(err) = self.take_failure(&workspace) {
                return Err(err);
            }
            let mut issues = self.issues.get(&workspace).cloned().unwrap_or_default();
            issues.truncate(page_size as usize);
            Ok(issues)
        }
        .boxed()
    }

    fn resolve_state<'a>(
        &'a self,
        _credential: &'a Credential,
        id: &'a str,
    ) -> BoxFuture<'a, Result<WorkflowState, SourceError>> {
        self.record(|calls| calls.resolve_state += 1);
        let state = self.remote_states.get(id).cloned().ok_or_else(|| not_found("state", id));
        async move {
            self.lookup_delay().await;
            state
        }
        .boxed()
    }

    fn resolve_user<'a>(&'a self, _credential: &'a Credential, id: &'a str) -> BoxFuture<'a, Result<User, SourceError>> {
        self.record(|calls| calls.resolve_user += 1);
        let user = self.users.get(id).cloned().ok_or_else(|| not_found("user", id));
        async move {
            self.lookup_delay().await;
            user
        }
        .boxed()
    }

    fn resolve_project<'a>(
        &'a self,
        _credential: &'a Credential,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Project, SourceError>> {
        self.record(|calls| calls.resolve_project += 1);
        let project = self.projects.get(id).cloned().ok_or_else(|| not_found("project", id));
        async move {
            self.lookup_delay().await;
            project
        }
        .boxed()
    }
}

/// Collector replaying scripted results, then succeeding with empty metrics.
#[derive(Default)]
pub struct ScriptedCollector {
    script: Mutex<VecDeque<Result<ContentMetrics, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedCollector {
    pub fn push(&self, result: Result<ContentMetrics, FetchError>) {
        self.script.lock().unwrap().push_back(result);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Collector for ScriptedCollector {
    fn collect<'a>(
        &'a self,
        _workspace: &'a str,
        _now: DateTime<Utc>,
    ) -> Pin<Box<dyn Future<Output = Result<ContentMetrics, FetchError>> + Send + 'a>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let result = self.script.lock().unwrap().pop_front().unwrap_or_else(|| Ok(ContentMetrics::default()));
        Box::pin(async move { result })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
