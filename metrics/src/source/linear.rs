use super::{
    Credential,
    IssueNode,
    IssueSource,
    LinearClient,
    PaginationOrderBy,
    Project,
    Team,
    User,
    WorkflowState,
};
use crate::SourceError;
use futures::{
    future::BoxFuture,
    FutureExt,
    TryFutureExt,
};

impl IssueSource for LinearClient {
    fn list_teams<'a>(&'a self, credential: &'a Credential) -> BoxFuture<'a, Result<Vec<Team>, SourceError>> {
        self.teams(credential.expose()).err_into().boxed()
    }

    fn list_workflow_states<'a>(
        &'a self,
        credential: &'a Credential,
    ) -> BoxFuture<'a, Result<Vec<WorkflowState>, SourceError>> {
        self.workflow_states(credential.expose()).err_into().boxed()
    }

    fn list_issues<'a>(
        &'a self,
        credential: &'a Credential,
        team_id: &'a str,
        page_size: u32,
        order_by: PaginationOrderBy,
    ) -> BoxFuture<'a, Result<Vec<IssueNode>, SourceError>> {
        self.issues(credential.expose(), team_id, page_size, order_by)
            .err_into()
            .boxed()
    }

    fn resolve_state<'a>(
        &'a self,
        credential: &'a Credential,
        id: &'a str,
    ) -> BoxFuture<'a, Result<WorkflowState, SourceError>> {
        self.workflow_state(credential.expose(), id).err_into().boxed()
    }

    fn resolve_user<'a>(&'a self, credential: &'a Credential, id: &'a str) -> BoxFuture<'a, Result<User, SourceError>> {
        self.user(credential.expose(), id).err_into().boxed()
    }

    fn resolve_project<'a>(
        &'a self,
        credential: &'a Credential,
        id: &'a str,
    ) -> BoxFuture<'a, Result<Project, SourceError>> {
        self.project(credential.expose(), id).err_into().boxed()
    }
}
