pub(crate) const TEAMS: &str = "query Teams { teams { nodes { id name key } } }";

pub(crate) const WORKFLOW_STATES: &str = "query WorkflowStates { workflowStates(first: 250) { nodes { id name type } } }";

pub(crate) const ISSUES: &str = "
query Issues($teamId: ID!, $first: Int!, $orderBy: PaginationOrderBy) {
  issues(filter: { team: { id: { eq: $teamId } } }, first: $first, orderBy: $orderBy) {
    nodes {
      id
      title
      dueDate
      createdAt
      state { id }
      assignee { id }
      project { id }
    }
  }
}";

pub(crate) const WORKFLOW_STATE: &str = "query WorkflowState($id: String!) { workflowState(id: $id) { id name type } }";

pub(crate) const USER: &str = "query User($id: String!) { user(id: $id) { id name displayName } }";

pub(crate) const PROJECT: &str = "query Project($id: String!) { project(id: $id) { id name } }";
