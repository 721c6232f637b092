//! Minimal GraphQL client for the Linear issue tracker.
//!
//! Only the read queries needed to build content metrics are covered: teams, workflow states, issues and the
//! lookups that resolve the references an issue points to.

#[macro_use]
extern crate tracing;

mod error;
mod queries;
mod types;

pub use error::{
    Error,
    Result,
    RATE_LIMITED_CODE,
};
use serde::{
    de::DeserializeOwned,
    Deserialize,
};
use std::time::Duration;
pub use types::*;
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "https://api.linear.app/graphql";

#[derive(Debug, Clone)]
pub struct LinearClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl LinearClient {
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub async fn teams(&self, api_key: &str) -> Result<Vec<Team>> {
        #[derive(Deserialize)]
        struct Data {
            teams: Connection<Team>,
        }
        let data: Data = self.query(api_key, queries::TEAMS, serde_json::json!({})).await?;
        Ok(data.teams.nodes)
    }

    pub async fn workflow_states(&self, api_key: &str) -> Result<Vec<WorkflowState>> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            workflow_states: Connection<WorkflowState>,
        }
        let data: Data = self
            .query(api_key, queries::WORKFLOW_STATES, serde_json::json!({}))
            .await?;
        Ok(data.workflow_states.nodes)
    }

    pub async fn issues(
        &self,
        api_key: &str,
        team_id: &str,
        first: u32,
        order_by: PaginationOrderBy,
    ) -> Result<Vec<IssueNode>> {
        #[derive(Deserialize)]
        struct Data {
            issues: Connection<IssueNode>,
        }
        let variables = serde_json::json!({
            "teamId": team_id,
            "first": first,
            "orderBy": order_by,
        });
        let data: Data = self.query(api_key, queries::ISSUES, variables).await?;
        Ok(data.issues.nodes)
    }

    pub async fn workflow_state(&self, api_key: &str, id: &str) -> Result<WorkflowState> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Data {
            workflow_state: Option<WorkflowState>,
        }
        let data: Data = self
            .query(api_key, queries::WORKFLOW_STATE, serde_json::json!({ "id": id }))
            .await?;
        data.workflow_state.ok_or_else(|| Error::NotFound {
            entity: "workflow state",
            id: id.to_string(),
        })
    }

    pub async fn user(&self, api_key: &str, id: &str) -> Result<User> {
        #[derive(Deserialize)]
        struct Data {
            user: Option<User>,
        }
        let data: Data = self.query(api_key, queries::USER, serde_json::json!({ "id": id })).await?;
        data.user.ok_or_else(|| Error::NotFound {
            entity: "user",
            id: id.to_string(),
        })
    }

    pub async fn project(&self, api_key: &str, id: &str) -> Result<Project> {
        #[derive(Deserialize)]
        struct Data {
            project: Option<Project>,
        }
        let data: Data = self
            .query(api_key, queries::PROJECT, serde_json::json!({ "id": id }))
            .await?;
        data.project.ok_or_else(|| Error::NotFound {
            entity: "project",
            id: id.to_string(),
        })
    }

    async fn query<T: DeserializeOwned>(&self, api_key: &str, query: &str, variables: serde_json::Value) -> Result<T> {
        trace!(endpoint = %self.endpoint, "sending GraphQL request");
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::AUTHORIZATION, api_key)
            .json(&serde_json::json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        parse_response(status, &body)
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    extensions: Option<GraphQlErrorExtensions>,
}

#[derive(Debug, Deserialize)]
struct GraphQlErrorExtensions {
    #[serde(default)]
    code: Option<String>,
}

impl GraphQlError {
    fn is_rate_limited(&self) -> bool {
        let code_matches = self
            .extensions
            .as_ref()
            .and_then(|ext| ext.code.as_deref())
            .is_some_and(|code| code == RATE_LIMITED_CODE);
        code_matches || self.message.to_lowercase().contains("rate limit")
    }
}

/// Turn a raw HTTP response into typed data, classifying throttling separately from other failures.
pub fn parse_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T> {
    const TOO_MANY_REQUESTS: u16 = 429;

    let envelope = serde_json::from_str::<GraphQlResponse<T>>(body);

    if let Ok(GraphQlResponse { errors, .. }) = &envelope {
        if let Some(throttled) = errors.iter().find(|err| err.is_rate_limited()) {
            warn!(status, message = %throttled.message, "issue tracker rate limit hit");
            return Err(Error::RateLimited {
                message: throttled.message.clone(),
            });
        }
    }

    if status == TOO_MANY_REQUESTS {
        warn!(status, "issue tracker rate limit hit");
        return Err(Error::RateLimited {
            message: format!("HTTP {status} Too Many Requests"),
        });
    }

    match envelope {
        Ok(GraphQlResponse { errors, .. }) if !errors.is_empty() => {
            Err(Error::GraphQl(errors.into_iter().map(|err| err.message).collect()))
        }
        Ok(GraphQlResponse { data: Some(data), .. }) if (200..300).contains(&status) => Ok(data),
        Ok(GraphQlResponse { data: None, .. }) if (200..300).contains(&status) => Err(Error::EmptyResponse),
        Ok(_) => Err(Error::Status {
            status,
            body: body.to_string(),
        }),
        Err(_) if !(200..300).contains(&status) => Err(Error::Status {
            status,
            body: body.to_string(),
        }),
        Err(err) => Err(Error::Decode(err)),
    }
}
