//! Workspace registry: which issue tracker workspaces exist and which of them can be queried.

use crate::Config;
use derive_more::Debug;
use serde::{
    Deserialize,
    Serialize,
};

/// Identifier of the aggregate pseudo-workspace.
pub const ALL_WORKSPACES: &str = "all";

/// A workspace entry as written in the configuration file.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkspaceConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[debug(skip)]
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
}

impl WorkspaceConfig {
    pub fn new(id: impl ToString) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl ToString) -> Self {
        self.api_key = Some(api_key.to_string());
        self
    }

    /// Name of the environment variable the API key is read from when none is given inline.
    pub fn api_key_env_var(&self) -> String {
        self.api_key_env.clone().unwrap_or_else(|| {
            format!("LINEAR_{}_API_KEY", self.id.to_uppercase().replace(['-', '.', ' '], "_"))
        })
    }

    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("Workspace - {}", self.id))
    }
}

/// Workspace as shown to the user.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

impl Workspace {
    pub fn all() -> Self {
        Self {
            id: ALL_WORKSPACES.to_string(),
            name: "All Workspaces".to_string(),
        }
    }

    pub fn is_aggregate(&self) -> bool {
        self.id == ALL_WORKSPACES
    }
}

/// API key for one workspace. The secret never shows up in debug output.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[debug("Credential(***)")]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl ToString) -> Option<Self> {
        let secret = secret.to_string();
        let secret = secret.trim();
        (!secret.is_empty()).then(|| Self(secret.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

#[derive(Clone, Debug)]
struct RegisteredWorkspace {
    workspace: Workspace,
    credential: Option<Credential>,
}

/// Static mapping of workspace ids to credentials.
///
/// The display list contains every configured workspace, the active list only those with a credential.
#[derive(Clone, Debug, Default)]
pub struct WorkspaceRegistry {
    entries: Vec<RegisteredWorkspace>,
}

impl WorkspaceRegistry {
    /// Build the registry, reading missing API keys from the process environment.
    pub fn from_config(config: &Config) -> Self {
        Self::from_config_with_env(config, |name| std::env::var(name).ok())
    }

    pub fn from_config_with_env(config: &Config, env: impl Fn(&str) -> Option<String>) -> Self {
        let entries = config
            .workspaces
            .iter()
            .map(|ws| {
                let credential = ws
                    .api_key
                    .as_ref()
                    .and_then(Credential::new)
                    .or_else(|| env(&ws.api_key_env_var()).and_then(Credential::new));
                if credential.is_none() {
                    debug!(workspace = %ws.id, env = %ws.api_key_env_var(), "no API key configured");
                }
                RegisteredWorkspace {
                    workspace: Workspace {
                        id: ws.id.clone(),
                        name: ws.display_name(),
                    },
                    credential,
                }
            })
            .collect();
        Self { entries }
    }

    /// Every selectable workspace, the aggregate view first.
    pub fn list_workspaces(&self) -> Vec<Workspace> {
        std::iter::once(Workspace::all())
            .chain(self.entries.iter().map(|entry| entry.workspace.clone()))
            .collect()
    }

    /// Workspaces that can actually be queried, in configuration order.
    pub fn active_workspaces(&self) -> Vec<Workspace> {
        self.entries
            .iter()
            .filter(|entry| entry.credential.is_some())
            .map(|entry| entry.workspace.clone())
            .collect()
    }

    pub fn get(&self, id: &str) -> Option<&Workspace> {
        self.entries
            .iter()
            .find(|entry| entry.workspace.id == id)
            .map(|entry| &entry.workspace)
    }

    pub fn credential(&self, id: &str) -> Option<&Credential> {
        self.entries
            .iter()
            .find(|entry| entry.workspace.id == id)
            .and_then(|entry| entry.credential.as_ref())
    }

    pub fn is_known(&self, id: &str) -> bool {
        id == ALL_WORKSPACES || self.get(id).is_some()
    }
}
