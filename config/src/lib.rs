#[macro_use]
extern crate tracing;

mod args;
mod dirs;
pub mod duration;
mod workspace;

pub use args::Args;
pub use dirs::{
    config_dir,
    config_file,
    CONFIG_DIR_ENV,
};
use eyre::{
    eyre,
    Context,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::HashSet,
    time::Duration,
};
pub use workspace::{
    Credential,
    Workspace,
    WorkspaceConfig,
    WorkspaceRegistry,
    ALL_WORKSPACES,
};

const DEFAULT_CONFIG: &str = include_str!("default-config.yaml");

/// Upper bound the issue tracker accepts for a single page.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Ten years.
pub const MAX_UPCOMING_WINDOW_DAYS: u32 = 3650;

/// Longest back-off after the issue tracker throttled us.
pub const MAX_RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(7 * 24 * 60 * 60);

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    pub api_url: url::Url,
    #[serde(with = "duration")]
    pub refresh_interval: Duration,
    #[serde(with = "duration")]
    pub rate_limit_cooldown: Duration,
    #[serde(with = "duration")]
    pub request_timeout: Duration,
    pub upcoming_window_days: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_workspace: Option<String>,
    #[serde(default)]
    pub workspaces: Vec<WorkspaceConfig>,
    #[serde(default)]
    pub verbose: bool,
}

impl Config {
    /// Layers the built-in defaults, `config.yaml` from the config directory, an optional extra file and the
    /// command line arguments.
    pub fn new(args: Args) -> Result<Self, config::ConfigError> {
        let config_file = config_file();
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml))
            .add_source(
                config::File::from(config_file.as_path())
                    .format(config::FileFormat::Yaml)
                    .required(false),
            );

        if let Some(extra) = &args.config {
            builder = builder.add_source(config::File::from(extra.as_path()).format(config::FileFormat::Yaml));
        }

        builder = builder.add_source(args);

        let cfg: Self = builder.build()?.try_deserialize()?;
        debug!(workspaces = cfg.workspaces.len(), config_file = ?config_file, "configuration loaded");

        Ok(cfg)
    }

    /// Built-in defaults overlaid with the given YAML document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Yaml))
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
            .build()?
            .try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            return Err(eyre!("refresh_interval must be greater than zero"));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(eyre!("page_size must be between 1 and {MAX_PAGE_SIZE}, got {}", self.page_size));
        }
        if self.upcoming_window_days > MAX_UPCOMING_WINDOW_DAYS {
            return Err(eyre!(
                "upcoming_window_days must be at most {MAX_UPCOMING_WINDOW_DAYS}, got {}",
                self.upcoming_window_days
            ));
        }
        if self.rate_limit_cooldown > MAX_RATE_LIMIT_COOLDOWN {
            return Err(eyre!(
                "rate_limit_cooldown must be at most {}, got {}",
                humantime::format_duration(MAX_RATE_LIMIT_COOLDOWN),
                humantime::format_duration(self.rate_limit_cooldown)
            ));
        }

        let mut seen = HashSet::new();
        for workspace in &self.workspaces {
            if workspace.id.trim().is_empty() {
                return Err(eyre!("workspace ids must not be empty"));
            }
            if workspace.id == ALL_WORKSPACES {
                return Err(eyre!("workspace id {ALL_WORKSPACES:?} is reserved for the aggregate view"));
            }
            if !seen.insert(workspace.id.as_str()) {
                return Err(eyre!("workspace {:?} is configured more than once", workspace.id));
            }
        }
        Ok(())
    }

    /// The workspace shown when none is selected explicitly.
    pub fn initial_workspace(&self) -> String {
        self.default_workspace
            .clone()
            .unwrap_or_else(|| ALL_WORKSPACES.to_string())
    }

    pub fn upcoming_window(&self) -> Duration {
        Duration::from_secs(u64::from(self.upcoming_window_days) * 24 * 60 * 60)
    }

    /// The effective configuration as YAML. API keys are never included.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yml::to_string(self).context("Failed to serialize config")
    }
}
