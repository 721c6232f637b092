use clap::Parser;
use std::path::PathBuf;

/// Content pipeline metrics across issue tracker workspaces
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version = version(), about, long_about = None)]
pub struct Args {
    /// Workspace to show. Use `all` for the aggregate across every configured workspace.
    #[clap(long, short, value_name = "ID")]
    pub workspace: Option<String>,

    /// Ignore cached metrics and fetch from the issue tracker.
    #[clap(long, action)]
    pub force: bool,

    /// Keep running and refresh whenever the cached metrics go stale.
    #[clap(long, action)]
    pub watch: bool,

    /// Write the dashboard snapshot as JSON instead of printing the report.
    #[clap(long, value_name = "FILE")]
    pub output_file: Option<PathBuf>,

    /// Show every author instead of the top five.
    #[clap(long, action)]
    pub all_authors: bool,

    /// List the configured workspaces and exit.
    #[clap(long, action)]
    pub list_workspaces: bool,

    /// Print the effective configuration and exit.
    #[clap(long, action)]
    pub show_config: bool,

    /// Additional configuration file layered on top of the stored configuration.
    #[clap(long, value_name = "FILE", env = "CONTENT_PIPELINE_CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Enables debug logging.
    #[clap(long, short, action)]
    pub verbose: bool,
}

mod config_ext {
    use super::*;
    use config::{
        Map,
        Source,
        Value,
    };
    use std::collections::HashMap;

    impl Source for Args {
        fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
            Box::new((*self).clone())
        }

        fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
            let mut cache = HashMap::<String, Value>::new();
            if let Some(workspace) = &self.workspace {
                cache.insert("default_workspace".to_string(), workspace.clone().into());
            }
            if self.verbose {
                cache.insert("verbose".to_string(), true.into());
            }
            Ok(cache)
        }
    }
}

pub fn version() -> String {
    let author = clap::crate_authors!();
    let config_file_path = crate::config_file().display().to_string();

    format!(
        "{}

Authors: {author}

Config file: {config_file_path}",
        clap::crate_version!()
    )
}
