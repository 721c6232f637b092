//! Location of the stored configuration.

use directories::ProjectDirs;
use std::{
    env,
    path::PathBuf,
};

/// Overrides the configuration directory.
pub const CONFIG_DIR_ENV: &str = "CONTENT_PIPELINE_CONFIG";

/// Name of the stored configuration file inside [`config_dir`].
pub const CONFIG_FILE: &str = "config.yaml";

lazy_static::lazy_static! {
    static ref PROJECT_DIRS: Option<ProjectDirs> = ProjectDirs::from("io", "content-pipeline", "content-pipeline");
}

/// `$CONTENT_PIPELINE_CONFIG`, else the platform config directory, else `./.config`.
pub fn config_dir() -> PathBuf {
    resolve_config_dir(env::var_os(CONFIG_DIR_ENV).map(PathBuf::from))
}

pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

fn resolve_config_dir(overridden: Option<PathBuf>) -> PathBuf {
    overridden
        .filter(|dir| !dir.as_os_str().is_empty())
        .or_else(|| PROJECT_DIRS.as_ref().map(|dirs| dirs.config_local_dir().to_path_buf()))
        .unwrap_or_else(|| PathBuf::from(".").join(".config"))
}
