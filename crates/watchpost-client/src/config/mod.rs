//! Console configuration.
//!
//! The file is located through `WATCHPOST_CONFIG`, else `watchpost.yaml` in
//! the working directory. Unknown keys are rejected and `validate()` runs
//! before a config is returned.

pub mod schema;

use std::path::{Path, PathBuf};

use watchpost_core::error::{Result, WatchpostError};

pub use schema::{ConsoleConfig, DedupSection, DispatchSection, ServerSection, TransportSection};

pub const CONFIG_ENV: &str = "WATCHPOST_CONFIG";
pub const DEFAULT_PATH: &str = "watchpost.yaml";

/// Resolve the config path from the value of [`CONFIG_ENV`], if set.
/// A blank value counts as unset.
pub fn config_path(env_value: Option<&str>) -> PathBuf {
    match env_value.map(str::trim) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => PathBuf::from(DEFAULT_PATH),
    }
}

/// Load the config named by the environment.
pub fn load() -> Result<ConsoleConfig> {
    let env_value = std::env::var(CONFIG_ENV).ok();
    load_from_file(config_path(env_value.as_deref()))
}

pub fn load_from_file(path: impl AsRef<Path>) -> Result<ConsoleConfig> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).inspect_err(|e| {
        tracing::error!(path = %path.display(), error = %e, "config read failed");
    })?;
    let cfg = load_from_str(&text)?;
    tracing::info!(
        path = %path.display(),
        host = %cfg.server.host,
        port = cfg.server.port,
        "config loaded"
    );
    Ok(cfg)
}

pub fn load_from_str(text: &str) -> Result<ConsoleConfig> {
    let cfg: ConsoleConfig = serde_yaml::from_str(text)
        .map_err(|e| WatchpostError::BadRequest(format!("config yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
