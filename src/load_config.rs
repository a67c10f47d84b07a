//! `load_config` module: merges an optional static YAML file with environment
//! variables into a [`WorkerConfig`].
//!
//! The YAML file carries only non-secret settings:
//!
//! ```yaml
//! bucket: models
//! destination: /runpod-volume/models
//! storage_endpoint: https://storage.googleapis.com
//! credential_mode: in_memory   # or: file
//! ```
//!
//! Environment variables override the file: `BUCKET_NAME`, `SYNC_DESTINATION`,
//! `STORAGE_ENDPOINT`. The credential is read only from `GCS_CREDENTIALS_JSON`.
//! Empty variables count as unset.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{error, info};

use crate::config::WorkerConfig;
use crate::contract::CredentialMode;

pub const ENV_BUCKET: &str = "BUCKET_NAME";
pub const ENV_DESTINATION: &str = "SYNC_DESTINATION";
pub const ENV_ENDPOINT: &str = "STORAGE_ENDPOINT";
pub const ENV_CREDENTIAL: &str = "GCS_CREDENTIALS_JSON";

#[derive(Debug, Default, Deserialize)]
struct StaticConfig {
    #[serde(default)]
    bucket: Option<String>,
    #[serde(default)]
    destination: Option<PathBuf>,
    #[serde(default)]
    storage_endpoint: Option<String>,
    #[serde(default)]
    credential_mode: Option<CredentialModeYaml>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CredentialModeYaml {
    InMemory,
    File,
}

impl From<CredentialModeYaml> for CredentialMode {
    fn from(m: CredentialModeYaml) -> Self {
        match m {
            CredentialModeYaml::InMemory => CredentialMode::InMemory,
            CredentialModeYaml::File => CredentialMode::File,
        }
    }
}

/// Loads the optional YAML file at `path`, then applies the process environment.
pub fn load_config(path: Option<&Path>) -> Result<WorkerConfig> {
    let static_conf = match path {
        Some(path) => read_static(path)?,
        None => StaticConfig::default(),
    };
    let config = merge(static_conf, |key| std::env::var(key).ok());
    config.trace_loaded();
    Ok(config)
}

fn read_static(path: &Path) -> Result<StaticConfig> {
    info!(config_path = ?path, "Loading configuration from file");
    let content = fs::read_to_string(path).map_err(|e| {
        error!(error = ?e, config_path = ?path, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path, e)
    })?;
    // An empty document deserializes as null, not as an empty mapping.
    if content.trim().is_empty() {
        return Ok(StaticConfig::default());
    }
    serde_yaml::from_str(&content)
        .map_err(|e| {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            e
        })
        .context("Failed to parse config YAML")
}

fn merge(static_conf: StaticConfig, env: impl Fn(&str) -> Option<String>) -> WorkerConfig {
    let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());
    let mut config = WorkerConfig::default();

    if let Some(bucket) = lookup(ENV_BUCKET).or(static_conf.bucket) {
        config.bucket = bucket;
    }
    if let Some(destination) = lookup(ENV_DESTINATION)
        .map(PathBuf::from)
        .or(static_conf.destination)
    {
        config.destination = destination;
    }
    if let Some(endpoint) = lookup(ENV_ENDPOINT).or(static_conf.storage_endpoint) {
        config.storage_endpoint = endpoint;
    }
    if let Some(mode) = static_conf.credential_mode {
        config.credential_mode = mode.into();
    }
    config.credential = lookup(ENV_CREDENTIAL);
    config
}
