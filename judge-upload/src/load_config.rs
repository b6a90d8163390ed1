//! `load_config` module: resolves the runtime [`Settings`] from an optional YAML file and the environment.
//!
//! This is the only place where the process environment and the optional config file are read.
//!
//! # Responsibilities
//! - Require the judge bearer token (`HASH_CODE_JUDGE_AUTH_TOKEN`) before anything else
//! - Parse the optional YAML config file (`api_base`, `builds_dir`, `data_sets`)
//! - Layer the `HASH_CODE_INPUT{n}_NAME` / `_ID` pairs from the environment over the file's data sets
//! - Refuse to continue without at least one data set
//!
//! # Errors
//! Errors are `anyhow::Error` with context and are surfaced at the CLI boundary.
//! Startup failures keep their [`StartupError`] as the root cause so callers can downcast.
use anyhow::{Context, Result};
use judge_upload_core::config::{DataSet, DataSetConfig, StartupError, AUTH_TOKEN_VAR};
use judge_upload_core::redact::shorten;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

pub const API_BASE_VAR: &str = "HASH_CODE_JUDGE_API_BASE";
pub const DEFAULT_API_BASE: &str = "https://hashcode-judge.appspot.com/api/judge/v1";
pub const DEFAULT_BUILDS_DIR: &str = ".builds";

/// Optional static config file. Holds no secrets.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub builds_dir: Option<PathBuf>,
    #[serde(default)]
    pub data_sets: Vec<DataSet>,
}

/// Everything a run needs: credential, endpoint, build location and data sets.
#[derive(Debug)]
pub struct Settings {
    pub token: SecretString,
    pub api_base: String,
    pub builds_dir: PathBuf,
    pub data_sets: DataSetConfig,
}

pub fn read_file_config<P: AsRef<Path>>(path: P) -> Result<FileConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(FileConfig::default());
    }

    match serde_yaml::from_str::<Option<FileConfig>>(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

/// Resolves [`Settings`] from `config_path` (if any) and `lookup`, which maps env var names to values.
pub fn load_settings<F>(config_path: Option<&Path>, lookup: F) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let token = match lookup(AUTH_TOKEN_VAR).filter(|t| !t.is_empty()) {
        Some(token) => SecretString::new(token),
        None => {
            error!("{AUTH_TOKEN_VAR} environment variable not set");
            return Err(StartupError::MissingCredential(AUTH_TOKEN_VAR.to_string()).into());
        }
    };
    debug!(token = %shorten(token.expose_secret()), "[CONFIG] auth token found");

    let file = match config_path {
        Some(path) => read_file_config(path)?,
        None => FileConfig::default(),
    };

    let api_base = lookup(API_BASE_VAR)
        .filter(|v| !v.is_empty())
        .or(file.api_base)
        .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
    let api_base = api_base.trim_end_matches('/').to_string();

    let builds_dir = file
        .builds_dir
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILDS_DIR));

    let data_sets = file
        .data_sets
        .into_iter()
        .collect::<DataSetConfig>()
        .merge(DataSetConfig::resolve(&lookup))
        .require_non_empty()
        .context("data set ids not initialized")?;

    info!(
        api_base = %api_base,
        builds_dir = %builds_dir.display(),
        data_sets = data_sets.len(),
        "Settings resolved"
    );

    Ok(Settings {
        token,
        api_base,
        builds_dir,
        data_sets,
    })
}

/// [`load_settings`] against the process environment.
pub fn load_settings_from_env(config_path: Option<&Path>) -> Result<Settings> {
    load_settings(config_path, |var| std::env::var(var).ok())
}
