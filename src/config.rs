//! Configuration for dashver.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (a `.env` file in the working directory is loaded first)
//! 2. Config file (.dashver/config.yaml)
//! 3. Defaults
//!
//! Config file discovery:
//! - Searches current directory and parents for .dashver/config.yaml
//! - Paths in config file are relative to the project root (parent of .dashver/)

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

pub const DEFAULT_DASHBOARD_UID: &str = "rYdddlPWk";
pub const DEFAULT_DASHBOARD_PATH: &str = "dashboards/node-exporter.json";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 5000;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub grafana: GrafanaConfig,
    #[serde(default)]
    pub repo: RepoConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub timeouts: Option<TimeoutsConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GrafanaConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub dashboard_uid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepoConfig {
    /// Git working tree (relative to the project root)
    pub path: Option<String>,
    /// Dashboard file, relative to the repository
    pub dashboard: Option<String>,
    /// Current version pointer file (relative to the project root)
    pub state_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutsConfig {
    pub http_seconds: Option<u64>,
    pub git_seconds: Option<u64>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Grafana base URL (required by flows that talk to the service)
    pub grafana_url: Option<String>,
    /// Grafana API token
    pub grafana_token: Option<String>,
    /// UID of the managed dashboard
    pub dashboard_uid: String,
    /// Git working tree holding the dashboard
    pub repo_dir: PathBuf,
    /// Dashboard file, relative to `repo_dir`
    pub dashboard_path: String,
    /// Current version pointer file
    pub state_file: PathBuf,
    /// HTTP API bind settings
    pub server: ServerSettings,
    /// Timeouts for external calls
    pub timeouts: Timeouts,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeouts {
    pub http_seconds: u64,
    pub git_seconds: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            http_seconds: 30,
            git_seconds: 60,
        }
    }
}

impl ResolvedConfig {
    /// `host:port` for the HTTP API
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Absolute path of the live dashboard file
    pub fn dashboard_file(&self) -> PathBuf {
        self.repo_dir.join(&self.dashboard_path)
    }

    /// Token with all but a short prefix masked, for display
    pub fn redacted_token(&self) -> Option<String> {
        self.grafana_token.as_ref().map(|token| {
            let prefix: String = token.chars().take(4).collect();
            format!("{}****", prefix)
        })
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".dashver").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

fn parse_env<T>(env: &HashMap<String, String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env.get(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .with_context(|| format!("Invalid value for {}: {}", key, value))
        })
        .transpose()
}

/// Merge env vars, an optional config file, and defaults
fn resolve(
    env: &HashMap<String, String>,
    config_file: Option<PathBuf>,
    cwd: &Path,
) -> Result<ResolvedConfig> {
    let file = match config_file {
        Some(ref path) => load_config_file(path)?,
        None => ConfigFile::default(),
    };

    // Project root is the parent of .dashver/ (grandparent of config.yaml)
    let base_dir = config_file
        .as_deref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .unwrap_or(cwd)
        .to_path_buf();

    let var = |key: &str| env.get(key).filter(|v| !v.trim().is_empty()).cloned();

    let repo_dir = if let Some(dir) = var("DASHVER_REPO") {
        PathBuf::from(dir)
    } else if let Some(ref dir) = file.repo.path {
        resolve_path(&base_dir, dir)
    } else {
        base_dir.clone()
    };

    let state_file = if let Some(path) = var("DASHVER_STATE_FILE") {
        PathBuf::from(path)
    } else if let Some(ref path) = file.repo.state_file {
        resolve_path(&base_dir, path)
    } else {
        repo_dir
            .join(".dashver")
            .join("state")
            .join("current_version.txt")
    };

    let dashboard_path = var("DASHVER_DASHBOARD_PATH")
        .or(file.repo.dashboard)
        .unwrap_or_else(|| DEFAULT_DASHBOARD_PATH.to_string());

    let server = ServerSettings {
        host: var("DASHVER_HOST")
            .or(file.server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: parse_env(env, "DASHVER_PORT")?
            .or(file.server.port)
            .unwrap_or(DEFAULT_PORT),
    };

    let defaults = Timeouts::default();
    let timeouts = Timeouts {
        http_seconds: parse_env(env, "DASHVER_HTTP_TIMEOUT_SECS")?
            .or(file.timeouts.as_ref().and_then(|t| t.http_seconds))
            .unwrap_or(defaults.http_seconds),
        git_seconds: parse_env(env, "DASHVER_GIT_TIMEOUT_SECS")?
            .or(file.timeouts.as_ref().and_then(|t| t.git_seconds))
            .unwrap_or(defaults.git_seconds),
    };

    Ok(ResolvedConfig {
        grafana_url: var("GRAFANA_URL").or(file.grafana.url),
        grafana_token: var("GRAFANA_API_TOKEN").or(file.grafana.token),
        dashboard_uid: var("DASHBOARD_UID")
            .or(file.grafana.dashboard_uid)
            .unwrap_or_else(|| DEFAULT_DASHBOARD_UID.to_string()),
        repo_dir,
        dashboard_path,
        state_file,
        server,
        timeouts,
        config_file,
    })
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    dotenvy::dotenv().ok();

    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    let env: HashMap<String, String> = std::env::vars().collect();

    resolve(&env, find_config_file(), &cwd)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}
