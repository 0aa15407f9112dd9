//! Settings structures for multisearch configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main settings structure matching settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub search: SearchSettings,
    pub outgoing: OutgoingSettings,
    /// Data sources in registration order
    pub sources: Vec<SourceConfig>,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables (MULTISEARCH_* prefix, plus SLACK_TOKEN)
    pub fn merge_env(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    /// Merge overrides from an arbitrary variable lookup
    pub fn merge_vars<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = var("MULTISEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Some(val) = var("MULTISEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Some(val) = var("MULTISEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Some(val) = var("MULTISEARCH_TIMEOUT") {
            if let Ok(secs) = val.parse() {
                self.search.timeout = Some(secs);
            }
        }
        if let Some(token) = var("SLACK_TOKEN") {
            match self.sources.iter_mut().find(|s| s.kind == "slack") {
                Some(slack) if slack.token.is_none() => slack.token = Some(token),
                Some(_) => {}
                None => self.sources.push(SourceConfig {
                    name: "Slack".to_string(),
                    kind: "slack".to_string(),
                    token: Some(token),
                    ..Default::default()
                }),
            }
        }
    }

    /// Check values the rest of the crate relies on
    pub fn validate(&self) -> Result<()> {
        if self.search.max_results == 0 {
            bail!("search.max_results must be greater than 0");
        }
        if let Some(timeout) = self.search.timeout {
            check_seconds("search.timeout", timeout)?;
        }
        check_seconds("outgoing.request_timeout", self.outgoing.request_timeout)?;

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                bail!("every source needs a name");
            }
            if !names.insert(source.name.as_str()) {
                bail!("duplicate source name: {}", source.name);
            }
        }
        Ok(())
    }

    /// Get all enabled sources, in configured order
    pub fn enabled_sources(&self) -> Vec<&SourceConfig> {
        self.sources.iter().filter(|s| !s.disabled).collect()
    }
}

/// A positive, finite number of seconds that fits in a `Duration`
fn check_seconds(key: &str, secs: f64) -> Result<()> {
    if !(secs > 0.0) {
        bail!("{} must be greater than 0", key);
    }
    if Duration::try_from_secs_f64(secs).is_err() {
        bail!("{} is out of range: {}", key, secs);
    }
    Ok(())
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the health endpoint
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "multisearch".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 8888,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Deadline for one fan-out in seconds. Unset means wait for every source.
    pub timeout: Option<f64>,
    /// Default number of results rendered per answer
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            timeout: None,
            max_results: 10,
        }
    }
}

impl SearchSettings {
    /// Deadline as a duration, if one is configured
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
            .filter(|t| *t > 0.0)
            .and_then(|t| Duration::try_from_secs_f64(t).ok())
    }
}

/// Outgoing request settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutgoingSettings {
    /// Default request timeout in seconds
    pub request_timeout: f64,
    /// Appended to the user agent string
    pub useragent_suffix: Option<String>,
    /// Pool max size
    pub pool_maxsize: usize,
    /// Verify SSL certificates
    pub verify_ssl: bool,
    /// Proxy settings
    pub proxies: ProxySettings,
}

impl Default for OutgoingSettings {
    fn default() -> Self {
        Self {
            request_timeout: 10.0,
            useragent_suffix: None,
            pool_maxsize: 20,
            verify_ssl: true,
            proxies: ProxySettings::default(),
        }
    }
}

/// Proxy settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub http: Option<String>,
    pub https: Option<String>,
    pub all: Option<String>,
}

/// Individual data source configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Display name, used as `source` on results
    pub name: String,
    /// Implementation to use (`slack`, `wikipedia`, `documents`)
    pub kind: String,
    /// Whether the source is skipped at startup
    pub disabled: bool,
    /// Relevance keywords, replacing the built-in list
    pub keywords: Option<Vec<String>>,
    /// API token if required
    pub token: Option<String>,
    /// API base URL override
    pub base_url: Option<String>,
    /// File backing a local source
    pub path: Option<PathBuf>,
    /// Maximum results requested from the backend
    pub max_results: Option<u32>,
}
