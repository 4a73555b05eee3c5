//! Runtime configuration.
//!
//! Every field has a default, so an empty JSON object (or an empty
//! environment) yields a working configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use docrules_core::{RuleId, WorkspaceName};

use crate::jobs::JobExecutorConfig;

pub const ENV_DEFAULT_WORKSPACE: &str = "DOCRULES_DEFAULT_WORKSPACE";
pub const ENV_MARKER_TYPE: &str = "DOCRULES_MARKER_TYPE";
pub const ENV_JOB_WORKERS: &str = "DOCRULES_JOB_WORKERS";
pub const ENV_JOB_POLL_INTERVAL_MS: &str = "DOCRULES_JOB_POLL_INTERVAL_MS";
pub const ENV_EXECUTOR_NAME: &str = "DOCRULES_EXECUTOR_NAME";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("configuration could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocRulesConfig {
    /// Workspace a background job falls back to when its payload has none.
    pub default_workspace: WorkspaceName,
    pub dispatch: DispatchConfig,
    pub executor: ExecutorSettings,
}

impl Default for DocRulesConfig {
    fn default() -> Self {
        Self {
            default_workspace: WorkspaceName::new("default"),
            dispatch: DispatchConfig::default(),
            executor: ExecutorSettings::default(),
        }
    }
}

/// How folder configuration is read by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Mixin marking a folder as carrying document rules. Rule mixins
    /// extend it.
    pub marker_type: String,
    pub background_flag_prefix: String,
    pub background_flag_suffix: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            marker_type: "jmix:applyDocumentRules".to_string(),
            background_flag_prefix: "j:".to_string(),
            background_flag_suffix: "AsBackgroundJob".to_string(),
        }
    }
}

impl DispatchConfig {
    /// Folder property holding the background flag of `rule_id`,
    /// e.g. `j:createPDFAsBackgroundJob`.
    pub fn background_flag(&self, rule_id: &RuleId) -> String {
        format!(
            "{}{}{}",
            self.background_flag_prefix, rule_id, self.background_flag_suffix
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    pub name: String,
    pub workers: usize,
    pub poll_interval_ms: u64,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            name: "docrules-jobs".to_string(),
            workers: 2,
            poll_interval_ms: 100,
        }
    }
}

impl ExecutorSettings {
    pub fn to_executor_config(&self) -> JobExecutorConfig {
        JobExecutorConfig::default()
            .with_name(self.name.clone())
            .with_workers(self.workers)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
    }
}

impl DocRulesConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from a variable lookup; unset variables keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(ws) = lookup(ENV_DEFAULT_WORKSPACE) {
            config.default_workspace = WorkspaceName::new(ws);
        }
        if let Some(marker) = lookup(ENV_MARKER_TYPE) {
            config.dispatch.marker_type = marker;
        }
        if let Some(name) = lookup(ENV_EXECUTOR_NAME) {
            config.executor.name = name;
        }
        if let Some(workers) = lookup(ENV_JOB_WORKERS) {
            config.executor.workers = parse_number(ENV_JOB_WORKERS, &workers)?;
        }
        if let Some(ms) = lookup(ENV_JOB_POLL_INTERVAL_MS) {
            config.executor.poll_interval_ms = parse_number(ENV_JOB_POLL_INTERVAL_MS, &ms)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_workspace.is_empty() {
            return Err(ConfigError::Invalid("default_workspace must not be empty".into()));
        }
        if self.dispatch.marker_type.trim().is_empty() {
            return Err(ConfigError::Invalid("dispatch.marker_type must not be empty".into()));
        }
        if self.executor.workers == 0 {
            return Err(ConfigError::Invalid("executor.workers must be at least 1".into()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}: expected a number, got {raw:?}")))
}
