use crate::filter::Filter;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// Download configuration: one optional filter per chat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Trace filter evaluation for every chat
    pub debug: bool,
    #[serde(rename = "chat")]
    pub chats: Vec<ChatConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub chat_id: i64,
    /// Messages are downloaded only when this expression holds; absent means all
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_filter: Option<String>,
}

/// A configured filter that failed pre-flight validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterDiagnostic {
    pub chat_id: i64,
    pub filter: String,
    pub message: String,
}

impl DownloadConfig {
    pub fn chat(&self, chat_id: i64) -> Option<&ChatConfig> {
        self.chats.iter().find(|chat| chat.chat_id == chat_id)
    }
}

pub fn load_config(path: Option<&Path>) -> Result<DownloadConfig, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(DownloadConfig::default())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<DownloadConfig, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    parse_config(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

pub fn parse_config(raw: &str) -> Result<DownloadConfig, toml::de::Error> {
    toml::from_str::<DownloadConfig>(raw)
}

/// Check every configured filter for syntax and type errors
///
/// Uses default metadata, so no representative message is needed.
pub fn validate_config(config: &DownloadConfig) -> Vec<FilterDiagnostic> {
    let filter = Filter::new();
    config
        .chats
        .iter()
        .filter_map(|chat| {
            let expr = chat.download_filter.as_deref()?;
            match filter.check_filter(expr) {
                (true, _) => None,
                (false, message) => Some(FilterDiagnostic {
                    chat_id: chat.chat_id,
                    filter: expr.to_string(),
                    message: message.unwrap_or_default(),
                }),
            }
        })
        .collect()
}
