use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::schema::CanonicalSchema;
use crate::types::{BackendInput, SourceTag};

/// Process configuration loaded from environment variables.
/// The schema and the fallback chain live in the TOML `FileConfig`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the TOML config. Defaults are used when unset.
    pub config_path: Option<PathBuf>,
    /// Root directory for persisted run logs.
    pub data_dir: PathBuf,
    /// How many items are reconciled at once in a batch.
    pub concurrency: usize,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT=json` selects JSON lines; anything else is text.
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let concurrency = match std::env::var("RECONCILE_CONCURRENCY") {
            Ok(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("RECONCILE_CONCURRENCY must be a number, got {raw:?}"))?
                .max(1),
            Err(_) => 4,
        };

        let config = Self {
            config_path: std::env::var("RECONCILE_CONFIG").ok().map(PathBuf::from),
            data_dir: PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string())),
            concurrency,
            log_format: LogFormat::from_env(),
        };

        config.log_settings();
        Ok(config)
    }

    fn log_settings(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  RECONCILE_CONFIG: {}",
            self.config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<not set>".to_string())
        );
        tracing::info!("  DATA_DIR: {}", self.data_dir.display());
        tracing::info!("  RECONCILE_CONCURRENCY: {}", self.concurrency);
    }

    /// Load the file config named by `RECONCILE_CONFIG`, or defaults.
    pub fn file_config(&self) -> Result<FileConfig> {
        match &self.config_path {
            Some(path) => load_config(path),
            None => Ok(FileConfig::default()),
        }
    }
}

/// TOML-backed configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub schema: CanonicalSchema,
    pub chain: ChainConfig,
}

/// The fallback chain: backends in the order they are tried.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainConfig {
    pub sources: Vec<ChainEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChainEntry {
    pub tag: SourceTag,
    pub input: BackendInput,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            sources: vec![
                ChainEntry {
                    tag: SourceTag::new(SourceTag::CAPTION_TEXT),
                    input: BackendInput::Caption,
                },
                ChainEntry {
                    tag: SourceTag::new(SourceTag::POSTER_OCR),
                    input: BackendInput::Poster,
                },
                ChainEntry {
                    tag: SourceTag::new(SourceTag::POSTER_VISION),
                    input: BackendInput::Poster,
                },
            ],
        }
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: FileConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    Ok(config)
}
