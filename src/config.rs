//! Persisted dashboard settings (`settings.toml` in the app directory).
//!
//! Config keys:
//! - `[service]`: `base_url`, `predict_path`, `feature_importance_path`,
//!   `confusion_matrix_path`, `timeout_secs`.
//! - `[display]`: `page_size`, `high_confidence_threshold`, `max_upload_bytes`.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::app_dirs::{AppDirError, AppDirs};
use crate::results::DEFAULT_PAGE_SIZE;
use crate::service::ServiceEndpoints;

const MIN_TIMEOUT_SECS: u64 = 1;
const MAX_PAGE_SIZE: usize = 500;

/// Errors that may occur while loading or saving settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    AppDir(#[from] AppDirError),
    #[error("Unable to create config directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Failed to serialize config to TOML at {path}: {source}")]
    SerializeToml {
        path: PathBuf,
        source: toml::ser::Error,
    },
    #[error("Invalid service URL '{value}': {source}")]
    InvalidUrl {
        value: String,
        source: url::ParseError,
    },
}

/// Top-level settings document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub display: DisplaySettings,
}

/// Where the prediction service lives and how long to wait for it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceSettings {
    /// Service root. A path prefix such as `http://host/api` is kept: the
    /// endpoint paths below are resolved relative to it unless they start
    /// with `/`, in which case they replace the prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_predict_path")]
    pub predict_path: String,
    #[serde(default = "default_feature_importance_path")]
    pub feature_importance_path: String,
    #[serde(default = "default_confusion_matrix_path")]
    pub confusion_matrix_path: String,
    /// Whole-request timeout applied to every call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            predict_path: default_predict_path(),
            feature_importance_path: default_feature_importance_path(),
            confusion_matrix_path: default_confusion_matrix_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_high_confidence_threshold")]
    pub high_confidence_threshold: f64,
    /// Uploads above this size trigger a warning; they are still sent.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            high_confidence_threshold: default_high_confidence_threshold(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_predict_path() -> String {
    "predict".to_string()
}

fn default_feature_importance_path() -> String {
    "metrics/feature-importance".to_string()
}

fn default_confusion_matrix_path() -> String {
    "metrics/confusion-matrix".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_high_confidence_threshold() -> f64 {
    0.9
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

impl AppSettings {
    /// Clamp values into usable ranges.
    pub fn normalized(mut self) -> Self {
        self.service.timeout_secs = self.service.timeout_secs.max(MIN_TIMEOUT_SECS);
        self.display.page_size = self.display.page_size.clamp(1, MAX_PAGE_SIZE);
        let threshold = self.display.high_confidence_threshold;
        self.display.high_confidence_threshold = if threshold.is_finite() {
            threshold.clamp(0.0, 1.0)
        } else {
            default_high_confidence_threshold()
        };
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs.max(MIN_TIMEOUT_SECS))
    }

    /// Resolve the endpoint paths against `base_url`.
    pub fn endpoints(&self) -> Result<ServiceEndpoints, ConfigError> {
        let base = parse_url(&self.service.base_url)?;
        let join = |path: &str| {
            base.join(path).map_err(|source| ConfigError::InvalidUrl {
                value: path.to_string(),
                source,
            })
        };
        Ok(ServiceEndpoints {
            predict: join(&self.service.predict_path)?,
            feature_importance: join(&self.service.feature_importance_path)?,
            confusion_matrix: join(&self.service.confusion_matrix_path)?,
        })
    }
}

fn parse_url(value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
        value: value.to_string(),
        source,
    })?;
    // Relative joins replace the last segment unless the path ends in `/`.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Resolve the settings file path, ensuring the app directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(AppDirs::resolve()?.settings_file())
}

/// Load settings from disk, returning defaults if the file is missing.
pub fn load_or_default() -> Result<AppSettings, ConfigError> {
    load_settings_from(&config_path()?)
}

pub fn load_settings_from(path: &Path) -> Result<AppSettings, ConfigError> {
    if !path.exists() {
        return Ok(AppSettings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str::<AppSettings>(&text)
        .map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source,
        })
        .map(AppSettings::normalized)
}

/// Persist settings to the default location.
pub fn save(settings: &AppSettings) -> Result<(), ConfigError> {
    save_settings_to_path(settings, &config_path()?)
}

/// Write the TOML settings file atomically to prevent partial writes on crash.
pub fn save_settings_to_path(settings: &AppSettings, path: &Path) -> Result<(), ConfigError> {
    let data = toml::to_string_pretty(settings).map_err(|source| ConfigError::SerializeToml {
        path: path.to_path_buf(),
        source,
    })?;
    let dir = path.parent().ok_or_else(|| ConfigError::Write {
        path: path.to_path_buf(),
        source: std::io::Error::other("config path has no parent directory"),
    })?;
    std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = dir.join(format!("{file_name}.tmp-{}", uuid::Uuid::new_v4().simple()));
    let write_err = |source| ConfigError::Write {
        path: tmp_path.clone(),
        source,
    };
    let mut file = std::fs::File::create(&tmp_path).map_err(write_err)?;
    file.write_all(data.as_bytes()).map_err(write_err)?;
    file.sync_all().map_err(write_err)?;
    drop(file);
    std::fs::rename(&tmp_path, path).map_err(|source| {
        let _ = std::fs::remove_file(&tmp_path);
        ConfigError::Write {
            path: path.to_path_buf(),
            source,
        }
    })
}
