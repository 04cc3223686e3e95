//! Where exoscope keeps its settings and logs.
//!
//! Everything lives in one `.exoscope` folder under the OS config directory.
//! Setting `EXOSCOPE_CONFIG_HOME` moves that folder's parent, which is how
//! portable installs and the integration tests keep their files apart.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;

/// Folder created under the config base.
pub const APP_DIR_NAME: &str = ".exoscope";
/// Environment variable replacing the OS config base.
pub const CONFIG_HOME_ENV: &str = "EXOSCOPE_CONFIG_HOME";

const SETTINGS_FILE_NAME: &str = "settings.toml";
const LOGS_DIR_NAME: &str = "logs";

#[derive(Debug, Error)]
pub enum AppDirError {
    #[error("Neither EXOSCOPE_CONFIG_HOME nor an OS config directory is available")]
    Unresolved,
    #[error("Failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// The resolved `.exoscope` folder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppDirs {
    root: PathBuf,
}

impl AppDirs {
    /// Resolve from the environment and create the folder.
    pub fn resolve() -> Result<Self, AppDirError> {
        let os_base = BaseDirs::new().map(|dirs| dirs.config_dir().to_path_buf());
        let base = pick_base(std::env::var_os(CONFIG_HOME_ENV), os_base)
            .ok_or(AppDirError::Unresolved)?;
        Self::under(&base)
    }

    /// Use `<base>/.exoscope`, creating it if needed.
    pub fn under(base: &Path) -> Result<Self, AppDirError> {
        let root = base.join(APP_DIR_NAME);
        create(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings_file(&self) -> PathBuf {
        self.root.join(SETTINGS_FILE_NAME)
    }

    /// The log folder, created on demand.
    pub fn logs(&self) -> Result<PathBuf, AppDirError> {
        let path = self.root.join(LOGS_DIR_NAME);
        create(&path)?;
        Ok(path)
    }
}

/// An explicit, non-empty override wins over the OS directory.
fn pick_base(override_value: Option<OsString>, os_base: Option<PathBuf>) -> Option<PathBuf> {
    match override_value {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => os_base,
    }
}

fn create(path: &Path) -> Result<(), AppDirError> {
    std::fs::create_dir_all(path).map_err(|source| AppDirError::Create {
        path: path.to_path_buf(),
        source,
    })
}
