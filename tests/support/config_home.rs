//! A throwaway config home that `EXOSCOPE_CONFIG_HOME` points at for one test.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use exoscope::app_dirs::{APP_DIR_NAME, CONFIG_HOME_ENV};
use tempfile::TempDir;

// The variable is process-wide, so tests that set it take turns.
static ENV_LOCK: Mutex<()> = Mutex::new(());

pub struct ConfigHome {
    dir: TempDir,
    previous: Option<std::ffi::OsString>,
    _turn: MutexGuard<'static, ()>,
}

impl ConfigHome {
    pub fn new() -> Self {
        let turn = ENV_LOCK.lock().unwrap_or_else(|err| err.into_inner());
        let dir = tempfile::tempdir().unwrap();
        let previous = std::env::var_os(CONFIG_HOME_ENV);
        // SAFETY: every writer of the variable holds ENV_LOCK.
        unsafe { std::env::set_var(CONFIG_HOME_ENV, dir.path()) };
        Self {
            dir,
            previous,
            _turn: turn,
        }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn settings_path(&self) -> PathBuf {
        self.dir.path().join(APP_DIR_NAME).join("settings.toml")
    }

    /// Drop a hand-written settings file where `config::load_or_default` looks.
    pub fn write_settings(&self, toml: &str) {
        let path = self.settings_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, toml).unwrap();
    }
}

impl Drop for ConfigHome {
    fn drop(&mut self) {
        // SAFETY: ENV_LOCK is still held through `_turn`.
        unsafe {
            match self.previous.take() {
                Some(value) => std::env::set_var(CONFIG_HOME_ENV, value),
                None => std::env::remove_var(CONFIG_HOME_ENV),
            }
        }
    }
}
