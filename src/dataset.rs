//! The dataset file picked for submission.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Extension the prediction endpoint accepts.
pub const ACCEPTED_EXTENSION: &str = "csv";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Only .csv files are supported: {path}")]
    UnsupportedExtension { path: PathBuf },
    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A readable CSV file chosen by the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetFile {
    path: PathBuf,
    file_name: String,
    size_bytes: u64,
}

impl DatasetFile {
    /// Validate the extension and stat the file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, DatasetError> {
        let path = path.into();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION));
        if !is_csv {
            return Err(DatasetError::UnsupportedExtension { path });
        }
        let metadata = std::fs::metadata(&path).map_err(|source| DatasetError::Unreadable {
            path: path.clone(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(DatasetError::Unreadable {
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
                path,
            });
        }
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".to_string());
        Ok(Self {
            path,
            file_name,
            size_bytes: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn opens_csv_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("koi.CSV");
        std::fs::write(&path, "koi_period\n1.0\n").unwrap();
        let file = DatasetFile::open(&path).unwrap();
        assert_eq!(file.file_name(), "koi.CSV");
        assert_eq!(file.size_bytes(), 16);
    }

    #[test]
    fn rejects_other_extensions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("koi.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(matches!(
            DatasetFile::open(&path),
            Err(DatasetError::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn reports_missing_files() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            DatasetFile::open(dir.path().join("gone.csv")),
            Err(DatasetError::Unreadable { .. })
        ));
    }
}
