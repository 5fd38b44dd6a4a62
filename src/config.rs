//! Configuration defaults and data file resolution.

use crate::data::Dataset;
use std::path::{Path, PathBuf};

/// Directory the six CSV tables are read from when none is given.
pub const DEFAULT_DATA_DIR: &str = "data";

pub const DEFAULT_BIND: &str = "127.0.0.1:8050";

pub const DEFAULT_TITLE: &str = "Financial Dashboard";

pub const DEFAULT_EXPORT_WIDTH: u32 = 1200;
pub const DEFAULT_EXPORT_HEIGHT: u32 = 800;

/// Where the input tables live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataConfig {
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl DataConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Full path of the CSV file backing a dataset.
    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        self.data_dir.join(dataset.file_name())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
