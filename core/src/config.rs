use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};

use crate::error::StoreError;
use crate::repository::file::DEFAULT_FILE_NAME;
use crate::repository::sqlite::DEFAULT_DB_NAME;

const DEFAULT_DIR_NAME: &str = ".todolist";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Json => "json",
            Backend::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "file" => Ok(Backend::Json),
            "sqlite" | "relational" | "db" => Ok(Backend::Sqlite),
            _ => Err(StoreError::UnsupportedBackend(s.to_string())),
        }
    }
}

/// Where and how tasks are stored. Resolved once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    pub backend: Backend,
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn new(backend: Backend, data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => default_data_dir()?,
        };
        Ok(StoreConfig { backend, data_dir })
    }

    /// Path of the backing file for the selected backend.
    pub fn storage_path(&self) -> PathBuf {
        match self.backend {
            Backend::Json => self.data_dir.join(DEFAULT_FILE_NAME),
            Backend::Sqlite => self.data_dir.join(DEFAULT_DB_NAME),
        }
    }
}

pub fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home_dir.join(DEFAULT_DIR_NAME))
}
