use std::env;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::scoring::ruleset::{Ruleset, RulesetError};

const DEFAULT_DB_NAME: &str = "carhythm.db";
const DEFAULT_LOG_LEVEL: &str = "warn";

const DB_VAR: &str = "CARHYTHM_DB";
const LOG_VAR: &str = "CARHYTHM_LOG";
const RULESET_VAR: &str = "CARHYTHM_RULESET";

/// Runtime settings: `.env`, then the environment, then CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub ruleset_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} is set but empty")]
    Empty { var: &'static str },

    #[error("cannot create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn default_db_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("carhythm")
        .join(DEFAULT_DB_NAME)
}

// Unset means default; set-but-blank is a mistake worth reporting
fn non_empty(var: &'static str) -> Result<Option<String>, ConfigError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Err(ConfigError::Empty { var }),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(_) => Ok(None),
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = non_empty(DB_VAR)?
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);
        let log_level = non_empty(LOG_VAR)?.unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        let ruleset_path = non_empty(RULESET_VAR)?.map(PathBuf::from);

        Ok(Self {
            db_path,
            log_level,
            ruleset_path,
        })
    }

    pub fn with_overrides(mut self, db: Option<PathBuf>, ruleset: Option<PathBuf>) -> Self {
        if let Some(db) = db {
            self.db_path = db;
        }
        if ruleset.is_some() {
            self.ruleset_path = ruleset;
        }
        self
    }

    /// Create the database's parent directory if needed.
    pub fn ensure_db_dir(&self) -> Result<(), ConfigError> {
        match self.db_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
                std::fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                    path: dir.to_path_buf(),
                    source,
                })
            }
            _ => Ok(()),
        }
    }

    /// The configured ruleset file, or the built-in standard rules.
    pub fn ruleset(&self) -> Result<Ruleset, RulesetError> {
        match &self.ruleset_path {
            Some(path) => Ruleset::from_file(path),
            None => Ok(Ruleset::standard()),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}
