use crate::error::{ClinicError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "CLINIC_DATA_DIR";

/// File layout below the data directory.
///
/// The ledger and the calendar configuration sit at the top level, the
/// OAuth token cache lives under `secrets/` so the directory can be
/// excluded from version control as a whole.
#[derive(Debug, Clone)]
pub struct ClinicPaths {
    data_dir: PathBuf,
}

impl ClinicPaths {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Resolution order: `--data-dir` flag, then `CLINIC_DATA_DIR`, then the
    /// current working directory.
    pub fn resolve(cli_override: Option<PathBuf>) -> Self {
        let data_dir = cli_override
            .or_else(|| std::env::var(DATA_DIR_ENV).ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(data_dir)
    }

    pub fn bookings_file(&self) -> PathBuf {
        self.data_dir.join("bookings.json")
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("clinic_config.json")
    }

    pub fn token_file(&self) -> PathBuf {
        self.data_dir.join("secrets").join("token.json")
    }
}

/// Calendar identifiers captured by the `setup` command
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicConfig {
    pub student_calendar: Option<String>,
    pub clinic_calendar: Option<String>,
}

impl ClinicConfig {
    /// Loads the configuration, treating a missing file as unconfigured.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|error| {
            ClinicError::Store(format!("failed to read {}: {error}", path.display()))
        })?;
        serde_json::from_str(&raw).map_err(|error| {
            ClinicError::Store(format!("failed to parse {}: {error}", path.display()))
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                ClinicError::Store(format!("failed to create {}: {error}", parent.display()))
            })?;
        }
        let raw = serde_json::to_string_pretty(self).map_err(|error| {
            ClinicError::Store(format!("failed to serialize configuration: {error}"))
        })?;
        fs::write(path, raw).map_err(|error| {
            ClinicError::Store(format!("failed to write {}: {error}", path.display()))
        })
    }

    pub fn require_clinic_calendar(&self) -> Result<&str> {
        self.clinic_calendar.as_deref().ok_or_else(|| {
            ClinicError::ConfigMissing(
                "no clinic calendar configured, run 'setup' first".to_string(),
            )
        })
    }
}
