use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Application-level constants
pub const APP_NAME: &str = "ClinicRecords";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CONFIG_ENV: &str = "CLINIC_CONFIG";
pub const DB_PATH_ENV: &str = "CLINIC_DB_PATH";
pub const NOTES_DB_PATH_ENV: &str = "CLINIC_NOTES_DB_PATH";
pub const PERF_LOG_ENV: &str = "CLINIC_PERF_LOG";
pub const LOG_FILTER_ENV: &str = "CLINIC_LOG";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Get the application data directory.
/// Local data dir of the platform, or the working directory when unknown.
pub fn app_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

pub fn default_log_filter() -> String {
    "clinic_records=info".to_string()
}

/// Runtime configuration, read once at start-up.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: PathBuf,
    /// `None` (or an empty path) disables the notes store.
    pub notes_database_path: Option<PathBuf>,
    /// `None` keeps timings in the log only.
    pub performance_log_path: Option<PathBuf>,
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let dir = app_data_dir();
        Self {
            database_path: dir.join("clinic.db"),
            notes_database_path: None,
            performance_log_path: Some(dir.join("performance_report.csv")),
            log_filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Defaults, then the JSON config file if present, then env overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| app_data_dir().join("config.json"));
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        tracing::debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `CLINIC_*` overrides from `lookup`. Empty notes path disables notes.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(DB_PATH_ENV).filter(|v| !v.trim().is_empty()) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(NOTES_DB_PATH_ENV) {
            self.notes_database_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup(PERF_LOG_ENV).filter(|v| !v.trim().is_empty()) {
            self.performance_log_path = Some(PathBuf::from(path));
        }
        if let Some(filter) = lookup(LOG_FILTER_ENV).filter(|v| !v.trim().is_empty()) {
            self.log_filter = filter;
        }
        if self
            .notes_database_path
            .as_ref()
            .is_some_and(|p| p.as_os_str().is_empty())
        {
            self.notes_database_path = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_live_under_app_data_dir() {
        let config = AppConfig::default();
        assert!(config.database_path.starts_with(app_data_dir()));
        assert!(config.database_path.ends_with("clinic.db"));
        assert!(config.notes_database_path.is_none());
        assert_eq!(config.log_filter, "clinic_records=info");
    }

    #[test]
    fn app_data_dir_ends_with_app_name() {
        assert!(app_data_dir().ends_with("ClinicRecords"));
    }

    #[test]
    fn file_values_fill_missing_fields_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "database_path": "/srv/clinic.db", "notes_database_path": "/srv/notes.db" }"#,
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/srv/clinic.db"));
        assert_eq!(config.notes_database_path, Some(PathBuf::from("/srv/notes.db")));
        assert_eq!(config.log_filter, default_log_filter());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::from_file(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn env_overrides_win() {
        let env: HashMap<&str, &str> = [
            (DB_PATH_ENV, "/tmp/a.db"),
            (NOTES_DB_PATH_ENV, "/tmp/notes.db"),
            (PERF_LOG_ENV, "/tmp/perf.csv"),
            (LOG_FILTER_ENV, "clinic_records=debug"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.database_path, PathBuf::from("/tmp/a.db"));
        assert_eq!(config.notes_database_path, Some(PathBuf::from("/tmp/notes.db")));
        assert_eq!(config.performance_log_path, Some(PathBuf::from("/tmp/perf.csv")));
        assert_eq!(config.log_filter, "clinic_records=debug");
    }

    #[test]
    fn empty_notes_override_disables_notes() {
        let mut config = AppConfig {
            notes_database_path: Some(PathBuf::from("/srv/notes.db")),
            ..AppConfig::default()
        };
        config.apply_overrides(|k| (k == NOTES_DB_PATH_ENV).then(String::new));
        assert!(config.notes_database_path.is_none());
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, "0.1.0");
    }
}
