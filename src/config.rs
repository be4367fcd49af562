use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Persisted run state. `last_update_seconds` is the watermark: the inclusive
/// lower bound of the next run's time window, rewritten at the end of every
/// successful run and never decreased.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub gmail_label: String,
    pub notion_database_id: String,
    pub last_update_seconds: i64,
}

fn config_dir() -> Result<PathBuf, ConfigError> {
    Ok(dirs::config_dir()
        .ok_or(ConfigError::NoConfigDir)?
        .join("gmail2notion"))
}

pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.json"))
}

pub fn default_credentials_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("credentials.json"))
}

/// Write an editable template config for the user to fill in.
pub fn write_template(path: &Path) -> Result<(), ConfigError> {
    let sample = Config {
        gmail_label: "Label_1234567890".to_string(),
        notion_database_id: "your-notion-database-id".to_string(),
        last_update_seconds: 0,
    };
    save_config(path, &sample)
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        // create a template config for users to edit
        write_template(path)?;
        return Err(ConfigError::TemplateCreated(path.to_path_buf()));
    }
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&s).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Overwrites the whole state file in one scoped write.
pub fn save_config(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    let io_err = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let s = serde_json::to_string_pretty(cfg).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, s).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("gmail2notion-config-{}-{}", std::process::id(), name))
    }

    #[test]
    fn save_then_load_round_trips() {
        let path = temp_path("roundtrip.json");
        let cfg = Config {
            gmail_label: "Label_42".to_string(),
            notion_database_id: "db-1".to_string(),
            last_update_seconds: 1000,
        };
        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded, cfg);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_of_loaded_config_is_idempotent() {
        let path = temp_path("idempotent.json");
        let cfg = Config {
            gmail_label: "Label_42".to_string(),
            notion_database_id: "db-1".to_string(),
            last_update_seconds: 1234,
        };
        save_config(&path, &cfg).unwrap();
        let loaded = load_config(&path).unwrap();
        save_config(&path, &loaded).unwrap();
        assert_eq!(load_config(&path).unwrap(), cfg);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn missing_file_writes_template_and_errors() {
        let path = temp_path("missing.json");
        let _ = fs::remove_file(&path);
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TemplateCreated(_)));
        // the template it left behind is itself loadable
        assert!(load_config(&path).is_ok());
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_errors() {
        let path = temp_path("malformed.json");
        fs::write(&path, "{ not json").unwrap();
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
        let _ = fs::remove_file(&path);
    }
}
