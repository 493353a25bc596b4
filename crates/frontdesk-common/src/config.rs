use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = ".frontdesk/config.toml";
const DEFAULT_DATA_DIR: &str = ".frontdesk/data";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrontdeskConfig {
    pub data_dir: PathBuf,
    pub log_level: String,
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Minutes a help request may stay pending before it is marked unresolved.
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
    #[serde(default = "default_knowledge_file")]
    pub knowledge_file: String,
    #[serde(default = "default_requests_file")]
    pub requests_file: String,
    #[serde(default)]
    pub livekit: LiveKitConfig,
}

/// Room settings for the voice channel. Credentials are never stored here,
/// only the names of the environment variables that carry them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    pub room: String,
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
    pub api_key_env: String,
    pub api_secret_env: String,
    pub url_env: String,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            room: "ai_voice_room".to_string(),
            token_ttl_secs: default_token_ttl_secs(),
            api_key_env: "LIVEKIT_API_KEY".to_string(),
            api_secret_env: "LIVEKIT_API_SECRET".to_string(),
            url_env: "LIVEKIT_URL".to_string(),
        }
    }
}

impl Default for FrontdeskConfig {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_DATA_DIR);

        Self {
            data_dir,
            log_level: "info".to_string(),
            bind_addr: default_bind_addr(),
            timeout_minutes: default_timeout_minutes(),
            knowledge_file: default_knowledge_file(),
            requests_file: default_requests_file(),
            livekit: LiveKitConfig::default(),
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_timeout_minutes() -> u64 {
    60
}

fn default_knowledge_file() -> String {
    "knowledge.json".to_string()
}

fn default_requests_file() -> String {
    "help_requests.json".to_string()
}

fn default_token_ttl_secs() -> u64 {
    6 * 60 * 60
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write config at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[from] toml::ser::Error),
    #[error("config has invalid value: {0}")]
    ValidationFailed(String),
}

impl FrontdeskConfig {
    pub fn resolve_path() -> PathBuf {
        if let Ok(path) = env::var("FRONTDESK_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let raw = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::WriteFailed {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, raw).map_err(|source| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the config from [`Self::resolve_path`], writing the defaults first
    /// when no file exists. The flag reports whether a file was created.
    pub fn load_or_create() -> Result<(Self, PathBuf, bool), ConfigError> {
        let path = Self::resolve_path();
        if path.exists() {
            let cfg = Self::load(&path)?;
            return Ok((cfg, path, false));
        }

        let cfg = Self::default();
        cfg.save(&path)?;
        Ok((cfg, path, true))
    }

    pub fn validate_and_prepare(&self) -> Result<(), ConfigError> {
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "log_level cannot be empty".to_string(),
            ));
        }
        if self.timeout_minutes == 0 {
            return Err(ConfigError::ValidationFailed(
                "timeout_minutes must be at least 1".to_string(),
            ));
        }
        for (field, value) in [
            ("knowledge_file", &self.knowledge_file),
            ("requests_file", &self.requests_file),
            ("livekit.room", &self.livekit.room),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::ValidationFailed(format!(
                    "{field} cannot be empty"
                )));
            }
        }
        if self.knowledge_file == self.requests_file {
            return Err(ConfigError::ValidationFailed(
                "knowledge_file and requests_file must differ".to_string(),
            ));
        }
        fs::create_dir_all(&self.data_dir).map_err(|source| ConfigError::WriteFailed {
            path: self.data_dir.clone(),
            source,
        })?;
        Ok(())
    }

    pub fn knowledge_path(&self) -> PathBuf {
        self.data_dir.join(&self.knowledge_file)
    }

    pub fn requests_path(&self) -> PathBuf {
        self.data_dir.join(&self.requests_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            "data_dir = \"/tmp/desk\"\nlog_level = \"debug\"\ntimeout_minutes = 3\n",
        )
        .expect("write config");

        let cfg = FrontdeskConfig::load(&path).expect("load");
        assert_eq!(cfg.timeout_minutes, 3);
        assert_eq!(cfg.bind_addr, "127.0.0.1:5000");
        assert_eq!(cfg.livekit.room, "ai_voice_room");
        assert_eq!(cfg.livekit.api_key_env, "LIVEKIT_API_KEY");
        assert_eq!(cfg.requests_path(), PathBuf::from("/tmp/desk/help_requests.json"));
    }

    #[test]
    fn save_then_load_keeps_livekit_section() {
        let tmp = tempdir().expect("tempdir");
        let path = tmp.path().join("nested/config.toml");
        let mut cfg = FrontdeskConfig {
            data_dir: tmp.path().join("data"),
            ..FrontdeskConfig::default()
        };
        cfg.livekit.room = "lobby".to_string();
        cfg.save(&path).expect("save");

        let loaded = FrontdeskConfig::load(&path).expect("load");
        assert_eq!(loaded.livekit.room, "lobby");
        assert_eq!(loaded.livekit.token_ttl_secs, 21_600);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let tmp = tempdir().expect("tempdir");
        let cfg = FrontdeskConfig {
            data_dir: tmp.path().join("data"),
            timeout_minutes: 0,
            ..FrontdeskConfig::default()
        };
        let err = cfg.validate_and_prepare().expect_err("must fail");
        assert!(err.to_string().contains("timeout_minutes"));
    }

    #[test]
    fn validate_creates_data_dir() {
        let tmp = tempdir().expect("tempdir");
        let cfg = FrontdeskConfig {
            data_dir: tmp.path().join("a/b"),
            ..FrontdeskConfig::default()
        };
        cfg.validate_and_prepare().expect("validate");
        assert!(cfg.data_dir.is_dir());
    }
}
