//! Application configuration types and loading
//!
//! This is the runner's own configuration (which engine to use and where
//! relative table paths live), separate from the pipeline file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::session::{ComputeSession, LocalSession, MemorySession, SessionError};

/// Environment variable overriding `engine.default-fs`
pub const DEFAULT_FS_ENV: &str = "PIPESTEP_DEFAULT_FS";

/// Main pipestep configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Compute engine configuration
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env()?;
        Ok(config)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .pipestep.yml
        let local_config = PathBuf::from(".pipestep.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/pipestep/pipestep.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pipestep").join("pipestep.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(value) = std::env::var(DEFAULT_FS_ENV) {
            self.engine.default_fs = value
                .parse()
                .map_err(|e: String| eyre::eyre!("Invalid {}: {}", DEFAULT_FS_ENV, e))?;
            tracing::debug!("default-fs overridden by {}: {}", DEFAULT_FS_ENV, self.engine.default_fs);
        }
        Ok(())
    }

    /// Build the compute session described by this config
    pub fn create_session(&self) -> Result<Arc<dyn ComputeSession>, SessionError> {
        match self.engine.kind {
            EngineKind::Memory => Ok(Arc::new(MemorySession::new())),
            EngineKind::Local => match self.engine.default_fs {
                FileSystem::Local => Ok(Arc::new(LocalSession::new(&self.engine.data_root))),
                other => Err(SessionError::UnsupportedFileSystem(other.to_string())),
            },
        }
    }
}

/// Compute engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine implementation
    pub kind: EngineKind,

    /// File system table paths live on
    #[serde(rename = "default-fs")]
    pub default_fs: FileSystem,

    /// Base directory for relative table paths
    #[serde(rename = "data-root")]
    pub data_root: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Local,
            default_fs: FileSystem::Local,
            data_root: PathBuf::from("."),
        }
    }
}

/// Available engine implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    Local,
    Memory,
}

/// File systems a table path may refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileSystem {
    Local,
    Hdfs,
    S3,
}

impl fmt::Display for FileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileSystem::Local => "local",
            FileSystem::Hdfs => "hdfs",
            FileSystem::S3 => "s3",
        };
        f.write_str(name)
    }
}

impl FromStr for FileSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "hdfs" => Ok(Self::Hdfs),
            "s3" => Ok(Self::S3),
            _ => Err(format!("Unknown file system: {}. Use: local, hdfs, or s3", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.engine.kind, EngineKind::Local);
        assert_eq!(config.engine.default_fs, FileSystem::Local);
        assert_eq!(config.engine.data_root, PathBuf::from("."));
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
engine:
  kind: memory
  default-fs: hdfs
  data-root: /data/warehouse
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.engine.kind, EngineKind::Memory);
        assert_eq!(config.engine.default_fs, FileSystem::Hdfs);
        assert_eq!(config.engine.data_root, PathBuf::from("/data/warehouse"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
engine:
  data-root: /srv/tables
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.engine.data_root, PathBuf::from("/srv/tables"));

        // Defaults for unspecified
        assert_eq!(config.engine.kind, EngineKind::Local);
        assert_eq!(config.engine.default_fs, FileSystem::Local);
    }

    #[test]
    fn test_file_system_from_str() {
        assert_eq!("S3".parse::<FileSystem>().unwrap(), FileSystem::S3);
        assert!("ftp".parse::<FileSystem>().is_err());
    }

    #[test]
    fn test_local_engine_rejects_remote_fs() {
        let mut config = Config::default();
        config.engine.default_fs = FileSystem::S3;

        let err = config.create_session().err().unwrap();
        assert!(matches!(err, SessionError::UnsupportedFileSystem(ref fs) if fs == "s3"));

        config.engine.kind = EngineKind::Memory;
        assert_eq!(config.create_session().unwrap().name(), "memory");
    }

    #[test]
    #[serial]
    fn test_env_overrides_default_fs() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pipestep.yml");
        fs::write(&path, "engine:\n  default-fs: local\n").unwrap();

        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::set_var(DEFAULT_FS_ENV, "hdfs") };
        let config = Config::load(Some(&path));
        unsafe { std::env::remove_var(DEFAULT_FS_ENV) };

        assert_eq!(config.unwrap().engine.default_fs, FileSystem::Hdfs);
    }

    #[test]
    #[serial]
    fn test_env_invalid_default_fs() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("pipestep.yml");
        fs::write(&path, "engine:\n  kind: local\n").unwrap();

        // SAFETY: serialized with other env-mutating tests
        unsafe { std::env::set_var(DEFAULT_FS_ENV, "floppy") };
        let config = Config::load(Some(&path));
        unsafe { std::env::remove_var(DEFAULT_FS_ENV) };

        assert!(config.is_err());
    }
}
