// src/config.rs
//! Configuration file parsing for pkgrepo
//!
//! Supports TOML configuration files with the following sections:
//! - [paths] - Package source tree, repository tree, database, VCS sources
//! - [build] - Worker count, builder invocation, indexing and static output
//! - [tools] - External tool commands

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pkgrepo/pkgrepo.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsSection,

    /// Build settings
    #[serde(default)]
    pub build: BuildSection,

    /// External tool commands
    #[serde(default)]
    pub tools: ToolsSection,
}

/// Filesystem locations
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// Root of the PKGBUILD source tree
    #[serde(default = "default_packages_root")]
    pub packages_root: PathBuf,

    /// Root under which one directory per repository is maintained
    #[serde(default = "default_repositories_root")]
    pub repositories_root: PathBuf,

    /// SQLite database path
    #[serde(default = "default_database")]
    pub database: PathBuf,

    /// Shared root of VCS working copies (makepkg SRCDEST)
    ///
    /// When unset, working copies are looked up inside each base package
    /// directory.
    #[serde(default)]
    pub srcdest: Option<PathBuf>,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            packages_root: default_packages_root(),
            repositories_root: default_repositories_root(),
            database: default_database(),
            srcdest: None,
        }
    }
}

fn default_packages_root() -> PathBuf {
    PathBuf::from("/srv/pkgrepo/packages")
}

fn default_repositories_root() -> PathBuf {
    PathBuf::from("/srv/pkgrepo/repos")
}

fn default_database() -> PathBuf {
    PathBuf::from("/var/lib/pkgrepo/pkgrepo.db")
}

/// Build settings
#[derive(Debug, Clone, Deserialize)]
pub struct BuildSection {
    /// Number of build tasks allowed to run at once
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Run the chroot build helper through sudo
    #[serde(default = "default_true")]
    pub sudo: bool,

    /// Let builder output through to the terminal
    #[serde(default)]
    pub debug: bool,

    /// Add artifacts to the repository database in delta mode
    #[serde(default)]
    pub delta: bool,

    /// Regenerate index.json under the repositories root after builds
    #[serde(default)]
    pub static_index: bool,

    /// The only architecture a multilib repository may carry
    #[serde(default = "default_multilib_architecture")]
    pub multilib_architecture: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            sudo: true,
            debug: false,
            delta: false,
            static_index: false,
            multilib_architecture: default_multilib_architecture(),
        }
    }
}

fn default_workers() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_multilib_architecture() -> String {
    "x86_64".to_string()
}

/// External tool commands
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsSection {
    /// Command printing the .SRCINFO of the PKGBUILD in the working directory
    #[serde(default = "default_srcinfo")]
    pub srcinfo: Vec<String>,

    /// Repository database add tool
    #[serde(default = "default_index_add")]
    pub index_add: String,

    /// Repository database remove tool
    #[serde(default = "default_index_remove")]
    pub index_remove: String,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            srcinfo: default_srcinfo(),
            index_add: default_index_add(),
            index_remove: default_index_remove(),
        }
    }
}

fn default_srcinfo() -> Vec<String> {
    vec!["makepkg".to_string(), "--printsrcinfo".to_string()]
}

fn default_index_add() -> String {
    "repo-add".to_string()
}

fn default_index_remove() -> String {
    "repo-remove".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            Error::ConfigError(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is absent
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.build.workers == 0 {
            return Err(Error::ConfigError(
                "build.workers must be at least 1".to_string(),
            ));
        }

        if self.tools.srcinfo.is_empty() {
            return Err(Error::ConfigError(
                "tools.srcinfo must name a command".to_string(),
            ));
        }

        if self.build.multilib_architecture.is_empty()
            || self.build.multilib_architecture == crate::db::models::ANY_ARCH
        {
            return Err(Error::ConfigError(format!(
                "Invalid build.multilib_architecture: '{}'",
                self.build.multilib_architecture
            )));
        }

        Ok(())
    }

    /// Database path as a string, the form `db::open` takes
    pub fn db_path(&self) -> String {
        self.paths.database.to_string_lossy().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.build.workers, 2);
        assert_eq!(config.build.multilib_architecture, "x86_64");
        assert!(config.build.sudo);
        assert!(config.paths.srcdest.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
[paths]
packages_root = "/home/builder/packages"
repositories_root = "/home/builder/public_html"
srcdest = "/home/builder/sources"

[build]
workers = 4
delta = true
static_index = true
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.paths.packages_root, PathBuf::from("/home/builder/packages"));
        assert_eq!(config.paths.srcdest, Some(PathBuf::from("/home/builder/sources")));
        assert_eq!(config.build.workers, 4);
        assert!(config.build.delta);
        assert!(config.build.static_index);
        // Untouched sections keep their defaults
        assert_eq!(config.tools.index_add, "repo-add");
        assert_eq!(config.paths.database, PathBuf::from("/var/lib/pkgrepo/pkgrepo.db"));
    }

    #[test]
    fn test_invalid_workers() {
        let config: Config = toml::from_str("[build]\nworkers = 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_multilib_architecture_cannot_be_any() {
        let config: Config =
            toml::from_str("[build]\nmultilib_architecture = \"any\"\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.tools.index_remove, "repo-remove");
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pkgrepo.toml");
        std::fs::write(&path, "[build\nworkers = ").unwrap();
        assert!(matches!(Config::load(&path), Err(Error::ConfigError(_))));
    }
}
