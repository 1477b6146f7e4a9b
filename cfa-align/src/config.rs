//! Configuration for cfa-align
//!
//! TOML configuration selecting the database location, the active
//! alignment kinds, and the external comparison commands.

use cfa_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level cfa-align configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignConfig {
    pub database: DatabaseSection,
    pub alignment: AlignmentSection,
    pub aligners: AlignersSection,
}

/// Database location override
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Explicit database path; defaults to `<data folder>/cfa.db`
    pub path: Option<PathBuf>,
}

/// Which alignment kinds run in this deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentSection {
    /// Active kind ids (1 = CE, 2 = TM-align, 3 = FATCAT)
    pub types: Vec<i64>,
}

impl Default for AlignmentSection {
    fn default() -> Self {
        Self { types: vec![1, 2, 3] }
    }
}

/// External command for one comparison backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignerCommand {
    /// Executable name or path
    pub command: String,
    /// Extra arguments placed before the structure paths
    #[serde(default)]
    pub args: Vec<String>,
}

impl AlignerCommand {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
        }
    }
}

/// Per-backend command table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignersSection {
    pub ce: AlignerCommand,
    pub tm: AlignerCommand,
    pub fatcat: AlignerCommand,
}

impl Default for AlignersSection {
    fn default() -> Self {
        Self {
            ce: AlignerCommand::new("cealign"),
            tm: AlignerCommand::new("TMalign"),
            fatcat: AlignerCommand::new("FATCAT"),
        }
    }
}

impl AlignConfig {
    /// Load configuration.
    ///
    /// An explicitly given path must exist and parse. With no explicit
    /// path, the platform config file is used if present, otherwise
    /// defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match cfa_common::config::default_config_file() {
                Ok(path) => Self::from_file(&path),
                Err(_) => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read config failed ({}): {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Parse config failed ({}): {}", path.display(), e)))
    }

    /// Resolve the database path against the data folder
    pub fn database_path(&self, data_folder: &Path) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| data_folder.join("cfa.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AlignConfig::default();
        assert_eq!(config.alignment.types, vec![1, 2, 3]);
        assert_eq!(config.aligners.tm.command, "TMalign");
        assert!(config.database.path.is_none());
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AlignConfig = toml::from_str(
            r#"
            [alignment]
            types = [2]

            [aligners.tm]
            command = "/opt/tmalign/TMalign"
            args = ["-fast"]
            "#,
        )
        .unwrap();

        assert_eq!(config.alignment.types, vec![2]);
        assert_eq!(config.aligners.tm.command, "/opt/tmalign/TMalign");
        assert_eq!(config.aligners.tm.args, vec!["-fast".to_string()]);
        // Untouched sections keep their defaults
        assert_eq!(config.aligners.ce.command, "cealign");
        assert_eq!(config.aligners.fatcat.command, "FATCAT");
    }

    #[test]
    fn test_database_path_override() {
        let mut config = AlignConfig::default();
        let data = Path::new("/var/lib/cfa");
        assert_eq!(config.database_path(data), PathBuf::from("/var/lib/cfa/cfa.db"));

        config.database.path = Some(PathBuf::from("/tmp/other.db"));
        assert_eq!(config.database_path(data), PathBuf::from("/tmp/other.db"));
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let err = AlignConfig::load(Some(Path::new("/nonexistent/cfa.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
