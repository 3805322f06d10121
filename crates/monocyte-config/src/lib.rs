//! Monocyte configuration
//!
//! A YAML file describing the region policy and per-handler switches:
//!
//! ```yaml
//! allowed_region_prefixes: [eu]
//! ignored_regions: [cn-north-1, us-gov-west-1]
//! dry_run: true
//! region: eu-west-1
//! handlers:
//!   ec2:
//!     enabled: true
//!     allow_terminate: false
//!   s3:
//!     enabled: true
//!     allow_delete: false
//! ```
//!
//! Every key is optional; missing keys take the built-in defaults.

pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable pointing directly at a configuration file
pub const CONFIG_PATH_ENV: &str = "MONOCYTE_CONFIG_PATH";

const CANDIDATES: &[&str] = &["monocyte.local.yaml", "monocyte.yaml", ".monocyte.yaml"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MonocyteConfig {
    /// Region prefixes where resources may live (`eu` matches `eu-west-1`)
    pub allowed_region_prefixes: Vec<String>,

    /// Regions that are never enumerated
    pub ignored_regions: Vec<String>,

    /// Simulate deletions; the CLI's `--execute` turns this off
    pub dry_run: bool,

    /// Region used to bootstrap the SDK clients; us-east-1 when unset
    pub region: Option<String>,

    pub handlers: HandlersConfig,
}

impl Default for MonocyteConfig {
    fn default() -> Self {
        Self {
            allowed_region_prefixes: vec!["eu".to_string()],
            ignored_regions: vec!["cn-north-1".to_string(), "us-gov-west-1".to_string()],
            dry_run: true,
            region: None,
            handlers: HandlersConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct HandlersConfig {
    pub ec2: Ec2Config,
    pub s3: S3Config,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Ec2Config {
    pub enabled: bool,
    /// Circuit breaker for real instance termination
    pub allow_terminate: bool,
}

impl Default for Ec2Config {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_terminate: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct S3Config {
    pub enabled: bool,
    /// Circuit breaker for real bucket deletion
    pub allow_delete: bool,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            enabled: true,
            allow_delete: false,
        }
    }
}

/// A configuration together with the file it came from
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: MonocyteConfig,
    /// `None` when the built-in defaults are in use
    pub source: Option<PathBuf>,
}

impl MonocyteConfig {
    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::MissingFile(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Yaml(source) => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })
    }

    /// Load `explicit` if given, else the discovered file, else the defaults.
    ///
    /// An explicit path that does not exist is an error; a failed discovery is not.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<LoadedConfig> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => match find_config_file() {
                Ok(path) => Some(path),
                Err(ConfigError::ConfigFileNotFound) => None,
                Err(e) => return Err(e),
            },
        };

        match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration");
                Ok(LoadedConfig {
                    config: Self::load(&path)?,
                    source: Some(path),
                })
            }
            None => {
                debug!("No configuration file found, using defaults");
                Ok(LoadedConfig {
                    config: Self::default(),
                    source: None,
                })
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self
            .allowed_region_prefixes
            .iter()
            .any(|p| p.trim().is_empty())
        {
            return Err(ConfigError::Invalid(
                "allowed_region_prefixes must not contain empty entries".to_string(),
            ));
        }
        if self.ignored_regions.iter().any(|r| r.trim().is_empty()) {
            return Err(ConfigError::Invalid(
                "ignored_regions must not contain empty entries".to_string(),
            ));
        }
        if matches!(self.region.as_deref(), Some(r) if r.trim().is_empty()) {
            return Err(ConfigError::Invalid("region must not be empty".to_string()));
        }
        Ok(())
    }
}

/// `~/.config/monocyte/config.yaml`, if a config directory exists
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("monocyte").join("config.yaml"))
}

/// Find the configuration file.
///
/// Search order:
/// 1. `MONOCYTE_CONFIG_PATH`
/// 2. current directory: monocyte.local.yaml, monocyte.yaml, .monocyte.yaml
/// 3. ~/.config/monocyte/config.yaml
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(&config_path);
        if path.exists() {
            return Ok(path);
        }
        warn!(path = %config_path, "{} points to a missing file, ignoring", CONFIG_PATH_ENV);
    }

    let current_dir = std::env::current_dir()?;
    for filename in CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Some(global) = global_config_path() {
        if global.exists() {
            return Ok(global);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}
