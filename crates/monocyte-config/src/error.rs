use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "No configuration file found. Looked for:\n\
        - $MONOCYTE_CONFIG_PATH\n\
        - current directory: monocyte.local.yaml, monocyte.yaml, .monocyte.yaml\n\
        - ~/.config/monocyte/config.yaml"
    )]
    ConfigFileNotFound,

    #[error("Configuration file does not exist: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
