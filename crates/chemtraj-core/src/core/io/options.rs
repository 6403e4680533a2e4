use super::diagnostics::Diagnostics;
use super::files::{Compression, Mode};
use super::inchi::toolkit::IdentifierToolkit;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// How a trajectory is opened, as it can be stored in a TOML file:
///
/// ```toml
/// mode = "write"
/// compression = "gzip"
/// format = "XYZ"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct TrajectoryConfig {
    pub mode: Mode,
    pub compression: Compression,
    /// Format name overriding extension and content detection.
    pub format: Option<String>,
}

impl TrajectoryConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<string>".to_string(),
            source: e,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Unknown format name: {0}")]
    UnknownFormat(String),
}

/// Everything needed to open a trajectory: the serializable configuration
/// plus the collaborators that can not be written to a file.
#[derive(Clone, Default)]
pub struct OpenOptions {
    config: TrajectoryConfig,
    diagnostics: Diagnostics,
    toolkit: Option<Arc<dyn IdentifierToolkit>>,
}

impl fmt::Debug for OpenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenOptions")
            .field("config", &self.config)
            .field("diagnostics", &self.diagnostics)
            .field("toolkit", &self.toolkit.is_some())
            .finish()
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: TrajectoryConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.config.mode = mode;
        self
    }
    pub fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }
    pub fn format(mut self, name: &str) -> Self {
        self.config.format = Some(name.to_string());
        self
    }
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }
    pub fn toolkit(mut self, toolkit: Arc<dyn IdentifierToolkit>) -> Self {
        self.toolkit = Some(toolkit);
        self
    }

    pub fn config(&self) -> &TrajectoryConfig {
        &self.config
    }

    pub fn diagnostics_sink(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn identifier_toolkit(&self) -> Option<Arc<dyn IdentifierToolkit>> {
        self.toolkit.clone()
    }
}
