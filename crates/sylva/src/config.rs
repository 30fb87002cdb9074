//! Settings file for the `sylva` command.
//!
//! ```yaml
//! cache-dir: .sylva/cache
//! column-encoding: utf-16
//! mode: batch
//! ```
//!
//! Every key is optional; missing keys take their defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{ColumnEncoding, Mode};

/// Name of the sylva directory
pub const SYLVA_DIR_NAME: &str = ".sylva";

/// Name of the configuration file inside [`SYLVA_DIR_NAME`]
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Default cache directory, relative to the working directory
pub const DEFAULT_CACHE_DIR: &str = ".sylva/cache";

/// Parsing mode named in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSetting {
    /// One-shot analysis runs
    #[default]
    Batch,
    /// Editor sessions
    Interactive,
}

/// Configuration file structure for sylva
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default)]
pub struct SylvaConfig {
    /// Directory of the file cache store
    pub cache_dir: PathBuf,

    /// Unit interactive columns are counted in
    pub column_encoding: ColumnEncoding,

    /// Default parsing mode
    pub mode: ModeSetting,
}

impl Default for SylvaConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            column_encoding: ColumnEncoding::default(),
            mode: ModeSetting::default(),
        }
    }
}

impl SylvaConfig {
    /// Default location of the configuration file under `root`.
    #[must_use]
    pub fn default_path(root: &Path) -> PathBuf {
        root.join(SYLVA_DIR_NAME).join(CONFIG_FILE_NAME)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Config` if
    /// it is not valid YAML for this structure.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Load configuration, falling back to defaults when the file is absent.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`], except that a missing file is not an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Save configuration to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if serialization fails and `Error::Io` if the
    /// file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The configured parsing mode, with the configured column encoding.
    #[must_use]
    pub fn mode(&self) -> Mode {
        match self.mode {
            ModeSetting::Batch => Mode::Batch,
            ModeSetting::Interactive => Mode::Interactive(self.column_encoding),
        }
    }

    /// Interactive mode with the configured column encoding.
    #[must_use]
    pub fn interactive_mode(&self) -> Mode {
        Mode::Interactive(self.column_encoding)
    }
}
