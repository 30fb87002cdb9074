//! CLI command implementations.

pub mod locate;
pub mod parse;
pub mod stale;

use std::path::{Path, PathBuf};

use sylva::cache::FileCacheStore;
use sylva::config::SylvaConfig;
use sylva::parser::RustParser;
use sylva::TreeProvider;

/// Settings shared by every command.
pub struct Settings {
    /// Loaded configuration (defaults when no file exists)
    pub config: SylvaConfig,
    /// Effective cache directory
    pub cache_dir: PathBuf,
}

impl Settings {
    /// Load the configuration and apply command-line overrides.
    ///
    /// An explicitly named configuration file must exist; the default one
    /// may be absent.
    pub fn resolve(config_path: Option<&Path>, cache_dir: Option<PathBuf>) -> sylva::Result<Self> {
        let config = match config_path {
            Some(path) => SylvaConfig::load(path)?,
            None => {
                let root = std::env::current_dir()?;
                SylvaConfig::load_or_default(&SylvaConfig::default_path(&root))?
            }
        };
        let cache_dir = cache_dir.unwrap_or_else(|| config.cache_dir.clone());
        tracing::debug!(cache_dir = %cache_dir.display(), "Resolved settings");
        Ok(Self { config, cache_dir })
    }

    /// The file cache store at the effective cache directory.
    pub fn store(&self) -> FileCacheStore {
        FileCacheStore::new(&self.cache_dir)
    }

    /// A provider parsing Rust through the file cache store.
    pub fn provider(&self) -> sylva::Result<TreeProvider<RustParser, FileCacheStore>> {
        Ok(TreeProvider::new(RustParser::new()?, self.store()))
    }
}
