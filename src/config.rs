//! # Configuration Module
//!
//! Data directory resolution and runtime configuration for Cadence.
//!
//! ## Data Storage
//!
//! By default everything lives in the platform data directory:
//! - Linux: `~/.local/share/cadence/`
//! - macOS: `~/Library/Application Support/cadence/`
//! - Windows: `%APPDATA%\cadence\`
//!
//! | File | Purpose |
//! |---|---|
//! | `dataset.csv` | track catalog |
//! | `clusters.json` | frozen clustering artifact |
//! | `favorites.csv` | favorites, rewritten after each change |
//! | `config.json` | optional overrides for all of the above |
//!
//! Precedence, lowest to highest: defaults, `config.json`, command-line
//! flags and `CADENCE_*` environment variables.

use anyhow::{Context, Result};
use log::debug;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::recommend::DEFAULT_TOP_K;

/// Results shown by a search unless the caller asks otherwise.
pub const DEFAULT_SEARCH_LIMIT: usize = 6;

/// Returns the Cadence data directory, creating it if needed.
///
/// # Errors
///
/// Fails if the platform data directory cannot be determined or the
/// `cadence` subdirectory cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. \
             Please ensure your platform supports standard data directories."
        )
    })?;

    let cadence_dir = data_dir.join("cadence");
    fs::create_dir_all(&cadence_dir).with_context(|| {
        format!(
            "Failed to create Cadence data directory at {}. Please check file permissions.",
            cadence_dir.display()
        )
    })?;

    Ok(cadence_dir)
}

/// Configuration for runtime behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Catalog CSV.
    pub catalog_path: PathBuf,
    /// Clustering artifact (JSON centroids).
    pub model_path: PathBuf,
    /// Favorites CSV.
    pub favorites_path: PathBuf,
    pub search_limit: usize,
    pub top_k: usize,
}

/// Defaults point into the data directory without creating it, so
/// deserializing a partial config file touches nothing on disk.
impl Default for RuntimeConfig {
    fn default() -> Self {
        let dir = dirs::data_dir().map_or_else(|| PathBuf::from("."), |d| d.join("cadence"));
        Self::in_dir(&dir)
    }
}

impl RuntimeConfig {
    /// Default file names inside `dir`.
    #[must_use]
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            catalog_path: dir.join("dataset.csv"),
            model_path: dir.join("clusters.json"),
            favorites_path: dir.join("favorites.csv"),
            search_limit: DEFAULT_SEARCH_LIMIT,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Read a JSON config file. Missing keys keep their defaults and
    /// relative paths are taken relative to the file's directory.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid JSON.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at {}", path.display()))?;
        let mut config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid config file at {}", path.display()))?;

        if let Some(base) = path.parent() {
            for field in [
                &mut config.catalog_path,
                &mut config.model_path,
                &mut config.favorites_path,
            ] {
                if field.is_relative() {
                    *field = base.join(&*field);
                }
            }
        }
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the effective configuration.
    ///
    /// Uses `explicit` when given (it must exist), otherwise
    /// `config.json` in the data directory if present, otherwise defaults.
    ///
    /// # Errors
    ///
    /// Fails if a config file exists but cannot be parsed.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let candidate = get_data_dir()?.join("config.json");
                if candidate.exists() {
                    Self::from_file(&candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Apply command-line overrides, then make every path absolute.
    ///
    /// # Errors
    ///
    /// Fails if a path cannot be made absolute.
    pub fn with_overrides(
        mut self,
        catalog: Option<PathBuf>,
        model: Option<PathBuf>,
        favorites: Option<PathBuf>,
    ) -> Result<Self> {
        if let Some(p) = catalog {
            self.catalog_path = p;
        }
        if let Some(p) = model {
            self.model_path = p;
        }
        if let Some(p) = favorites {
            self.favorites_path = p;
        }

        self.catalog_path = absolute(&self.catalog_path)?;
        self.model_path = absolute(&self.model_path)?;
        self.favorites_path = absolute(&self.favorites_path)?;
        Ok(self)
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize()
        .with_context(|| format!("Failed to resolve path {}", path.display()))?
        .into_owned())
}
