//! Persisted config (indices location, embedding model, search sizes) in the app data directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app_data;
use crate::ollama::{DEFAULT_BASE_URL, DEFAULT_EMBED_MODEL};
use crate::retriever::WIDEN_FACTOR;

const CONFIG_FILENAME: &str = "config.toml";

/// Number of FAQ entries returned by `search_faq`.
pub const DEFAULT_FAQ_SEARCH_K: usize = 3;
/// Default `k` for product searches when the caller doesn't pass one.
pub const DEFAULT_PRODUCT_SEARCH_K: usize = 8;

pub const FAQ_INDEX_FILENAME: &str = "faq.index";
pub const FAQ_METADATA_FILENAME: &str = "faq.metadata.json";
pub const PRODUCT_INDEX_FILENAME: &str = "products.index";
pub const PRODUCT_METADATA_FILENAME: &str = "products.metadata.json";

/// Every field is optional; accessors fill in defaults.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding `faq.index`, `products.index` and their metadata.
    pub indices_dir: Option<String>,
    pub ollama_url: Option<String>,
    pub embed_model: Option<String>,
    pub faq_search_k: Option<usize>,
    pub product_search_k: Option<usize>,
    /// Over-fetch multiplier for filtered product searches.
    pub widen_factor: Option<usize>,
}

impl Config {
    /// Configured indices directory, else `<app data>/indices`.
    pub fn indices_dir(&self) -> Option<PathBuf> {
        self.indices_dir
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(app_data::default_indices_dir)
    }

    pub fn index_paths(&self) -> Option<IndexPaths> {
        self.indices_dir().map(|dir| IndexPaths::in_dir(&dir))
    }

    pub fn ollama_url(&self) -> &str {
        self.ollama_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn embed_model(&self) -> &str {
        self.embed_model.as_deref().unwrap_or(DEFAULT_EMBED_MODEL)
    }

    pub fn faq_search_k(&self) -> usize {
        self.faq_search_k.filter(|k| *k > 0).unwrap_or(DEFAULT_FAQ_SEARCH_K)
    }

    pub fn product_search_k(&self) -> usize {
        self.product_search_k
            .filter(|k| *k > 0)
            .unwrap_or(DEFAULT_PRODUCT_SEARCH_K)
    }

    pub fn widen_factor(&self) -> usize {
        self.widen_factor.filter(|w| *w > 0).unwrap_or(WIDEN_FACTOR)
    }
}

/// File locations of the two collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPaths {
    pub faq_index: PathBuf,
    pub faq_metadata: PathBuf,
    pub product_index: PathBuf,
    pub product_metadata: PathBuf,
}

impl IndexPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            faq_index: dir.join(FAQ_INDEX_FILENAME),
            faq_metadata: dir.join(FAQ_METADATA_FILENAME),
            product_index: dir.join(PRODUCT_INDEX_FILENAME),
            product_metadata: dir.join(PRODUCT_METADATA_FILENAME),
        }
    }
}

/// Parse config text. Invalid TOML yields the default config.
pub fn parse_config(s: &str) -> Config {
    match toml::from_str(s) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("ignoring invalid {}: {}", CONFIG_FILENAME, e);
            Config::default()
        }
    }
}

/// Load config from the app data directory. Returns default config if missing or invalid.
pub fn load_config() -> Config {
    let Some(data_dir) = app_data::app_data_dir() else {
        return Config::default();
    };
    let path = data_dir.join(CONFIG_FILENAME);
    let Ok(s) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    parse_config(&s)
}

/// Save config to the app data directory.
pub fn save_config(config: &Config) -> Result<(), ConfigError> {
    let data_dir = app_data::app_data_dir().ok_or(ConfigError::NoDataDir)?;
    let path = data_dir.join(CONFIG_FILENAME);
    let s = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;
    std::fs::write(&path, s).map_err(ConfigError::Write)
}

/// Get the effective indices directory, if one can be determined.
pub fn get_indices_dir() -> Option<PathBuf> {
    load_config().indices_dir()
}

/// Set and persist the indices directory.
pub fn set_indices_dir(path: &Path) -> Result<(), ConfigError> {
    let path = path.canonicalize().map_err(ConfigError::Canonicalize)?;
    if !path.is_dir() {
        return Err(ConfigError::NotADirectory(path));
    }
    let mut config = load_config();
    config.indices_dir = Some(path.to_string_lossy().into_owned());
    save_config(&config)
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not determine app data directory")]
    NoDataDir,
    #[error("failed to serialize config: {0}")]
    Serialize(toml::ser::Error),
    #[error("failed to write config: {0}")]
    Write(std::io::Error),
    #[error("failed to resolve path: {0}")]
    Canonicalize(std::io::Error),
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
