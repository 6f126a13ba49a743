//! Configuration file support
//!
//! Loads configuration from `--config <file>`, `.wordsimrc.toml` in the current
//! directory or `<config dir>/word-similarity/config.toml`.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

use crate::catalog::{Catalog, ModelSource, ModelSpec};
use crate::similarity::DEFAULT_COMPOUND_JOINER;
use crate::word_vectors::VectorFormat;

pub const LOCAL_CONFIG_FILE: &str = ".wordsimrc.toml";
pub const CACHE_DIR_ENV: &str = "WORDSIM_CACHE_DIR";
const DEFAULT_TOP_N: usize = 10;

/// A model declared in the configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    /// Remote `.gz` or plain vector file.
    pub url: Option<String>,
    /// Local vector file; relative paths are resolved against the config file.
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub format: VectorFormat,
    /// Single character, or "" to keep compound tokens. Defaults to "_".
    pub compound_joiner: Option<String>,
    pub limit: Option<usize>,
}

impl ModelEntry {
    fn to_spec(&self) -> Result<ModelSpec> {
        let source = match (&self.url, &self.path) {
            (Some(url), None) => ModelSource::Remote(url.clone()),
            (None, Some(path)) => ModelSource::Local(path.clone()),
            (Some(_), Some(_)) => bail!("model '{}' sets both url and path", self.id),
            (None, None) => bail!("model '{}' needs a url or a path", self.id),
        };

        let compound_joiner = match self.compound_joiner.as_deref() {
            None => Some(DEFAULT_COMPOUND_JOINER),
            Some("") => None,
            Some(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => bail!(
                        "model '{}': compound_joiner must be a single character, got '{s}'",
                        self.id
                    ),
                }
            }
        };

        Ok(ModelSpec {
            id: self.id.clone(),
            source,
            format: self.format,
            compound_joiner,
            limit: self.limit,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where downloaded models are kept
    pub cache_dir: Option<PathBuf>,
    /// Model used when none is given on the command line
    pub default_model: Option<String>,
    /// Number of neighbors to ask for
    pub top_n: Option<usize>,
    /// Extra models, or replacements for built-in ones
    pub models: Vec<ModelEntry>,
}

impl Config {
    /// Loads `explicit` if given (errors are fatal), otherwise the first
    /// readable file of the usual locations, otherwise defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config = Self::parse(&content)
                .with_context(|| format!("Failed to parse config {}", path.display()))?;
            return Ok(config.resolved_against(path));
        }

        if let Some(config) = Self::load_from_path(Path::new(LOCAL_CONFIG_FILE)) {
            return Ok(config);
        }

        if let Some(dir) = dirs::config_dir() {
            let path = dir.join("word-similarity").join("config.toml");
            if let Some(config) = Self::load_from_path(&path) {
                return Ok(config);
            }
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match Self::parse(&content) {
            Ok(config) => Some(config.resolved_against(path)),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn resolved_against(mut self, config_path: &Path) -> Self {
        let Some(base) = config_path.parent() else {
            return self;
        };
        for entry in &mut self.models {
            if let Some(path) = entry.path.as_mut() {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
        self
    }

    /// Built-in models overlaid with the configured ones.
    pub fn catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::default();
        for entry in &self.models {
            catalog.insert(entry.to_spec()?);
        }
        Ok(catalog)
    }

    /// `WORDSIM_CACHE_DIR`, then `cache_dir`, then the platform cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        if let Some(dir) = env::var_os(CACHE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.cache_dir {
            return dir.clone();
        }
        dirs::cache_dir()
            .map(|d| d.join("word-similarity"))
            .unwrap_or_else(|| PathBuf::from(".word-similarity"))
    }

    /// Top-N default (10); zero counts as unset.
    pub fn top_n(&self) -> usize {
        self.top_n.filter(|&n| n > 0).unwrap_or(DEFAULT_TOP_N)
    }

    /// The configured default if it names a catalog entry, else the first entry.
    pub fn default_model<'a>(&self, catalog: &'a Catalog) -> Option<&'a ModelSpec> {
        self.default_model
            .as_deref()
            .and_then(|id| catalog.get(id))
            .or_else(|| catalog.default_model())
    }
}
