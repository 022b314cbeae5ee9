use miette::Result;
use miette::miette;
use serde::{Deserialize, Serialize};

use std::future::Future;
use std::path::Path;
use std::path::PathBuf;

use crate::error::{CitelineError, ParseError};

/// Runtime configuration for rendering and the citation popover.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tooltip: TooltipConfig,
    pub render: RenderConfig,
}

/// Popover behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TooltipConfig {
    /// Grace period before a hovered popover hides after the pointer leaves.
    pub hide_delay_ms: u64,
    /// Gap kept between the popover, its anchor, and the viewport edges.
    pub padding: f64,
    /// Longest excerpt shown in the popover, in characters.
    pub excerpt_max_chars: usize,
}

impl Default for TooltipConfig {
    fn default() -> Self {
        Self {
            hide_delay_ms: 300,
            padding: 8.0,
            excerpt_max_chars: 600,
        }
    }
}

/// Markdown rendering switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Wrap consecutive numbered items in an ordered list.
    /// Off by default: numbered items render as bare list items.
    pub wrap_numbered_lists: bool,
}

impl Config {
    /// Read a config through `loader`.
    pub async fn load(loader: &impl Loader) -> Result<Self> {
        loader
            .load()
            .await
            .map_err(|e| miette!("Failed to load configuration: {e}"))
    }
    /// Persist this config through `saver`.
    pub async fn save(&self, saver: &impl Saver) -> Result<()> {
        saver
            .save(self)
            .await
            .map_err(|e| miette!("Failed to save configuration: {e}"))
    }
}

/// Source of a [`Config`].
pub trait Loader {
    /// Produce the stored config.
    fn load(&self) -> impl Future<Output = core::result::Result<Config, CitelineError>> + Send;
}

/// Destination for a [`Config`].
pub trait Saver {
    /// Store `config`, replacing what was there.
    fn save(
        &self,
        config: &Config,
    ) -> impl Future<Output = core::result::Result<(), CitelineError>> + Send;
}

/// A config file on disk, usable as both [`Loader`] and [`Saver`].
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// The format follows the file extension: `.json` or `.toml`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn name(&self) -> String {
        self.path.display().to_string()
    }
}

impl Loader for FileStore {
    async fn load(&self) -> core::result::Result<Config, CitelineError> {
        match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => {
                let src = std::fs::read_to_string(&self.path)?;
                serde_json::from_str(&src)
                    .map_err(|e| ParseError::json(e, &self.name(), &src).into())
            }
            Some("toml") => {
                let src = std::fs::read_to_string(&self.path)?;
                toml::from_str(&src).map_err(|e| ParseError::toml(e, &self.name(), &src).into())
            }
            _ => Err(CitelineError::Config(format!(
                "unsupported config format: {}",
                self.name()
            ))),
        }
    }
}

impl Saver for FileStore {
    async fn save(&self, config: &Config) -> core::result::Result<(), CitelineError> {
        let contents = match self.path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)
                .map_err(|e| CitelineError::Config(e.to_string()))?,
            Some("toml") => {
                toml::to_string_pretty(config).map_err(|e| CitelineError::Config(e.to_string()))?
            }
            _ => {
                return Err(CitelineError::Config(format!(
                    "unsupported config format: {}",
                    self.name()
                )));
            }
        };
        Ok(std::fs::write(&self.path, contents)?)
    }
}
