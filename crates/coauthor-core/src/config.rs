use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::aggregate::WeightMode;
use crate::community::default_palette;
use crate::error::PipelineError;

/// Config file looked up in the working directory when no path is given.
pub const CONFIG_FILE: &str = "coauthor.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub aggregate: AggregateConfig,
    #[serde(default)]
    pub select: SelectConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_true")]
    pub track_weights: bool,
}

impl AggregateConfig {
    #[must_use]
    pub const fn weight_mode(&self) -> WeightMode {
        if self.track_weights {
            WeightMode::PaperCount
        } else {
            WeightMode::Presence
        }
    }
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            track_weights: default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectConfig {
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Edges kept per selected author when bounding the subgraph.
    #[serde(default = "default_fan_out")]
    pub fan_out: usize,
    #[serde(default = "default_palette")]
    pub palette: Vec<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fan_out: default_fan_out(),
            palette: default_palette(),
        }
    }
}

/// Load the pipeline config.
///
/// With `explicit` set, that file must exist. Otherwise `coauthor.toml` in
/// `dir` is used when present and defaults apply when it is not.
///
/// # Errors
///
/// A missing explicit file, an unreadable file, or invalid TOML.
pub fn load_config(dir: &Path, explicit: Option<&Path>) -> Result<PipelineConfig, PipelineError> {
    let path = match explicit {
        Some(path) if !path.exists() => return Err(PipelineError::MissingFile(path.to_path_buf())),
        Some(path) => path.to_path_buf(),
        None => {
            let path = dir.join(CONFIG_FILE);
            if !path.exists() {
                return Ok(PipelineConfig::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| PipelineError::Io {
        path: path.clone(),
        source,
    })?;

    toml::from_str::<PipelineConfig>(&content).map_err(|source| PipelineError::Config { path, source })
}

const fn default_true() -> bool {
    true
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

const fn default_chunk_size() -> usize {
    500_000
}

const fn default_top_n() -> usize {
    100
}

const fn default_fan_out() -> usize {
    3
}
