use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub project: ProjectConfig,
    pub scan: ScanConfig,
    pub output: OutputConfig,
}

/// Project metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names skipped entirely during the walk
    pub exclude: Vec<String>,
    /// Maximum traversal depth relative to the root; None means unbounded
    pub max_depth: Option<usize>,
    /// Include entries whose name starts with '.'
    pub include_hidden: bool,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub directory: PathBuf,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Summary,
    Json,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: None,
            description: None,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude: vec![
                "__pycache__".to_string(),
                ".git".to_string(),
                "venv".to_string(),
                ".venv".to_string(),
                "node_modules".to_string(),
                ".tox".to_string(),
                ".eggs".to_string(),
            ],
            max_depth: None,
            include_hidden: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            directory: PathBuf::from("./codemap-out"),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        output: Option<PathBuf>,
        exclude: Vec<String>,
        format: Option<String>,
        max_depth: Option<usize>,
        include_hidden: bool,
    ) {
        if let Some(out) = output {
            self.output.directory = out;
        }

        if !exclude.is_empty() {
            self.scan.exclude.extend(exclude);
        }

        if let Some(fmt) = format {
            self.output.format = match fmt.as_str() {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Summary,
            };
        }

        if max_depth.is_some() {
            self.scan.max_depth = max_depth;
        }

        if include_hidden {
            self.scan.include_hidden = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if let Some(depth) = self.scan.max_depth {
            if depth == 0 {
                return Err(Error::config_validation("max_depth must be at least 1"));
            }
            if depth > 100 {
                return Err(Error::config_validation("max_depth cannot exceed 100"));
            }
        }

        Ok(())
    }
}
