use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::flow::FlowStage;
use crate::error::{AnalysisError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub figures: FigureConfig,
    pub analysis: StudyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Patient database, `.xlsx`, `.xls`, `.ods` or `.csv`
    pub path: PathBuf,
    /// Worksheet name; the first sheet when unset
    pub sheet: Option<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("WorkingDb.xlsx"),
            sheet: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    /// Figure directory, relative to `dir`
    pub figures_dir: String,
    pub log_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            figures_dir: "dist figs".to_string(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl OutputConfig {
    pub fn figures_path(&self) -> PathBuf {
        self.dir.join(&self.figures_dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    pub width: u32,
    pub height: u32,
    pub histogram_bins: usize,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 600,
            height: 600,
            histogram_bins: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Stages of the code status flow diagram, left to right
    pub flow_stages: Vec<FlowStage>,
    /// Tolerance in days between LOS and discharge minus admit
    pub los_tolerance_days: i64,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            flow_stages: FlowStage::ALL.to_vec(),
            los_tolerance_days: 1,
        }
    }
}

impl AnalysisConfig {
    /// Load from `path`. Falls back to defaults when the default path does
    /// not exist; an explicitly requested file must be readable.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (config_path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        if !explicit && !config_path.exists() {
            return Ok(Self::default());
        }

        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            AnalysisError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        Self::from_toml(&config_content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.analysis.flow_stages.len() < 2 {
            return Err(AnalysisError::Config(
                "analysis.flow_stages needs at least two stages".to_string(),
            ));
        }
        if self.figures.histogram_bins == 0 {
            return Err(AnalysisError::Config(
                "figures.histogram_bins must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
