//! Figures for every analyzed variable and the code status flow
//!
//! Charts are written as SVG through the [`plotters`] svg backend, which
//! needs no system fonts and works in headless environments.

pub mod alluvial;
pub mod categorical;
pub mod distribution;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::FigureConfig;
use crate::domain::{PatientRecord, Variable};

pub use alluvial::draw_flow;
pub use categorical::display_cats;
pub use distribution::display_dist;

/// Errors that can occur during plot generation
#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to save plot to file: {0}")]
    FileSave(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type Result<T> = core::result::Result<T, PlotError>;

/// Column labels become file names; `/` and `?` are not allowed there
pub fn file_safe(label: &str) -> String {
    label.replace(['/', '?'], "_")
}

/// One figure per variable: a distribution plot for continuous variables and
/// a bar chart for categorical ones. Variables with nothing to plot are
/// skipped with a warning. Returns the files written.
pub fn visualizations(
    records: &[PatientRecord],
    output_dir: &Path,
    config: &FigureConfig,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(output_dir)?;

    let mut written = Vec::new();
    for variable in Variable::ALL {
        let result = if variable.is_continuous() {
            display_dist(records, *variable, output_dir, config)
        } else {
            display_cats(records, *variable, output_dir, config)
        };

        match result {
            Ok(path) => written.push(path),
            Err(PlotError::InvalidData(reason)) => {
                warn!(variable = %variable, %reason, "Skipping figure");
            }
            Err(e) => return Err(e),
        }
    }

    info!(count = written.len(), dir = %output_dir.display(), "Figures written");
    Ok(written)
}
