//! Declarative fill and cut configuration.

use std::path::Path;

use lh_core::Result;
use lh_hist::Axis;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::builtin::{Observable, Selection};
use crate::run::Run;

/// One fill: name, built-in projection and binning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillConfig {
    /// Fill name.
    pub name: String,
    /// Projection to histogram.
    pub projection: Observable,
    /// Binning.
    pub axis: Axis,
}

/// One cut: name, enable flag and built-in selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutConfig {
    /// Cut name, used to toggle it.
    pub name: String,
    /// Whether the cut starts enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Selection parameters, tagged by `kind`.
    #[serde(flatten)]
    pub selection: Selection,
}

fn default_enabled() -> bool {
    true
}

/// Fills and cuts of an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Fills in registration order.
    #[serde(default)]
    pub fills: Vec<FillConfig>,
    /// Cuts in evaluation order.
    #[serde(default)]
    pub cuts: Vec<CutConfig>,
}

/// Read a config document from a `.json` file, or YAML for any other
/// extension.
pub fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path)?;
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("").to_ascii_lowercase();
    Ok(if ext == "json" {
        serde_json::from_slice(&bytes)?
    } else {
        serde_yaml_ng::from_slice(&bytes)?
    })
}

impl AnalysisConfig {
    /// Read from a `.json` file, or YAML for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        read_config(path)
    }

    /// Build a [`Run`] with every fill and cut registered.
    /// Duplicate names are configuration errors.
    pub fn build_run(&self) -> Result<Run> {
        let mut run = Run::new();
        for fill in &self.fills {
            run.register_fill(fill.name.clone(), fill.axis, fill.projection)?;
        }
        for cut in &self.cuts {
            run.register_cut(cut.name.clone(), cut.enabled, cut.selection.clone())?;
        }
        Ok(run)
    }
}
