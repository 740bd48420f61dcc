//! Declarative event source selection.

use std::path::{Path, PathBuf};

use lh_core::{Error, EventSource, PION_MASS, Result};
use serde::{Deserialize, Serialize};

use crate::pair::PairSource;
use crate::starlight::StarlightSource;
use crate::tracks::TrackTableSource;

fn default_mass() -> f64 {
    PION_MASS
}

/// Which source to open and where its files are.
///
/// Relative paths are resolved against the directory passed to
/// [`SourceConfig::open`], normally the config file's directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// STARlight text output.
    Starlight {
        /// Input file.
        path: PathBuf,
        /// Track mass hypothesis in GeV.
        #[serde(default = "default_mass")]
        mass: f64,
    },
    /// Generated and reconstructed two-track Parquet tables.
    PairParquet {
        /// Generated table (`gen_*` columns).
        generated: PathBuf,
        /// Reconstructed table (`rec_*` columns).
        reconstructed: PathBuf,
        /// Track mass hypothesis in GeV.
        #[serde(default = "default_mass")]
        mass: f64,
    },
    /// Per-event track table in Parquet.
    TrackParquet {
        /// Input file.
        path: PathBuf,
        /// Track mass hypothesis in GeV.
        #[serde(default = "default_mass")]
        mass: f64,
    },
}

impl SourceConfig {
    /// Replace the input file of a single-file source.
    pub fn set_input(&mut self, input: PathBuf) -> Result<()> {
        match self {
            SourceConfig::Starlight { path, .. } | SourceConfig::TrackParquet { path, .. } => {
                *path = input;
                Ok(())
            }
            SourceConfig::PairParquet { .. } => Err(Error::Configuration(
                "pair_parquet sources take two inputs; set them in the config file".into(),
            )),
        }
    }

    /// Open the configured source.
    pub fn open(&self, base_dir: &Path) -> Result<Box<dyn EventSource>> {
        let resolve = |p: &PathBuf| if p.is_absolute() { p.clone() } else { base_dir.join(p) };
        let source: Box<dyn EventSource> = match self {
            SourceConfig::Starlight { path, mass } => {
                Box::new(StarlightSource::open(&resolve(path))?.with_mass(*mass))
            }
            SourceConfig::PairParquet { generated, reconstructed, mass } => {
                let (generated, reconstructed) = (resolve(generated), resolve(reconstructed));
                Box::new(PairSource::from_parquet(&generated, &reconstructed, *mass)?)
            }
            SourceConfig::TrackParquet { path, mass } => {
                Box::new(TrackTableSource::from_parquet(&resolve(path))?.with_mass(*mass))
            }
        };
        log::info!("opened {} source {}", self.kind(), source.name());
        Ok(source)
    }

    fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Starlight { .. } => "starlight",
            SourceConfig::PairParquet { .. } => "pair_parquet",
            SourceConfig::TrackParquet { .. } => "track_parquet",
        }
    }
}
