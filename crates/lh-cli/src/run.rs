//! `lihe run` configuration and artifact layout.

use anyhow::{Context, Result, bail};
use lh_analysis::{AnalysisConfig, MigrationArtifact, RunResult, read_config, write_points};
use lh_core::EventSource;
use lh_io::SourceConfig;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Where events come from.
    pub source: SourceConfig,
    /// Fills and cuts.
    #[serde(flatten)]
    pub analysis: AnalysisConfig,
    /// Directory the config was read from; relative source paths resolve here.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl RunConfig {
    pub fn open_source(&self) -> Result<Box<dyn EventSource>> {
        self.source.open(&self.base_dir).context("opening event source")
    }
}

pub fn read_run_config(path: &Path) -> Result<RunConfig> {
    let mut cfg: RunConfig =
        read_config(path).with_context(|| format!("reading {}", path.display()))?;
    cfg.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(cfg)
}

/// File-name-safe form of a fill name.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
        .collect()
}

/// Write `<fill>.before.dat`, `<fill>.after.dat` and `<fill>.migration.json`
/// for every fill into `out_dir`. Returns the written paths.
pub fn write_artifacts(out_dir: &Path, result: &RunResult) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;
    let mut stems = HashSet::new();
    let mut written = Vec::new();
    for (name, histos) in result.iter() {
        let stem = file_stem(name);
        if !stems.insert(stem.clone()) {
            bail!("fill names collide in output file name '{stem}' (fill '{name}')");
        }
        for (suffix, h) in [("before", histos.before_cuts()), ("after", histos.after_cuts())] {
            let path = out_dir.join(format!("{stem}.{suffix}.dat"));
            let file = std::fs::File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            write_points(h, BufWriter::new(file))?;
            written.push(path);
        }
        let path = out_dir.join(format!("{stem}.migration.json"));
        let artifact = MigrationArtifact::new(name, histos.migration());
        std::fs::write(&path, serde_json::to_string_pretty(&artifact)?)
            .with_context(|| format!("writing {}", path.display()))?;
        written.push(path);
    }
    tracing::info!(files = written.len(), dir = %out_dir.display(), "artifacts written");
    Ok(written)
}
