//! Read-only exports of a [`RunResult`]: flat `x y` point files and
//! plot-friendly JSON artifacts.

use std::io::Write;

use lh_core::Result;
use lh_hist::{Histogram, Histogram2D, Region};
use serde::Serialize;

use crate::result::{CutFlowEntry, RunResult};

/// Write one `"<bin_center> <count>"` line per in-range bin.
pub fn write_points<W: Write>(histogram: &Histogram, mut out: W) -> Result<()> {
    for (x, y) in histogram.points() {
        writeln!(out, "{x} {y}")?;
    }
    out.flush()?;
    Ok(())
}

/// Out-of-grid bucket of a migration matrix.
#[derive(Debug, Clone, Serialize)]
pub struct FlowBucket {
    /// Generated-axis region.
    pub x: Region,
    /// Reconstructed-axis region.
    pub y: Region,
    /// Entries.
    pub count: f64,
}

/// Plot-friendly migration matrix.
///
/// `matrix[ix][iy]` counts events generated in bin `ix` and reconstructed
/// in bin `iy`.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationArtifact {
    /// Fill name.
    pub name: String,
    /// Generated-axis edges.
    pub gen_bin_edges: Vec<f64>,
    /// Reconstructed-axis edges.
    pub rec_bin_edges: Vec<f64>,
    /// Counts, `[gen_idx][rec_idx]`.
    pub matrix: Vec<Vec<f64>>,
    /// Non-empty out-of-grid buckets.
    pub flows: Vec<FlowBucket>,
    /// Diagonal over column sum, per reconstructed bin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purity: Option<Vec<f64>>,
    /// Diagonal over row sum, per generated bin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stability: Option<Vec<f64>>,
}

impl MigrationArtifact {
    /// Build from a filled matrix.
    pub fn new(name: &str, m: &Histogram2D) -> Self {
        let flows = Region::ALL
            .iter()
            .flat_map(|&x| Region::ALL.iter().map(move |&y| (x, y)))
            .filter(|&(x, y)| !(x == Region::InRange && y == Region::InRange))
            .map(|(x, y)| FlowBucket { x, y, count: m.flow(x, y) })
            .filter(|b| b.count != 0.0)
            .collect();
        Self {
            name: name.to_string(),
            gen_bin_edges: m.axis_x().bin_edges(),
            rec_bin_edges: m.axis_y().bin_edges(),
            matrix: m.rows(),
            flows,
            purity: m.purity(),
            stability: m.stability(),
        }
    }
}

/// Range audit of one histogram.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSummary {
    /// All entries including flows.
    pub total: f64,
    /// Entries below range.
    pub underflow: f64,
    /// Entries at or above range.
    pub overflow: f64,
}

impl From<&Histogram> for HistogramSummary {
    fn from(h: &Histogram) -> Self {
        Self { total: h.total(), underflow: h.underflow(), overflow: h.overflow() }
    }
}

/// Per-fill section of a [`RunSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct FillSummary {
    /// Fill name.
    pub name: String,
    /// Generated view, all events.
    pub before_cuts: HistogramSummary,
    /// Reconstructed view, selected events.
    pub after_cuts: HistogramSummary,
    /// In-range migration entries.
    pub migration_in_range: f64,
    /// Diagonal fraction of the migration grid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub migration_diagonal_fraction: Option<f64>,
    /// Events without a reconstructed view.
    pub missing_reconstruction: u64,
}

/// Numbers-first summary of a pass.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Events read.
    pub events_seen: u64,
    /// Events selected.
    pub events_passed: u64,
    /// Events with no reconstructed view.
    pub events_without_reconstruction: u64,
    /// Per-cut first-rejection counts.
    pub cut_flow: Vec<CutFlowEntry>,
    /// Per-fill audits in name order.
    pub fills: Vec<FillSummary>,
}

impl From<&RunResult> for RunSummary {
    fn from(r: &RunResult) -> Self {
        let fills = r
            .iter()
            .map(|(name, h)| FillSummary {
                name: name.to_string(),
                before_cuts: h.before_cuts().into(),
                after_cuts: h.after_cuts().into(),
                migration_in_range: h.migration().in_range_total(),
                migration_diagonal_fraction: h.migration().diagonal_fraction(),
                missing_reconstruction: h.missing_reconstruction(),
            })
            .collect();
        Self {
            events_seen: r.events_seen(),
            events_passed: r.events_passed(),
            events_without_reconstruction: r.events_without_reconstruction(),
            cut_flow: r.cut_flow().to_vec(),
            fills,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lh_hist::Axis;

    #[test]
    fn points_file_has_one_line_per_bin() {
        let mut h = Histogram::new(Axis::new(0.0, 2.0, 4).unwrap());
        h.fill(0.6);
        h.fill(0.7);
        h.fill(5.0);
        let mut buf = Vec::new();
        write_points(&h, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "0.25 0\n0.75 2\n1.25 0\n1.75 0\n");
    }

    #[test]
    fn migration_artifact_lists_nonempty_flows() {
        let mut m = Histogram2D::square(Axis::new(0.0, 1.0, 2).unwrap());
        m.fill(0.25, 0.25);
        m.fill(0.25, 0.75);
        m.fill(3.0, 0.25);
        let a = MigrationArtifact::new("mass", &m);
        assert_eq!(a.matrix, vec![vec![1.0, 1.0], vec![0.0, 0.0]]);
        assert_eq!(a.gen_bin_edges, vec![0.0, 0.5, 1.0]);
        assert_eq!(a.flows.len(), 1);
        assert_eq!((a.flows[0].x, a.flows[0].y), (Region::Overflow, Region::InRange));
        assert_eq!(a.purity.as_deref(), Some(&[1.0, 0.0][..]));

        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["flows"][0]["x"], "overflow");
    }
}
