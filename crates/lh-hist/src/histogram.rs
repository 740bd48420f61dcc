//! Unweighted 1D histogram with explicit under/overflow counters.

use lh_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::axis::{Axis, BinIndex};

/// Per-bin counts over an [`Axis`].
///
/// Only [`Histogram::fill`] mutates a histogram; bins never shrink and the
/// binning never changes after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "HistogramDef")]
pub struct Histogram {
    axis: Axis,
    counts: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
}

#[derive(Deserialize)]
struct HistogramDef {
    axis: Axis,
    counts: Vec<f64>,
    underflow: f64,
    overflow: f64,
    entries: u64,
}

impl TryFrom<HistogramDef> for Histogram {
    type Error = Error;

    fn try_from(def: HistogramDef) -> Result<Self> {
        if def.counts.len() != def.axis.n_bins() {
            return Err(Error::Configuration(format!(
                "histogram has {} counts for {} bins",
                def.counts.len(),
                def.axis.n_bins()
            )));
        }
        let HistogramDef { axis, counts, underflow, overflow, entries } = def;
        Ok(Self { axis, counts, underflow, overflow, entries })
    }
}

impl Histogram {
    /// Empty histogram over `axis`.
    pub fn new(axis: Axis) -> Self {
        Self { axis, counts: vec![0.0; axis.n_bins()], underflow: 0.0, overflow: 0.0, entries: 0 }
    }

    /// Count one entry at `value`.
    #[inline]
    pub fn fill(&mut self, value: f64) {
        self.entries += 1;
        match self.axis.bin_index(value) {
            BinIndex::Bin(i) => self.counts[i] += 1.0,
            BinIndex::Underflow => self.underflow += 1.0,
            BinIndex::Overflow => self.overflow += 1.0,
        }
    }

    /// The binning.
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Number of in-range bins.
    pub fn n_bins(&self) -> usize {
        self.counts.len()
    }

    /// Content of bin `i`. Panics if `i >= n_bins`.
    pub fn bin_count(&self, i: usize) -> f64 {
        self.counts[i]
    }

    /// Center of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        self.axis.bin_center(i)
    }

    /// All in-range bin contents.
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Entries below the axis range.
    pub fn underflow(&self) -> f64 {
        self.underflow
    }

    /// Entries at or above the axis range.
    pub fn overflow(&self) -> f64 {
        self.overflow
    }

    /// Number of `fill` calls.
    pub fn entries(&self) -> u64 {
        self.entries
    }

    /// Sum of in-range bins.
    pub fn in_range_total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Sum of all bins plus underflow and overflow.
    pub fn total(&self) -> f64 {
        self.in_range_total() + self.underflow + self.overflow
    }

    /// `(bin_center, count)` for every in-range bin, in bin order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.counts.iter().enumerate().map(|(i, &c)| (self.axis.bin_center(i), c))
    }

    /// Build a histogram from precomputed contents, used for matrix projections.
    pub(crate) fn from_parts(axis: Axis, counts: Vec<f64>, underflow: f64, overflow: f64) -> Self {
        debug_assert_eq!(counts.len(), axis.n_bins());
        let entries = (counts.iter().sum::<f64>() + underflow + overflow) as u64;
        Self { axis, counts, underflow, overflow, entries }
    }
}
