//! Linear binning over a fixed `[low, high)` range.

use lh_core::{Error, Result};
use serde::{Deserialize, Serialize};

/// Where a value falls on an [`Axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinIndex {
    /// Below `low`.
    Underflow,
    /// In-range bin `0..n_bins`.
    Bin(usize),
    /// At or above `high` (also NaN).
    Overflow,
}

impl BinIndex {
    /// The in-range bin, if any.
    pub fn bin(self) -> Option<usize> {
        match self {
            BinIndex::Bin(i) => Some(i),
            _ => None,
        }
    }
}

/// `n_bins` equal-width bins covering `[low, high)`.
///
/// Values outside the range are never clipped into the edge bins; they are
/// reported as [`BinIndex::Underflow`] / [`BinIndex::Overflow`] so that
/// histograms can account for them separately.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AxisDef")]
pub struct Axis {
    low: f64,
    high: f64,
    n_bins: u32,
}

/// Unvalidated wire form of an [`Axis`].
#[derive(Deserialize)]
struct AxisDef {
    low: f64,
    high: f64,
    #[serde(alias = "bins")]
    n_bins: u32,
}

impl TryFrom<AxisDef> for Axis {
    type Error = Error;

    fn try_from(def: AxisDef) -> Result<Self> {
        Axis::new(def.low, def.high, def.n_bins)
    }
}

impl Axis {
    /// Create an axis. Fails unless `low < high`, both are finite, and `n_bins >= 1`.
    pub fn new(low: f64, high: f64, n_bins: u32) -> Result<Self> {
        if !(low.is_finite() && high.is_finite()) {
            return Err(Error::Configuration(format!(
                "axis bounds must be finite (low={low}, high={high})"
            )));
        }
        if low >= high {
            return Err(Error::Configuration(format!(
                "axis range is empty (low={low} >= high={high})"
            )));
        }
        if n_bins == 0 {
            return Err(Error::Configuration("axis must have at least one bin".into()));
        }
        Ok(Self { low, high, n_bins })
    }

    /// Lower edge of the first bin.
    pub fn low(&self) -> f64 {
        self.low
    }

    /// Upper edge of the last bin.
    pub fn high(&self) -> f64 {
        self.high
    }

    /// Number of in-range bins.
    pub fn n_bins(&self) -> usize {
        self.n_bins as usize
    }

    /// Width of every bin.
    pub fn width(&self) -> f64 {
        (self.high - self.low) / self.n_bins as f64
    }

    /// Locate `value`.
    ///
    /// `floor((value - low) / width)` is clamped to the last bin so that
    /// values a rounding error below `high` stay in range.
    #[inline]
    pub fn bin_index(&self, value: f64) -> BinIndex {
        if value < self.low {
            return BinIndex::Underflow;
        }
        if !(value < self.high) {
            return BinIndex::Overflow;
        }
        let raw = ((value - self.low) / self.width()).floor() as usize;
        BinIndex::Bin(raw.min(self.n_bins() - 1))
    }

    /// Center of bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        self.low + (i as f64 + 0.5) * self.width()
    }

    /// Lower edge of bin `i`.
    pub fn bin_low_edge(&self, i: usize) -> f64 {
        self.low + i as f64 * self.width()
    }

    /// All bin edges (length `n_bins + 1`). The last edge is exactly `high`.
    pub fn bin_edges(&self) -> Vec<f64> {
        let n = self.n_bins();
        (0..=n).map(|i| if i == n { self.high } else { self.bin_low_edge(i) }).collect()
    }
}
