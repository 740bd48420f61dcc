//! Migration matrix: a 2D histogram correlating two evaluations of the same
//! quantity.
//!
//! The x axis holds the generated (true) value and the y axis the
//! reconstructed (measured) value. Diagonal-heavy occupancy means good
//! resolution; off-diagonal cells quantify smearing. Pairs where either value
//! is out of range never touch the grid: they are counted in one of the eight
//! flow buckets named by the `(x, y)` [`Region`] combination.

use lh_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::axis::{Axis, BinIndex};
use crate::histogram::Histogram;

/// Position of a value relative to an axis range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// Below the range.
    Underflow,
    /// Inside the range.
    InRange,
    /// At or above the range.
    Overflow,
}

impl Region {
    /// All regions in axis order.
    pub const ALL: [Region; 3] = [Region::Underflow, Region::InRange, Region::Overflow];

    fn slot(self) -> usize {
        match self {
            Region::Underflow => 0,
            Region::InRange => 1,
            Region::Overflow => 2,
        }
    }
}

impl From<BinIndex> for Region {
    fn from(index: BinIndex) -> Self {
        match index {
            BinIndex::Underflow => Region::Underflow,
            BinIndex::Bin(_) => Region::InRange,
            BinIndex::Overflow => Region::Overflow,
        }
    }
}

/// Rectangular grid of counts addressed by two axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Histogram2DDef")]
pub struct Histogram2D {
    axis_x: Axis,
    axis_y: Axis,
    /// Row-major: `counts[ix * n_y + iy]`.
    counts: Vec<f64>,
    /// `flows[region_x][region_y]`; the `[InRange][InRange]` slot stays zero.
    flows: [[f64; 3]; 3],
}

#[derive(Deserialize)]
struct Histogram2DDef {
    axis_x: Axis,
    axis_y: Axis,
    counts: Vec<f64>,
    flows: [[f64; 3]; 3],
}

impl TryFrom<Histogram2DDef> for Histogram2D {
    type Error = Error;

    fn try_from(def: Histogram2DDef) -> Result<Self> {
        let cells = def.axis_x.n_bins() * def.axis_y.n_bins();
        if def.counts.len() != cells {
            return Err(Error::Configuration(format!(
                "migration matrix has {} counts for {cells} cells",
                def.counts.len()
            )));
        }
        let in_range = Region::InRange.slot();
        if def.flows[in_range][in_range] != 0.0 {
            return Err(Error::Configuration(
                "migration matrix has a non-zero (in_range, in_range) flow bucket".into(),
            ));
        }
        let Histogram2DDef { axis_x, axis_y, counts, flows } = def;
        Ok(Self { axis_x, axis_y, counts, flows })
    }
}

impl Histogram2D {
    /// Empty matrix over `axis_x × axis_y`.
    pub fn new(axis_x: Axis, axis_y: Axis) -> Self {
        Self {
            axis_x,
            axis_y,
            counts: vec![0.0; axis_x.n_bins() * axis_y.n_bins()],
            flows: [[0.0; 3]; 3],
        }
    }

    /// Square matrix using the same binning on both axes.
    pub fn square(axis: Axis) -> Self {
        Self::new(axis, axis)
    }

    /// Count one `(x, y)` pair.
    #[inline]
    pub fn fill(&mut self, x: f64, y: f64) {
        match (self.axis_x.bin_index(x), self.axis_y.bin_index(y)) {
            (BinIndex::Bin(ix), BinIndex::Bin(iy)) => {
                let n_y = self.axis_y.n_bins();
                self.counts[ix * n_y + iy] += 1.0;
            }
            (bx, by) => {
                self.flows[Region::from(bx).slot()][Region::from(by).slot()] += 1.0;
            }
        }
    }

    /// Binning of the generated (x) quantity.
    pub fn axis_x(&self) -> &Axis {
        &self.axis_x
    }

    /// Binning of the reconstructed (y) quantity.
    pub fn axis_y(&self) -> &Axis {
        &self.axis_y
    }

    /// Content of cell `(ix, iy)`. Panics if out of range.
    pub fn bin_count(&self, ix: usize, iy: usize) -> f64 {
        assert!(ix < self.axis_x.n_bins() && iy < self.axis_y.n_bins(), "cell out of range");
        self.counts[ix * self.axis_y.n_bins() + iy]
    }

    /// Row-major in-range grid.
    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    /// Grid as nested rows: `rows()[ix][iy]`.
    pub fn rows(&self) -> Vec<Vec<f64>> {
        self.counts.chunks(self.axis_y.n_bins()).map(<[f64]>::to_vec).collect()
    }

    /// Entries in one out-of-grid bucket. `(InRange, InRange)` is always zero;
    /// use [`Histogram2D::in_range_total`] for the grid.
    pub fn flow(&self, x: Region, y: Region) -> f64 {
        self.flows[x.slot()][y.slot()]
    }

    /// Entries with `x` below range, for any `y`.
    pub fn x_underflow(&self) -> f64 {
        self.flows[Region::Underflow.slot()].iter().sum()
    }

    /// Entries with `x` at or above range, for any `y`.
    pub fn x_overflow(&self) -> f64 {
        self.flows[Region::Overflow.slot()].iter().sum()
    }

    /// Entries with `y` below range, for any `x`.
    pub fn y_underflow(&self) -> f64 {
        self.flows.iter().map(|row| row[Region::Underflow.slot()]).sum()
    }

    /// Entries with `y` at or above range, for any `x`.
    pub fn y_overflow(&self) -> f64 {
        self.flows.iter().map(|row| row[Region::Overflow.slot()]).sum()
    }

    /// Sum of the in-range grid.
    pub fn in_range_total(&self) -> f64 {
        self.counts.iter().sum()
    }

    /// Grid plus every flow bucket.
    pub fn total(&self) -> f64 {
        self.in_range_total() + self.flows.iter().flatten().sum::<f64>()
    }

    /// Sum over in-range `y` for generated bin `ix`.
    pub fn row_sum(&self, ix: usize) -> f64 {
        let n_y = self.axis_y.n_bins();
        self.counts[ix * n_y..(ix + 1) * n_y].iter().sum()
    }

    /// Sum over in-range `x` for reconstructed bin `iy`.
    pub fn column_sum(&self, iy: usize) -> f64 {
        let n_y = self.axis_y.n_bins();
        (0..self.axis_x.n_bins()).map(|ix| self.counts[ix * n_y + iy]).sum()
    }

    /// Generated-value marginal restricted to pairs with an in-range `y`.
    ///
    /// Bin `ix` is [`Histogram2D::row_sum`]; under/overflow are the
    /// `(Underflow, InRange)` and `(Overflow, InRange)` buckets.
    pub fn projection_x(&self) -> Histogram {
        let counts = (0..self.axis_x.n_bins()).map(|ix| self.row_sum(ix)).collect();
        Histogram::from_parts(
            self.axis_x,
            counts,
            self.flow(Region::Underflow, Region::InRange),
            self.flow(Region::Overflow, Region::InRange),
        )
    }

    /// Reconstructed-value marginal restricted to pairs with an in-range `x`.
    pub fn projection_y(&self) -> Histogram {
        let counts = (0..self.axis_y.n_bins()).map(|iy| self.column_sum(iy)).collect();
        Histogram::from_parts(
            self.axis_y,
            counts,
            self.flow(Region::InRange, Region::Underflow),
            self.flow(Region::InRange, Region::Overflow),
        )
    }

    /// Fraction of the in-range grid on the diagonal. Requires equal bin counts;
    /// returns `None` otherwise or when the grid is empty.
    pub fn diagonal_fraction(&self) -> Option<f64> {
        let n = self.axis_x.n_bins();
        if n != self.axis_y.n_bins() {
            return None;
        }
        let total = self.in_range_total();
        if total == 0.0 {
            return None;
        }
        let diag: f64 = (0..n).map(|i| self.bin_count(i, i)).sum();
        Some(diag / total)
    }

    /// Per reconstructed bin: diagonal content over [`Histogram2D::column_sum`].
    /// Empty columns give 0. Square matrices only; `None` otherwise.
    pub fn purity(&self) -> Option<Vec<f64>> {
        self.diagonal_ratio(|iy| self.column_sum(iy))
    }

    /// Per generated bin: diagonal content over [`Histogram2D::row_sum`].
    /// Empty rows give 0. Square matrices only; `None` otherwise.
    pub fn stability(&self) -> Option<Vec<f64>> {
        self.diagonal_ratio(|ix| self.row_sum(ix))
    }

    fn diagonal_ratio(&self, denom: impl Fn(usize) -> f64) -> Option<Vec<f64>> {
        let n = self.axis_x.n_bins();
        if n != self.axis_y.n_bins() {
            return None;
        }
        Some(
            (0..n)
                .map(|i| {
                    let d = denom(i);
                    if d > 0.0 { self.bin_count(i, i) / d } else { 0.0 }
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn mass_axis() -> Axis {
        Axis::new(0.0, 1.5, 75).unwrap()
    }

    #[test]
    fn in_range_pairs_fill_grid() {
        let mut m = Histogram2D::square(mass_axis());
        for _ in 0..100 {
            m.fill(0.02, 0.02);
        }
        assert_eq!(m.bin_count(1, 1), 100.0);
        assert_eq!(m.in_range_total(), 100.0);
        assert_eq!(m.total(), 100.0);
        assert_eq!(m.diagonal_fraction(), Some(1.0));
    }

    #[test]
    fn x_overflow_is_excluded_from_grid() {
        let mut m = Histogram2D::square(mass_axis());
        m.fill(1.6, 0.5);
        assert_eq!(m.in_range_total(), 0.0);
        assert_eq!(m.flow(Region::Overflow, Region::InRange), 1.0);
        assert_eq!(m.x_overflow(), 1.0);
        assert_eq!(m.y_overflow(), 0.0);
        assert_eq!(m.total(), 1.0);
        let py = m.projection_y();
        assert_eq!(py.bin_count(25), 0.0);
        assert_eq!(py.total(), 0.0);
        assert_eq!(m.projection_x().overflow(), 1.0);
    }

    #[test]
    fn corner_buckets_are_distinct() {
        let mut m = Histogram2D::square(Axis::new(0.0, 1.0, 2).unwrap());
        m.fill(-1.0, -1.0);
        m.fill(-1.0, 2.0);
        m.fill(2.0, -1.0);
        m.fill(2.0, 2.0);
        m.fill(0.5, 2.0);
        m.fill(0.5, -0.1);
        for (x, y) in [
            (Region::Underflow, Region::Underflow),
            (Region::Underflow, Region::Overflow),
            (Region::Overflow, Region::Underflow),
            (Region::Overflow, Region::Overflow),
            (Region::InRange, Region::Overflow),
            (Region::InRange, Region::Underflow),
        ] {
            assert_eq!(m.flow(x, y), 1.0, "{x:?}/{y:?}");
        }
        assert_eq!(m.flow(Region::InRange, Region::InRange), 0.0);
        assert_eq!(m.x_underflow(), 2.0);
        assert_eq!(m.y_underflow(), 3.0);
        assert_eq!(m.y_overflow(), 3.0);
        assert_eq!(m.total(), 6.0);
    }

    #[test]
    fn marginals_match_grid() {
        let axis = Axis::new(0.0, 4.0, 4).unwrap();
        let mut m = Histogram2D::square(axis);
        let pairs = [(0.5, 0.5), (0.5, 1.5), (1.5, 1.5), (2.5, 3.5), (3.5, 3.5), (3.5, 9.0)];
        for (x, y) in pairs {
            m.fill(x, y);
        }
        assert_eq!(m.row_sum(0), 2.0);
        assert_eq!(m.row_sum(3), 1.0);
        assert_eq!(m.column_sum(3), 2.0);
        let px = m.projection_x();
        assert_eq!(px.counts(), &[2.0, 1.0, 1.0, 1.0]);
        assert_eq!(px.total(), 5.0);
        assert_eq!(m.projection_y().overflow(), 1.0);
        assert_eq!(m.flow(Region::InRange, Region::Overflow), 1.0);
        assert_eq!(m.rows()[0], vec![1.0, 1.0, 0.0, 0.0]);

        let purity = m.purity().unwrap();
        assert_relative_eq!(purity[1], 0.5);
        assert_relative_eq!(purity[2], 0.0);
        let stability = m.stability().unwrap();
        assert_relative_eq!(stability[0], 0.5);
        assert_relative_eq!(stability[3], 1.0);
    }

    #[test]
    fn non_square_has_no_diagonal_metrics() {
        let m = Histogram2D::new(Axis::new(0.0, 1.0, 2).unwrap(), Axis::new(0.0, 1.0, 3).unwrap());
        assert!(m.purity().is_none());
        assert!(m.diagonal_fraction().is_none());
        assert_eq!(m.counts().len(), 6);
    }

    #[test]
    fn deserialize_rejects_inconsistent_grids() {
        let mut m = Histogram2D::square(Axis::new(0.0, 1.0, 2).unwrap());
        m.fill(0.2, 0.7);
        m.fill(-1.0, 0.5);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(serde_json::from_value::<Histogram2D>(json.clone()).unwrap(), m);

        let mut short = json.clone();
        short["counts"] = serde_json::json!([1.0]);
        let err = serde_json::from_value::<Histogram2D>(short).unwrap_err();
        assert!(err.to_string().contains("1 counts for 4 cells"), "{err}");

        let mut inner_flow = json;
        inner_flow["flows"][1][1] = serde_json::json!(3.0);
        assert!(serde_json::from_value::<Histogram2D>(inner_flow).is_err());
    }
}

