//! # lh-hist
//!
//! Fixed-width binning for lihe. An [`Axis`] maps a value to a bin or to one
//! of the underflow/overflow sides; [`Histogram`] and [`Histogram2D`] count
//! unweighted entries through one or two axes.
//!
//! ```
//! use lh_hist::{Axis, Histogram};
//!
//! let axis = Axis::new(0.0, 1.5, 75).unwrap();
//! let mut h = Histogram::new(axis);
//! h.fill(0.02);
//! h.fill(2.0);
//! assert_eq!(h.bin_count(1), 1.0);
//! assert_eq!(h.overflow(), 1.0);
//! assert_eq!(h.total(), 2.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod axis;
pub mod histogram;
pub mod histogram2d;

pub use axis::{Axis, BinIndex};
pub use histogram::Histogram;
pub use histogram2d::{Histogram2D, Region};
