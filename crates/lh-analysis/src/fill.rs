//! Fill specs: named scalar projections and their accumulators.

use std::fmt;
use std::sync::Arc;

use lh_core::{Event, Result};
use lh_hist::{Axis, Histogram, Histogram2D};
use serde::{Deserialize, Serialize};

use crate::cut::TryFn;

/// Scalar quantity computed from an event.
///
/// Implemented for closures `Fn(&Event) -> f64`, for the built-in
/// [`crate::builtin::Observable`] kinds and for fallible callables wrapped
/// in [`TryFn`].
pub trait Projection: Send + Sync {
    /// Value of the quantity for `event`.
    fn project(&self, event: &Event) -> Result<f64>;
}

impl<F> Projection for F
where
    F: Fn(&Event) -> f64 + Send + Sync,
{
    fn project(&self, event: &Event) -> Result<f64> {
        Ok(self(event))
    }
}

impl<F> Projection for TryFn<F>
where
    F: Fn(&Event) -> Result<f64> + Send + Sync,
{
    fn project(&self, event: &Event) -> Result<f64> {
        (self.0)(event)
    }
}

/// Registration of one fill: its name, binning and projection.
#[derive(Clone)]
pub struct FillSpec {
    pub(crate) name: String,
    pub(crate) axis: Axis,
    pub(crate) projection: Arc<dyn Projection>,
}

impl FillSpec {
    /// Fill name, unique within a run.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binning shared by all three accumulators.
    pub fn axis(&self) -> &Axis {
        &self.axis
    }

    /// Fresh, zeroed accumulators for one pass.
    pub(crate) fn accumulators(&self) -> FillHistograms {
        FillHistograms::new(self.axis)
    }
}

impl fmt::Debug for FillSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FillSpec").field("name", &self.name).field("axis", &self.axis).finish()
    }
}

/// The three accumulators of one fill after (or during) a pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillHistograms {
    after_cuts: Histogram,
    before_cuts: Histogram,
    migration: Histogram2D,
    missing_reconstruction: u64,
}

impl FillHistograms {
    pub(crate) fn new(axis: Axis) -> Self {
        Self {
            after_cuts: Histogram::new(axis),
            before_cuts: Histogram::new(axis),
            migration: Histogram2D::square(axis),
            missing_reconstruction: 0,
        }
    }

    /// Reconstructed-view values of events passing the cut pipeline (the
    /// generated view for events without a reconstruction).
    pub fn after_cuts(&self) -> &Histogram {
        &self.after_cuts
    }

    /// Generated-view values of every event.
    pub fn before_cuts(&self) -> &Histogram {
        &self.before_cuts
    }

    /// `(generated, reconstructed)` values of events passing the cut pipeline.
    pub fn migration(&self) -> &Histogram2D {
        &self.migration
    }

    /// Events skipped for the migration matrix because the source had no
    /// reconstructed view. Distinct from axis overflow.
    pub fn missing_reconstruction(&self) -> u64 {
        self.missing_reconstruction
    }

    pub(crate) fn record_generated(&mut self, value: f64) {
        self.before_cuts.fill(value);
    }

    pub(crate) fn record_selected(&mut self, generated: f64, reconstructed: f64) {
        self.after_cuts.fill(reconstructed);
        self.migration.fill(generated, reconstructed);
    }

    /// Selected event without a reconstructed view: `after_cuts` only.
    pub(crate) fn record_selected_unmatched(&mut self, generated: f64) {
        self.after_cuts.fill(generated);
    }

    pub(crate) fn record_missing_reconstruction(&mut self) {
        self.missing_reconstruction += 1;
    }
}
