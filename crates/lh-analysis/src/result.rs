//! Immutable outcome of one pass.

use std::collections::BTreeMap;

use lh_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::fill::FillHistograms;

/// Events rejected first by one cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutFlowEntry {
    /// Cut name.
    pub name: String,
    /// Whether the cut was enabled for this pass.
    pub enabled: bool,
    /// Events whose first failing enabled cut was this one.
    pub rejected: u64,
}

/// Accumulators of every fill plus pass statistics.
///
/// Independent of the [`crate::Run`] that produced it; nothing here can be
/// mutated once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    histos: BTreeMap<String, FillHistograms>,
    events_seen: u64,
    events_passed: u64,
    events_without_reconstruction: u64,
    cut_flow: Vec<CutFlowEntry>,
}

impl RunResult {
    pub(crate) fn new(
        histos: BTreeMap<String, FillHistograms>,
        events_seen: u64,
        events_passed: u64,
        events_without_reconstruction: u64,
        cut_flow: Vec<CutFlowEntry>,
    ) -> Self {
        Self { histos, events_seen, events_passed, events_without_reconstruction, cut_flow }
    }

    /// Accumulators of the fill called `name`.
    pub fn get(&self, name: &str) -> Result<&FillHistograms> {
        self.histos.get(name).ok_or_else(|| Error::FillNotFound(name.to_string()))
    }

    /// Fill names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.histos.keys().map(String::as_str)
    }

    /// `(name, accumulators)` in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FillHistograms)> + '_ {
        self.histos.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fills.
    pub fn len(&self) -> usize {
        self.histos.len()
    }

    /// `true` when the run had no fills.
    pub fn is_empty(&self) -> bool {
        self.histos.is_empty()
    }

    /// Events read from the source.
    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }

    /// Events accepted by the cut pipeline.
    pub fn events_passed(&self) -> u64 {
        self.events_passed
    }

    /// Events for which the source had no reconstructed view.
    pub fn events_without_reconstruction(&self) -> u64 {
        self.events_without_reconstruction
    }

    /// Per-cut rejection counts in pipeline order.
    pub fn cut_flow(&self) -> &[CutFlowEntry] {
        &self.cut_flow
    }
}
