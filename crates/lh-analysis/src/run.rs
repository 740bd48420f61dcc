//! Run: orchestrates one pass over an event source.
//!
//! A [`Run`] holds the configuration (fills and cut pipeline). Each call to
//! [`Run::start`] resets the source and returns a [`Pass`] with freshly
//! zeroed accumulators; stepping the pass to [`PassState::Done`] and calling
//! [`Pass::finish`] yields the [`RunResult`]. While a pass is alive it
//! borrows the run, so the configuration cannot change under it.
//!
//! Per event, with generated view `g` and reconstructed view `r`:
//! 1. every fill records `projection(g)` into `before_cuts`;
//! 2. the cut pipeline is evaluated once on `r`;
//! 3. on acceptance every fill records `projection(r)` into `after_cuts`
//!    and `(projection(g), projection(r))` into `migration`.
//!
//! When the source has no reconstructed view for an event, `g` stands in
//! for `r` in steps 2 and 3, the migration entry is skipped, and the event
//! is counted as missing reconstruction.

use std::collections::BTreeMap;
use std::sync::Arc;

use lh_core::{Error, Event, EventSource, Result};
use lh_hist::Axis;

use crate::cut::{Cut, CutPipeline, Verdict};
use crate::fill::{FillHistograms, FillSpec, Projection};
use crate::result::{CutFlowEntry, RunResult};

const PROGRESS_EVERY: u64 = 10_000;

/// Fill and cut configuration for repeated passes.
#[derive(Clone, Debug, Default)]
pub struct Run {
    fills: Vec<FillSpec>,
    pipeline: CutPipeline,
}

impl Run {
    /// Run with no fills and an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fill. Names must be unique; on error nothing is added.
    pub fn register_fill(
        &mut self,
        name: impl Into<String>,
        axis: Axis,
        projection: impl Projection + 'static,
    ) -> Result<()> {
        self.register_fill_shared(name, axis, Arc::new(projection))
    }

    /// Register a fill with an already shared projection.
    pub fn register_fill_shared(
        &mut self,
        name: impl Into<String>,
        axis: Axis,
        projection: Arc<dyn Projection>,
    ) -> Result<()> {
        let name = name.into();
        if self.fills.iter().any(|f| f.name == name) {
            return Err(Error::Configuration(format!("duplicate fill name '{name}'")));
        }
        self.fills.push(FillSpec { name, axis, projection });
        Ok(())
    }

    /// Append a cut to the pipeline.
    pub fn register_cut(
        &mut self,
        name: impl Into<String>,
        enabled: bool,
        cut: impl Cut + 'static,
    ) -> Result<()> {
        self.pipeline.add(name, enabled, cut)
    }

    /// Toggle a registered cut for the next pass.
    pub fn set_cut_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        self.pipeline.set_enabled(name, enabled)
    }

    /// Replace the whole cut configuration.
    pub fn with_pipeline(mut self, pipeline: CutPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Current cut configuration.
    pub fn pipeline(&self) -> &CutPipeline {
        &self.pipeline
    }

    /// Registered fills in registration order.
    pub fn fills(&self) -> &[FillSpec] {
        &self.fills
    }

    /// Reset `source` and begin a pass.
    pub fn start<'a, S>(&'a self, source: &'a mut S) -> Result<Pass<'a, S>>
    where
        S: EventSource + ?Sized,
    {
        source.reset()?;
        log::info!(
            "pass started on {}: {} fills, {} cuts ({} enabled)",
            source.name(),
            self.fills.len(),
            self.pipeline.len(),
            self.pipeline.enabled_count()
        );
        Ok(Pass {
            run: self,
            source,
            state: PassState::Running,
            accumulators: self.fills.iter().map(FillSpec::accumulators).collect(),
            generated_values: vec![0.0; self.fills.len()],
            rejected: vec![0; self.pipeline.len()],
            events_seen: 0,
            events_passed: 0,
            events_without_reconstruction: 0,
        })
    }

    /// Run a complete pass over `source`.
    pub fn execute<S>(&self, source: &mut S) -> Result<RunResult>
    where
        S: EventSource + ?Sized,
    {
        let mut pass = self.start(source)?;
        while pass.step()? == PassState::Running {}
        pass.finish()
    }
}

/// Progress of a [`Pass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// More events may follow.
    Running,
    /// The source is exhausted; the result is final.
    Done,
}

/// One pass in progress.
///
/// Dropping a pass before [`PassState::Done`] abandons it; its partial
/// accumulators are discarded and never reported as a result.
pub struct Pass<'a, S: EventSource + ?Sized> {
    run: &'a Run,
    source: &'a mut S,
    state: PassState,
    accumulators: Vec<FillHistograms>,
    generated_values: Vec<f64>,
    rejected: Vec<u64>,
    events_seen: u64,
    events_passed: u64,
    events_without_reconstruction: u64,
}

impl<S: EventSource + ?Sized> Pass<'_, S> {
    /// Current state.
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Events processed so far.
    pub fn events_seen(&self) -> u64 {
        self.events_seen
    }

    /// Process the next event, or move to [`PassState::Done`] when the source
    /// is exhausted. Any error aborts the pass: later calls to
    /// [`Pass::finish`] fail with [`Error::IncompletePass`].
    pub fn step(&mut self) -> Result<PassState> {
        if self.state == PassState::Done {
            return Ok(PassState::Done);
        }
        if !self.source.has_more()? {
            self.state = PassState::Done;
            log::info!(
                "pass finished: {} events, {} passed cuts, {} without reconstruction",
                self.events_seen,
                self.events_passed,
                self.events_without_reconstruction
            );
            return Ok(PassState::Done);
        }
        self.source.advance()?;
        self.process_current()?;
        self.events_seen += 1;
        if self.events_seen % PROGRESS_EVERY == 0 {
            log::debug!("{} events processed, {} passed", self.events_seen, self.events_passed);
        }
        Ok(PassState::Running)
    }

    fn process_current(&mut self) -> Result<()> {
        let fills = &self.run.fills;
        let generated = self.source.generated();

        for ((spec, acc), value) in
            fills.iter().zip(self.accumulators.iter_mut()).zip(self.generated_values.iter_mut())
        {
            *value = project(spec, generated)?;
            acc.record_generated(*value);
        }

        let reconstructed = self.source.reconstructed();
        if reconstructed.is_none() {
            log::debug!("event {} has no reconstructed view", generated.id);
            self.events_without_reconstruction += 1;
            self.accumulators.iter_mut().for_each(FillHistograms::record_missing_reconstruction);
        }

        match self.run.pipeline.evaluate_flow(reconstructed.unwrap_or(generated))? {
            Verdict::RejectedBy(i) => self.rejected[i] += 1,
            Verdict::Pass => {
                self.events_passed += 1;
                for ((spec, acc), &gen_value) in
                    fills.iter().zip(self.accumulators.iter_mut()).zip(self.generated_values.iter())
                {
                    match reconstructed {
                        Some(r) => acc.record_selected(gen_value, project(spec, r)?),
                        None => acc.record_selected_unmatched(gen_value),
                    }
                }
            }
        }
        Ok(())
    }

    /// Package the accumulators. Fails unless the pass reached [`PassState::Done`].
    pub fn finish(self) -> Result<RunResult> {
        if self.state != PassState::Done {
            return Err(Error::IncompletePass);
        }
        let histos: BTreeMap<String, FillHistograms> = self
            .run
            .fills
            .iter()
            .map(|f| f.name.clone())
            .zip(self.accumulators)
            .collect();
        let cut_flow = self
            .run
            .pipeline
            .iter()
            .zip(self.rejected)
            .map(|((name, enabled), rejected)| CutFlowEntry {
                name: name.to_string(),
                enabled,
                rejected,
            })
            .collect();
        Ok(RunResult::new(
            histos,
            self.events_seen,
            self.events_passed,
            self.events_without_reconstruction,
            cut_flow,
        ))
    }
}

fn project(spec: &FillSpec, event: &Event) -> Result<f64> {
    spec.projection
        .project(event)
        .map_err(|e| Error::Evaluation(format!("fill '{}' on event {}: {e}", spec.name, event.id)))
}
