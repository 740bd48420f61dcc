//! Cuts and the ordered cut pipeline.

use std::fmt;
use std::sync::Arc;

use lh_core::{Error, Event, Result};

/// A named-elsewhere boolean selection over an event.
///
/// Implemented for plain closures `Fn(&Event) -> bool`, for the built-in
/// [`crate::builtin::Selection`] kinds, and for fallible callables wrapped in
/// [`TryFn`]. Implementations must be pure: the verdict may not depend on
/// which other cuts ran before.
pub trait Cut: Send + Sync {
    /// `true` when the event is kept.
    fn evaluate(&self, event: &Event) -> Result<bool>;
}

impl<F> Cut for F
where
    F: Fn(&Event) -> bool + Send + Sync,
{
    fn evaluate(&self, event: &Event) -> Result<bool> {
        Ok(self(event))
    }
}

/// Adapter for callables that can fail, e.g. predicates backed by an
/// external interpreter. Works as both a [`Cut`] and a
/// [`crate::fill::Projection`].
#[derive(Clone)]
pub struct TryFn<F>(pub F);

impl<F> Cut for TryFn<F>
where
    F: Fn(&Event) -> Result<bool> + Send + Sync,
{
    fn evaluate(&self, event: &Event) -> Result<bool> {
        (self.0)(event)
    }
}

struct Entry {
    name: String,
    enabled: bool,
    cut: Arc<dyn Cut>,
}

impl Clone for Entry {
    fn clone(&self) -> Self {
        Self { name: self.name.clone(), enabled: self.enabled, cut: Arc::clone(&self.cut) }
    }
}

/// Outcome of [`CutPipeline::evaluate_flow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every enabled cut passed.
    Pass,
    /// The enabled cut at this pipeline index was the first to fail.
    RejectedBy(usize),
}

impl Verdict {
    /// `true` for [`Verdict::Pass`].
    pub fn passed(self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

/// Ordered list of `{cut, enabled}` pairs.
///
/// Evaluation order is insertion order. Disabled cuts stay in the list but
/// are never called. Cloning is cheap: cuts are shared, enable flags are
/// copied, so a clone is an independent configuration snapshot.
#[derive(Clone, Default)]
pub struct CutPipeline {
    entries: Vec<Entry>,
}

impl CutPipeline {
    /// Empty pipeline; accepts every event.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a cut. Cut names must be unique.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        enabled: bool,
        cut: impl Cut + 'static,
    ) -> Result<()> {
        self.add_shared(name, enabled, Arc::new(cut))
    }

    /// Append an already shared cut.
    pub fn add_shared(
        &mut self,
        name: impl Into<String>,
        enabled: bool,
        cut: Arc<dyn Cut>,
    ) -> Result<()> {
        let name = name.into();
        if self.position(&name).is_some() {
            return Err(Error::Configuration(format!("duplicate cut name '{name}'")));
        }
        self.entries.push(Entry { name, enabled, cut });
        Ok(())
    }

    /// Enable or disable the cut called `name`. Takes effect on the next evaluation.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<()> {
        let i = self
            .position(name)
            .ok_or_else(|| Error::Configuration(format!("unknown cut '{name}'")))?;
        if self.entries[i].enabled != enabled {
            log::debug!("cut '{name}' {}", if enabled { "enabled" } else { "disabled" });
        }
        self.entries[i].enabled = enabled;
        Ok(())
    }

    /// Whether the cut called `name` is enabled, `None` if there is no such cut.
    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.position(name).map(|i| self.entries[i].enabled)
    }

    /// Enable every cut.
    pub fn enable_all(&mut self) {
        self.entries.iter_mut().for_each(|e| e.enabled = true);
    }

    /// Disable every cut; the pipeline then accepts everything.
    pub fn disable_all(&mut self) {
        self.entries.iter_mut().for_each(|e| e.enabled = false);
    }

    /// `(name, enabled)` in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> + '_ {
        self.entries.iter().map(|e| (e.name.as_str(), e.enabled))
    }

    /// Number of cuts, enabled or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when no cut was added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of enabled cuts.
    pub fn enabled_count(&self) -> usize {
        self.entries.iter().filter(|e| e.enabled).count()
    }

    /// `true` iff every enabled cut accepts the event.
    pub fn evaluate(&self, event: &Event) -> Result<bool> {
        Ok(self.evaluate_flow(event)?.passed())
    }

    /// Like [`CutPipeline::evaluate`], also naming the first failing cut.
    /// Stops at the first failure.
    pub fn evaluate_flow(&self, event: &Event) -> Result<Verdict> {
        for (i, entry) in self.entries.iter().enumerate() {
            if !entry.enabled {
                continue;
            }
            let keep = entry.cut.evaluate(event).map_err(|e| {
                Error::Evaluation(format!("cut '{}' on event {}: {e}", entry.name, event.id))
            })?;
            if !keep {
                return Ok(Verdict::RejectedBy(i));
            }
        }
        Ok(Verdict::Pass)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }
}

impl fmt::Debug for CutPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
