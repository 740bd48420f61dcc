//! Event source contract.
//!
//! A run pulls events from an [`EventSource`] strictly one at a time. Some
//! sources know both the generated (true) and the reconstructed (measured)
//! view of each physical event; single-view sources report their only view
//! as both.

use crate::types::Event;
use crate::Result;

/// Sequential, rewindable stream of events.
pub trait EventSource {
    /// `true` while at least one more event can be read.
    fn has_more(&mut self) -> Result<bool>;

    /// Read the next event. Malformed input is reported as
    /// [`crate::Error::MalformedInput`] and ends the pass.
    fn advance(&mut self) -> Result<()>;

    /// Generated view of the current event.
    fn generated(&self) -> &Event;

    /// Reconstructed view of the current event, `None` when the event was
    /// not reconstructed. Single-view sources return the generated view.
    fn reconstructed(&self) -> Option<&Event>;

    /// Rewind to the first event. Idempotent.
    fn reset(&mut self) -> Result<()>;

    /// Short name used in diagnostics.
    fn name(&self) -> &str {
        "source"
    }
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn has_more(&mut self) -> Result<bool> {
        (**self).has_more()
    }

    fn advance(&mut self) -> Result<()> {
        (**self).advance()
    }

    fn generated(&self) -> &Event {
        (**self).generated()
    }

    fn reconstructed(&self) -> Option<&Event> {
        (**self).reconstructed()
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// In-memory event source.
///
/// Built either from single-view events or from `(generated, reconstructed)`
/// pairs where the reconstructed view may be missing.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    generated: Vec<Event>,
    reconstructed: Vec<Option<Event>>,
    dual: bool,
    next: usize,
    current: Option<usize>,
    empty: Event,
}

impl MemorySource {
    /// Single-view source: the reconstructed view equals the generated one.
    pub fn single(events: Vec<Event>) -> Self {
        Self { generated: events, ..Self::default() }
    }

    /// Dual-view source.
    pub fn dual(pairs: Vec<(Event, Option<Event>)>) -> Self {
        let (generated, reconstructed) = pairs.into_iter().unzip();
        Self { generated, reconstructed, dual: true, ..Self::default() }
    }

    /// Number of events in the source.
    pub fn len(&self) -> usize {
        self.generated.len()
    }

    /// `true` when the source holds no events.
    pub fn is_empty(&self) -> bool {
        self.generated.is_empty()
    }
}

impl EventSource for MemorySource {
    fn has_more(&mut self) -> Result<bool> {
        Ok(self.next < self.generated.len())
    }

    fn advance(&mut self) -> Result<()> {
        if self.next >= self.generated.len() {
            return Err(crate::Error::malformed(
                "memory",
                format!("event {}", self.next),
                "advance past end of source",
            ));
        }
        self.current = Some(self.next);
        self.next += 1;
        Ok(())
    }

    fn generated(&self) -> &Event {
        self.current.map_or(&self.empty, |i| &self.generated[i])
    }

    fn reconstructed(&self) -> Option<&Event> {
        let i = self.current?;
        if self.dual { self.reconstructed[i].as_ref() } else { Some(&self.generated[i]) }
    }

    fn reset(&mut self) -> Result<()> {
        self.next = 0;
        self.current = None;
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
