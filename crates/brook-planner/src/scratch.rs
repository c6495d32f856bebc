//! Per-query planner scratch: stream activation bits and base cardinalities.
//!
//! The scratch is shared with the enclosing compiler. The ordering core flips
//! activation bits so the access probe sees the binding context of the
//! partial order under exploration; every activation is paired with a
//! deactivation on all exit paths.

use brook_types::StreamId;

/// One scratch slot per registered stream.
#[derive(Debug, Clone)]
struct StreamSlot {
    active: bool,
    cardinality: f64,
}

/// The per-compilation scratch table.
#[derive(Debug, Clone, Default)]
pub struct PlannerScratch {
    slots: Vec<StreamSlot>,
}

impl PlannerScratch {
    /// An empty scratch with no registered streams.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the next stream, with the base table cardinality estimated by
    /// the enclosing compiler. Cardinalities are floored at one row.
    pub fn register(&mut self, cardinality: f64) -> StreamId {
        let id = StreamId::new(u32::try_from(self.slots.len()).expect("stream count fits in u32"));
        self.slots.push(StreamSlot {
            active: false,
            cardinality: cardinality.max(1.0),
        });
        id
    }

    /// Number of registered streams.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.slots.len()
    }

    /// Mark a stream active. Idempotent under paired use.
    pub fn activate(&mut self, stream: StreamId) {
        self.slot_mut(stream).active = true;
    }

    /// Mark a stream inactive. Idempotent under paired use.
    pub fn deactivate(&mut self, stream: StreamId) {
        self.slot_mut(stream).active = false;
    }

    /// Whether a stream is currently marked active.
    #[must_use]
    pub fn is_active(&self, stream: StreamId) -> bool {
        self.slot(stream).active
    }

    /// Base table cardinality for a stream, always at least one row.
    #[must_use]
    pub fn cardinality(&self, stream: StreamId) -> f64 {
        self.slot(stream).cardinality
    }

    /// Streams currently marked active, in registration order.
    #[must_use]
    pub fn active_streams(&self) -> Vec<StreamId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.active)
            .map(|(i, _)| StreamId::new(i as u32))
            .collect()
    }

    fn slot(&self, stream: StreamId) -> &StreamSlot {
        self.slots
            .get(stream.index())
            .expect("stream registered in scratch")
    }

    fn slot_mut(&mut self, stream: StreamId) -> &mut StreamSlot {
        self.slots
            .get_mut(stream.index())
            .expect("stream registered in scratch")
    }
}

/// Scoped activation of a set of streams.
///
/// Captures the active set on entry, forces the given streams active, and
/// restores the captured set when dropped, on normal return, early return,
/// and propagated failure alike.
#[derive(Debug)]
pub struct ActivationScope<'a> {
    scratch: &'a mut PlannerScratch,
    saved: Vec<bool>,
}

impl<'a> ActivationScope<'a> {
    /// Capture the current active set and force `streams` active.
    pub fn activate(scratch: &'a mut PlannerScratch, streams: &[StreamId]) -> Self {
        let saved = scratch.slots.iter().map(|slot| slot.active).collect();
        for &stream in streams {
            scratch.activate(stream);
        }
        Self { scratch, saved }
    }

    /// The scratch, with the scope's activations in effect.
    #[must_use]
    pub fn scratch(&self) -> &PlannerScratch {
        self.scratch
    }
}

impl Drop for ActivationScope<'_> {
    fn drop(&mut self) {
        for (slot, saved) in self.scratch.slots.iter_mut().zip(&self.saved) {
            slot.active = *saved;
        }
    }
}
