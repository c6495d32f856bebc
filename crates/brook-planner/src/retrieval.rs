//! Access probe contract.
//!
//! The index-selection oracle consumed by the ordering core. Given one stream
//! and the set of streams currently active in the scratch, it reports the
//! best access path it can build: cost, selectivity, uniqueness, whether an
//! ordered index satisfies the requested sort, and which active streams
//! supplied index bindings.

use brook_error::Result;
use brook_types::{SortClause, StreamId};

use crate::scratch::PlannerScratch;

/// Best-access estimate for a single stream under a given active set.
#[derive(Debug, Clone, PartialEq)]
#[allow(clippy::derive_partial_eq_without_eq)]
pub struct AccessEstimate {
    /// Estimated cost of driving the stream once.
    pub cost: f64,
    /// Fraction of the stream's rows surviving the access, in (0, 1].
    pub selectivity: f64,
    /// The chosen access returns at most one row per probe.
    pub unique: bool,
    /// An ordered index delivers rows in the requested sort order.
    pub navigated: bool,
    /// Number of indexes applied by the access.
    pub indexes: usize,
    /// Streams whose active state supplied bindings to the chosen access.
    /// Never contains the probed stream itself.
    pub dependent_streams: Vec<StreamId>,
}

impl AccessEstimate {
    /// Whether `stream` contributed a binding to the chosen access.
    #[must_use]
    pub fn depends_on(&self, stream: StreamId) -> bool {
        self.dependent_streams.contains(&stream)
    }
}

/// Index-selection oracle consulted by the ordering core.
///
/// Implementations must be deterministic for a fixed active set and fixed
/// inputs, and must not mutate any planning state. Failures (catalog reads,
/// missing statistics) propagate through the core unchanged.
pub trait AccessEstimator {
    /// Estimate the best access for `stream`, given the streams currently
    /// active in `scratch`. `sort` is the requested output ordering when the
    /// caller wants navigability measured against it.
    fn estimate(
        &self,
        scratch: &PlannerScratch,
        stream: StreamId,
        sort: Option<&SortClause>,
    ) -> Result<AccessEstimate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depends_on() {
        let estimate = AccessEstimate {
            cost: 1.0,
            selectivity: 0.5,
            unique: false,
            navigated: false,
            indexes: 1,
            dependent_streams: vec![StreamId::new(2), StreamId::new(5)],
        };
        assert!(estimate.depends_on(StreamId::new(2)));
        assert!(estimate.depends_on(StreamId::new(5)));
        assert!(!estimate.depends_on(StreamId::new(3)));
    }
}
