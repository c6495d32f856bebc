//! Inner-join ordering.
//!
//! Given the record streams of an inner join, decides the order in which they
//! should be driven at execution time so that total estimated cost is
//! minimized:
//! - per-stream base costing through the access probe
//! - a dependency graph of indexed relationships ("if base is driven first,
//!   test may use an index keyed by base's output")
//! - a pruned depth-first search over join permutations
//! - explicit plan directives that pin the declared order
//!
//! Construction runs the costing and dependency analysis eagerly; afterwards
//! [`JoinOrderSearch::find_join_order`] can be called repeatedly, each call
//! ordering the streams not yet marked used by an earlier call.

use std::cmp::Ordering;

use brook_error::Result;
use brook_types::limits::MINIMUM_CARDINALITY;
use brook_types::{SortClause, StreamId};
use tracing::{debug, trace};

use crate::retrieval::AccessEstimator;
use crate::scratch::{ActivationScope, PlannerScratch};
use crate::PlannerSettings;

// ---------------------------------------------------------------------------
// Stream records
// ---------------------------------------------------------------------------

/// An edge of the dependency graph: once the owning (base) stream is active,
/// `stream` can use an index keyed by the base's output.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(clippy::derive_partial_eq_without_eq)]
pub struct IndexRelationship {
    /// The dependent stream, the one that becomes cheaper.
    pub stream: StreamId,
    /// Estimated cost with the base stream bound.
    pub cost: f64,
    /// Estimated rows with the base stream bound.
    pub cardinality: f64,
    /// The indexed access returns at most one row per probe.
    pub unique: bool,
}

impl IndexRelationship {
    /// Cheapness order: a unique relationship always beats a non-unique one;
    /// within the same uniqueness class, lower cost wins.
    #[must_use]
    pub fn cheaper_than(&self, other: &IndexRelationship) -> bool {
        if self.unique != other.unique {
            return self.unique;
        }
        self.cost < other.cost
    }
}

/// Per-stream planning record: the base (single-stream) estimate plus the
/// outgoing relationships discovered during dependency analysis.
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Stream this record describes.
    pub stream: StreamId,
    /// Cost of the best single-stream access.
    pub base_cost: f64,
    /// Selectivity of the best single-stream access.
    pub base_selectivity: f64,
    /// The base access yields at most one row per probe.
    pub base_unique: bool,
    /// An ordered index satisfies the requested sort without a sort step.
    pub base_navigated: bool,
    /// Number of indexes applied by the base access.
    pub base_indexes: usize,
    /// How many other streams could supply a binding to one of this stream's
    /// indexes.
    pub previous_expected_streams: usize,
    /// Part of a returned order, or of the path currently under exploration.
    /// Flags flipped during a descent are restored on every unwind.
    pub used: bool,
    /// Outgoing edges, kept sorted by [`IndexRelationship::cheaper_than`].
    pub indexed_relationships: Vec<IndexRelationship>,
}

impl StreamInfo {
    fn new(stream: StreamId) -> Self {
        Self {
            stream,
            base_cost: 0.0,
            base_selectivity: 0.0,
            base_unique: false,
            base_navigated: false,
            base_indexes: 0,
            previous_expected_streams: 0,
            used: false,
            indexed_relationships: Vec::new(),
        }
    }

    /// No other stream can make this stream's access cheaper.
    #[inline]
    #[must_use]
    pub fn is_independent(&self) -> bool {
        self.previous_expected_streams == 0
    }

    /// The base access applies at least one index predicate.
    #[inline]
    #[must_use]
    pub fn is_filtered(&self) -> bool {
        self.base_indexes > 0
    }

    /// Pre-search ordering: independent streams first, then unique base
    /// accesses, then lower base cost.
    #[must_use]
    pub fn cheaper_than(&self, other: &StreamInfo) -> bool {
        if self.is_independent() != other.is_independent() {
            return self.is_independent();
        }
        if self.base_unique != other.base_unique {
            return self.base_unique;
        }
        self.base_cost < other.base_cost
    }
}

/// Insert a relationship at its cheapness-sorted position.
fn insert_sorted(list: &mut Vec<IndexRelationship>, relationship: IndexRelationship) {
    let at = list
        .iter()
        .position(|existing| relationship.cheaper_than(existing))
        .unwrap_or(list.len());
    list.insert(at, relationship);
}

/// One position of the order under construction.
#[derive(Debug, Clone, Copy)]
struct OrderSlot {
    /// Occupant along the path currently being explored.
    number: StreamId,
    /// Occupant in the best order found so far.
    best_stream: StreamId,
}

impl Default for OrderSlot {
    fn default() -> Self {
        Self {
            number: StreamId::new(0),
            best_stream: StreamId::new(0),
        }
    }
}

// ---------------------------------------------------------------------------
// The ordering core
// ---------------------------------------------------------------------------

/// Cost-based ordering of the streams of one inner join.
pub struct JoinOrderSearch<'a, P: AccessEstimator + ?Sized> {
    scratch: &'a mut PlannerScratch,
    probe: &'a P,
    sort: Option<&'a SortClause>,
    /// An explicit plan directive pins the declared stream order.
    plan: bool,
    settings: PlannerSettings,
    inner_streams: Vec<StreamInfo>,
    slots: Vec<OrderSlot>,
    /// Length of the best partial order found so far.
    best_count: usize,
    /// Cumulative cost of that order; meaningless while `best_count == 0`.
    best_cost: f64,
    /// Streams not yet marked used at the start of the current invocation.
    remaining_streams: usize,
}

impl<'a, P: AccessEstimator + ?Sized> JoinOrderSearch<'a, P> {
    /// Build the search over `streams`, computing base estimates and the
    /// dependency graph up front.
    ///
    /// With `plan` set the declared stream order is authoritative: streams
    /// are never reordered and step costs are not re-evaluated.
    pub fn new(
        scratch: &'a mut PlannerScratch,
        probe: &'a P,
        streams: &[StreamId],
        sort: Option<&'a SortClause>,
        plan: bool,
        settings: PlannerSettings,
    ) -> Result<Self> {
        let mut search = Self {
            scratch,
            probe,
            sort,
            plan,
            settings,
            inner_streams: streams.iter().map(|&s| StreamInfo::new(s)).collect(),
            slots: vec![OrderSlot::default(); streams.len()],
            best_count: 0,
            best_cost: 0.0,
            remaining_streams: 0,
        };
        search.calculate_stream_info()?;
        Ok(search)
    }

    /// The per-stream records, in their post-analysis order.
    #[must_use]
    pub fn streams(&self) -> &[StreamInfo] {
        &self.inner_streams
    }

    /// Estimated cost of the most recently returned order. Meaningless when
    /// the last call returned an empty order.
    #[must_use]
    pub fn best_cost(&self) -> f64 {
        self.best_cost
    }

    /// Base costing (each stream in isolation), dependency analysis (all
    /// streams active at once), then the pre-search sort.
    fn calculate_stream_info(&mut self) -> Result<()> {
        // Base cost without any relation to the other join streams. The sort
        // clause is passed so base navigability is measured against it.
        for i in 0..self.inner_streams.len() {
            let stream = self.inner_streams[i].stream;

            self.scratch.activate(stream);
            let estimate = self.probe.estimate(self.scratch, stream, self.sort);
            self.scratch.deactivate(stream);
            let estimate = estimate?;

            let info = &mut self.inner_streams[i];
            info.base_cost = estimate.cost;
            info.base_selectivity = estimate.selectivity;
            info.base_indexes = estimate.indexes;
            info.base_unique = estimate.unique;
            info.base_navigated = estimate.navigated;
        }

        // Collect stream inter-dependencies with every candidate visible to
        // the probe at once.
        let streams: Vec<StreamId> = self.inner_streams.iter().map(|info| info.stream).collect();
        let scope = ActivationScope::activate(&mut *self.scratch, &streams);
        for test_idx in 0..self.inner_streams.len() {
            Self::collect_dependencies(self.probe, scope.scratch(), &mut self.inner_streams, test_idx)?;
        }
        drop(scope);

        // Unless an explicit plan pins the order, sort the streams by
        // independency and cost. The sort is stable: streams that compare
        // equal keep their declared order, so tie-breaks are deterministic.
        if !self.plan && self.inner_streams.len() > 1 {
            self.inner_streams.sort_by(|a, b| {
                if a.cheaper_than(b) {
                    Ordering::Less
                } else if b.cheaper_than(a) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            });
        }

        Ok(())
    }

    /// Dependency builder for one `test` stream: probe it with the full
    /// active set and no sort, then attach a relationship to every base
    /// stream that contributed a binding to the chosen access.
    fn collect_dependencies(
        probe: &P,
        scratch: &PlannerScratch,
        inner_streams: &mut [StreamInfo],
        test_idx: usize,
    ) -> Result<()> {
        let test_stream = inner_streams[test_idx].stream;
        let estimate = probe.estimate(scratch, test_stream, None)?;

        // The cardinality estimate comes from the scratch's base table
        // cardinality, not from the probe.
        let test_cardinality = scratch.cardinality(test_stream);
        let relationship = IndexRelationship {
            stream: test_stream,
            cost: estimate.cost,
            cardinality: if estimate.unique {
                test_cardinality
            } else {
                test_cardinality * estimate.selectivity
            },
            unique: estimate.unique,
        };

        let mut expected = 0;
        for base in inner_streams.iter_mut() {
            if base.stream != test_stream && estimate.depends_on(base.stream) {
                insert_sorted(&mut base.indexed_relationships, relationship);
                expected += 1;
            }
        }
        inner_streams[test_idx].previous_expected_streams += expected;
        Ok(())
    }

    /// Decide the next join order over the streams not yet marked used.
    ///
    /// Returns the ordered streams and marks every returned stream used; an
    /// empty result means no candidate stream remains. A single independent
    /// stream, when one exists, wins outright without any search.
    pub fn find_join_order(&mut self) -> Result<Vec<StreamId>> {
        self.best_count = 0;
        self.remaining_streams = 0;

        let mut filters = 0usize;
        let mut navigations = 0usize;

        // Seed scan: count the remaining streams, track how many could
        // satisfy the sort by index navigation, and greedily keep the
        // cheapest independent stream.
        for info in &self.inner_streams {
            if info.used {
                continue;
            }
            self.remaining_streams += 1;

            let current_filter = usize::from(info.is_filtered());
            if navigations > 0 && current_filter > 0 {
                navigations = 0;
            }
            filters += current_filter;
            if info.base_navigated && current_filter == filters {
                navigations += 1;
            }

            if info.is_independent() && (self.best_count == 0 || info.base_cost < self.best_cost) {
                self.slots[0].best_stream = info.stream;
                self.best_count = 1;
                self.best_cost = info.base_cost;
            }
        }

        debug!(
            target: "brook.planner",
            remaining = self.remaining_streams,
            filters,
            navigations,
            independent_seed = (self.best_count == 1),
            "start join order"
        );

        if self.best_count == 0 {
            let mut process_list: Vec<IndexRelationship> = Vec::new();

            for i in 0..self.inner_streams.len() {
                let info = &self.inner_streams[i];
                if info.used {
                    continue;
                }

                // When optimization for first rows was requested and index
                // navigations are possible, only consider join orders that
                // start with a navigational stream. Except cases where other
                // streams have local predicates applied.
                let current_filter = usize::from(info.is_filtered());
                let eligible = !self.settings.favor_first_rows
                    || navigations == 0
                    || (info.base_navigated && current_filter == filters);
                if !eligible {
                    continue;
                }

                process_list.clear();
                self.find_best_order(0, i, &mut process_list, 0.0, 1.0)?;

                trace!(
                    target: "brook.planner",
                    seed = %self.inner_streams[i].stream,
                    relationships = ?process_list
                        .iter()
                        .map(|r| (r.stream.get(), r.cost))
                        .collect::<Vec<_>>(),
                    "seed process list"
                );

                if self.plan {
                    // An explicit plan dictates the order; one descent from
                    // the first remaining stream settles it.
                    break;
                }
            }
        }

        let mut best_streams = Vec::with_capacity(self.best_count);
        for slot in 0..self.best_count {
            let stream = self.slots[slot].best_stream;
            let idx = self.stream_info_index(stream);
            self.inner_streams[idx].used = true;
            best_streams.push(stream);
        }

        debug!(
            target: "brook.planner",
            order = ?best_streams.iter().map(|s| s.get()).collect::<Vec<_>>(),
            cost = self.best_cost,
            "best join order"
        );

        Ok(best_streams)
    }

    /// One level of the recursive descent: append the stream at `position`,
    /// cost the step, and follow the cheapest reachable relationship.
    ///
    /// The activation and the used-flag snapshot taken here are restored on
    /// every exit path, including a failing probe.
    fn find_best_order(
        &mut self,
        position: usize,
        stream_idx: usize,
        process_list: &mut Vec<IndexRelationship>,
        cost: f64,
        cardinality: f64,
    ) -> Result<()> {
        let stream = self.inner_streams[stream_idx].stream;
        let first = position == 0;

        self.scratch.activate(stream);
        self.slots[position].number = stream;
        let position = position + 1;

        // Snapshot the used flags; the descent below mutates them.
        let saved_flags: Vec<bool> = self.inner_streams.iter().map(|info| info.used).collect();

        let result = self.descend(position, stream_idx, process_list, cost, cardinality, first);

        self.scratch.deactivate(stream);
        for (info, saved) in self.inner_streams.iter_mut().zip(saved_flags) {
            info.used = saved;
        }

        result
    }

    fn descend(
        &mut self,
        position: usize,
        stream_idx: usize,
        process_list: &mut Vec<IndexRelationship>,
        cost: f64,
        cardinality: f64,
        first: bool,
    ) -> Result<()> {
        let stream = self.inner_streams[stream_idx].stream;

        // Step cost under the bindings activated along the path. An explicit
        // plan is binding, so nothing is re-evaluated there.
        let mut new_cost = 0.0;
        let mut new_cardinality = 0.0;
        if !self.plan {
            let (position_cost, position_cardinality) = self.estimate_step(stream, first)?;
            new_cost = cost + cardinality * position_cost;
            new_cardinality = position_cardinality * cardinality;
        }

        // A longer partial order always wins; an equally long one only on a
        // strictly lower cost, so the first-found order takes ties.
        if position > self.best_count
            || (position == self.best_count && new_cost < self.best_cost)
        {
            self.best_count = position;
            self.best_cost = new_cost;
            for slot in &mut self.slots[..position] {
                slot.best_stream = slot.number;
            }
        }

        if tracing::enabled!(target: "brook.planner", tracing::Level::TRACE) {
            trace!(
                target: "brook.planner",
                position,
                cost = new_cost,
                cardinality = new_cardinality,
                path = ?self.slots[..position]
                    .iter()
                    .map(|slot| slot.number.get())
                    .collect::<Vec<_>>(),
                "found order"
            );
        }

        // Used in the sense of: already part of this proposed ordering.
        self.inner_streams[stream_idx].used = true;

        // Done when every remaining stream is placed, or when a full ordering
        // exists that this prefix can no longer undercut. The latter is the
        // sole pruning rule; cost is monotone along a path, so no extension
        // of such a prefix can beat the recorded best.
        let done = position == self.remaining_streams
            || (self.best_count == self.remaining_streams && self.best_cost <= new_cost);

        if !done && !self.plan {
            self.merge_relationships(stream_idx, process_list);

            // Follow only the cheapest reachable target; the rest of the
            // list is reconsidered when ancestors backtrack.
            let next = process_list
                .iter()
                .find(|rel| !self.stream_info(rel.stream).used)
                .map(|rel| rel.stream);
            if let Some(next_stream) = next {
                let next_idx = self.stream_info_index(next_stream);
                self.find_best_order(position, next_idx, process_list, new_cost, new_cardinality)?;
            }
        }

        if self.plan {
            // The declared order is walked as-is, one next stream per level.
            let next = self.inner_streams.iter().position(|info| !info.used);
            if let Some(next_idx) = next {
                self.find_best_order(position, next_idx, process_list, new_cost, new_cardinality)?;
            }
        }

        Ok(())
    }

    /// Cost one step of the partial order. The probe sees the streams
    /// activated along the path; the sort clause only matters for the first
    /// position, which decides whether navigation can satisfy it.
    fn estimate_step(&self, stream: StreamId, first: bool) -> Result<(f64, f64)> {
        let sort = if first { self.sort } else { None };
        let estimate = self.probe.estimate(self.scratch, stream, sort)?;
        let cardinality = self.scratch.cardinality(stream) * estimate.selectivity;
        Ok((estimate.cost, cardinality.max(MINIMUM_CARDINALITY)))
    }

    /// Merge the stream's outgoing relationships into the process list: an
    /// unused target not yet listed is inserted at its sorted position; a
    /// target already listed keeps whichever entry is cheaper.
    fn merge_relationships(&self, stream_idx: usize, process_list: &mut Vec<IndexRelationship>) {
        for r in 0..self.inner_streams[stream_idx].indexed_relationships.len() {
            let relationship = self.inner_streams[stream_idx].indexed_relationships[r];
            if self.stream_info(relationship.stream).used {
                continue;
            }

            match process_list
                .iter()
                .position(|entry| entry.stream == relationship.stream)
            {
                Some(existing) => {
                    if relationship.cheaper_than(&process_list[existing]) {
                        process_list.remove(existing);
                        insert_sorted(process_list, relationship);
                    }
                }
                None => insert_sorted(process_list, relationship),
            }
        }
    }

    /// Linear lookup by stream id; the sets involved are small.
    fn stream_info(&self, stream: StreamId) -> &StreamInfo {
        &self.inner_streams[self.stream_info_index(stream)]
    }

    fn stream_info_index(&self, stream: StreamId) -> usize {
        self.inner_streams
            .iter()
            .position(|info| info.stream == stream)
            .expect("stream belongs to this join")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
