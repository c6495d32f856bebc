//! Numeric floors used by the cost model.

/// Lower bound applied to every per-position cardinality estimate.
///
/// With the floor in place, cumulative cost is monotone non-decreasing along
/// a search path, which is what makes bound-based pruning admissible.
pub const MINIMUM_CARDINALITY: f64 = 1.0;
