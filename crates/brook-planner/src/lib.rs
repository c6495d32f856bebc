//! Inner-join ordering core for the brook query planner.
//!
//! Implements:
//! - Base costing of each candidate stream through the access probe
//! - Dependency analysis: which streams can supply index bindings to which
//! - Pruned depth-first search over join permutations
//! - Seed selection shortcuts (independent streams, first-rows navigation)
//! - Explicit plan directives that pin the declared order
//!
//! The crate owns no catalog and no statistics; both are reached through the
//! [`retrieval::AccessEstimator`] oracle. The per-query scratch shared with
//! the enclosing compiler lives in [`scratch`].

pub mod join_order;
pub mod retrieval;
pub mod scratch;

pub use join_order::{IndexRelationship, JoinOrderSearch, StreamInfo};
pub use retrieval::{AccessEstimate, AccessEstimator};
pub use scratch::{ActivationScope, PlannerScratch};

/// Tunables handed down from the enclosing optimizer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct PlannerSettings {
    /// Prefer plans that deliver initial rows quickly over plans with the
    /// lowest total cost.
    #[serde(default)]
    pub favor_first_rows: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_is_total_cost() {
        assert!(!PlannerSettings::default().favor_first_rows);
    }

    #[test]
    fn test_settings_deserialize_missing_field() {
        let settings: PlannerSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, PlannerSettings::default());
    }
}
