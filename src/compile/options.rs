//! Ambient compiler configuration (SPEC_FULL.md §2's ambient layers),
//! analogous to the teacher's `MetricConfig`-style config structs threaded
//! through long-lived constructors rather than passed ad hoc per call.

///
/// CompileOptions
///

#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Unit duration a `derivative()` call without an explicit unit argument
    /// is scaled to (§4.7's "default: 1 second"). Consulted by
    /// `Select::apply_tail` whenever a statement's derivative stage is
    /// [`crate::compile::DerivativeUnit::Default`].
    pub derivative_default_unit_nanos: i64,
    /// Soft cap on points materialized by any one combinator (demux, fill,
    /// median/top/bottom) for a single window or series; combinators in this
    /// crate do not enforce it themselves — it exists for a host to budget
    /// against before issuing a request.
    pub max_window_materialization: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            derivative_default_unit_nanos: 1_000_000_000,
            max_window_materialization: 1_000_000,
        }
    }
}
