//! Metric registration and recording.
//!
//! This crate has no server to expose an endpoint from, so unlike the
//! monitoring module this is trimmed from, there is no recorder
//! implementation, no Prometheus/JSON exporter, and no health-check
//! submodule — only the `metrics` facade macros, grouped here the same way
//! the teacher groups its `describe_*!` calls in one `init()`.

use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};

/// Register every metric this crate emits. Call once, before the first
/// [`crate::facts::Graph`] is constructed, so dashboards see descriptions
/// even if the metric hasn't fired yet.
pub fn init() {
    describe_counter!(
        "axiom_atoms_allocated",
        Unit::Count,
        "Number of atom nodes allocated"
    );
    describe_counter!(
        "axiom_variables_allocated",
        Unit::Count,
        "Number of variable nodes allocated"
    );
    describe_counter!(
        "axiom_edges_created",
        Unit::Count,
        "Number of adjacency edges created"
    );
    describe_counter!(
        "axiom_facts_asserted",
        Unit::Count,
        "Number of newly reified fact nodes"
    );
    describe_counter!(
        "axiom_facts_asserted_idempotent",
        Unit::Count,
        "Number of assert_fact calls that matched an existing fact"
    );
    describe_counter!(
        "axiom_deductions_asserted",
        Unit::Count,
        "Number of facts asserted by the reasoning driver"
    );
    describe_counter!(
        "axiom_contradictions_raised",
        Unit::Count,
        "Number of ContradictionSignal events raised during a run"
    );
    describe_gauge!(
        "axiom_node_count",
        Unit::Count,
        "Current number of allocated nodes"
    );
    describe_gauge!(
        "axiom_rule_count",
        Unit::Count,
        "Current number of Causes-predicated rule facts"
    );
    describe_histogram!(
        "axiom_run_iterations",
        Unit::Count,
        "Passes taken to reach a fixpoint in one run() call"
    );
}

/// Record the size-related gauges after a graph mutation batch (loader run,
/// snapshot load, or `run()` completion).
pub fn record_graph_size(node_count: usize, rule_count: usize) {
    metrics::gauge!("axiom_node_count", node_count as f64);
    metrics::gauge!("axiom_rule_count", rule_count as f64);
}

/// Record how many passes a `run()` call took to settle.
pub fn record_run_iterations(iterations: usize) {
    metrics::histogram!("axiom_run_iterations", iterations as f64);
}
