//! axiom-core — an in-memory symbolic knowledge graph with a forward-chaining
//! rule engine.
//!
//! Facts are reified directly into graph topology and identified by content
//! hash, so asserting the same triple twice is a no-op rather than a new
//! record. A small set of core predicates (`IsA`, `Unequal`, `Causes`, `And`,
//! `RelationTypeCategory`, `Contradiction`, `HasValue`) gives rules and
//! queries something to unify against; everything else is an ordinary named
//! atom.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod facts;
pub mod loader;
pub mod monitoring;
pub mod naming;
pub mod node;
pub mod reason;
pub mod snapshot;
pub mod store;
pub mod traversal;
pub mod unify;

pub use error::{AxiomError, Result};
pub use facts::{Answer, Graph, ParsedFact, Predicates};
pub use loader::{load_str, parse_condition, LoadReport};
pub use node::Node;
pub use reason::{
    apply_rule, prune_facts, prune_nodes, purge_unused_predicates, run, run_with_diagnostics,
    PruneSide, RunReport,
};
pub use snapshot::{load, save};
pub use traversal::{format_contradiction, format_deduction, format_fact, get_sources};
pub use unify::{Bindings, Unification};

/// Crate version, exposed for diagnostics and the CLI's `--version` output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
