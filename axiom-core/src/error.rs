//! Error types for axiom-core

use thiserror::Error;

use crate::node::Node;

/// Main error type for axiom-core operations
#[derive(Error, Debug)]
pub enum AxiomError {
    /// The atom or variable id range has been exhausted.
    #[error("capacity exhausted allocating a new {0}")]
    CapacityExhausted(&'static str),

    /// `connect`/`disconnect` referenced a node that was never allocated.
    #[error("unknown node {0:?}")]
    UnknownNode(Node),

    /// `reserve` was asked to materialise an id outside the hash range.
    #[error("cannot reserve {0:?} as a hash node: it collides with the atom range")]
    CollisionWithAtom(Node),

    /// A fact's object set contains its own subject or predicate.
    #[error("fact is self-referential: subject or predicate reappears among the objects")]
    SelfReferentialFact,

    /// A weighted assertion disagreed with the weight already on record.
    #[error("weight {new} contradicts the recorded weight {existing} for this fact")]
    ContradictingProbability {
        /// Weight already stored for the fact.
        existing: f64,
        /// Weight the caller tried to record.
        new: f64,
    },

    /// `connect` was asked to attach a probability to an edge touching a variable.
    #[error("cannot attach a probability to an edge touching variable {0:?}")]
    ProbabilityOnVariable(Node),

    /// `connect` disagreed about direction with an existing weight on the same pair.
    #[error("probability already recorded for ({0:?}, {1:?}) in the other direction")]
    ProbabilityConflict(Node, Node),

    /// A rule fired a deduction equal to the reserved `Contradiction` node, or one
    /// that disagrees with an existing known fact. Constructed and logged by the
    /// driver per rule; never propagated as an `Err` since a contradiction is an
    /// expected run outcome, not a failure to report to the caller.
    #[error("contradiction deriving from rule {rule:?} under the current bindings")]
    ContradictionSignal {
        /// The rule whose deduction produced the contradiction.
        rule: Node,
    },

    /// `prune_nodes` was invoked with a variable predicate.
    #[error("prune_nodes requires a fixed predicate, not a variable")]
    PrunePredicateMustBeFixed,

    /// Snapshot save/load failed.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Snapshot file is truncated, malformed, or fails the round-trip invariant.
    #[error("malformed snapshot: {0}")]
    SnapshotError(String),
}

/// Result type alias for axiom-core operations
pub type Result<T> = std::result::Result<T, AxiomError>;
