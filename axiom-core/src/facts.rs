//! Fact algebra: reified facts, conjunctions, and the graph orchestrator that
//! ties the node allocator, naming layer, and core predicates together.
//!
//! A fact `F = hash(P, S, {O1..On})` is reified directly into graph topology
//! (`S <-> F`, `F -> P`, `Oi -> F`) rather than stored as a separate record,
//! so asserting the same triple twice always lands on the same node.

use tracing::instrument;

use crate::error::{AxiomError, Result};
use crate::naming::Naming;
use crate::node::{self, Node};
use crate::store::GraphStore;

/// The six relations preallocated on construction: `RelationTypeCategory`,
/// `Causes`, `And`, `IsA`, `Unequal`, `Contradiction`.
#[derive(Debug, Clone, Copy)]
pub struct Predicates {
    /// The relation every predicate is declared an instance of.
    pub relation_type_category: Node,
    /// Relates a rule's condition to its deductions.
    pub causes: Node,
    /// Marks a conjunction's head.
    pub and: Node,
    /// Ordinary subtype/membership relation.
    pub is_a: Node,
    /// Disequality constraint used in rule conditions.
    pub unequal: Node,
    /// Sentinel deduction target that signals a contradiction.
    pub contradiction: Node,
    /// Marks a node as carrying a value-concept, consulted by unification's
    /// value-equivalence shortcut.
    pub has_value: Node,
}

/// A reified fact parsed back into its triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFact {
    /// The fact's subject.
    pub subject: Node,
    /// The fact's predicate.
    pub predicate: Node,
    /// The fact's object set (order-insignificant, but returned sorted).
    pub objects: Vec<Node>,
}

/// Result of [`Graph::check_fact`]: a tagged variant, not a class hierarchy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Answer {
    /// No fact node corresponds to the queried triple.
    Unknown,
    /// A fact node exists, carrying the given probability (default `1.0`).
    Known {
        /// The resolved fact node.
        fact: Node,
        /// The recorded weight; `1.0` when none was attached.
        probability: f64,
    },
}

impl Answer {
    /// `true` for [`Answer::Known`].
    pub fn is_known(&self) -> bool {
        matches!(self, Answer::Known { .. })
    }

    /// `true` if known with probability strictly above one half.
    pub fn is_correct(&self) -> bool {
        matches!(self, Answer::Known { probability, .. } if *probability > 0.5)
    }

    /// `true` if known with probability strictly below one half.
    pub fn is_wrong(&self) -> bool {
        matches!(self, Answer::Known { probability, .. } if *probability < 0.5)
    }

    /// `true` if known with probability exactly zero.
    pub fn is_impossible(&self) -> bool {
        matches!(self, Answer::Known { probability, .. } if *probability == 0.0)
    }
}

/// The graph: node store, naming tables, and core predicates, exposing the
/// fact algebra operations that assert and parse reified facts.
pub struct Graph {
    store: GraphStore,
    naming: Naming,
    predicates: Predicates,
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    /// A fresh graph with the six core predicates preallocated and the
    /// foundational `IsA`/`Unequal`/`Causes` membership facts asserted.
    pub fn new() -> Self {
        let store = GraphStore::new();
        let naming = Naming::default();

        let relation_type_category = store.allocate_atom().expect("empty graph has capacity");
        let causes = store.allocate_atom().expect("empty graph has capacity");
        let and = store.allocate_atom().expect("empty graph has capacity");
        let is_a = store.allocate_atom().expect("empty graph has capacity");
        let unequal = store.allocate_atom().expect("empty graph has capacity");
        let contradiction = store.allocate_atom().expect("empty graph has capacity");
        let has_value = store.allocate_atom().expect("empty graph has capacity");

        let predicates = Predicates {
            relation_type_category,
            causes,
            and,
            is_a,
            unequal,
            contradiction,
            has_value,
        };

        let graph = Graph {
            store,
            naming,
            predicates,
        };

        graph
            .assert_fact(is_a, predicates.is_a, &[relation_type_category], None)
            .expect("bootstrap facts cannot fail");
        graph
            .assert_fact(unequal, predicates.is_a, &[relation_type_category], None)
            .expect("bootstrap facts cannot fail");
        graph
            .assert_fact(causes, predicates.is_a, &[relation_type_category], None)
            .expect("bootstrap facts cannot fail");

        graph
    }

    /// Assemble a graph from already-populated parts, skipping the bootstrap
    /// allocation `new()` performs. Used by [`crate::snapshot::load`], which
    /// restores the core predicates and their membership facts from the file
    /// instead of re-deriving them.
    pub(crate) fn from_parts(store: GraphStore, naming: Naming, predicates: Predicates) -> Self {
        Graph {
            store,
            naming,
            predicates,
        }
    }

    /// The underlying adjacency store.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// The per-language naming tables.
    pub fn naming(&self) -> &Naming {
        &self.naming
    }

    /// The preallocated core predicates.
    pub fn predicates(&self) -> &Predicates {
        &self.predicates
    }

    /// Allocate a fresh named atom, interning `name` in `lang`.
    pub fn atom(&self, name: &str, lang: &str) -> Result<Node> {
        self.naming.intern(&self.store, name, lang)
    }

    /// Allocate a fresh variable.
    pub fn variable(&self) -> Result<Node> {
        self.store.allocate_variable()
    }

    /// Assert `subject predicate {objects}`, optionally weighted.
    ///
    /// Auto-declares `predicate IsA RelationTypeCategory` the first time a
    /// new predicate is used. Idempotent: asserting the same triple twice
    /// returns the same fact node and leaves the graph unchanged, unless the
    /// second assertion's weight disagrees with the first per the min/max
    /// merge rule, in which case it fails with
    /// [`AxiomError::ContradictingProbability`].
    #[instrument(level = "debug", skip(self, objects))]
    pub fn assert_fact(
        &self,
        subject: Node,
        predicate: Node,
        objects: &[Node],
        prob: Option<f64>,
    ) -> Result<Node> {
        if objects.contains(&predicate) || objects.contains(&subject) {
            return Err(AxiomError::SelfReferentialFact);
        }

        if predicate != self.predicates.is_a && predicate != self.predicates.relation_type_category
        {
            self.assert_fact(
                predicate,
                self.predicates.is_a,
                &[self.predicates.relation_type_category],
                None,
            )?;
        }

        let fact = node::hash_heads_set(predicate, subject, objects);

        if self.store.exists(fact) {
            if let Some(new_prob) = prob {
                let existing = self.store.probability(fact, predicate).unwrap_or(1.0);
                self.store
                    .connect(fact, predicate, Some(new_prob))
                    .map_err(|_| AxiomError::ContradictingProbability {
                        existing,
                        new: new_prob,
                    })?;
            }
            metrics::counter!("axiom_facts_asserted_idempotent").increment(1);
            return Ok(fact);
        }

        self.store.reserve(fact)?;
        self.store.connect(subject, fact, None)?;
        self.store.connect(fact, subject, None)?;
        self.store.connect(fact, predicate, prob)?;
        for object in objects {
            self.store.connect(*object, fact, None)?;
        }

        metrics::counter!("axiom_facts_asserted").increment(1);
        Ok(fact)
    }

    /// Assert a conjunction `C = hash(And, {subs})`, idempotently.
    pub fn condition(&self, subs: &[Node]) -> Result<Node> {
        let conjunction = node::hash_head_set(self.predicates.and, subs);
        if !self.store.exists(conjunction) {
            self.store.reserve(conjunction)?;
            self.store.connect(conjunction, self.predicates.and, None)?;
            for sub in subs {
                self.store.connect(*sub, conjunction, None)?;
            }
        }
        Ok(conjunction)
    }

    /// Look up the fact `subject predicate {objects}` without asserting it.
    pub fn check_fact(&self, subject: Node, predicate: Node, objects: &[Node]) -> Answer {
        let fact = node::hash_heads_set(predicate, subject, objects);

        if !self.store.exists(fact) {
            return Answer::Unknown;
        }
        if !self.store.has_right_edge(subject, fact) || !self.store.has_left_edge(subject, fact) {
            return Answer::Unknown;
        }
        if !self.store.has_right_edge(fact, predicate) {
            return Answer::Unknown;
        }
        for object in objects {
            if !self.store.has_right_edge(*object, fact) {
                return Answer::Unknown;
            }
        }

        let probability = self.store.probability(fact, predicate).unwrap_or(1.0);
        Answer::Known { fact, probability }
    }

    /// `true` if `node` is a conjunction (has an outgoing edge to `And`).
    pub fn is_conjunction(&self, node: Node) -> bool {
        self.store.has_right_edge(node, self.predicates.and)
    }

    /// Every structural interpretation of `fact` as a `(subject, predicate,
    /// objects)` triple.
    ///
    /// Candidate predicates are the nodes in `right[F]` declared `IsA
    /// RelationTypeCategory`; for each, candidate subjects are the remaining
    /// nodes in `right[F]` that are also bidirectional (present in
    /// `left[F]`); the object set is `left[F]` minus the subject and
    /// predicate, excluding anything that also appears in `right[F]`. When
    /// more than one interpretation survives, those with a non-hash subject
    /// are preferred — a hash subject usually means `fact` is itself the
    /// object of some other, unrelated structure.
    pub fn fact_structures(&self, fact: Node) -> Vec<ParsedFact> {
        if fact.is_none() || !self.store.exists(fact) {
            return Vec::new();
        }

        let right = self.store.right_of(fact);
        let left = self.store.left_of(fact);
        let right_set: std::collections::HashSet<Node> = right.iter().copied().collect();
        let left_set: std::collections::HashSet<Node> = left.iter().copied().collect();

        let predicates: Vec<Node> = right
            .iter()
            .copied()
            .filter(|p| {
                self.check_fact(*p, self.predicates.is_a, &[self.predicates.relation_type_category])
                    .is_known()
            })
            .collect();

        let mut structures = Vec::new();
        for predicate in predicates {
            for subject in right.iter().copied().filter(|s| *s != predicate) {
                if !left_set.contains(&subject) {
                    continue;
                }
                let mut objects: Vec<Node> = left
                    .iter()
                    .copied()
                    .filter(|o| *o != subject && *o != predicate && !right_set.contains(o))
                    .collect();
                if objects.is_empty() {
                    continue;
                }
                objects.sort_unstable();
                structures.push(ParsedFact {
                    subject,
                    predicate,
                    objects,
                });
            }
        }

        if structures.len() > 1 && structures.iter().any(|s| !s.subject.is_hash()) {
            structures.retain(|s| !s.subject.is_hash());
        }
        structures
    }

    /// The preferred structural interpretation of a non-conjunction fact
    /// node, recovering `(subject, predicate, objects)`.
    pub fn parse_fact(&self, fact: Node) -> Option<ParsedFact> {
        self.fact_structures(fact).into_iter().next()
    }

    /// The node declared as `node`'s value-concept via the reserved
    /// `HasValue` relation, if any.
    pub fn value_concept(&self, node: Node) -> Option<Node> {
        if node.is_none() || !self.store.exists(node) {
            return None;
        }
        for relation in self.store.right_of(node) {
            if self.store.has_right_edge(relation, self.predicates.has_value) {
                for target in self.store.left_of(relation) {
                    if target != node {
                        return Some(target);
                    }
                }
            }
        }
        None
    }

    /// Recover the sub-conditions of a conjunction node.
    pub fn parse_conjunction(&self, conjunction: Node) -> Option<Vec<Node>> {
        if !self.is_conjunction(conjunction) {
            return None;
        }
        Some(self.store.left_of(conjunction))
    }

    /// Delete a node, its incident edges, and its naming entries.
    pub fn remove(&self, node: Node) {
        self.store.remove(node);
        self.naming.remove_name(node, "en");
        self.naming.cleanup(&self.store);
    }
}
