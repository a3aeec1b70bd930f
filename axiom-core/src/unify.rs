//! Structural unification between a rule's condition nodes and the facts
//! already asserted in the graph.
//!
//! Two nodes unify if they're identical, if one is an unbound variable (which
//! binds to the other), or if both resolve to fact structures whose subject,
//! predicate, and object sets unify pairwise. A `history` of node pairs
//! visited in the current unification attempt gives cycle safety: revisiting
//! a pair already in progress succeeds co-inductively rather than looping.

use std::collections::HashMap;

use crossbeam::channel::bounded;
use rayon::prelude::*;

use crate::facts::{Graph, ParsedFact};
use crate::node::Node;

/// Above this many relation-driven candidates, extraction runs on the
/// `rayon` pool instead of inline — the relation-driven fallback is the one
/// candidate source with no size bound (every fact ever asserted with a
/// given predicate), so it's the only one worth chunking.
const PARALLEL_CANDIDATE_THRESHOLD: usize = 256;

/// Variable -> bound node. Two maps are threaded through a unification
/// attempt: `local` bindings made within the current attempt (discarded on
/// failure) and `global` bindings already committed by earlier conditions in
/// the same rule (consulted but never mutated here).
pub type Bindings = HashMap<Node, Node>;

fn resolve(bindings: &Bindings, node: Node) -> Node {
    if node.is_variable() {
        *bindings.get(&node).unwrap_or(&node)
    } else {
        node
    }
}

/// Structural unification of `rule` against `candidate`.
///
/// `local` accumulates bindings made during this attempt; `global` holds
/// bindings already fixed by earlier conditions and is consulted but never
/// written. `history` guards against infinite recursion on cyclic graphs: a
/// `(rule, candidate)` pair already on the stack unifies trivially.
pub fn unify_nodes(
    graph: &Graph,
    rule: Node,
    candidate: Node,
    local: &mut Bindings,
    global: &Bindings,
    history: &mut Vec<(Node, Node)>,
) -> bool {
    if rule == candidate {
        return true;
    }

    if rule.is_variable() {
        if let Some(bound) = local.get(&rule).or_else(|| global.get(&rule)) {
            return *bound == candidate;
        }
        local.insert(rule, candidate);
        return true;
    }

    if history.contains(&(rule, candidate)) {
        return true;
    }

    if let (Some(rule_value), Some(candidate_value)) =
        (graph.value_concept(rule), graph.value_concept(candidate))
    {
        if rule_value == candidate_value {
            return true;
        }
    }

    history.push((rule, candidate));
    let unified = unify_structurally(graph, rule, candidate, local, global, history);
    history.pop();
    unified
}

fn unify_structurally(
    graph: &Graph,
    rule: Node,
    candidate: Node,
    local: &mut Bindings,
    global: &Bindings,
    history: &mut Vec<(Node, Node)>,
) -> bool {
    let rule_structures = graph.fact_structures(rule);
    let candidate_structures = graph.fact_structures(candidate);
    if rule_structures.is_empty() || candidate_structures.is_empty() {
        return false;
    }

    for rule_structure in &rule_structures {
        for candidate_structure in &candidate_structures {
            let mut attempt = local.clone();
            if unify_fact_structures(
                graph,
                rule_structure,
                candidate_structure,
                &mut attempt,
                global,
                history,
            ) {
                *local = attempt;
                return true;
            }
        }
    }
    false
}

fn unify_fact_structures(
    graph: &Graph,
    rule: &ParsedFact,
    candidate: &ParsedFact,
    local: &mut Bindings,
    global: &Bindings,
    history: &mut Vec<(Node, Node)>,
) -> bool {
    if !unify_nodes(graph, rule.predicate, candidate.predicate, local, global, history) {
        return false;
    }
    if !unify_nodes(graph, rule.subject, candidate.subject, local, global, history) {
        return false;
    }
    if rule.objects.len() > candidate.objects.len() {
        return false;
    }

    let mut used = vec![false; candidate.objects.len()];
    for rule_object in &rule.objects {
        let mut matched = false;
        for (index, candidate_object) in candidate.objects.iter().enumerate() {
            if used[index] {
                continue;
            }
            let mut attempt = local.clone();
            if unify_nodes(graph, *rule_object, *candidate_object, &mut attempt, global, history) {
                *local = attempt;
                used[index] = true;
                matched = true;
                break;
            }
        }
        if !matched {
            return false;
        }
    }
    true
}

/// Try to extend `bindings` by unifying a rule condition `subject relation
/// {objects}` against an already-asserted `candidate_fact`.
///
/// Rejects `candidate_fact` outright if any of its objects is itself a
/// variable — that marks it as another rule's condition rather than a ground
/// fact. Each rule object is matched against *some* distinct candidate
/// object (a fact's object set models disjoint alternatives, e.g. `IsA
/// {Cat, Dog}`), not all of them at once.
pub fn extract_bindings(
    graph: &Graph,
    subject: Node,
    relation: Node,
    objects: &[Node],
    candidate_fact: Node,
    bindings: &Bindings,
) -> Option<Bindings> {
    let parsed = graph.parse_fact(candidate_fact)?;
    if parsed.objects.iter().any(|o| o.is_variable()) {
        return None;
    }

    let mut local = Bindings::new();
    let mut history = Vec::new();

    if !unify_nodes(graph, subject, parsed.subject, &mut local, bindings, &mut history) {
        return None;
    }

    if relation.is_variable() {
        if !unify_nodes(graph, relation, parsed.predicate, &mut local, bindings, &mut history) {
            return None;
        }
    } else if relation != parsed.predicate {
        return None;
    }

    for rule_object in objects {
        let mut matched = false;
        for candidate_object in &parsed.objects {
            let mut attempt = local.clone();
            let mut attempt_history = history.clone();
            if unify_nodes(
                graph,
                *rule_object,
                *candidate_object,
                &mut attempt,
                bindings,
                &mut attempt_history,
            ) {
                local = attempt;
                matched = true;
                break;
            }
        }
        if !matched {
            return None;
        }
    }

    let mut merged = bindings.clone();
    merged.extend(local);
    Some(merged)
}

/// Enumerates every way a rule condition `subject relation {objects}`
/// unifies against the facts already in the graph, given bindings already
/// fixed by earlier conditions in the same rule.
///
/// Candidate facts are chosen by whichever side is already bound, cheapest
/// first: a bound subject drives the search through `right_of(subject)`; a
/// bound object falls back to `right_of(object)`; otherwise a fixed relation
/// drives it through `left_of(relation)`, scanning every fact ever asserted
/// with that predicate. If the relation is also unbound, every predicate atom
/// `P` with `P IsA RelationTypeCategory` is enumerated and their `left_of(P)`
/// sets unioned, so a fully unbound condition still sees every fact in the
/// graph rather than matching nothing.
pub struct Unification<'g> {
    graph: &'g Graph,
    subject: Node,
    relation: Node,
    objects: Vec<Node>,
    bindings: Bindings,
    candidates: Vec<Node>,
    index: usize,
    precomputed: Option<std::vec::IntoIter<(Node, Bindings)>>,
}

/// Every predicate atom `P` with `P IsA RelationTypeCategory`, unioned with
/// every fact ever asserted under each one — the candidate source for a
/// condition whose relation position is itself an unbound variable (`?X ?P
/// ?Y`), where no bound subject/object/relation is available to drive the
/// search.
fn relation_type_candidates(graph: &Graph) -> Vec<Node> {
    let predicates = graph.predicates();
    let mut seen = std::collections::HashSet::new();
    let mut candidates = Vec::new();
    for typing_fact in graph.store().right_of(predicates.relation_type_category) {
        let Some(parsed) = graph.parse_fact(typing_fact) else {
            continue;
        };
        if parsed.predicate != predicates.is_a {
            continue;
        }
        for fact in graph.store().left_of(parsed.subject) {
            if seen.insert(fact) {
                candidates.push(fact);
            }
        }
    }
    candidates
}

impl<'g> Unification<'g> {
    /// Build the candidate set for `subject relation {objects}` under
    /// `bindings`, selecting the cheapest driving index available.
    pub fn new(
        graph: &'g Graph,
        subject: Node,
        relation: Node,
        objects: Vec<Node>,
        bindings: Bindings,
    ) -> Self {
        let resolved_subject = resolve(&bindings, subject);
        let resolved_relation = resolve(&bindings, relation);
        let resolved_objects: Vec<Node> =
            objects.iter().map(|o| resolve(&bindings, *o)).collect();

        let relation_filter = |fact: &Node| {
            resolved_relation.is_variable()
                || graph.store().has_right_edge(*fact, resolved_relation)
        };

        let mut relation_driven = false;
        let candidates = if !resolved_subject.is_variable() && graph.store().exists(resolved_subject) {
            graph
                .store()
                .right_of(resolved_subject)
                .into_iter()
                .filter(relation_filter)
                .collect()
        } else if let Some(bound_object) = resolved_objects
            .iter()
            .find(|o| !o.is_variable() && graph.store().exists(**o))
        {
            graph
                .store()
                .right_of(*bound_object)
                .into_iter()
                .filter(relation_filter)
                .collect()
        } else if !resolved_relation.is_variable() && graph.store().exists(resolved_relation) {
            relation_driven = true;
            graph.store().left_of(resolved_relation)
        } else if resolved_relation.is_variable() {
            relation_driven = true;
            relation_type_candidates(graph)
        } else {
            Vec::new()
        };

        if relation_driven && candidates.len() > PARALLEL_CANDIDATE_THRESHOLD {
            let matches = extract_matches_parallel(
                graph,
                subject,
                relation,
                &objects,
                &bindings,
                &candidates,
            );
            return Unification {
                graph,
                subject,
                relation,
                objects,
                bindings,
                candidates: Vec::new(),
                index: 0,
                precomputed: Some(matches.into_iter()),
            };
        }

        Unification {
            graph,
            subject,
            relation,
            objects,
            bindings,
            candidates,
            index: 0,
            precomputed: None,
        }
    }

    /// Candidate facts remaining to be tried, for diagnostics and fan-out
    /// sizing decisions made by the caller.
    pub fn remaining_candidates(&self) -> usize {
        match &self.precomputed {
            Some(iter) => iter.len(),
            None => self.candidates.len().saturating_sub(self.index),
        }
    }
}

/// Extract bindings for every candidate on the `rayon` pool, chunked
/// `4×workers` ways, with matches funneled through a bounded `crossbeam`
/// channel and drained once every chunk has finished.
fn extract_matches_parallel(
    graph: &Graph,
    subject: Node,
    relation: Node,
    objects: &[Node],
    bindings: &Bindings,
    candidates: &[Node],
) -> Vec<(Node, Bindings)> {
    let workers = rayon::current_num_threads().max(1);
    let chunk_size = (candidates.len() / (4 * workers)).max(1);
    let (tx, rx) = bounded(candidates.len());

    candidates.par_chunks(chunk_size).for_each(|chunk| {
        for candidate in chunk {
            if let Some(extended) =
                extract_bindings(graph, subject, relation, objects, *candidate, bindings)
            {
                let _ = tx.send((*candidate, extended));
            }
        }
    });
    drop(tx);

    rx.try_iter().collect()
}

impl<'g> Iterator for Unification<'g> {
    /// The matched fact node together with the bindings it yields.
    type Item = (Node, Bindings);

    fn next(&mut self) -> Option<(Node, Bindings)> {
        if let Some(iter) = &mut self.precomputed {
            return iter.next();
        }

        while self.index < self.candidates.len() {
            let candidate = self.candidates[self.index];
            self.index += 1;
            if let Some(extended) = extract_bindings(
                self.graph,
                self.subject,
                self.relation,
                &self.objects,
                candidate,
                &self.bindings,
            ) {
                return Some((candidate, extended));
            }
        }
        None
    }
}
