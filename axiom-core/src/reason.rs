//! Forward-chaining reasoning driver: rule iteration, condition ordering,
//! deduction instantiation, contradiction handling, and the maintenance
//! sweeps (pruning, unused-predicate purge) that sit alongside it.
//!
//! A rule is a fact whose predicate is `Causes`: its subject is the
//! condition (a single leaf or a conjunction), its objects are the
//! deduction templates instantiated once the condition matches.

use std::collections::{HashMap, HashSet};

use tracing::{instrument, trace};

use crate::error::{AxiomError, Result};
use crate::facts::{Answer, Graph};
use crate::node::Node;
use crate::traversal::{format_contradiction, format_deduction};
use crate::unify::{Bindings, Unification};

/// Outcome of a single rule iteration pass and the run it belongs to.
#[derive(Debug, Default, Clone)]
pub struct RunReport {
    /// Total new facts asserted across every pass.
    pub deductions: usize,
    /// Number of passes executed (always >= 1).
    pub iterations: usize,
    /// Rule nodes that raised a contradiction at least once, with the
    /// condition node active when they did.
    pub contradictions: Vec<(Node, Node)>,
}

impl RunReport {
    /// `true` if at least one rule raised a contradiction during the run.
    pub fn has_contradiction(&self) -> bool {
        !self.contradictions.is_empty()
    }
}

/// Iterate rules to a fixpoint (or once, if `once` is set). Every pass only
/// re-examines rules; a pass makes progress when at least one deduction is
/// newly asserted. The loop stops when a pass makes no progress.
#[instrument(level = "debug", skip(graph))]
pub fn run(graph: &Graph, once: bool) -> RunReport {
    run_inner(graph, once, None)
}

/// Like [`run`], but calls `on_line` with each diagnostic line the §6 print
/// callback contract describes — a deduced-fact line (`important = false`)
/// or a contradiction line (`important = true`) — as it's produced. The
/// shell/CLI layer is expected to suppress the non-important ones when the
/// caller doesn't want per-deduction noise.
pub fn run_with_diagnostics(
    graph: &Graph,
    once: bool,
    mut on_line: impl FnMut(String, bool),
) -> RunReport {
    run_inner(graph, once, Some(&mut on_line))
}

fn run_inner(graph: &Graph, once: bool, mut on_line: Option<&mut dyn FnMut(String, bool)>) -> RunReport {
    let causes = graph.predicates().causes;
    let mut report = RunReport::default();

    loop {
        report.iterations += 1;
        let mut progress = false;

        for rule in graph.store().left_of(causes) {
            let parsed = match graph.parse_fact(rule) {
                Some(p) if !p.objects.is_empty() => p,
                _ => continue,
            };
            let condition = parsed.subject;

            for bindings in evaluate_condition(graph, condition) {
                match deduce(graph, rule, &parsed.objects, &bindings) {
                    DeduceOutcome::Contradiction => {
                        report.contradictions.push((rule, condition));
                        metrics::counter!("axiom_contradictions_raised").increment(1);
                        if let Some(cb) = on_line.as_deref_mut() {
                            let shown = instantiate(graph, condition, &bindings, &mut Vec::new())
                                .unwrap_or(condition);
                            cb(format_contradiction(graph, shown, "en"), true);
                        }
                    }
                    DeduceOutcome::Progress(asserted) => {
                        progress = true;
                        report.deductions += asserted.len();
                        if let Some(cb) = on_line.as_deref_mut() {
                            let premises: Vec<Node> = condition_leaves(graph, condition)
                                .into_iter()
                                .filter_map(|leaf| instantiate(graph, leaf, &bindings, &mut Vec::new()))
                                .collect();
                            for conclusion in &asserted {
                                cb(format_deduction(graph, *conclusion, &premises, "en"), false);
                            }
                        }
                    }
                    DeduceOutcome::NoProgress => {}
                }
            }
        }

        trace!(iteration = report.iterations, progress, "reasoning pass complete");
        if once || !progress {
            break;
        }
    }

    crate::monitoring::record_graph_size(graph.store().all_nodes().len(), graph.store().left_of(causes).len());
    crate::monitoring::record_run_iterations(report.iterations);

    report
}

fn condition_leaves(graph: &Graph, condition: Node) -> Vec<Node> {
    if graph.is_conjunction(condition) {
        graph.parse_conjunction(condition).unwrap_or_default()
    } else {
        vec![condition]
    }
}

/// All bindings under which `condition` is structurally derivable from the
/// graph: a single leaf condition, or a conjunction evaluated depth-first in
/// `optimize_order`'s order.
fn evaluate_condition(graph: &Graph, condition: Node) -> Vec<Bindings> {
    if graph.is_conjunction(condition) {
        let subs = graph.parse_conjunction(condition).unwrap_or_default();
        let ordered = optimize_order(graph, &subs);
        let mut out = Vec::new();
        evaluate_sequence(graph, &ordered, Bindings::new(), Vec::new(), &mut out);
        out
    } else {
        evaluate_leaf(graph, condition, &Bindings::new(), &[])
            .into_iter()
            .map(|(bindings, _)| bindings)
            .collect()
    }
}

/// Greedy sub-condition scheduler: at each step, pick the remaining
/// sub-condition whose (subject, objects) are most often constant or
/// already bound under the variables fixed by previously-chosen
/// sub-conditions. Binding state is only simulated (which variables would
/// become bound), never actually resolved, since reordering must not
/// depend on which facts happen to match.
fn optimize_order(graph: &Graph, subs: &[Node]) -> Vec<Node> {
    let mut remaining: Vec<Node> = subs.to_vec();
    let mut assumed_bound: HashSet<Node> = HashSet::new();
    let mut ordered = Vec::with_capacity(subs.len());

    while !remaining.is_empty() {
        let mut best_index = 0;
        let mut best_score = i64::MIN;
        for (index, sub) in remaining.iter().enumerate() {
            let score = condition_score(graph, *sub, &assumed_bound);
            if score > best_score {
                best_score = score;
                best_index = index;
            }
        }

        let chosen = remaining.remove(best_index);
        if let Some(parsed) = graph.parse_fact(chosen) {
            mark_bound(&mut assumed_bound, parsed.subject);
            for object in &parsed.objects {
                mark_bound(&mut assumed_bound, *object);
            }
        }
        ordered.push(chosen);
    }

    ordered
}

fn mark_bound(assumed_bound: &mut HashSet<Node>, node: Node) {
    if node.is_variable() {
        assumed_bound.insert(node);
    }
}

fn condition_score(graph: &Graph, node: Node, assumed_bound: &HashSet<Node>) -> i64 {
    let Some(parsed) = graph.parse_fact(node) else {
        return 0;
    };
    let mut score = 0i64;
    let mut tally = |n: Node| {
        if !n.is_variable() || assumed_bound.contains(&n) {
            score += 1;
        } else {
            score -= 1;
        }
    };
    tally(parsed.subject);
    for object in &parsed.objects {
        tally(*object);
    }
    score
}

/// Depth-first evaluation of an ordered list of sub-conditions, threading
/// bindings and the accumulated `Unequal` constraint set through each step.
fn evaluate_sequence(
    graph: &Graph,
    subs: &[Node],
    bindings: Bindings,
    unequals: Vec<(Node, Node)>,
    out: &mut Vec<(Bindings, Vec<(Node, Node)>)>,
) {
    match subs.split_first() {
        None => out.push((bindings, unequals)),
        Some((first, rest)) => {
            for (next_bindings, next_unequals) in evaluate_leaf(graph, *first, &bindings, &unequals)
            {
                evaluate_sequence(graph, rest, next_bindings, next_unequals, out);
            }
        }
    }
}

/// Evaluate a single leaf condition against the graph, extending `bindings`
/// and `unequals` for every matching fact. A condition predicated on
/// `Unequal` both matches like any other fact (an asserted `Unequal` fact
/// must exist) and registers its `(subject, object)` pairs as constraints
/// checked against every binding from here on.
fn evaluate_leaf(
    graph: &Graph,
    condition: Node,
    bindings: &Bindings,
    unequals: &[(Node, Node)],
) -> Vec<(Bindings, Vec<(Node, Node)>)> {
    let Some(parsed) = graph.parse_fact(condition) else {
        return Vec::new();
    };
    let is_unequal = parsed.predicate == graph.predicates().unequal;

    let unification = Unification::new(
        graph,
        parsed.subject,
        parsed.predicate,
        parsed.objects.clone(),
        bindings.clone(),
    );

    let mut results = Vec::new();
    for (_fact, extended) in unification {
        let mut next_unequals = unequals.to_vec();
        if is_unequal {
            next_unequals.extend(parsed.objects.iter().map(|o| (parsed.subject, *o)));
        }
        if violates_unequal(&extended, &next_unequals) {
            continue;
        }
        results.push((extended, next_unequals));
    }
    results
}

fn violates_unequal(bindings: &Bindings, unequals: &[(Node, Node)]) -> bool {
    unequals.iter().any(|(x, y)| {
        let rx = resolve(bindings, *x);
        let ry = resolve(bindings, *y);
        !rx.is_variable() && !ry.is_variable() && rx == ry
    })
}

fn resolve(bindings: &Bindings, node: Node) -> Node {
    if node.is_variable() {
        *bindings.get(&node).unwrap_or(&node)
    } else {
        node
    }
}

enum DeduceOutcome {
    Contradiction,
    Progress(Vec<Node>),
    NoProgress,
}

/// Instantiate and assert each deduction template under `bindings`. Raises
/// [`DeduceOutcome::Contradiction`] if any template is the reserved
/// `Contradiction` node, or if its instantiation is already known wrong.
fn deduce(graph: &Graph, rule: Node, deductions: &[Node], bindings: &Bindings) -> DeduceOutcome {
    let mut asserted = Vec::new();

    for deduction in deductions {
        if *deduction == graph.predicates().contradiction {
            trace!(error = %AxiomError::ContradictionSignal { rule }, "contradiction raised");
            return DeduceOutcome::Contradiction;
        }

        let mut history = Vec::new();
        let Some(instantiated) = instantiate(graph, *deduction, bindings, &mut history) else {
            continue;
        };

        let Some(parsed) = graph.parse_fact(instantiated) else {
            continue;
        };

        if parsed.objects.contains(&parsed.subject) {
            continue;
        }
        if parsed.subject == parsed.predicate {
            continue;
        }

        match graph.check_fact(parsed.subject, parsed.predicate, &parsed.objects) {
            Answer::Known { probability, .. } if probability < 0.5 => {
                trace!(error = %AxiomError::ContradictionSignal { rule }, "contradiction raised");
                return DeduceOutcome::Contradiction;
            }
            Answer::Known { .. } => continue,
            Answer::Unknown => {
                if graph
                    .assert_fact(parsed.subject, parsed.predicate, &parsed.objects, None)
                    .is_ok()
                {
                    asserted.push(instantiated);
                    metrics::counter!("axiom_deductions_asserted").increment(1);
                }
            }
        }
    }

    if !asserted.is_empty() {
        DeduceOutcome::Progress(asserted)
    } else {
        DeduceOutcome::NoProgress
    }
}

/// Recursively substitute `bindings` into `node`, rebuilding nested fact and
/// conjunction structures as needed. Returns `None` if any variable
/// encountered along the way is still unbound — the caller treats that as a
/// partial match that a future pass may complete. `history` guards against
/// reinstantiating the same hash node twice within one substitution.
fn instantiate(graph: &Graph, node: Node, bindings: &Bindings, history: &mut Vec<Node>) -> Option<Node> {
    if node.is_variable() {
        return bindings.get(&node).copied();
    }
    if node.is_none() || node.is_atom() {
        return Some(node);
    }

    if history.contains(&node) {
        return Some(node);
    }
    history.push(node);

    let result = if graph.is_conjunction(node) {
        let subs = graph.parse_conjunction(node)?;
        let mut instantiated_subs = Vec::with_capacity(subs.len());
        for sub in subs {
            instantiated_subs.push(instantiate(graph, sub, bindings, history)?);
        }
        graph.condition(&instantiated_subs).ok()
    } else {
        let parsed = graph.parse_fact(node)?;
        let subject = instantiate(graph, parsed.subject, bindings, history)?;
        let predicate = instantiate(graph, parsed.predicate, bindings, history)?;
        let mut objects = Vec::with_capacity(parsed.objects.len());
        for object in parsed.objects {
            objects.push(instantiate(graph, object, bindings, history)?);
        }
        graph.assert_fact(subject, predicate, &objects, None).ok()
    };

    history.pop();
    result
}

/// Apply a rule node's condition against the graph with `R = ∅`, delivering
/// bindings to the caller instead of producing deductions — the query path
/// shared with external collaborators.
pub fn apply_rule(graph: &Graph, condition: Node) -> Vec<Bindings> {
    evaluate_condition(graph, condition)
}

/// Which side of a pruned fact's endpoints `prune_nodes` deletes when they
/// become isolated. Left an explicit choice rather than guessed, since
/// the source material doesn't settle which side wins when both a subject
/// and an object go isolated at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneSide {
    /// Delete isolated subjects.
    Sources,
    /// Delete isolated objects.
    Targets,
    /// Delete both.
    Both,
}

/// Delete every fact matching `subject predicate {objects}` (which may
/// contain variables, matched the same way a rule condition would be).
/// Returns the number of fact nodes removed.
pub fn prune_facts(graph: &Graph, subject: Node, predicate: Node, objects: &[Node]) -> usize {
    let matches: Vec<Node> = Unification::new(
        graph,
        subject,
        predicate,
        objects.to_vec(),
        Bindings::new(),
    )
    .map(|(fact, _)| fact)
    .collect();

    for fact in &matches {
        graph.remove(*fact);
    }
    matches.len()
}

/// Like [`prune_facts`], but also deletes the subject and/or object atoms of
/// each matched fact once they become isolated (no remaining edges at all).
/// `predicate` must be a concrete node; a variable predicate fails with
/// [`AxiomError::PrunePredicateMustBeFixed`], since without it every
/// relation in the graph would be eligible for node-level deletion.
pub fn prune_nodes(
    graph: &Graph,
    subject: Node,
    predicate: Node,
    objects: &[Node],
    side: PruneSide,
) -> Result<usize> {
    if predicate.is_variable() {
        return Err(AxiomError::PrunePredicateMustBeFixed);
    }

    let matches: Vec<(Node, Node, Vec<Node>)> = Unification::new(
        graph,
        subject,
        predicate,
        objects.to_vec(),
        Bindings::new(),
    )
    .filter_map(|(fact, _)| {
        graph
            .parse_fact(fact)
            .map(|parsed| (fact, parsed.subject, parsed.objects))
    })
    .collect();

    let mut candidates = HashSet::new();
    for (fact, matched_subject, matched_objects) in &matches {
        graph.remove(*fact);
        if matches!(side, PruneSide::Sources | PruneSide::Both) {
            candidates.insert(*matched_subject);
        }
        if matches!(side, PruneSide::Targets | PruneSide::Both) {
            candidates.extend(matched_objects.iter().copied());
        }
    }

    let mut removed = matches.len();
    for node in candidates {
        if graph.store().exists(node)
            && graph.store().left_degree(node) == 0
            && graph.store().right_degree(node) == 0
        {
            graph.remove(node);
            removed += 1;
        }
    }

    Ok(removed)
}

/// Maintenance sweep: remove fact nodes whose parsed structure has become
/// empty through prior removals ("zombie" facts), and predicates that
/// retain no valid `IsA RelationTypeCategory` uses once those are gone.
pub fn purge_unused_predicates(graph: &Graph) -> usize {
    let mut purged = 0;

    let all_nodes = graph.store().all_nodes();
    for node in &all_nodes {
        if !node.is_hash() || !graph.store().exists(*node) {
            continue;
        }
        if graph.is_conjunction(*node) {
            continue;
        }
        if graph.fact_structures(*node).is_empty() && graph.store().right_degree(*node) == 0 {
            graph.remove(*node);
            purged += 1;
        }
    }

    let core: HashSet<Node> = [
        graph.predicates().relation_type_category,
        graph.predicates().causes,
        graph.predicates().and,
        graph.predicates().is_a,
        graph.predicates().unequal,
        graph.predicates().contradiction,
        graph.predicates().has_value,
    ]
    .into_iter()
    .collect();

    for node in &all_nodes {
        if core.contains(node) || node.is_hash() {
            continue;
        }
        if !graph.store().exists(*node) {
            continue;
        }
        let still_a_relation = graph
            .check_fact(
                *node,
                graph.predicates().is_a,
                &[graph.predicates().relation_type_category],
            )
            .is_known();
        if still_a_relation && graph.store().left_degree(*node) == 0 {
            graph.remove(*node);
            purged += 1;
        }
    }

    purged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(graph: &Graph, condition: Node, deductions: &[Node]) -> Node {
        graph
            .assert_fact(condition, graph.predicates().causes, deductions, None)
            .unwrap()
    }

    #[test]
    fn transitivity_rule_deduces_across_a_chain() {
        let graph = Graph::new();
        let likes = graph.atom("likes", "en").unwrap();
        let a = graph.atom("a", "en").unwrap();
        let b = graph.atom("b", "en").unwrap();
        let c = graph.atom("c", "en").unwrap();

        graph.assert_fact(a, likes, &[b], None).unwrap();
        graph.assert_fact(b, likes, &[c], None).unwrap();

        let x = graph.variable().unwrap();
        let y = graph.variable().unwrap();
        let z = graph.variable().unwrap();
        let sub1 = graph.assert_fact(x, likes, &[y], None).unwrap();
        let sub2 = graph.assert_fact(y, likes, &[z], None).unwrap();
        let condition = graph.condition(&[sub1, sub2]).unwrap();
        let deduction_pattern = graph.assert_fact(x, likes, &[z], None).unwrap();

        rule(&graph, condition, &[deduction_pattern]);

        let report = run(&graph, false);
        assert!(!report.has_contradiction());
        assert!(graph.check_fact(a, likes, &[c]).is_correct());
    }

    #[test]
    fn disjoint_alternatives_both_bind_on_query() {
        let graph = Graph::new();
        let sun = graph.atom("sun", "en").unwrap();
        let is_a = graph.predicates().is_a;
        let star = graph.atom("star", "en").unwrap();
        let planet = graph.atom("planet", "en").unwrap();
        graph.assert_fact(sun, is_a, &[star], None).unwrap();
        graph.assert_fact(sun, is_a, &[planet], None).unwrap();

        let x = graph.variable().unwrap();
        let query = graph.assert_fact(sun, is_a, &[x], None).unwrap();
        let bindings = apply_rule(&graph, query);
        let mut targets: Vec<Node> = bindings.iter().map(|b| b[&x]).collect();
        targets.sort_unstable();
        let mut expected = vec![star, planet];
        expected.sort_unstable();
        assert_eq!(targets, expected);
    }

    #[test]
    fn unequal_condition_raises_exactly_one_contradiction() {
        let graph = Graph::new();
        let equals = graph.atom("equals", "en").unwrap();
        let unequal = graph.predicates().unequal;
        let p1 = graph.atom("p1", "en").unwrap();
        let p2 = graph.atom("p2", "en").unwrap();

        graph.assert_fact(p1, equals, &[p2], None).unwrap();
        graph.assert_fact(p1, unequal, &[p2], None).unwrap();

        let x = graph.variable().unwrap();
        let y = graph.variable().unwrap();
        let sub1 = graph.assert_fact(x, equals, &[y], None).unwrap();
        let sub2 = graph.assert_fact(x, unequal, &[y], None).unwrap();
        let condition = graph.condition(&[sub1, sub2]).unwrap();
        rule(&graph, condition, &[graph.predicates().contradiction]);

        let report = run(&graph, false);
        assert_eq!(report.contradictions.len(), 1);
    }

    #[test]
    fn grandparent_rule_reuses_the_shared_variable() {
        let graph = Graph::new();
        let parent = graph.atom("parent", "en").unwrap();
        let grandparent = graph.atom("grandparent", "en").unwrap();
        let a = graph.atom("a", "en").unwrap();
        let b = graph.atom("b", "en").unwrap();
        let c = graph.atom("c", "en").unwrap();
        let d = graph.atom("d", "en").unwrap();

        graph.assert_fact(a, parent, &[b], None).unwrap();
        graph.assert_fact(b, parent, &[c], None).unwrap();
        graph.assert_fact(b, parent, &[d], None).unwrap();

        let x = graph.variable().unwrap();
        let y = graph.variable().unwrap();
        let z = graph.variable().unwrap();
        let sub1 = graph.assert_fact(x, parent, &[y], None).unwrap();
        let sub2 = graph.assert_fact(y, parent, &[z], None).unwrap();
        let condition = graph.condition(&[sub1, sub2]).unwrap();
        let deduction_pattern = graph.assert_fact(x, grandparent, &[z], None).unwrap();
        rule(&graph, condition, &[deduction_pattern]);

        run(&graph, false);

        assert!(graph.check_fact(a, grandparent, &[c]).is_correct());
        assert!(graph.check_fact(a, grandparent, &[d]).is_correct());
    }

    #[test]
    fn second_run_reports_no_new_deductions() {
        let graph = Graph::new();
        let likes = graph.atom("likes", "en").unwrap();
        let a = graph.atom("a", "en").unwrap();
        let b = graph.atom("b", "en").unwrap();
        let c = graph.atom("c", "en").unwrap();
        graph.assert_fact(a, likes, &[b], None).unwrap();
        graph.assert_fact(b, likes, &[c], None).unwrap();

        let x = graph.variable().unwrap();
        let y = graph.variable().unwrap();
        let z = graph.variable().unwrap();
        let sub1 = graph.assert_fact(x, likes, &[y], None).unwrap();
        let sub2 = graph.assert_fact(y, likes, &[z], None).unwrap();
        let condition = graph.condition(&[sub1, sub2]).unwrap();
        let deduction_pattern = graph.assert_fact(x, likes, &[z], None).unwrap();
        rule(&graph, condition, &[deduction_pattern]);

        run(&graph, false);
        let second = run(&graph, false);
        assert_eq!(second.deductions, 0);
    }

    #[test]
    fn run_with_diagnostics_reports_a_deduction_line_and_a_contradiction_line() {
        let graph = Graph::new();
        let likes = graph.atom("likes", "en").unwrap();
        let a = graph.atom("a", "en").unwrap();
        let b = graph.atom("b", "en").unwrap();
        let c = graph.atom("c", "en").unwrap();
        graph.assert_fact(a, likes, &[b], None).unwrap();
        graph.assert_fact(b, likes, &[c], None).unwrap();

        let x = graph.variable().unwrap();
        let y = graph.variable().unwrap();
        let z = graph.variable().unwrap();
        let sub1 = graph.assert_fact(x, likes, &[y], None).unwrap();
        let sub2 = graph.assert_fact(y, likes, &[z], None).unwrap();
        let condition = graph.condition(&[sub1, sub2]).unwrap();
        let deduction_pattern = graph.assert_fact(x, likes, &[z], None).unwrap();
        rule(&graph, condition, &[deduction_pattern]);

        let equal = graph.atom("equal", "en").unwrap();
        let p1 = graph.atom("p1", "en").unwrap();
        let p2 = graph.atom("p2", "en").unwrap();
        graph.assert_fact(p1, equal, &[p2], None).unwrap();
        graph
            .assert_fact(p1, graph.predicates().unequal, &[p2], None)
            .unwrap();
        let u = graph.variable().unwrap();
        let v = graph.variable().unwrap();
        let eq_sub = graph.assert_fact(u, equal, &[v], None).unwrap();
        let unequal_sub = graph.assert_fact(u, graph.predicates().unequal, &[v], None).unwrap();
        let contradiction_condition = graph.condition(&[eq_sub, unequal_sub]).unwrap();
        rule(&graph, contradiction_condition, &[graph.predicates().contradiction]);

        let mut deduction_lines = Vec::new();
        let mut contradiction_lines = Vec::new();
        let report = run_with_diagnostics(&graph, false, |line, important| {
            if important {
                contradiction_lines.push(line);
            } else {
                deduction_lines.push(line);
            }
        });

        assert!(report.deductions >= 1);
        assert!(report.has_contradiction());
        assert!(!deduction_lines.is_empty());
        assert!(deduction_lines.iter().any(|line| line.contains('⇐')));
        assert!(!contradiction_lines.is_empty());
        assert!(contradiction_lines.iter().all(|line| line.starts_with("«Contradiction»")));
    }

    #[test]
    fn prune_facts_removes_every_match() {
        let graph = Graph::new();
        let likes = graph.atom("likes", "en").unwrap();
        let a = graph.atom("a", "en").unwrap();
        let b = graph.atom("b", "en").unwrap();
        let c = graph.atom("c", "en").unwrap();
        graph.assert_fact(a, likes, &[b], None).unwrap();
        graph.assert_fact(a, likes, &[c], None).unwrap();

        let y = graph.variable().unwrap();
        let removed = prune_facts(&graph, a, likes, &[y]);
        assert_eq!(removed, 2);
        assert!(!graph.check_fact(a, likes, &[b]).is_known());
    }

    #[test]
    fn prune_nodes_rejects_a_variable_predicate() {
        let graph = Graph::new();
        let a = graph.atom("a", "en").unwrap();
        let p = graph.variable().unwrap();
        let o = graph.variable().unwrap();
        assert!(matches!(
            prune_nodes(&graph, a, p, &[o], PruneSide::Both),
            Err(AxiomError::PrunePredicateMustBeFixed)
        ));
    }

    #[test]
    fn prune_nodes_deletes_isolated_targets() {
        let graph = Graph::new();
        let likes = graph.atom("likes", "en").unwrap();
        let a = graph.atom("a", "en").unwrap();
        let b = graph.atom("b", "en").unwrap();
        graph.assert_fact(a, likes, &[b], None).unwrap();

        let y = graph.variable().unwrap();
        let removed = prune_nodes(&graph, a, likes, &[y], PruneSide::Targets).unwrap();
        assert!(removed >= 1);
        assert!(!graph.store().exists(b));
    }
}
