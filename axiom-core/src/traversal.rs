//! Read-only traversal and diagnostic formatting: `get_sources`, `format_fact`,
//! and the `⇐`-separated lines the print callback contract (§6) names.

use crate::facts::Graph;
use crate::node::Node;

/// Every subject `S` such that some known fact has `predicate` as its
/// relation and `target` among its objects — an object-driven traversal,
/// the same direction [`crate::unify::Unification`] uses when a condition's
/// object resolves to a concrete node before its subject does.
pub fn get_sources(graph: &Graph, predicate: Node, target: Node) -> Vec<Node> {
    graph
        .store()
        .right_of(target)
        .into_iter()
        .filter(|fact| graph.store().has_right_edge(*fact, predicate))
        .filter_map(|fact| graph.parse_fact(fact))
        .map(|parsed| parsed.subject)
        .collect()
}

/// Render `node` for display in `lang`: a fact as `subject predicate
/// object1, object2`, a conjunction as its sub-conditions joined by `, `,
/// anything else by its name (falling back to [`Node`]'s `Display`).
///
/// `history` guards against runaway recursion on cyclic fact structures,
/// matching the cycle-safety convention used by unification and
/// instantiation.
pub fn format_fact(graph: &Graph, node: Node, lang: &str) -> String {
    format_fact_inner(graph, node, lang, &mut Vec::new())
}

fn format_fact_inner(graph: &Graph, node: Node, lang: &str, history: &mut Vec<Node>) -> String {
    if history.contains(&node) {
        return display_name(graph, node, lang);
    }

    if graph.is_conjunction(node) {
        history.push(node);
        let subs = graph.parse_conjunction(node).unwrap_or_default();
        let rendered = subs
            .iter()
            .map(|s| format_fact_inner(graph, *s, lang, history))
            .collect::<Vec<_>>()
            .join(", ");
        history.pop();
        return rendered;
    }

    match graph.parse_fact(node) {
        Some(parsed) => {
            history.push(node);
            let subject = format_fact_inner(graph, parsed.subject, lang, history);
            let predicate = display_name(graph, parsed.predicate, lang);
            let objects = parsed
                .objects
                .iter()
                .map(|o| format_fact_inner(graph, *o, lang, history))
                .collect::<Vec<_>>()
                .join(", ");
            history.pop();
            format!("{subject} {predicate} {objects}")
        }
        None => display_name(graph, node, lang),
    }
}

fn display_name(graph: &Graph, node: Node, lang: &str) -> String {
    graph
        .naming()
        .get_name(node, lang, true)
        .unwrap_or_else(|| node.to_string())
}

/// A deduced-line diagnostic: `«conclusion» ⇐ «premise₁», …, «premiseₖ»`.
pub fn format_deduction(graph: &Graph, conclusion: Node, premises: &[Node], lang: &str) -> String {
    let premise_strs: Vec<String> = premises
        .iter()
        .map(|p| format!("«{}»", format_fact(graph, *p, lang)))
        .collect();
    format!(
        "«{}» ⇐ {}",
        format_fact(graph, conclusion, lang),
        premise_strs.join(", ")
    )
}

/// A contradiction-line diagnostic: `«Contradiction» ⇐ «offending-condition»`.
pub fn format_contradiction(graph: &Graph, condition: Node, lang: &str) -> String {
    format!("«Contradiction» ⇐ «{}»", format_fact(graph, condition, lang))
}
