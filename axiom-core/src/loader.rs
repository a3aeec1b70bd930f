//! A minimal line-oriented text format for seeding a graph outside of Rust
//! test code:
//!
//! ```text
//! # comment
//! atom likes(alice, bob).
//! rule likes(X, Y), likes(Y, Z) => likes(X, Z).
//! ```
//!
//! This is deliberately not a scripting language: no control flow, no
//! evaluation semantics beyond "this line names a fact" or "this line names
//! a rule." An identifier starting with an uppercase letter or `_` is a
//! variable, shared by name across one rule's conditions and conclusions;
//! anything else is interned as a named atom. Consumed only by the CLI and
//! by tests that want readable fixtures.

use crate::error::{AxiomError, Result};
use crate::facts::Graph;
use crate::node::Node;
use std::collections::HashMap;

/// Counts of what a [`load_str`] call asserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of `atom` lines asserted.
    pub facts_asserted: usize,
    /// Number of `rule` lines asserted.
    pub rules_asserted: usize,
}

/// Parse and assert every `atom`/`rule` line in `input` into `graph`.
pub fn load_str(graph: &Graph, input: &str) -> Result<LoadReport> {
    let mut report = LoadReport::default();

    for (number, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix("atom ") {
            load_atom_line(graph, rest)
                .map_err(|e| annotate(e, number + 1, line))?;
            report.facts_asserted += 1;
        } else if let Some(rest) = line.strip_prefix("rule ") {
            load_rule_line(graph, rest)
                .map_err(|e| annotate(e, number + 1, line))?;
            report.rules_asserted += 1;
        } else {
            return Err(AxiomError::SnapshotError(format!(
                "line {}: expected `atom` or `rule`: {line}",
                number + 1
            )));
        }
    }

    Ok(report)
}

fn annotate(error: AxiomError, line: usize, text: &str) -> AxiomError {
    match error {
        AxiomError::SnapshotError(msg) => {
            AxiomError::SnapshotError(format!("line {line}: {msg} (in `{text}`)"))
        }
        other => other,
    }
}

fn load_atom_line(graph: &Graph, rest: &str) -> Result<Node> {
    let rest = rest.trim().trim_end_matches('.');
    let (predicate_name, args) = split_call(rest)?;
    if args.is_empty() {
        return Err(AxiomError::SnapshotError(
            "an `atom` fact needs at least a subject".into(),
        ));
    }

    let mut variables = HashMap::new();
    let predicate = resolve_predicate_name(graph, predicate_name)?;
    let subject = resolve_term(graph, &args[0], &mut variables)?;
    let objects = args[1..]
        .iter()
        .map(|term| resolve_term(graph, term, &mut variables))
        .collect::<Result<Vec<_>>>()?;

    graph.assert_fact(subject, predicate, &objects, None)
}

fn load_rule_line(graph: &Graph, rest: &str) -> Result<Node> {
    let (condition_text, conclusion_text) = rest.trim().trim_end_matches('.').split_once("=>").ok_or_else(|| {
        AxiomError::SnapshotError("a `rule` line needs a `=>` separating conditions from conclusions".into())
    })?;

    let mut variables = HashMap::new();

    let conditions = split_top_level(condition_text, ',')
        .into_iter()
        .map(|term| load_condition(graph, &term, &mut variables))
        .collect::<Result<Vec<_>>>()?;
    if conditions.is_empty() {
        return Err(AxiomError::SnapshotError("a rule needs at least one condition".into()));
    }
    let condition = if conditions.len() == 1 {
        conditions[0]
    } else {
        graph.condition(&conditions)?
    };

    let deductions = split_top_level(conclusion_text, ',')
        .into_iter()
        .map(|term| load_condition(graph, &term, &mut variables))
        .collect::<Result<Vec<_>>>()?;
    if deductions.is_empty() {
        return Err(AxiomError::SnapshotError("a rule needs at least one conclusion".into()));
    }

    graph.assert_fact(condition, graph.predicates().causes, &deductions, None)
}

/// A condition or conclusion term: either the literal `Contradiction`, or a
/// `predicate(subject, objects...)` call asserted as a (possibly variable-
/// laden) pattern fact.
/// Parse and assert a single condition/conclusion term (`predicate(subject,
/// objects...)` or the literal `Contradiction`), returning the asserted
/// pattern node alongside the variable names it introduced. Used by the CLI's
/// `query` subcommand to assert a one-shot query pattern and later resolve
/// its bindings back to readable names.
pub fn parse_condition(graph: &Graph, term: &str) -> Result<(Node, HashMap<String, Node>)> {
    let mut variables = HashMap::new();
    let node = load_condition(graph, term, &mut variables)?;
    Ok((node, variables))
}

fn load_condition(graph: &Graph, term: &str, variables: &mut HashMap<String, Node>) -> Result<Node> {
    let term = term.trim();
    if term == "Contradiction" {
        return Ok(graph.predicates().contradiction);
    }

    let (predicate_name, args) = split_call(term)?;
    if args.is_empty() {
        return Err(AxiomError::SnapshotError(
            "a condition or conclusion needs at least a subject".into(),
        ));
    }

    let predicate = resolve_predicate_name(graph, predicate_name)?;
    let subject = resolve_term(graph, &args[0], variables)?;
    let objects = args[1..]
        .iter()
        .map(|a| resolve_term(graph, a, variables))
        .collect::<Result<Vec<_>>>()?;

    graph.assert_fact(subject, predicate, &objects, None)
}

fn resolve_predicate_name(graph: &Graph, name: &str) -> Result<Node> {
    match name {
        "IsA" => Ok(graph.predicates().is_a),
        "Unequal" => Ok(graph.predicates().unequal),
        "Causes" => Ok(graph.predicates().causes),
        _ => graph.atom(name, "en"),
    }
}

fn resolve_term(graph: &Graph, term: &str, variables: &mut HashMap<String, Node>) -> Result<Node> {
    let term = term.trim();
    if is_variable_name(term) {
        if let Some(node) = variables.get(term) {
            return Ok(*node);
        }
        let node = graph.variable()?;
        variables.insert(term.to_string(), node);
        Ok(node)
    } else {
        graph.atom(term, "en")
    }
}

fn is_variable_name(term: &str) -> bool {
    term.starts_with(|c: char| c.is_uppercase() || c == '_')
}

/// Split `name(a, b, c)` into `("name", ["a", "b", "c"])`.
fn split_call(input: &str) -> Result<(&str, Vec<String>)> {
    let open = input
        .find('(')
        .ok_or_else(|| AxiomError::SnapshotError(format!("expected `name(args...)`: {input}")))?;
    let close = input
        .rfind(')')
        .ok_or_else(|| AxiomError::SnapshotError(format!("unterminated argument list: {input}")))?;
    if close < open {
        return Err(AxiomError::SnapshotError(format!("malformed argument list: {input}")));
    }

    let name = input[..open].trim();
    let body = &input[open + 1..close];
    let args = if body.trim().is_empty() {
        Vec::new()
    } else {
        split_top_level(body, ',')
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect()
    };
    Ok((name, args))
}

/// Split `input` on `sep`, ignoring occurrences nested inside parentheses.
fn split_top_level(input: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut current = String::new();

    for c in input.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            }
            ')' => {
                depth -= 1;
                current.push(c);
            }
            c if c == sep && depth == 0 => {
                parts.push(current.trim().to_string());
                current.clear();
            }
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_line_asserts_a_fact() {
        let graph = Graph::new();
        load_str(&graph, "atom likes(alice, bob).").unwrap();

        let alice = graph.naming().get_node("alice", "en").unwrap();
        let likes = graph.naming().get_node("likes", "en").unwrap();
        let bob = graph.naming().get_node("bob", "en").unwrap();
        assert!(graph.check_fact(alice, likes, &[bob]).is_correct());
    }

    #[test]
    fn rule_line_shares_variables_across_conditions_and_conclusion() {
        let graph = Graph::new();
        let report = load_str(
            &graph,
            "atom likes(alice, bob).\n\
             atom likes(bob, carol).\n\
             rule likes(X, Y), likes(Y, Z) => likes(X, Z).\n",
        )
        .unwrap();

        assert_eq!(report.facts_asserted, 2);
        assert_eq!(report.rules_asserted, 1);

        let report = crate::reason::run(&graph, false);
        assert!(!report.has_contradiction());

        let alice = graph.naming().get_node("alice", "en").unwrap();
        let likes = graph.naming().get_node("likes", "en").unwrap();
        let carol = graph.naming().get_node("carol", "en").unwrap();
        assert!(graph.check_fact(alice, likes, &[carol]).is_correct());
    }

    #[test]
    fn comments_and_blank_lines_are_ignored() {
        let graph = Graph::new();
        let report = load_str(&graph, "# a comment\n\n   \natom likes(a, b).\n").unwrap();
        assert_eq!(report.facts_asserted, 1);
    }

    #[test]
    fn malformed_line_reports_its_line_number() {
        let graph = Graph::new();
        let err = load_str(&graph, "atom likes(a, b).\nnonsense\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn contradiction_literal_is_recognised_as_a_conclusion() {
        let graph = Graph::new();
        load_str(
            &graph,
            "atom equals(p1, p2).\n\
             atom Unequal(p1, p2).\n\
             rule equals(X, Y), Unequal(X, Y) => Contradiction.\n",
        )
        .unwrap();

        let report = crate::reason::run(&graph, false);
        assert_eq!(report.contradictions.len(), 1);
    }
}
