//! Concrete end-to-end scenario: a snapshot cycle at a scale the inline
//! `snapshot.rs` unit tests don't exercise.

use axiom_core::{run, save, Graph};

#[test]
fn snapshot_cycle_preserves_deductions_across_a_thousand_facts() {
    let graph = Graph::new();
    let likes = graph.atom("likes", "en").unwrap();

    let nodes: Vec<_> = (0..1000)
        .map(|i| graph.atom(&format!("n{i}"), "en").unwrap())
        .collect();
    for pair in nodes.windows(2) {
        graph.assert_fact(pair[0], likes, &[pair[1]], None).unwrap();
    }

    let x = graph.variable().unwrap();
    let y = graph.variable().unwrap();
    let z = graph.variable().unwrap();
    let sub1 = graph.assert_fact(x, likes, &[y], None).unwrap();
    let sub2 = graph.assert_fact(y, likes, &[z], None).unwrap();
    let condition = graph.condition(&[sub1, sub2]).unwrap();
    let deduction = graph.assert_fact(x, likes, &[z], None).unwrap();
    graph
        .assert_fact(condition, graph.predicates().causes, &[deduction], None)
        .unwrap();

    let before = run(&graph, false);
    assert!(!before.has_contradiction());

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("thousand.axiom");
    save(&graph, &path).unwrap();

    let reloaded = axiom_core::load(&path).unwrap();
    let after = run(&reloaded, false);
    assert!(!after.has_contradiction());
    assert_eq!(after.deductions, 0, "restored graph should already be at its fixpoint");

    let n0 = reloaded.naming().get_node("n0", "en").unwrap();
    let n999 = reloaded.naming().get_node("n999", "en").unwrap();
    let likes2 = reloaded.naming().get_node("likes", "en").unwrap();
    assert!(reloaded.check_fact(n0, likes2, &[n999]).is_correct());
}
