//! Whole-graph binary persistence.
//!
//! A hand-rolled chunked format, not `serde`/`bincode`: a magic header, the
//! seven core predicate ids, the node table, the edge table (one direction —
//! `left` is rebuilt from `right` on load), the probability table, and
//! finally the per-language name tables. Every integer is little-endian;
//! every length-prefixed blob uses a `u32` length.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{AxiomError, Result};
use crate::facts::{Graph, Predicates};
use crate::naming::Naming;
use crate::node::Node;
use crate::store::GraphStore;

const MAGIC: &[u8; 8] = b"AXIOMSNP";
const VERSION: u32 = 1;

/// Serialize `graph` to `path`.
pub fn save(graph: &Graph, path: impl AsRef<Path>) -> Result<()> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    out.write_all(MAGIC)?;
    write_u32(&mut out, VERSION)?;

    let p = graph.predicates();
    for id in [
        p.relation_type_category,
        p.causes,
        p.and,
        p.is_a,
        p.unequal,
        p.contradiction,
        p.has_value,
    ] {
        write_u64(&mut out, id.raw())?;
    }

    let nodes = graph.store().all_nodes();
    write_u64(&mut out, nodes.len() as u64)?;
    for node in &nodes {
        write_u64(&mut out, node.raw())?;
    }

    let mut edges = Vec::new();
    for node in &nodes {
        for target in graph.store().right_of(*node) {
            edges.push((*node, target));
        }
    }
    write_u64(&mut out, edges.len() as u64)?;
    for (a, b) in &edges {
        write_u64(&mut out, a.raw())?;
        write_u64(&mut out, b.raw())?;
    }

    let probabilities = graph.store().all_probabilities();
    write_u64(&mut out, probabilities.len() as u64)?;
    for (a, b, prob) in &probabilities {
        write_u64(&mut out, a.raw())?;
        write_u64(&mut out, b.raw())?;
        write_f64(&mut out, *prob)?;
    }

    let names = graph.naming().all_entries();
    write_u64(&mut out, names.len() as u64)?;
    for (lang, node, name) in &names {
        write_blob(&mut out, lang.as_bytes())?;
        write_u64(&mut out, node.raw())?;
        write_blob(&mut out, name.as_bytes())?;
    }

    out.flush()?;
    Ok(())
}

/// Deserialize a graph previously written by [`save`].
pub fn load(path: impl AsRef<Path>) -> Result<Graph> {
    let file = File::open(path)?;
    let mut input = BufReader::new(file);

    let mut magic = [0u8; 8];
    input.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(AxiomError::SnapshotError("bad magic header".into()));
    }
    let version = read_u32(&mut input)?;
    if version != VERSION {
        return Err(AxiomError::SnapshotError(format!(
            "unsupported snapshot version {version}"
        )));
    }

    let mut predicate_ids = [0u64; 7];
    for slot in &mut predicate_ids {
        *slot = read_u64(&mut input)?;
    }
    let predicates = Predicates {
        relation_type_category: Node::from_raw(predicate_ids[0]),
        causes: Node::from_raw(predicate_ids[1]),
        and: Node::from_raw(predicate_ids[2]),
        is_a: Node::from_raw(predicate_ids[3]),
        unequal: Node::from_raw(predicate_ids[4]),
        contradiction: Node::from_raw(predicate_ids[5]),
        has_value: Node::from_raw(predicate_ids[6]),
    };

    let store = GraphStore::new();
    let node_count = read_u64(&mut input)?;
    for _ in 0..node_count {
        let id = Node::from_raw(read_u64(&mut input)?);
        store.restore_node(id)?;
    }

    let edge_count = read_u64(&mut input)?;
    for _ in 0..edge_count {
        let a = Node::from_raw(read_u64(&mut input)?);
        let b = Node::from_raw(read_u64(&mut input)?);
        store.connect(a, b, None)?;
    }

    let probability_count = read_u64(&mut input)?;
    for _ in 0..probability_count {
        let a = Node::from_raw(read_u64(&mut input)?);
        let b = Node::from_raw(read_u64(&mut input)?);
        let prob = read_f64(&mut input)?;
        store.restore_probability(a, b, prob);
    }

    let naming = Naming::default();
    let name_count = read_u64(&mut input)?;
    for _ in 0..name_count {
        let lang = String::from_utf8(read_blob(&mut input)?)
            .map_err(|e| AxiomError::SnapshotError(e.to_string()))?;
        let node = Node::from_raw(read_u64(&mut input)?);
        let name = String::from_utf8(read_blob(&mut input)?)
            .map_err(|e| AxiomError::SnapshotError(e.to_string()))?;
        naming.set_name(node, &name, &lang, true);
    }

    Ok(Graph::from_parts(store, naming, predicates))
}

fn write_u32(out: &mut impl Write, value: u32) -> Result<()> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_u64(out: &mut impl Write, value: u64) -> Result<()> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_f64(out: &mut impl Write, value: f64) -> Result<()> {
    out.write_all(&value.to_le_bytes())?;
    Ok(())
}

fn write_blob(out: &mut impl Write, bytes: &[u8]) -> Result<()> {
    write_u32(out, bytes.len() as u32)?;
    out.write_all(bytes)?;
    Ok(())
}

fn read_u32(input: &mut impl Read) -> Result<u32> {
    let mut buf = [0u8; 4];
    input.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(input: &mut impl Read) -> Result<u64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn read_f64(input: &mut impl Read) -> Result<f64> {
    let mut buf = [0u8; 8];
    input.read_exact(&mut buf)?;
    Ok(f64::from_le_bytes(buf))
}

fn read_blob(input: &mut impl Read) -> Result<Vec<u8>> {
    let len = read_u32(input)? as usize;
    let mut buf = vec![0u8; len];
    input.read_exact(&mut buf)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_facts_names_and_probabilities() {
        let graph = Graph::new();
        let alice = graph.atom("alice", "en").unwrap();
        let likes = graph.atom("likes", "en").unwrap();
        let bob = graph.atom("bob", "en").unwrap();
        graph.assert_fact(alice, likes, &[bob], Some(0.8)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.axiom");
        save(&graph, &path).unwrap();

        let reloaded = load(&path).unwrap();
        let alice2 = reloaded.naming().get_node("alice", "en").unwrap();
        let likes2 = reloaded.naming().get_node("likes", "en").unwrap();
        let bob2 = reloaded.naming().get_node("bob", "en").unwrap();

        assert_eq!(alice, alice2);
        let answer = reloaded.check_fact(alice2, likes2, &[bob2]);
        assert!(answer.is_known());
        assert_eq!(
            reloaded.store().probability(
                crate::node::hash_heads_set(likes2, alice2, &[bob2]),
                likes2
            ),
            Some(0.8)
        );
    }

    #[test]
    fn round_trip_preserves_rules_and_reasoning() {
        let graph = Graph::new();
        let likes = graph.atom("likes", "en").unwrap();
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

        let alice = graph.atom("alice", "en").unwrap();
        let bob = graph.atom("bob", "en").unwrap();
        let carol = graph.atom("carol", "en").unwrap();
        graph.assert_fact(alice, likes, &[bob], None).unwrap();
        graph.assert_fact(bob, likes, &[carol], None).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.axiom");
        save(&graph, &path).unwrap();
        let reloaded = load(&path).unwrap();

        let report = crate::reason::run(&reloaded, false);
        assert!(!report.has_contradiction());

        let alice2 = reloaded.naming().get_node("alice", "en").unwrap();
        let likes2 = reloaded.naming().get_node("likes", "en").unwrap();
        let carol2 = reloaded.naming().get_node("carol", "en").unwrap();
        assert!(reloaded.check_fact(alice2, likes2, &[carol2]).is_correct());
    }

    #[test]
    fn bad_magic_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.axiom");
        std::fs::write(&path, b"not a snapshot at all").unwrap();

        assert!(matches!(load(&path), Err(AxiomError::SnapshotError(_))));
    }
}
