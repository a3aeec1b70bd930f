//! The graph store: bidirectional adjacency over [`Node`] ids, node allocation,
//! and the attached-probability table.
//!
//! Two `parking_lot` reader-writer locks guard the `left`/`right` adjacency
//! maps; a plain mutex guards probabilities. Writers are rare relative to
//! readers, so a consistent snapshot is taken under the shared lock and then
//! released — callers iterate the snapshot, never the live map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;
use tracing::instrument;

use crate::error::{AxiomError, Result};
use crate::node::{self, Node};

const GROW_THRESHOLD: usize = 128;
const SHRINK_THRESHOLD: usize = 64;
const INLINE_CAPACITY: usize = 8;

/// Adaptive neighbour-set container.
///
/// Transitions `Empty -> Single -> Small(sorted) -> Large(hash set)` as a
/// node's degree grows, and back down with hysteresis (grow at
/// [`GROW_THRESHOLD`], shrink at [`SHRINK_THRESHOLD`]) so a neighbourhood
/// that hovers near the boundary doesn't thrash between representations.
#[derive(Debug, Clone)]
enum AdjSet {
    Empty,
    Single(Node),
    Small(SmallVec<[Node; INLINE_CAPACITY]>),
    Large(std::collections::HashSet<Node, ahash::RandomState>),
}

impl Default for AdjSet {
    fn default() -> Self {
        AdjSet::Empty
    }
}

impl AdjSet {
    fn len(&self) -> usize {
        match self {
            AdjSet::Empty => 0,
            AdjSet::Single(_) => 1,
            AdjSet::Small(v) => v.len(),
            AdjSet::Large(s) => s.len(),
        }
    }

    fn contains(&self, n: Node) -> bool {
        match self {
            AdjSet::Empty => false,
            AdjSet::Single(x) => *x == n,
            AdjSet::Small(v) => v.binary_search(&n).is_ok(),
            AdjSet::Large(s) => s.contains(&n),
        }
    }

    fn insert(&mut self, n: Node) {
        match self {
            AdjSet::Empty => *self = AdjSet::Single(n),
            AdjSet::Single(existing) => {
                if *existing == n {
                    return;
                }
                let mut v = SmallVec::new();
                if *existing < n {
                    v.push(*existing);
                    v.push(n);
                } else {
                    v.push(n);
                    v.push(*existing);
                }
                *self = AdjSet::Small(v);
            }
            AdjSet::Small(v) => {
                match v.binary_search(&n) {
                    Ok(_) => {}
                    Err(idx) => v.insert(idx, n),
                }
                if v.len() > GROW_THRESHOLD {
                    let set: std::collections::HashSet<Node, ahash::RandomState> =
                        v.iter().copied().collect();
                    *self = AdjSet::Large(set);
                }
            }
            AdjSet::Large(s) => {
                s.insert(n);
            }
        }
    }

    fn remove(&mut self, n: Node) {
        match self {
            AdjSet::Empty => {}
            AdjSet::Single(existing) => {
                if *existing == n {
                    *self = AdjSet::Empty;
                }
            }
            AdjSet::Small(v) => {
                if let Ok(idx) = v.binary_search(&n) {
                    v.remove(idx);
                }
                if v.len() == 1 {
                    *self = AdjSet::Single(v[0]);
                } else if v.is_empty() {
                    *self = AdjSet::Empty;
                }
            }
            AdjSet::Large(s) => {
                s.remove(&n);
                if s.len() < SHRINK_THRESHOLD {
                    let v: SmallVec<[Node; INLINE_CAPACITY]> = {
                        let mut v: Vec<Node> = s.iter().copied().collect();
                        v.sort_unstable();
                        v.into_iter().collect()
                    };
                    *self = AdjSet::Small(v);
                }
            }
        }
    }

    fn to_vec(&self) -> Vec<Node> {
        match self {
            AdjSet::Empty => Vec::new(),
            AdjSet::Single(n) => vec![*n],
            AdjSet::Small(v) => v.to_vec(),
            AdjSet::Large(s) => s.iter().copied().collect(),
        }
    }
}

/// Combine two recorded weights per the min/max conflict rule: both `>= 0.5`
/// take the max, both `<= 0.5` take the min, otherwise the pair contradicts.
pub fn merge_probability(existing: f64, new: f64) -> std::result::Result<f64, (f64, f64)> {
    if existing >= 0.5 && new >= 0.5 {
        Ok(existing.max(new))
    } else if existing <= 0.5 && new <= 0.5 {
        Ok(existing.min(new))
    } else {
        Err((existing, new))
    }
}

/// The bidirectional adjacency graph, node allocator, and probability table.
pub struct GraphStore {
    left: RwLock<HashMap<Node, AdjSet>>,
    right: RwLock<HashMap<Node, AdjSet>>,
    probabilities: Mutex<HashMap<(Node, Node), f64>>,
    next_atom: AtomicU64,
    next_variable: AtomicU64,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    /// An empty store with no allocated nodes.
    pub fn new() -> Self {
        GraphStore {
            left: RwLock::new(HashMap::new()),
            right: RwLock::new(HashMap::new()),
            probabilities: Mutex::new(HashMap::new()),
            next_atom: AtomicU64::new(1),
            next_variable: AtomicU64::new(u64::MAX),
        }
    }

    /// Number of distinct nodes currently tracked.
    pub fn node_count(&self) -> usize {
        self.left.read().len()
    }

    fn create_node(&self, n: Node) {
        self.left.write().entry(n).or_default();
        self.right.write().entry(n).or_default();
    }

    /// Allocate a fresh atom, counting up from 1 and skipping any id already
    /// in use. Fails with [`AxiomError::CapacityExhausted`] once the atom
    /// range is exhausted.
    pub fn allocate_atom(&self) -> Result<Node> {
        loop {
            let id = self.next_atom.fetch_add(1, Ordering::Relaxed);
            if id == 0 || id > node::ATOM_MAX {
                return Err(AxiomError::CapacityExhausted("atom"));
            }
            let candidate = Node::from_raw(id);
            if self.exists(candidate) {
                continue;
            }
            self.create_node(candidate);
            metrics::counter!("axiom_atoms_allocated").increment(1);
            return Ok(candidate);
        }
    }

    /// Allocate a fresh variable, counting down from the top of the variable
    /// range. Fails with [`AxiomError::CapacityExhausted`] once exhausted.
    pub fn allocate_variable(&self) -> Result<Node> {
        loop {
            let id = self.next_variable.fetch_sub(1, Ordering::Relaxed);
            if id < node::VARIABLE_MIN {
                return Err(AxiomError::CapacityExhausted("variable"));
            }
            let candidate = Node::from_raw(id);
            if self.exists(candidate) {
                continue;
            }
            self.create_node(candidate);
            metrics::counter!("axiom_variables_allocated").increment(1);
            return Ok(candidate);
        }
    }

    /// Idempotently create a specific hash-range id (used when materialising
    /// a reified fact or conjunction). Fails with
    /// [`AxiomError::CollisionWithAtom`] if `id` falls outside the hash range.
    pub fn reserve(&self, id: Node) -> Result<Node> {
        if !id.is_hash() {
            return Err(AxiomError::CollisionWithAtom(id));
        }
        if !self.exists(id) {
            self.create_node(id);
        }
        Ok(id)
    }

    /// `true` if `n` has been allocated (appears in both adjacency maps).
    pub fn exists(&self, n: Node) -> bool {
        self.right.read().contains_key(&n)
    }

    /// Insert a directed edge `a -> b`, optionally recording a probability on
    /// the pair. Fails if either endpoint is unknown, if a probability is
    /// attached to an edge touching a variable, or if the new weight
    /// disagrees with one already on record.
    #[instrument(level = "trace", skip(self))]
    pub fn connect(&self, a: Node, b: Node, prob: Option<f64>) -> Result<()> {
        if !self.exists(a) {
            return Err(AxiomError::UnknownNode(a));
        }
        if !self.exists(b) {
            return Err(AxiomError::UnknownNode(b));
        }

        if let Some(p) = prob {
            if a.is_variable() {
                return Err(AxiomError::ProbabilityOnVariable(a));
            }
            if b.is_variable() {
                return Err(AxiomError::ProbabilityOnVariable(b));
            }
            let mut probs = self.probabilities.lock();
            match probs.get(&(a, b)).copied() {
                Some(existing) => match merge_probability(existing, p) {
                    Ok(merged) => {
                        probs.insert((a, b), merged);
                    }
                    Err(_) => return Err(AxiomError::ProbabilityConflict(a, b)),
                },
                None => {
                    probs.insert((a, b), p);
                }
            }
        }

        self.right.write().entry(a).or_default().insert(b);
        self.left.write().entry(b).or_default().insert(a);
        metrics::counter!("axiom_edges_created").increment(1);
        Ok(())
    }

    /// Remove the directed edge `a -> b`, along with any recorded probability.
    #[instrument(level = "trace", skip(self))]
    pub fn disconnect(&self, a: Node, b: Node) {
        if let Some(set) = self.right.write().get_mut(&a) {
            set.remove(b);
        }
        if let Some(set) = self.left.write().get_mut(&b) {
            set.remove(a);
        }
        self.probabilities.lock().remove(&(a, b));
    }

    /// Delete a node along with every edge incident to it and its probability
    /// entries. Does not touch naming tables; callers that expose names run
    /// their own cleanup sweep afterward.
    pub fn remove(&self, n: Node) {
        let outgoing = self.right_of(n);
        let incoming = self.left_of(n);

        for b in &outgoing {
            self.disconnect(n, *b);
        }
        for a in &incoming {
            self.disconnect(*a, n);
        }

        self.left.write().remove(&n);
        self.right.write().remove(&n);

        let mut probs = self.probabilities.lock();
        probs.retain(|(a, b), _| *a != n && *b != n);
    }

    /// Snapshot copy of `n`'s predecessors (nodes with an edge pointing to `n`).
    pub fn left_of(&self, n: Node) -> Vec<Node> {
        self.left
            .read()
            .get(&n)
            .map(AdjSet::to_vec)
            .unwrap_or_default()
    }

    /// Snapshot copy of `n`'s successors (nodes `n` has an edge pointing to).
    pub fn right_of(&self, n: Node) -> Vec<Node> {
        self.right
            .read()
            .get(&n)
            .map(AdjSet::to_vec)
            .unwrap_or_default()
    }

    /// `true` if an edge `b -> a` exists (`b` is a predecessor of `a`).
    pub fn has_left_edge(&self, a: Node, b: Node) -> bool {
        self.left
            .read()
            .get(&a)
            .map(|s| s.contains(b))
            .unwrap_or(false)
    }

    /// `true` if an edge `a -> b` exists.
    pub fn has_right_edge(&self, a: Node, b: Node) -> bool {
        self.right
            .read()
            .get(&a)
            .map(|s| s.contains(b))
            .unwrap_or(false)
    }

    /// The recorded probability for `(a, b)`, if any.
    pub fn probability(&self, a: Node, b: Node) -> Option<f64> {
        self.probabilities.lock().get(&(a, b)).copied()
    }

    /// Degree (out-degree) of `n`, for heuristics that need it without paying
    /// for a full snapshot copy.
    pub fn right_degree(&self, n: Node) -> usize {
        self.right.read().get(&n).map(AdjSet::len).unwrap_or(0)
    }

    /// Degree (in-degree) of `n`.
    pub fn left_degree(&self, n: Node) -> usize {
        self.left.read().get(&n).map(AdjSet::len).unwrap_or(0)
    }

    /// Every currently allocated node, snapshotted under the read lock.
    pub fn all_nodes(&self) -> Vec<Node> {
        self.left.read().keys().copied().collect()
    }

    /// Snapshot copy of every recorded probability, for persistence.
    pub fn all_probabilities(&self) -> Vec<(Node, Node, f64)> {
        self.probabilities
            .lock()
            .iter()
            .map(|(&(a, b), &p)| (a, b, p))
            .collect()
    }

    /// Force-create `id` during snapshot restore, advancing the matching
    /// counter past it so later `allocate_atom`/`allocate_variable` calls
    /// never collide with a restored id. Hash ids go through the ordinary
    /// [`GraphStore::reserve`] path, since they carry no counter.
    pub fn restore_node(&self, id: Node) -> Result<()> {
        if id.is_hash() {
            return self.reserve(id).map(|_| ());
        }
        if id.is_variable() {
            self.create_node(id);
            self.next_variable.fetch_min(id.raw().saturating_sub(1), Ordering::Relaxed);
            return Ok(());
        }
        if id.is_atom() {
            self.create_node(id);
            self.next_atom.fetch_max(id.raw() + 1, Ordering::Relaxed);
            return Ok(());
        }
        Err(AxiomError::CollisionWithAtom(id))
    }

    /// Insert a probability entry verbatim during snapshot restore, bypassing
    /// the merge/conflict checks `connect` applies to freshly-asserted edges.
    pub fn restore_probability(&self, a: Node, b: Node, prob: f64) {
        self.probabilities.lock().insert((a, b), prob);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_atom_counts_up() {
        let store = GraphStore::new();
        let a = store.allocate_atom().unwrap();
        let b = store.allocate_atom().unwrap();
        assert!(a.is_atom() && b.is_atom());
        assert!(a.raw() < b.raw());
    }

    #[test]
    fn allocate_variable_counts_down() {
        let store = GraphStore::new();
        let a = store.allocate_variable().unwrap();
        let b = store.allocate_variable().unwrap();
        assert!(a.is_variable() && b.is_variable());
        assert!(a.raw() > b.raw());
    }

    #[test]
    fn connect_requires_known_nodes() {
        let store = GraphStore::new();
        let a = store.allocate_atom().unwrap();
        let ghost = Node::from_raw(999_999);
        assert!(matches!(
            store.connect(a, ghost, None),
            Err(AxiomError::UnknownNode(_))
        ));
    }

    #[test]
    fn connect_and_disconnect_round_trip() {
        let store = GraphStore::new();
        let a = store.allocate_atom().unwrap();
        let b = store.allocate_atom().unwrap();
        store.connect(a, b, None).unwrap();

        assert!(store.has_right_edge(a, b));
        assert!(store.has_left_edge(b, a));
        assert_eq!(store.right_of(a), vec![b]);

        store.disconnect(a, b);
        assert!(!store.has_right_edge(a, b));
        assert!(store.right_of(a).is_empty());
    }

    #[test]
    fn probability_on_variable_is_rejected() {
        let store = GraphStore::new();
        let a = store.allocate_atom().unwrap();
        let v = store.allocate_variable().unwrap();
        assert!(matches!(
            store.connect(a, v, Some(0.9)),
            Err(AxiomError::ProbabilityOnVariable(_))
        ));
    }

    #[test]
    fn conflicting_probability_across_half_point_is_rejected() {
        let store = GraphStore::new();
        let a = store.allocate_atom().unwrap();
        let b = store.allocate_atom().unwrap();
        store.connect(a, b, Some(0.9)).unwrap();
        assert!(matches!(
            store.connect(a, b, Some(0.1)),
            Err(AxiomError::ProbabilityConflict(_, _))
        ));
    }

    #[test]
    fn remove_clears_incident_edges() {
        let store = GraphStore::new();
        let a = store.allocate_atom().unwrap();
        let b = store.allocate_atom().unwrap();
        let c = store.allocate_atom().unwrap();
        store.connect(a, b, None).unwrap();
        store.connect(c, a, None).unwrap();

        store.remove(a);

        assert!(!store.exists(a));
        assert!(store.right_of(c).is_empty());
        assert!(store.left_of(b).is_empty());
    }

    #[test]
    fn adjacency_survives_the_large_set_transition() {
        let store = GraphStore::new();
        let hub = store.allocate_atom().unwrap();
        let mut spokes = Vec::new();
        for _ in 0..300 {
            let n = store.allocate_atom().unwrap();
            store.connect(hub, n, None).unwrap();
            spokes.push(n);
        }
        assert_eq!(store.right_degree(hub), 300);
        for n in &spokes {
            assert!(store.has_right_edge(hub, *n));
        }

        for n in spokes.iter().take(250) {
            store.disconnect(hub, *n);
        }
        assert_eq!(store.right_degree(hub), 50);
    }
}
