//! Per-language naming layer: bidirectional `name <-> node` maps with a
//! fallback lookup chain. Names never affect identity or inference; this is a
//! side table consumed only by diagnostics and external collaborators.

use dashmap::DashMap;

use crate::node::Node;
use crate::store::GraphStore;

/// The system's internal fallback language, consulted after English and
/// before an arbitrary remaining language.
pub const INTERNAL_LANG: &str = "en";

/// Bidirectional per-language name tables.
pub struct Naming {
    node_to_name: DashMap<(String, Node), String>,
    name_to_node: DashMap<(String, String), Node>,
    internal_lang: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self::new(INTERNAL_LANG)
    }
}

impl Naming {
    /// A naming layer with no entries, using `internal_lang` as the
    /// second-to-last step of the fallback chain.
    pub fn new(internal_lang: impl Into<String>) -> Self {
        Naming {
            node_to_name: DashMap::new(),
            name_to_node: DashMap::new(),
            internal_lang: internal_lang.into(),
        }
    }

    /// Atomic get-or-create: returns the node already bound to `(name, lang)`
    /// in `store`, or allocates a fresh atom and binds it.
    pub fn intern(&self, store: &GraphStore, name: &str, lang: &str) -> crate::error::Result<Node> {
        let key = (lang.to_string(), name.to_string());
        if let Some(existing) = self.name_to_node.get(&key) {
            return Ok(*existing);
        }

        let node = store.allocate_atom()?;
        self.name_to_node.insert(key, node);
        self.node_to_name.insert((lang.to_string(), node), name.to_string());
        Ok(node)
    }

    /// Bind `name` to `node` in `lang`. Returns `false` without writing
    /// anything if `name` is already bound to a *different* node in `lang`
    /// and `merge` is not set; with `merge` the existing binding is
    /// overwritten in both directions.
    pub fn set_name(&self, node: Node, name: &str, lang: &str, merge: bool) -> bool {
        let key = (lang.to_string(), name.to_string());
        if let Some(existing) = self.name_to_node.get(&key) {
            if *existing != node && !merge {
                return false;
            }
            if *existing != node {
                self.node_to_name.remove(&(lang.to_string(), *existing));
            }
        }
        self.name_to_node.insert(key, node);
        self.node_to_name.insert((lang.to_string(), node), name.to_string());
        true
    }

    /// `true` if `node` has a name recorded in `lang`.
    pub fn has_name(&self, node: Node, lang: &str) -> bool {
        self.node_to_name.contains_key(&(lang.to_string(), node))
    }

    /// Look up `node`'s name in `lang`, following the fallback chain
    /// (`lang -> English -> internal language -> arbitrary first language`)
    /// when `fallback` is set and the direct lookup misses.
    pub fn get_name(&self, node: Node, lang: &str, fallback: bool) -> Option<String> {
        if let Some(name) = self.node_to_name.get(&(lang.to_string(), node)) {
            return Some(name.clone());
        }
        if !fallback {
            return None;
        }

        for candidate in ["en", self.internal_lang.as_str()] {
            if candidate == lang {
                continue;
            }
            if let Some(name) = self.node_to_name.get(&(candidate.to_string(), node)) {
                return Some(name.clone());
            }
        }

        self.node_to_name
            .iter()
            .find(|entry| entry.key().1 == node)
            .map(|entry| entry.value().clone())
    }

    /// The node bound to `name` in `lang`, if any.
    pub fn get_node(&self, name: &str, lang: &str) -> Option<Node> {
        self.name_to_node
            .get(&(lang.to_string(), name.to_string()))
            .map(|n| *n)
    }

    /// Remove `node`'s binding in `lang`, in both directions.
    pub fn remove_name(&self, node: Node, lang: &str) {
        if let Some((_, name)) = self.node_to_name.remove(&(lang.to_string(), node)) {
            self.name_to_node.remove(&(lang.to_string(), name));
        }
    }

    /// Every language with at least one name recorded.
    pub fn languages(&self) -> Vec<String> {
        let mut langs: Vec<String> = self
            .node_to_name
            .iter()
            .map(|entry| entry.key().0.clone())
            .collect();
        langs.sort_unstable();
        langs.dedup();
        langs
    }

    /// `true` if at least one name is recorded in `lang`.
    pub fn has_language(&self, lang: &str) -> bool {
        self.node_to_name.iter().any(|entry| entry.key().0 == lang)
    }

    /// Every `(lang, node, name)` triple currently recorded, for snapshotting.
    pub fn all_entries(&self) -> Vec<(String, Node, String)> {
        self.node_to_name
            .iter()
            .map(|entry| {
                let (lang, node) = entry.key().clone();
                (lang, node, entry.value().clone())
            })
            .collect()
    }

    /// Purge every naming-table entry whose node no longer exists in `store`.
    pub fn cleanup(&self, store: &GraphStore) {
        let stale: Vec<(String, Node)> = self
            .node_to_name
            .iter()
            .filter(|entry| !store.exists(entry.key().1))
            .map(|entry| entry.key().clone())
            .collect();

        for (lang, node) in stale {
            self.remove_name(node, &lang);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_get_or_create() {
        let store = GraphStore::new();
        let naming = Naming::default();

        let a = naming.intern(&store, "alice", "en").unwrap();
        let b = naming.intern(&store, "alice", "en").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fallback_chain_reaches_english_then_internal_then_arbitrary() {
        let store = GraphStore::new();
        let naming = Naming::new("de");
        let node = store.allocate_atom().unwrap();

        naming.set_name(node, "katze", "de", false);
        assert_eq!(naming.get_name(node, "fr", true).as_deref(), Some("katze"));

        naming.set_name(node, "cat", "en", false);
        assert_eq!(naming.get_name(node, "fr", true).as_deref(), Some("cat"));
    }

    #[test]
    fn rename_collision_is_rejected_without_merge() {
        let store = GraphStore::new();
        let naming = Naming::default();
        let a = store.allocate_atom().unwrap();
        let b = store.allocate_atom().unwrap();

        assert!(naming.set_name(a, "shared", "en", false));
        assert!(!naming.set_name(b, "shared", "en", false));
        assert_eq!(naming.get_node("shared", "en"), Some(a));
    }

    #[test]
    fn cleanup_purges_removed_nodes() {
        let store = GraphStore::new();
        let naming = Naming::default();
        let node = store.allocate_atom().unwrap();
        naming.set_name(node, "ghost", "en", false);

        store.remove(node);
        naming.cleanup(&store);

        assert_eq!(naming.get_node("ghost", "en"), None);
        assert!(!naming.has_name(node, "en"));
    }
}
