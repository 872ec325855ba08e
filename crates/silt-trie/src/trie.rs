//! Copy-on-write trie.

use std::collections::HashMap;
use std::sync::Arc;

/// A trie node: a branch, optionally carrying a value.
///
/// Nodes are immutable once constructed; mutation always builds new nodes
/// along the affected path.
#[derive(Debug)]
enum TrieNode<T> {
    /// Branch without a value.
    Inner {
        children: HashMap<u8, Arc<TrieNode<T>>>,
    },
    /// Branch that also terminates a key.
    Valued {
        children: HashMap<u8, Arc<TrieNode<T>>>,
        value: Arc<T>,
    },
}

impl<T> TrieNode<T> {
    fn children(&self) -> &HashMap<u8, Arc<TrieNode<T>>> {
        match self {
            TrieNode::Inner { children } | TrieNode::Valued { children, .. } => children,
        }
    }

    fn value(&self) -> Option<&Arc<T>> {
        match self {
            TrieNode::Valued { value, .. } => Some(value),
            TrieNode::Inner { .. } => None,
        }
    }

    /// Rebuilds a node with new children, keeping the value (if any).
    fn with_children(&self, children: HashMap<u8, Arc<TrieNode<T>>>) -> Arc<TrieNode<T>> {
        match self.value() {
            Some(value) => Arc::new(TrieNode::Valued {
                children,
                value: Arc::clone(value),
            }),
            None => Arc::new(TrieNode::Inner { children }),
        }
    }
}

/// Persistent prefix map from byte strings to values.
///
/// `put` and `remove` return a new trie; untouched subtrees are shared
/// between the old and new versions. Cloning a trie is a root-pointer copy.
///
/// The empty key addresses the root.
///
/// # Example
///
/// ```rust
/// use silt_trie::Trie;
///
/// let v1: Trie<u32> = Trie::new();
/// let v2 = v1.put(b"hello", 42);
/// assert_eq!(v2.get(b"hello"), Some(&42));
/// assert_eq!(v1.get(b"hello"), None); // v1 is unchanged
/// ```
#[derive(Debug)]
pub struct Trie<T> {
    root: Option<Arc<TrieNode<T>>>,
}

impl<T> Clone for Trie<T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
        }
    }
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Trie<T> {
    /// Creates an empty trie.
    #[must_use]
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Looks up `key`, walking one child edge per byte.
    pub fn get(&self, key: &[u8]) -> Option<&T> {
        let mut node = self.root.as_ref()?;
        for byte in key {
            node = node.children().get(byte)?;
        }
        node.value().map(Arc::as_ref)
    }

    /// Looks up `key` and returns a shared handle to the value.
    pub(crate) fn get_shared(&self, key: &[u8]) -> Option<Arc<T>> {
        let mut node = self.root.as_ref()?;
        for byte in key {
            node = node.children().get(byte)?;
        }
        node.value().map(Arc::clone)
    }

    /// Returns a new trie with `key` mapped to `value`.
    ///
    /// Only the nodes on the path from the root to the terminal are copied;
    /// an existing terminal keeps its children and is upgraded to carry the
    /// new value.
    #[must_use]
    pub fn put(&self, key: &[u8], value: T) -> Self {
        let root = Self::put_node(self.root.as_deref(), key, Arc::new(value));
        Self { root: Some(root) }
    }

    fn put_node(node: Option<&TrieNode<T>>, key: &[u8], value: Arc<T>) -> Arc<TrieNode<T>> {
        let mut children = node.map(|n| n.children().clone()).unwrap_or_default();
        match key.split_first() {
            None => Arc::new(TrieNode::Valued { children, value }),
            Some((&byte, rest)) => {
                let new_child =
                    Self::put_node(children.get(&byte).map(Arc::as_ref), rest, value);
                children.insert(byte, new_child);
                match node {
                    Some(node) => node.with_children(children),
                    None => Arc::new(TrieNode::Inner { children }),
                }
            }
        }
    }

    /// Returns a new trie with `key` unmapped.
    ///
    /// A terminal that still has children is demoted to a plain branch; a
    /// childless terminal is unlinked from its parent. Removing an absent
    /// key returns a trie sharing this one's root.
    #[must_use]
    pub fn remove(&self, key: &[u8]) -> Self {
        if self.get(key).is_none() {
            return self.clone();
        }
        let root = self.root.as_ref().expect("present key implies a root");
        Self {
            root: Self::remove_node(root, key),
        }
    }

    /// Removes `key` below `node`, which is known to contain it. Returns
    /// the replacement node, or `None` if the node ends up with neither
    /// value nor children.
    fn remove_node(node: &TrieNode<T>, key: &[u8]) -> Option<Arc<TrieNode<T>>> {
        match key.split_first() {
            None => {
                if node.children().is_empty() {
                    None
                } else {
                    Some(Arc::new(TrieNode::Inner {
                        children: node.children().clone(),
                    }))
                }
            }
            Some((&byte, rest)) => {
                let mut children = node.children().clone();
                let child = children
                    .get(&byte)
                    .expect("present key implies a child on its path");
                match Self::remove_node(child, rest) {
                    Some(new_child) => {
                        children.insert(byte, new_child);
                    }
                    None => {
                        children.remove(&byte);
                    }
                }
                Some(node.with_children(children))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_on_empty_trie() {
        let trie: Trie<u32> = Trie::new();
        assert_eq!(trie.get(b"hello"), None);
        assert_eq!(trie.get(b""), None);
    }

    #[test]
    fn test_put_then_get() {
        let trie = Trie::new().put(b"hello", 42u32);
        assert_eq!(trie.get(b"hello"), Some(&42));
        assert_eq!(trie.get(b"hell"), None);
        assert_eq!(trie.get(b"hello!"), None);
    }

    #[test]
    fn test_put_is_persistent() {
        let v1 = Trie::new().put(b"a", 1u32);
        let v2 = v1.put(b"a", 2);
        let v3 = v2.put(b"b", 3);

        assert_eq!(v1.get(b"a"), Some(&1));
        assert_eq!(v2.get(b"a"), Some(&2));
        assert_eq!(v2.get(b"b"), None);
        assert_eq!(v3.get(b"a"), Some(&2));
        assert_eq!(v3.get(b"b"), Some(&3));
    }

    #[test]
    fn test_prefix_keys_are_independent() {
        let trie = Trie::new()
            .put(b"ab", 1u32)
            .put(b"abc", 2)
            .put(b"a", 3);

        assert_eq!(trie.get(b"a"), Some(&3));
        assert_eq!(trie.get(b"ab"), Some(&1));
        assert_eq!(trie.get(b"abc"), Some(&2));
    }

    #[test]
    fn test_overwrite_keeps_children() {
        let trie = Trie::new().put(b"ab", 1u32).put(b"abc", 2).put(b"ab", 9);
        assert_eq!(trie.get(b"ab"), Some(&9));
        assert_eq!(trie.get(b"abc"), Some(&2));
    }

    #[test]
    fn test_empty_key_addresses_root() {
        let trie = Trie::new().put(b"", 7u32).put(b"x", 8);
        assert_eq!(trie.get(b""), Some(&7));
        assert_eq!(trie.get(b"x"), Some(&8));

        let removed = trie.remove(b"");
        assert_eq!(removed.get(b""), None);
        assert_eq!(removed.get(b"x"), Some(&8));
    }

    #[test]
    fn test_remove_terminal_with_children_demotes_it() {
        let trie = Trie::new().put(b"a", 1u32).put(b"ab", 2);
        let removed = trie.remove(b"a");

        assert_eq!(removed.get(b"a"), None);
        assert_eq!(removed.get(b"ab"), Some(&2));
        // The original version is untouched.
        assert_eq!(trie.get(b"a"), Some(&1));
    }

    #[test]
    fn test_remove_childless_terminal_unlinks_edge() {
        let trie = Trie::new().put(b"a", 1u32).put(b"ab", 2);
        let removed = trie.remove(b"ab");

        assert_eq!(removed.get(b"ab"), None);
        assert_eq!(removed.get(b"a"), Some(&1));
    }

    #[test]
    fn test_remove_absent_key_is_a_noop() {
        let trie = Trie::new().put(b"a", 1u32);
        let removed = trie.remove(b"zzz");
        assert_eq!(removed.get(b"a"), Some(&1));

        let empty: Trie<u32> = Trie::new();
        assert_eq!(empty.remove(b"a").get(b"a"), None);
    }

    #[test]
    fn test_remove_last_key_empties_trie() {
        let trie = Trie::new().put(b"solo", 1u32);
        let removed = trie.remove(b"solo");
        assert_eq!(removed.get(b"solo"), None);
        assert_eq!(removed.get(b""), None);
    }

    #[test]
    fn test_structural_sharing() {
        // Subtrees off the put path are shared, not copied.
        let v1 = Trie::new().put(b"left", 1u32).put(b"right", 2);
        let v2 = v1.put(b"left", 9);

        let right_v1 = v1.get_shared(b"right").unwrap();
        let right_v2 = v2.get_shared(b"right").unwrap();
        assert!(Arc::ptr_eq(&right_v1, &right_v2));
    }

    #[test]
    fn test_non_copyable_values() {
        let trie = Trie::new().put(b"boxed", Box::new(42u32));
        assert_eq!(trie.get(b"boxed").map(|b| **b), Some(42));
    }

    #[test]
    fn test_many_keys() {
        let mut trie = Trie::new();
        for i in 0u32..200 {
            trie = trie.put(format!("key-{i:03}").as_bytes(), i);
        }
        for i in 0u32..200 {
            assert_eq!(trie.get(format!("key-{i:03}").as_bytes()), Some(&i));
        }
        for i in (0u32..200).step_by(2) {
            trie = trie.remove(format!("key-{i:03}").as_bytes());
        }
        for i in 0u32..200 {
            let got = trie.get(format!("key-{i:03}").as_bytes()).copied();
            let expected = if i % 2 == 0 { None } else { Some(i) };
            assert_eq!(got, expected);
        }
    }
}
