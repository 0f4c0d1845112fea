
use ahash::AHashMap;

use crate::kernel::hash::Hash;

/// A mutable equivalence relation over term-hash keys, used as the memo
/// table of one conversion check. Nodes live in flat parent/weight
/// vectors indexed by dense ids; the map translates hash keys to ids.
#[derive(Debug, Default)]
pub struct UnionFind {
    parent: Vec<usize>,
    weight: Vec<usize>,
    nodes: AHashMap<Hash, usize>,
}

impl UnionFind {
    pub fn new() -> UnionFind {
        UnionFind::default()
    }

    /// The node for `key`, creating a fresh singleton class if the key
    /// has not been seen.
    pub fn singleton(&mut self, key: Hash) -> usize {
        match self.nodes.get(&key) {
            Some(node) => *node,
            None => {
                let node = self.parent.len();
                self.parent.push(node);
                self.weight.push(1);
                self.nodes.insert(key, node);
                node
            }
        }
    }

    /// Walk to the class representative, retargeting every traversed
    /// node at the root.
    fn find_root(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut at = node;
        while self.parent[at] != root {
            let next = self.parent[at];
            self.parent[at] = root;
            at = next;
        }
        root
    }

    /// Merge two classes, hanging the lighter root under the heavier.
    fn union(&mut self, a: usize, b: usize) {
        let a = self.find_root(a);
        let b = self.find_root(b);
        if a == b { return }
        let (light, heavy) = if self.weight[a] < self.weight[b] { (a, b) } else { (b, a) };
        self.parent[light] = heavy;
        self.weight[heavy] += self.weight[light];
    }

    pub fn equivalent(&mut self, a: usize, b: usize) -> bool {
        self.find_root(a) == self.find_root(b)
    }

    pub fn is_equivalent(&mut self, k1: Hash, k2: Hash) -> bool {
        let a = self.singleton(k1);
        let b = self.singleton(k2);
        self.equivalent(a, b)
    }

    pub fn equate(&mut self, k1: Hash, k2: Hash) {
        let a = self.singleton(k1);
        let b = self.singleton(k2);
        self.union(a, b);
    }
}
