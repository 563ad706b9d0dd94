//! Place hierarchy as a closure table over a DAG, not a tree of recursive
//! pointers — `is_ancestor` is an O(1) set lookup after a one-time BFS closure
//! build, per spec's "cyclic relations" design note.

use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub struct Hierarchy {
    direct_children: HashMap<String, Vec<String>>,
    closure: HashSet<(String, String)>,
}

impl Hierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a direct parent -> child edge. Call `build_closure` once all
    /// edges are registered.
    pub fn add_edge(&mut self, parent_id: &str, child_id: &str) {
        self.direct_children
            .entry(parent_id.to_string())
            .or_default()
            .push(child_id.to_string());
    }

    /// Compute the full ancestor-of-descendant closure via BFS from every
    /// node that has children. Safe against cycles: each BFS tracks visited
    /// nodes and never revisits one.
    pub fn build_closure(&mut self) {
        self.closure.clear();
        let roots: Vec<String> = self.direct_children.keys().cloned().collect();
        for root in roots {
            let mut visited = HashSet::new();
            let mut queue = std::collections::VecDeque::new();
            queue.push_back(root.clone());
            visited.insert(root.clone());

            while let Some(node) = queue.pop_front() {
                if let Some(children) = self.direct_children.get(&node) {
                    for child in children {
                        if visited.insert(child.clone()) {
                            self.closure.insert((root.clone(), child.clone()));
                            queue.push_back(child.clone());
                        }
                    }
                }
            }
        }
    }

    pub fn is_ancestor(&self, ancestor_id: &str, descendant_id: &str) -> bool {
        self.closure.contains(&(ancestor_id.to_string(), descendant_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_child_is_ancestor() {
        let mut h = Hierarchy::new();
        h.add_edge("us", "california");
        h.build_closure();
        assert!(h.is_ancestor("us", "california"));
    }

    #[test]
    fn transitive_descendant_is_ancestor() {
        let mut h = Hierarchy::new();
        h.add_edge("us", "california");
        h.add_edge("california", "san-francisco");
        h.build_closure();
        assert!(h.is_ancestor("us", "san-francisco"));
    }

    #[test]
    fn unrelated_nodes_are_not_ancestors() {
        let mut h = Hierarchy::new();
        h.add_edge("us", "california");
        h.add_edge("uk", "london");
        h.build_closure();
        assert!(!h.is_ancestor("us", "london"));
    }

    #[test]
    fn dag_with_multiple_parents_does_not_infinite_loop() {
        let mut h = Hierarchy::new();
        h.add_edge("continent", "region-a");
        h.add_edge("continent", "region-b");
        h.add_edge("region-a", "city-x");
        h.add_edge("region-b", "city-x");
        h.build_closure();
        assert!(h.is_ancestor("continent", "city-x"));
        assert!(h.is_ancestor("region-a", "city-x"));
        assert!(h.is_ancestor("region-b", "city-x"));
    }
}
