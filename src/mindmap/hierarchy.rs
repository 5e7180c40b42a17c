use std::collections::{HashMap, HashSet};

/// Parent/child index over one lesson's nodes
///
/// Built from `(id, parent_id)` pairs in sibling order. Every walk is bounded by
/// the number of indexed nodes, so corrupted parent cycles cannot hang a caller.
#[derive(Debug, Default, Clone)]
pub struct HierarchyIndex {
    parents: HashMap<String, Option<String>>,
    children: HashMap<String, Vec<String>>,
    roots: Vec<String>,
}

impl HierarchyIndex {
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<S>)>,
        S: Into<String>,
    {
        let mut index = HierarchyIndex::default();
        for (id, parent) in pairs {
            let id = id.into();
            let parent = parent.map(Into::into);
            match &parent {
                Some(parent_id) => index
                    .children
                    .entry(parent_id.clone())
                    .or_default()
                    .push(id.clone()),
                None => index.roots.push(id.clone()),
            }
            index.parents.insert(id, parent);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.parents.contains_key(id)
    }

    pub fn parent_of(&self, id: &str) -> Option<&str> {
        self.parents.get(id).and_then(|p| p.as_deref())
    }

    pub fn children_of(&self, id: &str) -> &[String] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    /// Whether `ancestor` is `node` itself or sits above it
    ///
    /// Follows `parent_id` links from `node` for at most `len()` steps.
    pub fn is_ancestor_or_self(&self, ancestor: &str, node: &str) -> bool {
        let mut current = Some(node);
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            if steps >= self.len() {
                return false;
            }
            steps += 1;
            current = self.parent_of(id);
        }
        false
    }

    /// Whether re-parenting `node_id` under `new_parent_id` would close a loop
    pub fn would_create_cycle(&self, node_id: &str, new_parent_id: Option<&str>) -> bool {
        match new_parent_id {
            Some(parent) => self.is_ancestor_or_self(node_id, parent),
            None => false,
        }
    }

    /// `id` followed by all of its descendants, depth-first in sibling order
    pub fn subtree(&self, id: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![id.to_string()];

        while let Some(current) = stack.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }
            for child in self.children_of(&current).iter().rev() {
                if !visited.contains(child) {
                    stack.push(child.clone());
                }
            }
            out.push(current);
        }
        out
    }

    /// Distance to the nearest root, `None` when the chain is broken or cyclic
    pub fn depth_of(&self, id: &str) -> Option<usize> {
        if !self.contains(id) {
            return None;
        }
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            if !self.contains(parent) || depth >= self.len() {
                return None;
            }
            depth += 1;
            current = parent;
        }
        Some(depth)
    }
}
