use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use super::hierarchy::HierarchyIndex;
use super::types::{MindMapNode, TreeSnapshot};

/// Row of the tree editor's visible list
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeRow {
    pub id: String,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
}

/// Local state of the admin tree editor
///
/// Nodes live in a flat map keyed by id; the nesting is derived on demand so
/// every server payload can be applied as a patch.
#[derive(Clone, Debug, Default)]
pub struct TreeEditorState {
    nodes: IndexMap<String, MindMapNode>,
    expanded: HashSet<String>,
}

impl TreeEditorState {
    pub fn from_snapshot(snapshot: &TreeSnapshot) -> Self {
        let mut state = Self::default();
        state.load(snapshot);
        state
    }

    /// Replace the cache, keeping expansion for ids that still exist
    pub fn load(&mut self, snapshot: &TreeSnapshot) {
        self.nodes = snapshot
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.clone()))
            .collect();
        let nodes = &self.nodes;
        self.expanded.retain(|id| nodes.contains_key(id));
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&MindMapNode> {
        self.nodes.get(id)
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    pub fn toggle(&mut self, id: &str) {
        if !self.expanded.remove(id) && self.nodes.contains_key(id) {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn expand(&mut self, id: &str) {
        if self.nodes.contains_key(id) {
            self.expanded.insert(id.to_string());
        }
    }

    pub fn collapse(&mut self, id: &str) {
        self.expanded.remove(id);
    }

    pub fn expand_all(&mut self) {
        self.expanded = self.nodes.keys().cloned().collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Rows to display: depth-first in sibling order, descending only into
    /// expanded nodes
    pub fn visible_rows(&self) -> Vec<TreeRow> {
        let index = self.index();
        let mut rows = Vec::new();
        let mut visited = HashSet::new();
        let mut stack: Vec<(String, usize)> = self
            .top_level(&index)
            .into_iter()
            .rev()
            .map(|id| (id, 0))
            .collect();

        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id.clone()) {
                continue;
            }
            let children = index.children_of(&id);
            let expanded = self.expanded.contains(&id);
            if expanded {
                for child in children.iter().rev() {
                    stack.push((child.clone(), depth + 1));
                }
            }
            rows.push(TreeRow {
                has_children: !children.is_empty(),
                expanded,
                id,
                depth,
            });
        }
        rows
    }

    /// Apply a node returned by create; its parent is opened to reveal it
    pub fn apply_created(&mut self, node: MindMapNode) {
        if let Some(parent_id) = &node.parent_id {
            self.expand(parent_id);
        }
        self.nodes.insert(node.id.clone(), node);
    }

    pub fn apply_updated(&mut self, node: MindMapNode) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Apply the node returned by a reorder or reparent
    ///
    /// The server renumbers both sibling lists and shifts the levels of the
    /// moved subtree but only returns the moved node, so the same bookkeeping
    /// is replayed locally.
    pub fn apply_moved(&mut self, node: MindMapNode) {
        let id = node.id.clone();
        let Some(previous) = self.nodes.get(&id).cloned() else {
            self.apply_created(node);
            return;
        };

        let level_shift = node.level - previous.level;
        if level_shift != 0 {
            for descendant in self.index().subtree(&id).into_iter().skip(1) {
                if let Some(cached) = self.nodes.get_mut(&descendant) {
                    cached.level += level_shift;
                }
            }
        }

        let old_siblings = self.siblings_without(previous.parent_id.as_deref(), &id);
        let mut new_siblings = self.siblings_without(node.parent_id.as_deref(), &id);
        let position = node.order.clamp(0, new_siblings.len() as i32) as usize;
        new_siblings.insert(position, id.clone());

        if let Some(parent_id) = &node.parent_id {
            self.expand(parent_id);
        }
        self.nodes.insert(id, node);
        self.renumber(&old_siblings);
        self.renumber(&new_siblings);
    }

    /// Drop every id listed in a `deletedNodeIds` payload
    pub fn apply_deleted(&mut self, deleted_node_ids: &[String]) {
        for id in deleted_node_ids {
            self.nodes.shift_remove(id);
            self.expanded.remove(id);
        }
    }

    /// Whether dropping `dragged` under `target` is a move the server accepts
    ///
    /// `None` as target means promoting the node to a root.
    pub fn can_drop(&self, dragged: &str, target: Option<&str>) -> bool {
        let Some(dragged_node) = self.nodes.get(dragged) else {
            return false;
        };
        match target {
            None => true,
            Some(target_id) => match self.nodes.get(target_id) {
                Some(target_node) if target_node.lesson_id == dragged_node.lesson_id => {
                    !self.index().would_create_cycle(dragged, Some(target_id))
                }
                _ => false,
            },
        }
    }

    fn siblings_without(&self, parent_id: Option<&str>, excluded: &str) -> Vec<String> {
        let mut siblings: Vec<&MindMapNode> = self
            .nodes
            .values()
            .filter(|n| n.parent_id.as_deref() == parent_id && n.id != excluded)
            .collect();
        siblings.sort_by_key(|n| n.order);
        siblings.into_iter().map(|n| n.id.clone()).collect()
    }

    fn renumber(&mut self, ordered_ids: &[String]) {
        for (position, id) in ordered_ids.iter().enumerate() {
            if let Some(cached) = self.nodes.get_mut(id) {
                cached.order = position as i32;
            }
        }
    }

    fn index(&self) -> HierarchyIndex {
        let mut ordered: Vec<&MindMapNode> = self.nodes.values().collect();
        ordered.sort_by_key(|n| n.order);
        HierarchyIndex::from_pairs(
            ordered
                .into_iter()
                .map(|n| (n.id.as_str(), n.parent_id.as_deref())),
        )
    }

    /// Roots plus nodes whose parent is not cached
    fn top_level(&self, index: &HierarchyIndex) -> Vec<String> {
        let mut ordered: Vec<&MindMapNode> = self
            .nodes
            .values()
            .filter(|n| match &n.parent_id {
                None => true,
                Some(parent) => !index.contains(parent),
            })
            .collect();
        ordered.sort_by_key(|n| n.order);
        ordered.into_iter().map(|n| n.id.clone()).collect()
    }
}
