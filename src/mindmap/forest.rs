use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

#[cfg(feature = "server")]
use utoipa::ToSchema;

use super::types::{MindMapNode, MindMapRelationship};

/// Deepest nesting the services accept; levels run from 0 to `MAX_TREE_DEPTH - 1`
pub const MAX_TREE_DEPTH: usize = 50;

/// A node with its children attached, as rendered by the tree editor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct ForestNode {
    #[serde(flatten)]
    pub node: MindMapNode,
    pub children: Vec<ForestNode>,
}

impl ForestNode {
    /// Number of nodes in this subtree, the node included
    pub fn size(&self) -> usize {
        1 + self.children.iter().map(ForestNode::size).sum::<usize>()
    }
}

/// Assembled lesson
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct Forest {
    pub roots: Vec<ForestNode>,
    pub relationships: Vec<MindMapRelationship>,
    /// Nodes whose parent did not resolve; they are surfaced as roots
    pub orphans: Vec<String>,
    /// Nodes unreachable from any root because of a parent cycle
    pub cyclic: Vec<String>,
    /// Nodes nested past [`MAX_TREE_DEPTH`]; they start a new root
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub detached: Vec<String>,
}

impl Forest {
    pub fn node_count(&self) -> usize {
        self.roots.iter().map(ForestNode::size).sum()
    }
}

/// Rebuild the parent/child forest from a flat node list
///
/// Siblings keep their `order`, ties fall back to input order. Malformed data
/// never loops: nodes are emitted at most once and anything left unvisited is
/// reported as cyclic. The walk uses an explicit stack and never nests deeper
/// than [`MAX_TREE_DEPTH`], so nothing downstream recurses without bound.
pub fn assemble(nodes: Vec<MindMapNode>, relationships: Vec<MindMapRelationship>) -> Forest {
    let ids: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();

    let mut root_indices = Vec::new();
    let mut orphans = Vec::new();
    let mut children: HashMap<String, Vec<usize>> = HashMap::new();

    for (idx, node) in nodes.iter().enumerate() {
        match &node.parent_id {
            None => root_indices.push(idx),
            Some(parent_id) if ids.contains(parent_id) => {
                children.entry(parent_id.clone()).or_default().push(idx)
            }
            Some(parent_id) => {
                warn!(
                    "Node {} references missing parent {}, surfacing it as a root",
                    node.id, parent_id
                );
                orphans.push(node.id.clone());
                root_indices.push(idx);
            }
        }
    }

    let sort_key = |idx: &usize| (nodes[*idx].order, *idx);
    root_indices.sort_by_key(sort_key);
    for siblings in children.values_mut() {
        siblings.sort_by_key(sort_key);
    }

    let mut visited = vec![false; nodes.len()];
    let mut preorder = Vec::with_capacity(nodes.len());
    let mut attached: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut detached = Vec::new();

    // Detached nodes are appended and walked as roots of their own
    let mut tops = root_indices;
    let mut next_top = 0;
    while next_top < tops.len() {
        let top = tops[next_top];
        next_top += 1;
        if visited[top] {
            continue;
        }
        visited[top] = true;

        let mut stack = vec![(top, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            preorder.push(idx);
            let Some(list) = children.get(&nodes[idx].id) else {
                continue;
            };
            let mut kept = Vec::with_capacity(list.len());
            for &child in list {
                if visited[child] {
                    continue;
                }
                if depth + 1 >= MAX_TREE_DEPTH {
                    detached.push(nodes[child].id.clone());
                    tops.push(child);
                } else {
                    visited[child] = true;
                    kept.push(child);
                }
            }
            stack.extend(kept.iter().rev().map(|&child| (child, depth + 1)));
            attached.insert(idx, kept);
        }
    }
    if !detached.is_empty() {
        warn!(
            "Detached {} node(s) nested deeper than {} levels",
            detached.len(),
            MAX_TREE_DEPTH
        );
    }

    let cyclic: Vec<String> = nodes
        .iter()
        .zip(visited.iter())
        .filter(|(_, seen)| !**seen)
        .map(|(node, _)| node.id.clone())
        .collect();
    if !cyclic.is_empty() {
        warn!("Excluded {} node(s) caught in a parent cycle", cyclic.len());
    }

    // Reverse preorder finishes every child before its parent
    let mut built: Vec<Option<ForestNode>> = (0..nodes.len()).map(|_| None).collect();
    for &idx in preorder.iter().rev() {
        let kids = attached
            .remove(&idx)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|child| built[child].take())
            .collect();
        built[idx] = Some(ForestNode {
            node: nodes[idx].clone(),
            children: kids,
        });
    }
    let roots: Vec<ForestNode> = tops.iter().filter_map(|idx| built[*idx].take()).collect();

    Forest {
        roots,
        relationships,
        orphans,
        cyclic,
        detached,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::mindmap::types::{NodeShape, NodeType};
    use chrono::Utc;

    pub(crate) fn node(id: &str, parent: Option<&str>, level: i32, order: i32) -> MindMapNode {
        let now = Utc::now();
        MindMapNode {
            id: id.to_string(),
            lesson_id: "lesson-1".to_string(),
            parent_id: parent.map(str::to_string),
            level,
            order,
            title_ar: format!("عقدة {}", id),
            title_en: format!("Node {}", id),
            description_ar: None,
            description_en: None,
            node_type: NodeType::default_for(parent.is_some()),
            color: "#10b981".to_string(),
            shape: NodeShape::Rect,
            is_published: true,
            position_x: None,
            position_y: None,
            date_hijri: None,
            date_gregorian: None,
            location: None,
            participants: None,
            decision: None,
            alternatives: None,
            outcomes: None,
            moral_lessons: None,
            modern_apps: None,
            security_impact: None,
            sources: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn ids(nodes: &[ForestNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.node.id.as_str()).collect()
    }

    #[test]
    fn attaches_children_in_sibling_order() {
        let forest = assemble(
            vec![
                node("r", None, 0, 0),
                node("b", Some("r"), 1, 1),
                node("a", Some("r"), 1, 0),
                node("a1", Some("a"), 2, 0),
            ],
            vec![],
        );

        assert_eq!(ids(&forest.roots), vec!["r"]);
        assert_eq!(ids(&forest.roots[0].children), vec!["a", "b"]);
        assert_eq!(ids(&forest.roots[0].children[0].children), vec!["a1"]);
        assert_eq!(forest.node_count(), 4);
        assert!(forest.orphans.is_empty());
        assert!(forest.cyclic.is_empty());
    }

    #[test]
    fn orphans_surface_as_roots() {
        let forest = assemble(
            vec![node("r", None, 0, 0), node("lost", Some("gone"), 1, 0)],
            vec![],
        );

        assert_eq!(ids(&forest.roots), vec!["r", "lost"]);
        assert_eq!(forest.orphans, vec!["lost".to_string()]);
    }

    #[test]
    fn cyclic_data_terminates_and_is_reported() {
        let forest = assemble(
            vec![
                node("r", None, 0, 0),
                node("x", Some("y"), 1, 0),
                node("y", Some("x"), 1, 0),
                node("z", Some("x"), 2, 0),
            ],
            vec![],
        );

        assert_eq!(ids(&forest.roots), vec!["r"]);
        assert_eq!(forest.node_count(), 1);
        assert_eq!(
            forest.cyclic,
            vec!["x".to_string(), "y".to_string(), "z".to_string()]
        );
    }

    #[test]
    fn empty_input_gives_empty_forest() {
        let forest = assemble(vec![], vec![]);
        assert!(forest.roots.is_empty());
        assert_eq!(forest.node_count(), 0);
    }

    #[test]
    fn very_deep_chains_are_split_instead_of_overflowing() {
        let depth = 10_000;
        let mut chain = vec![node("n0", None, 0, 0)];
        for i in 1..depth {
            let parent = format!("n{}", i - 1);
            chain.push(node(&format!("n{}", i), Some(&parent), i as i32, 0));
        }

        let forest = assemble(chain, vec![]);

        assert_eq!(forest.node_count(), depth);
        assert_eq!(forest.roots.len(), depth / MAX_TREE_DEPTH);
        assert_eq!(forest.detached.len(), depth / MAX_TREE_DEPTH - 1);
        assert_eq!(forest.detached[0], format!("n{}", MAX_TREE_DEPTH));
        assert!(forest.cyclic.is_empty());

        let json = serde_json::to_string(&forest).unwrap();
        assert!(json.contains("\"detached\""));
    }

    #[test]
    fn shallow_forests_omit_detached() {
        let forest = assemble(vec![node("r", None, 0, 0)], vec![]);
        let json = serde_json::to_value(&forest).unwrap();
        assert!(json.get("detached").is_none());
    }
}
