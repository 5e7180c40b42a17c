use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[cfg(feature = "server")]
use utoipa::ToSchema;

use super::layout::{compute_layout, LayoutConfig, Point};
use super::types::{MindMapNode, MindMapRelationship, TreeSnapshot};
use crate::errors::{MindMapError, MindMapResult};

const HIERARCHY_EDGE_PREFIX: &str = "parent-";

/// Synthetic id of the edge drawn between a parent and its child
pub fn hierarchy_edge_id(parent_id: &str, child_id: &str) -> String {
    format!("{}{}-{}", HIERARCHY_EDGE_PREFIX, parent_id, child_id)
}

pub fn is_hierarchy_edge_id(id: &str) -> bool {
    id.starts_with(HIERARCHY_EDGE_PREFIX)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum GraphMode {
    #[default]
    Admin,
    Student,
}

impl fmt::Display for GraphMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphMode::Admin => f.write_str("admin"),
            GraphMode::Student => f.write_str("student"),
        }
    }
}

impl FromStr for GraphMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(GraphMode::Admin),
            "student" => Ok(GraphMode::Student),
            _ => Err(format!("Unknown graph mode: {}", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub position: Point,
    /// False when the position comes from the radial fallback
    pub saved_position: bool,
    pub data: MindMapNode,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyEdge {
    pub id: String,
    pub parent_id: String,
    pub child_id: String,
}

/// Edge of the projected graph, tagged by where it comes from
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GraphEdge {
    Hierarchy(HierarchyEdge),
    Relationship(MindMapRelationship),
}

impl GraphEdge {
    pub fn id(&self) -> &str {
        match self {
            GraphEdge::Hierarchy(edge) => &edge.id,
            GraphEdge::Relationship(rel) => &rel.id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            GraphEdge::Hierarchy(edge) => &edge.parent_id,
            GraphEdge::Relationship(rel) => &rel.from_node_id,
        }
    }

    pub fn target(&self) -> &str {
        match self {
            GraphEdge::Hierarchy(edge) => &edge.child_id,
            GraphEdge::Relationship(rel) => &rel.to_node_id,
        }
    }

    /// Relationship id to delete when the admin disconnects this edge
    pub fn deletable_relationship_id(&self) -> MindMapResult<&str> {
        match self {
            GraphEdge::Relationship(rel) => Ok(&rel.id),
            GraphEdge::Hierarchy(edge) => Err(MindMapError::HierarchicalEdge(edge.id.clone())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct GraphView {
    pub mode: GraphMode,
    #[cfg_attr(feature = "server", schema(value_type = Vec<Object>))]
    pub nodes: Vec<GraphNode>,
    #[cfg_attr(feature = "server", schema(value_type = Vec<Object>))]
    pub edges: Vec<GraphEdge>,
}

/// Project a lesson into positioned graph nodes and type-tagged edges
///
/// Positions are computed over every node before filtering, so a node the
/// student sees sits where the admin sees it.
pub fn project_graph(snapshot: &TreeSnapshot, mode: GraphMode, layout: &LayoutConfig) -> GraphView {
    let positions = compute_layout(&snapshot.nodes, layout);

    let visible: Vec<&MindMapNode> = snapshot
        .nodes
        .iter()
        .filter(|n| mode == GraphMode::Admin || n.is_published)
        .collect();
    let visible_ids: HashSet<&str> = visible.iter().map(|n| n.id.as_str()).collect();

    let nodes = visible
        .iter()
        .map(|n| GraphNode {
            id: n.id.clone(),
            position: positions
                .get(&n.id)
                .copied()
                .unwrap_or(Point { x: layout.origin_x, y: layout.origin_y }),
            saved_position: n.saved_position().is_some(),
            data: (*n).clone(),
        })
        .collect();

    let mut edges: Vec<GraphEdge> = visible
        .iter()
        .filter_map(|n| {
            let parent_id = n.parent_id.as_deref()?;
            visible_ids.contains(parent_id).then(|| {
                GraphEdge::Hierarchy(HierarchyEdge {
                    id: hierarchy_edge_id(parent_id, &n.id),
                    parent_id: parent_id.to_string(),
                    child_id: n.id.clone(),
                })
            })
        })
        .collect();

    edges.extend(
        snapshot
            .relationships
            .iter()
            .filter(|r| {
                visible_ids.contains(r.from_node_id.as_str())
                    && visible_ids.contains(r.to_node_id.as_str())
            })
            .cloned()
            .map(GraphEdge::Relationship),
    );

    GraphView { mode, nodes, edges }
}
