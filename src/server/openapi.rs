use utoipa::OpenApi;

use super::error::ErrorBody;
use super::handlers::{bulk, health, hierarchy, nodes, relationships, tree};
use crate::mindmap::{
    DeletedNodes, Forest, ForestNode, GraphMode, GraphView, LineStyle, MindMapNode,
    MindMapRelationship, NewRelationship, NodeFields, NodePatch, NodeShape, NodeType, Point,
    PositionSaveResult, PositionUpdate, RelationshipType, RemovalPreview, TreeSnapshot,
};
use crate::services::BulkRequest;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Ebad Academy mind maps",
        description = "Hierarchical lesson mind maps with cross-links, layout and exports"
    ),
    paths(
        health::health_check,
        tree::get_tree,
        tree::get_forest,
        tree::get_graph,
        tree::export_lesson,
        nodes::create_node,
        nodes::get_node,
        nodes::update_node,
        nodes::delete_node,
        hierarchy::add_child,
        hierarchy::removal_preview,
        hierarchy::reorder,
        hierarchy::save_positions,
        relationships::create_relationship,
        relationships::list_relationships,
        relationships::delete_relationship,
        bulk::bulk,
    ),
    components(schemas(
        ErrorBody,
        MindMapNode,
        MindMapRelationship,
        TreeSnapshot,
        Forest,
        ForestNode,
        GraphView,
        GraphMode,
        Point,
        NodeType,
        NodeShape,
        RelationshipType,
        LineStyle,
        NodeFields,
        NodePatch,
        NewRelationship,
        PositionUpdate,
        PositionSaveResult,
        DeletedNodes,
        RemovalPreview,
        BulkRequest,
        nodes::CreateNodeRequest,
        hierarchy::ReorderRequest,
        hierarchy::SavePositionsRequest,
        relationships::RelationshipDeleted,
    )),
    tags(
        (name = "health"),
        (name = "tree", description = "Read views of a lesson"),
        (name = "nodes", description = "Node CRUD"),
        (name = "hierarchy", description = "Moves, children, positions and removal previews"),
        (name = "relationships", description = "Cross-links between nodes"),
        (name = "bulk", description = "Operations over many nodes at once")
    )
)]
pub struct ApiDoc;
