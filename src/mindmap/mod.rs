//! Mind-map domain model and the pure algorithms shared by every consumer
//!
//! Nothing in this module touches storage: the services load flat node and
//! relationship sets and hand them to [`forest::assemble`],
//! [`layout::compute_layout`] or [`graph::project_graph`].

pub mod forest;
pub mod graph;
pub mod hierarchy;
pub mod layout;
pub mod tree_editor;
pub mod types;

pub use forest::{assemble, Forest, ForestNode, MAX_TREE_DEPTH};
pub use graph::{project_graph, GraphEdge, GraphMode, GraphNode, GraphView, HierarchyEdge};
pub use hierarchy::HierarchyIndex;
pub use layout::{compute_layout, LayoutConfig, Point};
pub use tree_editor::{TreeEditorState, TreeRow};
pub use types::*;
