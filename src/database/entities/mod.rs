pub mod mind_map_nodes;
pub mod mind_map_relationships;

pub use mind_map_nodes::Entity as MindMapNodes;
pub use mind_map_relationships::Entity as MindMapRelationships;
