use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed, styled, non-hierarchical edge between two nodes of one lesson
///
/// `(lesson_id, from_node_id, to_node_id)` is covered by a unique index.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mind_map_relationships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub lesson_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub relationship_type: String,
    pub color: String,
    pub line_width: i32,
    pub line_style: String,
    pub label_ar: Option<String>,
    pub label_en: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::mind_map_nodes::Entity",
        from = "Column::FromNodeId",
        to = "super::mind_map_nodes::Column::Id",
        on_delete = "Cascade"
    )]
    FromNode,
    #[sea_orm(
        belongs_to = "super::mind_map_nodes::Entity",
        from = "Column::ToNodeId",
        to = "super::mind_map_nodes::Column::Id",
        on_delete = "Cascade"
    )]
    ToNode,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True when the edge touches the given node on either end
    pub fn touches(&self, node_id: &str) -> bool {
        self.from_node_id == node_id || self.to_node_id == node_id
    }
}
