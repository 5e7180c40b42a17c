use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single concept, event or idea inside a lesson's mind map
///
/// `parent_id` links to another row of the same lesson; `level` is kept equal
/// to the depth below the nearest root. List-valued metadata columns hold a
/// JSON-encoded array of strings.
///
/// Related entities:
/// - `mind_map_nodes`: parent node (self reference)
/// - `mind_map_relationships`: non-hierarchical edges touching this node
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "mind_map_nodes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub lesson_id: String,
    pub parent_id: Option<String>,
    pub level: i32,
    pub sort_order: i32,

    pub title_ar: String,
    pub title_en: String,
    #[sea_orm(column_type = "Text")]
    pub description_ar: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub description_en: Option<String>,
    pub node_type: String,
    pub color: String,
    pub shape: String,
    pub is_published: bool,

    pub position_x: Option<f64>, // Saved by the graph editor, None until dragged
    pub position_y: Option<f64>,

    // Historical metadata
    pub date_hijri: Option<String>,
    pub date_gregorian: Option<String>,
    pub location: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub participants: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub decision: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub alternatives: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub outcomes: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub moral_lessons: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub modern_apps: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub security_impact: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub sources: Option<String>,

    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id",
        on_delete = "Cascade"
    )]
    Parent,
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Whether the graph editor has stored a coordinate pair for this node
    pub fn has_saved_position(&self) -> bool {
        self.position_x.is_some() && self.position_y.is_some()
    }
}
