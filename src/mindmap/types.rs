use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

#[cfg(feature = "server")]
use utoipa::ToSchema;

use crate::database::entities::{mind_map_nodes, mind_map_relationships};

/// Kind of concept a node stands for; drives the default color and shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeType {
    Root,
    Category,
    Topic,
    Subtopic,
    Detail,
    Note,
    Event,
    Decision,
    Policy,
    Battle,
    Treaty,
    Revelation,
    Miracle,
    Lesson,
}

impl NodeType {
    pub const ALL: [NodeType; 14] = [
        NodeType::Root,
        NodeType::Category,
        NodeType::Topic,
        NodeType::Subtopic,
        NodeType::Detail,
        NodeType::Note,
        NodeType::Event,
        NodeType::Decision,
        NodeType::Policy,
        NodeType::Battle,
        NodeType::Treaty,
        NodeType::Revelation,
        NodeType::Miracle,
        NodeType::Lesson,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Root => "ROOT",
            NodeType::Category => "CATEGORY",
            NodeType::Topic => "TOPIC",
            NodeType::Subtopic => "SUBTOPIC",
            NodeType::Detail => "DETAIL",
            NodeType::Note => "NOTE",
            NodeType::Event => "EVENT",
            NodeType::Decision => "DECISION",
            NodeType::Policy => "POLICY",
            NodeType::Battle => "BATTLE",
            NodeType::Treaty => "TREATY",
            NodeType::Revelation => "REVELATION",
            NodeType::Miracle => "MIRACLE",
            NodeType::Lesson => "LESSON",
        }
    }

    /// Type used when the author does not pick one
    pub fn default_for(has_parent: bool) -> Self {
        if has_parent {
            NodeType::Topic
        } else {
            NodeType::Root
        }
    }

    pub fn default_color(&self) -> &'static str {
        match self {
            NodeType::Root => "#6366f1",
            NodeType::Category => "#0ea5e9",
            NodeType::Topic => "#10b981",
            NodeType::Subtopic => "#14b8a6",
            NodeType::Detail => "#64748b",
            NodeType::Note => "#eab308",
            NodeType::Event => "#f97316",
            NodeType::Decision => "#ef4444",
            NodeType::Policy => "#8b5cf6",
            NodeType::Battle => "#b91c1c",
            NodeType::Treaty => "#0d9488",
            NodeType::Revelation => "#16a34a",
            NodeType::Miracle => "#d946ef",
            NodeType::Lesson => "#2563eb",
        }
    }

    pub fn default_shape(&self) -> NodeShape {
        match self {
            NodeType::Root => NodeShape::Circle,
            NodeType::Decision => NodeShape::Diamond,
            _ => NodeShape::Rect,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown node type: {}", s))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    Circle,
    Rect,
    Diamond,
}

impl NodeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeShape::Circle => "circle",
            NodeShape::Rect => "rect",
            NodeShape::Diamond => "diamond",
        }
    }
}

impl fmt::Display for NodeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "circle" => Ok(NodeShape::Circle),
            "rect" => Ok(NodeShape::Rect),
            "diamond" => Ok(NodeShape::Diamond),
            _ => Err(format!("Unknown node shape: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "UPPERCASE")]
pub enum RelationshipType {
    #[default]
    Related,
    Influenced,
    Contrasts,
    Causes,
    Precedes,
    Supports,
    Opposes,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Related => "RELATED",
            RelationshipType::Influenced => "INFLUENCED",
            RelationshipType::Contrasts => "CONTRASTS",
            RelationshipType::Causes => "CAUSES",
            RelationshipType::Precedes => "PRECEDES",
            RelationshipType::Supports => "SUPPORTS",
            RelationshipType::Opposes => "OPPOSES",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationshipType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "RELATED" => Ok(RelationshipType::Related),
            "INFLUENCED" => Ok(RelationshipType::Influenced),
            "CONTRASTS" => Ok(RelationshipType::Contrasts),
            "CAUSES" => Ok(RelationshipType::Causes),
            "PRECEDES" => Ok(RelationshipType::Precedes),
            "SUPPORTS" => Ok(RelationshipType::Supports),
            "OPPOSES" => Ok(RelationshipType::Opposes),
            _ => Err(format!("Unknown relationship type: {}", s)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
}

impl LineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
        }
    }
}

impl FromStr for LineStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "solid" => Ok(LineStyle::Solid),
            "dashed" => Ok(LineStyle::Dashed),
            _ => Err(format!("Unknown line style: {}", s)),
        }
    }
}

pub const DEFAULT_RELATIONSHIP_COLOR: &str = "#94a3b8";
pub const DEFAULT_LINE_WIDTH: i32 = 3;
pub const MIN_LINE_WIDTH: i32 = 1;
pub const MAX_LINE_WIDTH: i32 = 10;

/// Node as exchanged with editors and viewers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MindMapNode {
    pub id: String,
    pub lesson_id: String,
    pub parent_id: Option<String>,
    pub level: i32,
    pub order: i32,
    pub title_ar: String,
    pub title_en: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub color: String,
    pub shape: NodeShape,
    pub is_published: bool,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub date_hijri: Option<String>,
    pub date_gregorian: Option<String>,
    pub location: Option<String>,
    pub participants: Option<Vec<String>>,
    pub decision: Option<String>,
    pub alternatives: Option<Vec<String>>,
    pub outcomes: Option<Vec<String>>,
    pub moral_lessons: Option<Vec<String>>,
    pub modern_apps: Option<Vec<String>>,
    pub security_impact: Option<String>,
    pub sources: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MindMapNode {
    /// Saved coordinate pair, only when both halves are present
    pub fn saved_position(&self) -> Option<(f64, f64)> {
        match (self.position_x, self.position_y) {
            (Some(x), Some(y)) => Some((x, y)),
            _ => None,
        }
    }
}

impl From<mind_map_nodes::Model> for MindMapNode {
    fn from(model: mind_map_nodes::Model) -> Self {
        let node_type = model.node_type.parse::<NodeType>().unwrap_or_else(|err| {
            warn!("Node {} has unreadable type: {}", model.id, err);
            NodeType::default_for(model.parent_id.is_some())
        });
        let shape = model
            .shape
            .parse::<NodeShape>()
            .unwrap_or_else(|_| node_type.default_shape());

        Self {
            node_type,
            shape,
            participants: decode_list(model.participants.as_deref()),
            alternatives: decode_list(model.alternatives.as_deref()),
            outcomes: decode_list(model.outcomes.as_deref()),
            moral_lessons: decode_list(model.moral_lessons.as_deref()),
            modern_apps: decode_list(model.modern_apps.as_deref()),
            sources: decode_list(model.sources.as_deref()),
            id: model.id,
            lesson_id: model.lesson_id,
            parent_id: model.parent_id,
            level: model.level,
            order: model.sort_order,
            title_ar: model.title_ar,
            title_en: model.title_en,
            description_ar: model.description_ar,
            description_en: model.description_en,
            color: model.color,
            is_published: model.is_published,
            position_x: model.position_x,
            position_y: model.position_y,
            date_hijri: model.date_hijri,
            date_gregorian: model.date_gregorian,
            location: model.location,
            decision: model.decision,
            security_impact: model.security_impact,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Styled semantic edge as exchanged with the graph editor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MindMapRelationship {
    pub id: String,
    pub lesson_id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    #[serde(rename = "type")]
    pub relationship_type: RelationshipType,
    pub color: String,
    pub line_width: i32,
    pub line_style: LineStyle,
    pub label_ar: Option<String>,
    pub label_en: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl MindMapRelationship {
    pub fn touches(&self, node_id: &str) -> bool {
        self.from_node_id == node_id || self.to_node_id == node_id
    }
}

impl From<mind_map_relationships::Model> for MindMapRelationship {
    fn from(model: mind_map_relationships::Model) -> Self {
        let relationship_type = model.relationship_type.parse().unwrap_or_else(|err| {
            warn!("Relationship {} has unreadable type: {}", model.id, err);
            RelationshipType::Related
        });

        Self {
            relationship_type,
            line_style: model.line_style.parse().unwrap_or_default(),
            id: model.id,
            lesson_id: model.lesson_id,
            from_node_id: model.from_node_id,
            to_node_id: model.to_node_id,
            color: model.color,
            line_width: model.line_width,
            label_ar: model.label_ar,
            label_en: model.label_en,
            source_handle: model.source_handle,
            target_handle: model.target_handle,
            created_at: model.created_at,
        }
    }
}

/// Flat `{nodes, relationships}` payload of one lesson
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
pub struct TreeSnapshot {
    pub nodes: Vec<MindMapNode>,
    pub relationships: Vec<MindMapRelationship>,
}

/// Display and metadata fields accepted when a node is created
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NodeFields {
    pub title_ar: String,
    pub title_en: String,
    pub description_ar: Option<String>,
    pub description_en: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
    pub color: Option<String>,
    pub shape: Option<NodeShape>,
    pub is_published: Option<bool>,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
    pub date_hijri: Option<String>,
    pub date_gregorian: Option<String>,
    pub location: Option<String>,
    pub participants: Option<Vec<String>>,
    pub decision: Option<String>,
    pub alternatives: Option<Vec<String>>,
    pub outcomes: Option<Vec<String>>,
    pub moral_lessons: Option<Vec<String>>,
    pub modern_apps: Option<Vec<String>>,
    pub security_impact: Option<String>,
    pub sources: Option<Vec<String>>,
}

impl NodeFields {
    pub fn titled(title_ar: impl Into<String>, title_en: impl Into<String>) -> Self {
        Self {
            title_ar: title_ar.into(),
            title_en: title_en.into(),
            ..Default::default()
        }
    }

    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.node_type = Some(node_type);
        self
    }

    pub fn published(mut self, is_published: bool) -> Self {
        self.is_published = Some(is_published);
        self
    }
}

/// Partial node update
///
/// A field left out keeps its value; `null` on a nullable field clears it.
/// `parentId` and `lessonId` are captured only so they can be refused.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    pub title_ar: Option<String>,
    pub title_en: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<String>))]
    pub description_ar: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<String>))]
    pub description_en: Option<Option<String>>,
    #[serde(rename = "type")]
    pub node_type: Option<NodeType>,
    pub color: Option<String>,
    pub shape: Option<NodeShape>,
    pub is_published: Option<bool>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<f64>))]
    pub position_x: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<f64>))]
    pub position_y: Option<Option<f64>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<String>))]
    pub date_hijri: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<String>))]
    pub date_gregorian: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<String>))]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<Vec<String>>))]
    pub participants: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<String>))]
    pub decision: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<Vec<String>>))]
    pub alternatives: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<Vec<String>>))]
    pub outcomes: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<Vec<String>>))]
    pub moral_lessons: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<Vec<String>>))]
    pub modern_apps: Option<Option<Vec<String>>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<String>))]
    pub security_impact: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    #[cfg_attr(feature = "server", schema(value_type = Option<Vec<String>>))]
    pub sources: Option<Option<Vec<String>>>,

    #[serde(default, deserialize_with = "deserialize_some", skip_serializing)]
    #[cfg_attr(feature = "server", schema(value_type = Option<Object>))]
    pub parent_id: Option<serde_json::Value>,
    #[serde(default, deserialize_with = "deserialize_some", skip_serializing)]
    #[cfg_attr(feature = "server", schema(value_type = Option<Object>))]
    pub lesson_id: Option<serde_json::Value>,
}

/// Styling and endpoints of a new relationship
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewRelationship {
    pub from_node_id: String,
    pub to_node_id: String,
    #[serde(rename = "type", default)]
    pub relationship_type: RelationshipType,
    pub color: Option<String>,
    pub line_width: Option<i32>,
    pub line_style: Option<LineStyle>,
    pub label_ar: Option<String>,
    pub label_en: Option<String>,
    pub source_handle: Option<String>,
    pub target_handle: Option<String>,
}

impl NewRelationship {
    pub fn between(from_node_id: impl Into<String>, to_node_id: impl Into<String>) -> Self {
        Self {
            from_node_id: from_node_id.into(),
            to_node_id: to_node_id.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PositionUpdate {
    pub id: String,
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PositionSaveResult {
    pub updated: usize,
    pub missing: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct DeletedNodes {
    pub deleted_node_ids: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RemovalPreview {
    pub node_ids: Vec<String>,
    pub relationship_ids: Vec<String>,
    pub node_count: usize,
    pub relationship_count: usize,
}

impl RemovalPreview {
    pub fn new(node_ids: Vec<String>, relationship_ids: Vec<String>) -> Self {
        Self {
            node_count: node_ids.len(),
            relationship_count: relationship_ids.len(),
            node_ids,
            relationship_ids,
        }
    }
}

/// Deserialize a present field as `Some`, so an explicit `null` becomes `Some(None)`
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Read a list column stored either as a JSON array or as one plain string
pub fn decode_list(raw: Option<&str>) -> Option<Vec<String>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(items) => Some(items),
        Err(_) => Some(vec![raw.to_string()]),
    }
}

pub fn encode_list(items: Option<&[String]>) -> Option<String> {
    items.map(|items| serde_json::Value::from(items.to_vec()).to_string())
}
