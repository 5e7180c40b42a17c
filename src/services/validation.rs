use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::{MindMapError, MindMapResult};
use crate::mindmap::types::{NewRelationship, NodeFields, NodePatch, MAX_LINE_WIDTH, MIN_LINE_WIDTH};
use crate::mindmap::MAX_TREE_DEPTH;

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("Invalid regex pattern for hex colors")
});

/// Input checks shared by the node, relationship and bulk services
pub struct ValidationService;

impl ValidationService {
    /// Trimmed, non-empty title
    pub fn validate_title(field: &str, value: &str) -> MindMapResult<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(MindMapError::validation(format!("{} cannot be empty", field)));
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_lesson_id(lesson_id: &str) -> MindMapResult<String> {
        let trimmed = lesson_id.trim();
        if trimmed.is_empty() {
            return Err(MindMapError::validation("lessonId is required"));
        }
        Ok(trimmed.to_string())
    }

    /// `#rgb` or `#rrggbb`
    /// A node may sit at most `MAX_TREE_DEPTH - 1` levels below its root
    pub fn validate_level(level: i32) -> MindMapResult<i32> {
        if level < 0 || level as usize >= MAX_TREE_DEPTH {
            return Err(MindMapError::validation(format!(
                "Mind maps nest at most {} levels deep",
                MAX_TREE_DEPTH
            )));
        }
        Ok(level)
    }

    pub fn validate_color(color: &str) -> MindMapResult<String> {
        let trimmed = color.trim();
        if !HEX_COLOR.is_match(trimmed) {
            return Err(MindMapError::validation(format!(
                "Invalid color '{}': expected #rgb or #rrggbb",
                color
            )));
        }
        Ok(trimmed.to_string())
    }

    pub fn validate_line_width(width: i32) -> MindMapResult<i32> {
        if !(MIN_LINE_WIDTH..=MAX_LINE_WIDTH).contains(&width) {
            return Err(MindMapError::validation(format!(
                "lineWidth must be between {} and {}, got {}",
                MIN_LINE_WIDTH, MAX_LINE_WIDTH, width
            )));
        }
        Ok(width)
    }

    pub fn validate_coordinate(field: &str, value: Option<f64>) -> MindMapResult<Option<f64>> {
        match value {
            Some(v) if !v.is_finite() => Err(MindMapError::validation(format!(
                "{} must be a finite number",
                field
            ))),
            other => Ok(other),
        }
    }

    pub fn validate_node_fields(fields: &NodeFields) -> MindMapResult<()> {
        Self::validate_title("titleAr", &fields.title_ar)?;
        Self::validate_title("titleEn", &fields.title_en)?;
        if let Some(color) = &fields.color {
            Self::validate_color(color)?;
        }
        Self::validate_coordinate("positionX", fields.position_x)?;
        Self::validate_coordinate("positionY", fields.position_y)?;
        Ok(())
    }

    /// Structural fields are refused outright; only re-parenting moves a node
    pub fn validate_patch(patch: &NodePatch) -> MindMapResult<()> {
        if patch.parent_id.is_some() {
            return Err(MindMapError::validation(
                "parentId cannot be changed by an update, use reorder",
            ));
        }
        if patch.lesson_id.is_some() {
            return Err(MindMapError::validation("lessonId cannot be changed"));
        }
        if let Some(title) = &patch.title_ar {
            Self::validate_title("titleAr", title)?;
        }
        if let Some(title) = &patch.title_en {
            Self::validate_title("titleEn", title)?;
        }
        if let Some(color) = &patch.color {
            Self::validate_color(color)?;
        }
        Self::validate_coordinate("positionX", patch.position_x.flatten())?;
        Self::validate_coordinate("positionY", patch.position_y.flatten())?;
        Ok(())
    }

    pub fn validate_relationship(input: &NewRelationship) -> MindMapResult<()> {
        if input.from_node_id.trim().is_empty() || input.to_node_id.trim().is_empty() {
            return Err(MindMapError::validation(
                "fromNodeId and toNodeId are required",
            ));
        }
        if input.from_node_id == input.to_node_id {
            return Err(MindMapError::validation(
                "A relationship must connect two different nodes",
            ));
        }
        if let Some(color) = &input.color {
            Self::validate_color(color)?;
        }
        if let Some(width) = input.line_width {
            Self::validate_line_width(width)?;
        }
        Ok(())
    }
}
