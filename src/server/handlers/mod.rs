pub mod bulk;
pub mod health;
pub mod hierarchy;
pub mod nodes;
pub mod relationships;
pub mod tree;

use serde::Deserialize;
use utoipa::IntoParams;

use super::error::{ApiError, ApiResult};
use crate::errors::MindMapError;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LessonQuery {
    /// Lesson whose mind map is requested
    pub lesson_id: Option<String>,
}

impl LessonQuery {
    pub fn lesson_id(&self) -> ApiResult<&str> {
        required(self.lesson_id.as_deref(), "lessonId")
    }
}

/// A query parameter that must be present and non-blank
pub(crate) fn required<'a>(value: Option<&'a str>, name: &str) -> ApiResult<&'a str> {
    match value.map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError(MindMapError::validation(format!(
            "{} is required",
            name
        )))),
    }
}
