use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use tracing::{info, warn};
use uuid::Uuid;

use super::store;
use super::tree_cache::TreeCache;
use super::validation::ValidationService;
use crate::database::entities::mind_map_relationships;
use crate::errors::{MindMapError, MindMapResult};
use crate::mindmap::graph::is_hierarchy_edge_id;
use crate::mindmap::types::DEFAULT_LINE_WIDTH;
use crate::mindmap::{MindMapRelationship, NewRelationship, DEFAULT_RELATIONSHIP_COLOR};

/// Relationship store: styled semantic edges between two nodes of a lesson
#[derive(Clone)]
pub struct RelationshipService {
    db: DatabaseConnection,
    cache: Arc<TreeCache>,
}

impl RelationshipService {
    pub fn new(db: DatabaseConnection, cache: Arc<TreeCache>) -> Self {
        Self { db, cache }
    }

    /// Insert a new edge
    ///
    /// Duplicates are caught by the unique index on
    /// `(lesson_id, from_node_id, to_node_id)`, not by a prior lookup.
    pub async fn create_relationship(
        &self,
        input: NewRelationship,
    ) -> MindMapResult<MindMapRelationship> {
        ValidationService::validate_relationship(&input)?;

        let txn = self.db.begin().await?;
        let from = store::find_node(&txn, &input.from_node_id).await?;
        let to = store::find_node(&txn, &input.to_node_id).await?;
        if from.lesson_id != to.lesson_id {
            return Err(MindMapError::validation(
                "A relationship must connect nodes of the same lesson",
            ));
        }

        let color = match &input.color {
            Some(color) => ValidationService::validate_color(color)?,
            None => DEFAULT_RELATIONSHIP_COLOR.to_string(),
        };

        let model = mind_map_relationships::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            lesson_id: Set(from.lesson_id.clone()),
            from_node_id: Set(from.id.clone()),
            to_node_id: Set(to.id.clone()),
            relationship_type: Set(input.relationship_type.as_str().to_string()),
            color: Set(color),
            line_width: Set(input.line_width.unwrap_or(DEFAULT_LINE_WIDTH)),
            line_style: Set(input.line_style.unwrap_or_default().as_str().to_string()),
            label_ar: Set(input.label_ar),
            label_en: Set(input.label_en),
            source_handle: Set(input.source_handle),
            target_handle: Set(input.target_handle),
            created_at: Set(Utc::now()),
        }
        .insert(&txn)
        .await
        .map_err(|e| MindMapError::from_write(e, &from.id, &to.id))?;

        txn.commit().await?;
        self.cache.invalidate(&model.lesson_id);

        info!(
            "Created {} relationship {} -> {}",
            model.relationship_type, model.from_node_id, model.to_node_id
        );
        Ok(model.into())
    }

    pub async fn delete_relationship(&self, id: &str) -> MindMapResult<()> {
        if is_hierarchy_edge_id(id) {
            warn!("Refused to delete hierarchical edge {}", id);
            return Err(MindMapError::HierarchicalEdge(id.to_string()));
        }

        let txn = self.db.begin().await?;
        let existing = mind_map_relationships::Entity::find_by_id(id.to_string())
            .one(&txn)
            .await?
            .ok_or_else(|| MindMapError::relationship_not_found(id))?;

        mind_map_relationships::Entity::delete_by_id(existing.id.clone())
            .exec(&txn)
            .await?;
        txn.commit().await?;

        self.cache.invalidate(&existing.lesson_id);
        info!("Deleted relationship {}", id);
        Ok(())
    }

    pub async fn list_relationships(&self, lesson_id: &str) -> MindMapResult<Vec<MindMapRelationship>> {
        let lesson_id = ValidationService::validate_lesson_id(lesson_id)?;
        Ok(store::lesson_relationships(&self.db, &lesson_id)
            .await?
            .into_iter()
            .map(MindMapRelationship::from)
            .collect())
    }
}
