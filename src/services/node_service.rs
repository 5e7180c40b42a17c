use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use tracing::{debug, info};
use uuid::Uuid;

use super::lesson_locks::LessonLocks;
use super::store;
use super::tree_cache::TreeCache;
use super::validation::ValidationService;
use crate::database::entities::mind_map_nodes;
use crate::errors::{MindMapError, MindMapResult};
use crate::mindmap::{
    encode_list, DeletedNodes, MindMapNode, MindMapRelationship, NodeFields, NodePatch, NodeType,
    PositionSaveResult, PositionUpdate, TreeSnapshot,
};

/// Node store: creation, edits, position saves and cascading delete
#[derive(Clone)]
pub struct NodeService {
    db: DatabaseConnection,
    locks: Arc<LessonLocks>,
    cache: Arc<TreeCache>,
}

impl NodeService {
    pub fn new(db: DatabaseConnection, locks: Arc<LessonLocks>, cache: Arc<TreeCache>) -> Self {
        Self { db, locks, cache }
    }

    pub async fn create_node(
        &self,
        lesson_id: &str,
        parent_id: Option<&str>,
        fields: NodeFields,
    ) -> MindMapResult<MindMapNode> {
        let lesson_id = ValidationService::validate_lesson_id(lesson_id)?;
        ValidationService::validate_node_fields(&fields)?;

        let _guard = self.locks.lock(&lesson_id).await;
        let txn = self.db.begin().await?;

        let level = match parent_id {
            Some(parent_id) => {
                let parent = store::find_node(&txn, parent_id).await?;
                if parent.lesson_id != lesson_id {
                    // A parent from another lesson does not resolve here
                    return Err(MindMapError::node_not_found(parent_id));
                }
                ValidationService::validate_level(parent.level + 1)?
            }
            None => 0,
        };
        let sort_order = store::next_sibling_order(&txn, &lesson_id, parent_id).await?;

        let node_type = fields
            .node_type
            .unwrap_or_else(|| NodeType::default_for(parent_id.is_some()));
        let color = match &fields.color {
            Some(color) => ValidationService::validate_color(color)?,
            None => node_type.default_color().to_string(),
        };
        let shape = fields.shape.unwrap_or_else(|| node_type.default_shape());
        let now = Utc::now();

        let model = mind_map_nodes::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            lesson_id: Set(lesson_id.clone()),
            parent_id: Set(parent_id.map(str::to_string)),
            level: Set(level),
            sort_order: Set(sort_order),
            title_ar: Set(ValidationService::validate_title("titleAr", &fields.title_ar)?),
            title_en: Set(ValidationService::validate_title("titleEn", &fields.title_en)?),
            description_ar: Set(fields.description_ar),
            description_en: Set(fields.description_en),
            node_type: Set(node_type.as_str().to_string()),
            color: Set(color),
            shape: Set(shape.as_str().to_string()),
            is_published: Set(fields.is_published.unwrap_or(false)),
            position_x: Set(fields.position_x),
            position_y: Set(fields.position_y),
            date_hijri: Set(fields.date_hijri),
            date_gregorian: Set(fields.date_gregorian),
            location: Set(fields.location),
            participants: Set(encode_list(fields.participants.as_deref())),
            decision: Set(fields.decision),
            alternatives: Set(encode_list(fields.alternatives.as_deref())),
            outcomes: Set(encode_list(fields.outcomes.as_deref())),
            moral_lessons: Set(encode_list(fields.moral_lessons.as_deref())),
            modern_apps: Set(encode_list(fields.modern_apps.as_deref())),
            security_impact: Set(fields.security_impact),
            sources: Set(encode_list(fields.sources.as_deref())),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        self.cache.invalidate(&lesson_id);

        info!(
            "Created node {} in lesson {} at level {}",
            model.id, lesson_id, level
        );
        Ok(model.into())
    }

    pub async fn get_node(&self, id: &str) -> MindMapResult<MindMapNode> {
        Ok(store::find_node(&self.db, id).await?.into())
    }

    pub async fn update_node(&self, id: &str, patch: NodePatch) -> MindMapResult<MindMapNode> {
        ValidationService::validate_patch(&patch)?;

        let txn = self.db.begin().await?;
        let existing = store::find_node(&txn, id).await?;
        let lesson_id = existing.lesson_id.clone();

        let mut active: mind_map_nodes::ActiveModel = existing.into();
        if let Some(title) = patch.title_ar {
            active.title_ar = Set(title.trim().to_string());
        }
        if let Some(title) = patch.title_en {
            active.title_en = Set(title.trim().to_string());
        }
        if let Some(description) = patch.description_ar {
            active.description_ar = Set(description);
        }
        if let Some(description) = patch.description_en {
            active.description_en = Set(description);
        }
        if let Some(node_type) = patch.node_type {
            active.node_type = Set(node_type.as_str().to_string());
        }
        if let Some(color) = patch.color {
            active.color = Set(color.trim().to_string());
        }
        if let Some(shape) = patch.shape {
            active.shape = Set(shape.as_str().to_string());
        }
        if let Some(is_published) = patch.is_published {
            active.is_published = Set(is_published);
        }
        if let Some(x) = patch.position_x {
            active.position_x = Set(x);
        }
        if let Some(y) = patch.position_y {
            active.position_y = Set(y);
        }
        if let Some(value) = patch.date_hijri {
            active.date_hijri = Set(value);
        }
        if let Some(value) = patch.date_gregorian {
            active.date_gregorian = Set(value);
        }
        if let Some(value) = patch.location {
            active.location = Set(value);
        }
        if let Some(value) = patch.decision {
            active.decision = Set(value);
        }
        if let Some(value) = patch.security_impact {
            active.security_impact = Set(value);
        }
        if let Some(items) = patch.participants {
            active.participants = Set(encode_list(items.as_deref()));
        }
        if let Some(items) = patch.alternatives {
            active.alternatives = Set(encode_list(items.as_deref()));
        }
        if let Some(items) = patch.outcomes {
            active.outcomes = Set(encode_list(items.as_deref()));
        }
        if let Some(items) = patch.moral_lessons {
            active.moral_lessons = Set(encode_list(items.as_deref()));
        }
        if let Some(items) = patch.modern_apps {
            active.modern_apps = Set(encode_list(items.as_deref()));
        }
        if let Some(items) = patch.sources {
            active.sources = Set(encode_list(items.as_deref()));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await?;
        txn.commit().await?;
        self.cache.invalidate(&lesson_id);

        debug!("Updated node {}", id);
        Ok(updated.into())
    }

    /// Delete a node with its whole subtree and every incident relationship
    pub async fn delete_node(&self, id: &str) -> MindMapResult<DeletedNodes> {
        let lesson_id = store::find_node(&self.db, id).await?.lesson_id;
        let _guard = self.locks.lock(&lesson_id).await;

        let txn = self.db.begin().await?;
        // Re-read under the lock, the node may have gone meanwhile
        let root = store::find_node(&txn, id).await?;
        let plan = store::plan_removal(&txn, &root).await?;
        store::execute_removal(&txn, &root, &plan).await?;
        txn.commit().await?;

        self.cache.invalidate(&lesson_id);
        info!(
            "Deleted node {} with {} descendant(s) and {} relationship(s)",
            id,
            plan.node_count.saturating_sub(1),
            plan.relationship_count
        );

        Ok(DeletedNodes {
            deleted_node_ids: plan.node_ids,
        })
    }

    /// Flat snapshot of a lesson, served from the tree cache when fresh
    pub async fn get_tree(&self, lesson_id: &str) -> MindMapResult<Arc<TreeSnapshot>> {
        let lesson_id = ValidationService::validate_lesson_id(lesson_id)?;
        if let Some(snapshot) = self.cache.get(&lesson_id) {
            return Ok(snapshot);
        }

        let generation = self.cache.generation(&lesson_id);
        let txn = self.db.begin().await?;
        let nodes = store::lesson_nodes(&txn, &lesson_id).await?;
        let relationships = store::lesson_relationships(&txn, &lesson_id).await?;
        txn.commit().await?;

        let snapshot = Arc::new(TreeSnapshot {
            nodes: nodes.into_iter().map(MindMapNode::from).collect(),
            relationships: relationships
                .into_iter()
                .map(MindMapRelationship::from)
                .collect(),
        });

        self.cache.put(&lesson_id, generation, snapshot.clone());
        Ok(snapshot)
    }

    /// Store editor coordinates in one transaction
    ///
    /// Unknown ids are reported rather than failing the batch; a repeated id
    /// keeps its last entry.
    pub async fn save_positions(
        &self,
        updates: Vec<PositionUpdate>,
    ) -> MindMapResult<PositionSaveResult> {
        let mut latest: IndexMap<String, (Option<f64>, Option<f64>)> = IndexMap::new();
        for update in updates {
            ValidationService::validate_coordinate("positionX", update.position_x)?;
            ValidationService::validate_coordinate("positionY", update.position_y)?;
            latest.insert(update.id, (update.position_x, update.position_y));
        }
        if latest.is_empty() {
            return Ok(PositionSaveResult::default());
        }

        let ids: Vec<String> = latest.keys().cloned().collect();
        let txn = self.db.begin().await?;
        let existing: HashMap<String, mind_map_nodes::Model> = store::find_nodes(&txn, &ids)
            .await?
            .into_iter()
            .map(|n| (n.id.clone(), n))
            .collect();

        let now = Utc::now();
        let mut result = PositionSaveResult::default();
        let mut lessons = Vec::new();
        for (id, (x, y)) in latest {
            let Some(model) = existing.get(&id) else {
                result.missing.push(id);
                continue;
            };
            if !lessons.contains(&model.lesson_id) {
                lessons.push(model.lesson_id.clone());
            }
            let mut active: mind_map_nodes::ActiveModel = model.clone().into();
            active.position_x = Set(x);
            active.position_y = Set(y);
            active.updated_at = Set(now);
            active.update(&txn).await?;
            result.updated += 1;
        }

        txn.commit().await?;
        self.cache.invalidate_many(&lessons);

        debug!(
            "Saved {} position(s), {} unknown id(s)",
            result.updated,
            result.missing.len()
        );
        Ok(result)
    }
}
