use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexSet;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;

#[cfg(feature = "server")]
use utoipa::ToSchema;

use super::lesson_locks::LessonLocks;
use super::store;
use super::tree_cache::TreeCache;
use crate::database::entities::mind_map_nodes;
use crate::errors::{MindMapError, MindMapResult};
use crate::mindmap::MindMapNode;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BulkOperation {
    Publish,
    Unpublish,
    Delete,
    Export,
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BulkOperation::Publish => "publish",
            BulkOperation::Unpublish => "unpublish",
            BulkOperation::Delete => "delete",
            BulkOperation::Export => "export",
        })
    }
}

impl FromStr for BulkOperation {
    type Err = MindMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "publish" => Ok(BulkOperation::Publish),
            "unpublish" => Ok(BulkOperation::Unpublish),
            "delete" => Ok(BulkOperation::Delete),
            "export" => Ok(BulkOperation::Export),
            _ => Err(MindMapError::validation(format!(
                "Unknown bulk operation: {}",
                s
            ))),
        }
    }
}

/// Body of a bulk request; the operation stays a string so an unknown name is
/// reported as a validation error rather than a parse failure
///
/// `dryRun` is only accepted with `delete` and reports what would be removed.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub operation: String,
    #[serde(default)]
    pub node_ids: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BulkOutcome {
    #[serde(rename_all = "camelCase")]
    Exported {
        data: Vec<MindMapNode>,
        count: usize,
        not_found: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    DeletePreview {
        node_ids: Vec<String>,
        relationship_ids: Vec<String>,
        node_count: usize,
        relationship_count: usize,
        not_found: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    Affected {
        affected: usize,
        not_found: Vec<String>,
    },
}

impl BulkOutcome {
    pub fn not_found(&self) -> &[String] {
        match self {
            BulkOutcome::Exported { not_found, .. }
            | BulkOutcome::DeletePreview { not_found, .. }
            | BulkOutcome::Affected { not_found, .. } => not_found,
        }
    }

    pub fn affected(&self) -> usize {
        match self {
            BulkOutcome::Exported { count, .. } => *count,
            BulkOutcome::DeletePreview { node_count, .. } => *node_count,
            BulkOutcome::Affected { affected, .. } => *affected,
        }
    }
}

/// Publish, unpublish, delete or export an arbitrary set of nodes in one
/// transaction
#[derive(Clone)]
pub struct BulkService {
    db: DatabaseConnection,
    locks: Arc<LessonLocks>,
    cache: Arc<TreeCache>,
}

impl BulkService {
    pub fn new(db: DatabaseConnection, locks: Arc<LessonLocks>, cache: Arc<TreeCache>) -> Self {
        Self { db, locks, cache }
    }

    pub async fn execute_request(&self, request: BulkRequest) -> MindMapResult<BulkOutcome> {
        let operation = request.operation.parse::<BulkOperation>()?;
        if !request.dry_run {
            return self.execute(operation, request.node_ids).await;
        }
        match operation {
            BulkOperation::Delete => self.preview_delete(request.node_ids).await,
            other => Err(MindMapError::validation(format!(
                "dryRun is not supported for bulk {}",
                other
            ))),
        }
    }

    pub async fn execute(
        &self,
        operation: BulkOperation,
        node_ids: Vec<String>,
    ) -> MindMapResult<BulkOutcome> {
        let ids = normalize_ids(node_ids)?;
        let outcome = match operation {
            BulkOperation::Publish => self.set_published(&ids, true).await?,
            BulkOperation::Unpublish => self.set_published(&ids, false).await?,
            BulkOperation::Delete => self.delete(&ids).await?,
            BulkOperation::Export => self.export(&ids).await?,
        };

        info!(
            "Bulk {} over {} id(s): {} affected, {} not found",
            operation,
            ids.len(),
            outcome.affected(),
            outcome.not_found().len()
        );
        Ok(outcome)
    }

    /// Distinct nodes and relationships a bulk delete would remove, without
    /// removing anything
    ///
    /// Overlapping subtrees count once, matching the `affected` figure of the
    /// real delete.
    pub async fn preview_delete(&self, node_ids: Vec<String>) -> MindMapResult<BulkOutcome> {
        let ids = normalize_ids(node_ids)?;

        let txn = self.db.begin().await?;
        let existing = store::find_nodes(&txn, &ids).await?;
        let by_id: HashMap<&str, &mind_map_nodes::Model> =
            existing.iter().map(|n| (n.id.as_str(), n)).collect();
        let found: HashSet<&str> = by_id.keys().copied().collect();
        let not_found = missing(&ids, &found);

        let mut node_ids: IndexSet<String> = IndexSet::new();
        let mut relationship_ids: IndexSet<String> = IndexSet::new();
        for id in &ids {
            let Some(root) = by_id.get(id.as_str()) else {
                continue;
            };
            if node_ids.contains(id) {
                continue;
            }
            let plan = store::plan_removal(&txn, root).await?;
            node_ids.extend(plan.node_ids);
            relationship_ids.extend(plan.relationship_ids);
        }
        txn.commit().await?;

        info!(
            "Bulk delete preview over {} id(s): {} node(s), {} relationship(s), {} not found",
            ids.len(),
            node_ids.len(),
            relationship_ids.len(),
            not_found.len()
        );
        Ok(BulkOutcome::DeletePreview {
            node_count: node_ids.len(),
            relationship_count: relationship_ids.len(),
            node_ids: node_ids.into_iter().collect(),
            relationship_ids: relationship_ids.into_iter().collect(),
            not_found,
        })
    }

    async fn set_published(&self, ids: &[String], published: bool) -> MindMapResult<BulkOutcome> {
        let txn = self.db.begin().await?;
        let existing = store::find_nodes(&txn, ids).await?;
        let found: HashSet<&str> = existing.iter().map(|n| n.id.as_str()).collect();
        let not_found = missing(ids, &found);

        let targets: Vec<String> = existing.iter().map(|n| n.id.clone()).collect();
        for chunk in targets.chunks(500) {
            mind_map_nodes::Entity::update_many()
                .col_expr(mind_map_nodes::Column::IsPublished, Expr::value(published))
                .col_expr(mind_map_nodes::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(mind_map_nodes::Column::Id.is_in(chunk.iter().cloned()))
                .exec(&txn)
                .await?;
        }
        txn.commit().await?;

        self.cache
            .invalidate_many(existing.iter().map(|n| n.lesson_id.as_str()));
        Ok(BulkOutcome::Affected {
            affected: existing.len(),
            not_found,
        })
    }

    async fn delete(&self, ids: &[String]) -> MindMapResult<BulkOutcome> {
        let lessons: Vec<String> = store::find_nodes(&self.db, ids)
            .await?
            .into_iter()
            .map(|n| n.lesson_id)
            .collect();
        let _guards = self.locks.lock_many(&lessons).await;

        let txn = self.db.begin().await?;
        let existing = store::find_nodes(&txn, ids).await?;
        let found: HashSet<&str> = existing.iter().map(|n| n.id.as_str()).collect();
        let not_found = missing(ids, &found);

        let mut removed: HashSet<String> = HashSet::new();
        for id in ids {
            if removed.contains(id) || !found.contains(id.as_str()) {
                continue;
            }
            // Earlier subtrees may have reshuffled siblings, read the row again
            let root = store::find_node(&txn, id).await?;
            let plan = store::plan_removal(&txn, &root).await?;
            store::execute_removal(&txn, &root, &plan).await?;
            removed.extend(plan.node_ids);
        }
        txn.commit().await?;

        self.cache
            .invalidate_many(existing.iter().map(|n| n.lesson_id.as_str()));
        Ok(BulkOutcome::Affected {
            affected: removed.len(),
            not_found,
        })
    }

    async fn export(&self, ids: &[String]) -> MindMapResult<BulkOutcome> {
        let txn = self.db.begin().await?;
        let mut existing = store::find_nodes(&txn, ids).await?;
        txn.commit().await?;

        let found: HashSet<&str> = existing.iter().map(|n| n.id.as_str()).collect();
        let not_found = missing(ids, &found);

        let position: HashMap<&str, usize> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        existing.sort_by_key(|n| position.get(n.id.as_str()).copied());
        let data: Vec<MindMapNode> = existing.into_iter().map(MindMapNode::from).collect();
        Ok(BulkOutcome::Exported {
            count: data.len(),
            data,
            not_found,
        })
    }
}

fn normalize_ids(node_ids: Vec<String>) -> MindMapResult<Vec<String>> {
    let ids: IndexSet<String> = node_ids
        .into_iter()
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .collect();
    if ids.is_empty() {
        return Err(MindMapError::validation("nodeIds cannot be empty"));
    }
    Ok(ids.into_iter().collect())
}

fn missing(ids: &[String], found: &HashSet<&str>) -> Vec<String> {
    ids.iter()
        .filter(|id| !found.contains(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::MindMapErrorKind;
    use crate::mindmap::NodeFields;
    use crate::services::NodeService;

    async fn services() -> (NodeService, BulkService) {
        let db = setup_test_db().await;
        let locks = Arc::new(LessonLocks::new());
        let cache = Arc::new(TreeCache::default());
        (
            NodeService::new(db.clone(), locks.clone(), cache.clone()),
            BulkService::new(db, locks, cache),
        )
    }

    #[tokio::test]
    async fn publish_is_idempotent_and_reports_unknown_ids() {
        let (nodes, bulk) = services().await;
        let a = nodes
            .create_node("lesson-1", None, NodeFields::titled("أ", "A"))
            .await
            .unwrap();
        let b = nodes
            .create_node("lesson-1", Some(&a.id), NodeFields::titled("ب", "B"))
            .await
            .unwrap();
        let ids = vec![a.id.clone(), b.id.clone(), "ghost".to_string()];

        for _ in 0..2 {
            let outcome = bulk.execute(BulkOperation::Publish, ids.clone()).await.unwrap();
            assert_eq!(outcome.affected(), 2);
            assert_eq!(outcome.not_found(), &["ghost".to_string()]);
        }
        assert!(nodes.get_node(&b.id).await.unwrap().is_published);

        bulk.execute(BulkOperation::Unpublish, vec![a.id.clone()])
            .await
            .unwrap();
        assert!(!nodes.get_node(&a.id).await.unwrap().is_published);
        // no cascade to children
        assert!(nodes.get_node(&b.id).await.unwrap().is_published);
    }

    #[tokio::test]
    async fn delete_counts_overlapping_subtrees_once() {
        let (nodes, bulk) = services().await;
        let a = nodes
            .create_node("lesson-1", None, NodeFields::titled("أ", "A"))
            .await
            .unwrap();
        let b = nodes
            .create_node("lesson-1", Some(&a.id), NodeFields::titled("ب", "B"))
            .await
            .unwrap();
        let c = nodes
            .create_node("lesson-1", Some(&b.id), NodeFields::titled("ج", "C"))
            .await
            .unwrap();
        let other = nodes
            .create_node("lesson-1", None, NodeFields::titled("د", "D"))
            .await
            .unwrap();

        let outcome = bulk
            .execute(BulkOperation::Delete, vec![c.id.clone(), a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        assert_eq!(outcome.affected(), 3);
        assert!(outcome.not_found().is_empty());

        let tree = nodes.get_tree("lesson-1").await.unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert_eq!(tree.nodes[0].id, other.id);
    }

    #[tokio::test]
    async fn export_returns_requested_nodes_in_order() {
        let (nodes, bulk) = services().await;
        let a = nodes
            .create_node("lesson-1", None, NodeFields::titled("أ", "A"))
            .await
            .unwrap();
        let b = nodes
            .create_node("lesson-1", None, NodeFields::titled("ب", "B"))
            .await
            .unwrap();

        let outcome = bulk
            .execute(BulkOperation::Export, vec![b.id.clone(), a.id.clone(), b.id.clone()])
            .await
            .unwrap();
        match outcome {
            BulkOutcome::Exported { data, count, not_found } => {
                assert_eq!(count, 2);
                assert_eq!(data[0].id, b.id);
                assert_eq!(data[1].id, a.id);
                assert!(not_found.is_empty());
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejects_empty_sets_and_unknown_operations() {
        let (_, bulk) = services().await;

        let err = bulk.execute(BulkOperation::Publish, vec![]).await.unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::Validation);

        let err = bulk
            .execute_request(BulkRequest {
                operation: "archive".to_string(),
                node_ids: vec!["a".to_string()],
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::Validation);
    }

    #[tokio::test]
    async fn delete_preview_counts_parent_and_child_once() {
        let db = setup_test_db().await;
        let locks = Arc::new(LessonLocks::new());
        let cache = Arc::new(TreeCache::default());
        let nodes = NodeService::new(db.clone(), locks.clone(), cache.clone());
        let relationships = crate::services::RelationshipService::new(db.clone(), cache.clone());
        let bulk = BulkService::new(db, locks, cache);

        let parent = nodes
            .create_node("lesson-1", None, NodeFields::titled("أ", "Parent"))
            .await
            .unwrap();
        let child = nodes
            .create_node("lesson-1", Some(&parent.id), NodeFields::titled("ب", "Child"))
            .await
            .unwrap();
        let grandchild = nodes
            .create_node("lesson-1", Some(&child.id), NodeFields::titled("ج", "Grandchild"))
            .await
            .unwrap();
        let outside = nodes
            .create_node("lesson-1", None, NodeFields::titled("د", "Outside"))
            .await
            .unwrap();
        relationships
            .create_relationship(crate::mindmap::NewRelationship::between(&parent.id, &grandchild.id))
            .await
            .unwrap();
        relationships
            .create_relationship(crate::mindmap::NewRelationship::between(&outside.id, &child.id))
            .await
            .unwrap();

        // child listed first, its subtree is folded into the parent's
        let selection = vec![child.id.clone(), parent.id.clone(), "ghost".to_string()];
        let preview = bulk
            .execute_request(BulkRequest {
                operation: "delete".to_string(),
                node_ids: selection.clone(),
                dry_run: true,
            })
            .await
            .unwrap();
        match &preview {
            BulkOutcome::DeletePreview {
                node_ids,
                relationship_count,
                node_count,
                not_found,
                ..
            } => {
                assert_eq!(*node_count, 3);
                assert_eq!(node_ids.len(), 3);
                assert_eq!(*relationship_count, 2);
                assert_eq!(not_found, &["ghost".to_string()]);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(nodes.get_tree("lesson-1").await.unwrap().nodes.len(), 4);

        let outcome = bulk.execute(BulkOperation::Delete, selection).await.unwrap();
        assert_eq!(outcome.affected(), preview.affected());
        let tree = nodes.get_tree("lesson-1").await.unwrap();
        assert_eq!(tree.nodes.len(), 1);
        assert!(tree.relationships.is_empty());
    }

    #[tokio::test]
    async fn dry_run_is_only_for_delete() {
        let (_, bulk) = services().await;
        let err = bulk
            .execute_request(BulkRequest {
                operation: "publish".to_string(),
                node_ids: vec!["a".to_string()],
                dry_run: true,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::Validation);
    }
}
