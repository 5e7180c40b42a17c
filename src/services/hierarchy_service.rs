use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use tracing::{debug, info};

use super::lesson_locks::LessonLocks;
use super::node_service::NodeService;
use super::store;
use super::tree_cache::TreeCache;
use super::validation::ValidationService;
use crate::database::entities::mind_map_nodes;
use crate::errors::{MindMapError, MindMapResult};
use crate::mindmap::{DeletedNodes, MindMapNode, NodeFields, RemovalPreview};

/// Structural mutations that keep the forest invariants
///
/// `reparent` is the only operation allowed to change a node's parent.
#[derive(Clone)]
pub struct HierarchyService {
    db: DatabaseConnection,
    locks: Arc<LessonLocks>,
    cache: Arc<TreeCache>,
    nodes: NodeService,
}

impl HierarchyService {
    pub fn new(
        db: DatabaseConnection,
        locks: Arc<LessonLocks>,
        cache: Arc<TreeCache>,
        nodes: NodeService,
    ) -> Self {
        Self {
            db,
            locks,
            cache,
            nodes,
        }
    }

    /// Move a node under `new_parent_id` (or to the roots) at `new_order`
    ///
    /// The ancestor walk runs on the state read under the lesson lock, before
    /// any write. Levels of the moved subtree are recomputed and both the old
    /// and new sibling lists are renumbered contiguously.
    pub async fn reparent(
        &self,
        node_id: &str,
        new_parent_id: Option<&str>,
        new_order: i32,
    ) -> MindMapResult<MindMapNode> {
        let lesson_id = store::find_node(&self.db, node_id).await?.lesson_id;
        let _guard = self.locks.lock(&lesson_id).await;

        let txn = self.db.begin().await?;
        let node = store::find_node(&txn, node_id).await?;

        let new_parent = match new_parent_id {
            Some(parent_id) => {
                let parent = store::find_node(&txn, parent_id).await?;
                if parent.lesson_id != node.lesson_id {
                    return Err(MindMapError::validation(format!(
                        "Node '{}' belongs to another lesson",
                        parent_id
                    )));
                }
                Some(parent)
            }
            None => None,
        };

        let lesson_nodes = store::lesson_nodes(&txn, &lesson_id).await?;
        let index = store::hierarchy_of(&lesson_nodes);
        if index.would_create_cycle(node_id, new_parent_id) {
            return Err(MindMapError::cycle_rejected(
                node_id,
                new_parent_id.unwrap_or_default(),
            ));
        }

        // Levels of the moved subtree, checked before anything is written
        let new_level = new_parent.as_ref().map(|p| p.level + 1).unwrap_or(0);
        let mut levels: HashMap<String, i32> = HashMap::new();
        levels.insert(node_id.to_string(), new_level);
        let mut descendant_levels: Vec<(String, i32)> = Vec::new();
        for descendant in index.subtree(node_id).into_iter().skip(1) {
            let parent_level = index
                .parent_of(&descendant)
                .and_then(|p| levels.get(p))
                .copied()
                .unwrap_or(new_level);
            let level = parent_level + 1;
            levels.insert(descendant.clone(), level);
            descendant_levels.push((descendant, level));
        }
        let deepest = descendant_levels
            .iter()
            .map(|(_, level)| *level)
            .max()
            .unwrap_or(new_level);
        ValidationService::validate_level(deepest)?;

        let current: HashMap<&str, i32> = lesson_nodes
            .iter()
            .map(|n| (n.id.as_str(), n.sort_order))
            .collect();
        let old_parent_id = node.parent_id.as_deref();

        let mut new_siblings: Vec<String> = store::sibling_ids(&index, new_parent_id)
            .into_iter()
            .filter(|id| id != node_id)
            .collect();
        let position = new_order.clamp(0, new_siblings.len() as i32) as usize;
        new_siblings.insert(position, node_id.to_string());

        if old_parent_id != new_parent_id {
            let old_siblings: Vec<String> = store::sibling_ids(&index, old_parent_id)
                .into_iter()
                .filter(|id| id != node_id)
                .collect();
            store::renumber(&txn, &old_siblings, &current).await?;
        }

        mind_map_nodes::Entity::update_many()
            .col_expr(
                mind_map_nodes::Column::ParentId,
                Expr::value(new_parent_id.map(str::to_string)),
            )
            .col_expr(mind_map_nodes::Column::Level, Expr::value(new_level))
            .col_expr(mind_map_nodes::Column::SortOrder, Expr::value(position as i32))
            .col_expr(mind_map_nodes::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(mind_map_nodes::Column::Id.eq(node_id))
            .exec(&txn)
            .await?;

        let mut renumbered = current.clone();
        renumbered.insert(node_id, position as i32);
        store::renumber(&txn, &new_siblings, &renumbered).await?;

        // Descendants keep their parents, only their depth shifts
        let stored_levels: HashMap<&str, i32> = lesson_nodes
            .iter()
            .map(|n| (n.id.as_str(), n.level))
            .collect();
        let mut shifted = 0usize;
        for (descendant, level) in descendant_levels {
            if stored_levels.get(descendant.as_str()) != Some(&level) {
                mind_map_nodes::Entity::update_many()
                    .col_expr(mind_map_nodes::Column::Level, Expr::value(level))
                    .filter(mind_map_nodes::Column::Id.eq(descendant.as_str()))
                    .exec(&txn)
                    .await?;
                shifted += 1;
            }
        }

        let moved = store::find_node(&txn, node_id).await?;
        txn.commit().await?;
        self.cache.invalidate(&lesson_id);

        info!(
            "Moved node {} under {} at position {} ({} descendant level(s) updated)",
            node_id,
            new_parent_id.unwrap_or("<root>"),
            position,
            shifted
        );
        Ok(moved.into())
    }

    /// Create a node under an existing parent, in the parent's lesson
    pub async fn add_child(&self, parent_id: &str, fields: NodeFields) -> MindMapResult<MindMapNode> {
        let parent = store::find_node(&self.db, parent_id).await?;
        self.nodes
            .create_node(&parent.lesson_id, Some(parent_id), fields)
            .await
    }

    /// Delete a node, its descendants and every incident relationship
    pub async fn remove_subtree(&self, node_id: &str) -> MindMapResult<DeletedNodes> {
        self.nodes.delete_node(node_id).await
    }

    /// What `remove_subtree` would delete, without deleting it
    pub async fn preview_removal(&self, node_id: &str) -> MindMapResult<RemovalPreview> {
        let root = store::find_node(&self.db, node_id).await?;
        let preview = store::plan_removal(&self.db, &root).await?;
        debug!(
            "Removal of {} would delete {} node(s) and {} relationship(s)",
            node_id, preview.node_count, preview.relationship_count
        );
        Ok(preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::setup_test_db;
    use crate::errors::MindMapErrorKind;
    use crate::mindmap::NewRelationship;
    use crate::services::RelationshipService;

    struct Fixture {
        nodes: NodeService,
        relationships: RelationshipService,
        hierarchy: HierarchyService,
    }

    async fn fixture() -> Fixture {
        let db = setup_test_db().await;
        let locks = Arc::new(LessonLocks::new());
        let cache = Arc::new(TreeCache::default());
        let nodes = NodeService::new(db.clone(), locks.clone(), cache.clone());
        Fixture {
            relationships: RelationshipService::new(db.clone(), cache.clone()),
            hierarchy: HierarchyService::new(db, locks, cache, nodes.clone()),
            nodes,
        }
    }

    async fn chain(f: &Fixture) -> (MindMapNode, MindMapNode, MindMapNode) {
        let a = f
            .nodes
            .create_node("lesson-1", None, NodeFields::titled("أ", "A"))
            .await
            .unwrap();
        let b = f.hierarchy.add_child(&a.id, NodeFields::titled("ب", "B")).await.unwrap();
        let c = f.hierarchy.add_child(&b.id, NodeFields::titled("ج", "C")).await.unwrap();
        (a, b, c)
    }

    #[tokio::test]
    async fn moving_into_a_descendant_is_rejected_without_changes() {
        let f = fixture().await;
        let (a, _b, c) = chain(&f).await;
        let before = f.nodes.get_tree("lesson-1").await.unwrap();

        let err = f.hierarchy.reparent(&a.id, Some(&c.id), 0).await.unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::CycleRejected);

        let err = f.hierarchy.reparent(&a.id, Some(&a.id), 0).await.unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::CycleRejected);

        let after = f.nodes.get_tree("lesson-1").await.unwrap();
        assert_eq!(before.nodes, after.nodes);
        let stored = f.nodes.get_node(&a.id).await.unwrap();
        assert_eq!(stored.parent_id, None);
        assert_eq!(stored.level, 0);
    }

    #[tokio::test]
    async fn reparent_recomputes_levels_of_the_subtree() {
        let f = fixture().await;
        let (a, b, c) = chain(&f).await;

        let moved = f.hierarchy.reparent(&b.id, None, 0).await.unwrap();
        assert_eq!(moved.parent_id, None);
        assert_eq!(moved.level, 0);
        assert_eq!(moved.order, 0);
        assert_eq!(f.nodes.get_node(&c.id).await.unwrap().level, 1);
        assert_eq!(f.nodes.get_node(&a.id).await.unwrap().order, 1);

        let moved = f.hierarchy.reparent(&b.id, Some(&a.id), 5).await.unwrap();
        assert_eq!(moved.level, 1);
        assert_eq!(moved.order, 0);
        assert_eq!(f.nodes.get_node(&c.id).await.unwrap().level, 2);
        assert_eq!(f.nodes.get_node(&a.id).await.unwrap().order, 0);
    }

    #[tokio::test]
    async fn reparent_inserts_at_requested_position() {
        let f = fixture().await;
        let root = f
            .nodes
            .create_node("lesson-1", None, NodeFields::titled("ج", "Root"))
            .await
            .unwrap();
        let x = f.hierarchy.add_child(&root.id, NodeFields::titled("س", "X")).await.unwrap();
        let y = f.hierarchy.add_child(&root.id, NodeFields::titled("ص", "Y")).await.unwrap();
        let z = f.hierarchy.add_child(&root.id, NodeFields::titled("ع", "Z")).await.unwrap();

        f.hierarchy.reparent(&z.id, Some(&root.id), 0).await.unwrap();

        let order = |id: &str| {
            let nodes = f.nodes.clone();
            let id = id.to_string();
            async move { nodes.get_node(&id).await.unwrap().order }
        };
        assert_eq!(order(&z.id).await, 0);
        assert_eq!(order(&x.id).await, 1);
        assert_eq!(order(&y.id).await, 2);
    }

    #[tokio::test]
    async fn reparent_rejects_foreign_and_missing_parents() {
        let f = fixture().await;
        let (a, _, _) = chain(&f).await;
        let other = f
            .nodes
            .create_node("lesson-2", None, NodeFields::titled("د", "D"))
            .await
            .unwrap();

        let err = f.hierarchy.reparent(&a.id, Some(&other.id), 0).await.unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::Validation);

        let err = f.hierarchy.reparent(&a.id, Some("ghost"), 0).await.unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::NotFound);

        let err = f.hierarchy.reparent("ghost", None, 0).await.unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::NotFound);
    }

    #[tokio::test]
    async fn remove_subtree_cascades_and_matches_preview() {
        let f = fixture().await;
        let (a, b, c) = chain(&f).await;
        let d = f.hierarchy.add_child(&a.id, NodeFields::titled("د", "D")).await.unwrap();
        let rel = f
            .relationships
            .create_relationship(NewRelationship::between(&c.id, &d.id))
            .await
            .unwrap();

        let preview = f.hierarchy.preview_removal(&b.id).await.unwrap();
        assert_eq!(preview.node_ids, vec![b.id.clone(), c.id.clone()]);
        assert_eq!(preview.relationship_ids, vec![rel.id.clone()]);

        let deleted = f.hierarchy.remove_subtree(&b.id).await.unwrap();
        assert_eq!(deleted.deleted_node_ids, preview.node_ids);

        let tree = f.nodes.get_tree("lesson-1").await.unwrap();
        let ids: Vec<&str> = tree.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec![a.id.as_str(), d.id.as_str()]);
        assert!(tree.relationships.is_empty());
        // d closed the gap left by b
        assert_eq!(f.nodes.get_node(&d.id).await.unwrap().order, 0);
    }

    #[tokio::test]
    async fn nesting_stops_at_the_depth_limit() {
        let f = fixture().await;
        let root = f
            .nodes
            .create_node("lesson-1", None, NodeFields::titled("جذر", "Root"))
            .await
            .unwrap();
        let mut deepest = root.clone();
        for i in 1..crate::mindmap::MAX_TREE_DEPTH {
            deepest = f
                .hierarchy
                .add_child(&deepest.id, NodeFields::titled("فرع", format!("Level {}", i)))
                .await
                .unwrap();
        }
        assert_eq!(deepest.level as usize, crate::mindmap::MAX_TREE_DEPTH - 1);

        let err = f
            .hierarchy
            .add_child(&deepest.id, NodeFields::titled("عميق", "Too deep"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::Validation);

        // a two-level subtree cannot hang below the second deepest node
        let pair = f
            .nodes
            .create_node("lesson-1", None, NodeFields::titled("أ", "Pair"))
            .await
            .unwrap();
        f.hierarchy.add_child(&pair.id, NodeFields::titled("ب", "Pair child")).await.unwrap();
        let before = f.nodes.get_tree("lesson-1").await.unwrap();
        let err = f
            .hierarchy
            .reparent(&pair.id, deepest.parent_id.as_deref(), 0)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), MindMapErrorKind::Validation);
        assert_eq!(*f.nodes.get_tree("lesson-1").await.unwrap(), *before);
    }
}
