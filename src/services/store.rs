//! Query helpers shared by the services
//!
//! All helpers are generic over [`ConnectionTrait`] so they run equally on the
//! pooled connection and inside a transaction. Inside a transaction always pass
//! the transaction: an in-memory database has a single pooled connection.

use std::collections::HashMap;

use indexmap::IndexSet;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::database::entities::{mind_map_nodes, mind_map_relationships};
use crate::errors::{MindMapError, MindMapResult};
use crate::mindmap::{HierarchyIndex, RemovalPreview};

/// Keeps `IN (...)` lists below SQLite's bound-parameter limit
const ID_CHUNK: usize = 500;

pub(crate) async fn find_node<C: ConnectionTrait>(
    conn: &C,
    id: &str,
) -> MindMapResult<mind_map_nodes::Model> {
    mind_map_nodes::Entity::find_by_id(id.to_string())
        .one(conn)
        .await?
        .ok_or_else(|| MindMapError::node_not_found(id))
}

pub(crate) async fn find_nodes<C: ConnectionTrait>(
    conn: &C,
    ids: &[String],
) -> MindMapResult<Vec<mind_map_nodes::Model>> {
    let mut found = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(ID_CHUNK) {
        let mut rows = mind_map_nodes::Entity::find()
            .filter(mind_map_nodes::Column::Id.is_in(chunk.iter().cloned()))
            .all(conn)
            .await?;
        found.append(&mut rows);
    }
    Ok(found)
}

/// Nodes of a lesson, by level, sibling order, creation time and id
pub(crate) async fn lesson_nodes<C: ConnectionTrait>(
    conn: &C,
    lesson_id: &str,
) -> MindMapResult<Vec<mind_map_nodes::Model>> {
    Ok(mind_map_nodes::Entity::find()
        .filter(mind_map_nodes::Column::LessonId.eq(lesson_id))
        .order_by_asc(mind_map_nodes::Column::Level)
        .order_by_asc(mind_map_nodes::Column::SortOrder)
        .order_by_asc(mind_map_nodes::Column::CreatedAt)
        .order_by_asc(mind_map_nodes::Column::Id)
        .all(conn)
        .await?)
}

pub(crate) async fn lesson_relationships<C: ConnectionTrait>(
    conn: &C,
    lesson_id: &str,
) -> MindMapResult<Vec<mind_map_relationships::Model>> {
    Ok(mind_map_relationships::Entity::find()
        .filter(mind_map_relationships::Column::LessonId.eq(lesson_id))
        .order_by_asc(mind_map_relationships::Column::CreatedAt)
        .order_by_asc(mind_map_relationships::Column::Id)
        .all(conn)
        .await?)
}

pub(crate) fn hierarchy_of(nodes: &[mind_map_nodes::Model]) -> HierarchyIndex {
    HierarchyIndex::from_pairs(
        nodes
            .iter()
            .map(|n| (n.id.as_str(), n.parent_id.as_deref())),
    )
}

/// Children of `parent_id` (or the lesson's roots) in sibling order
pub(crate) fn sibling_ids(index: &HierarchyIndex, parent_id: Option<&str>) -> Vec<String> {
    match parent_id {
        Some(parent) => index.children_of(parent).to_vec(),
        None => index.roots().to_vec(),
    }
}

pub(crate) async fn next_sibling_order<C: ConnectionTrait>(
    conn: &C,
    lesson_id: &str,
    parent_id: Option<&str>,
) -> MindMapResult<i32> {
    let query = mind_map_nodes::Entity::find()
        .filter(mind_map_nodes::Column::LessonId.eq(lesson_id));
    let query = match parent_id {
        Some(parent) => query.filter(mind_map_nodes::Column::ParentId.eq(parent)),
        None => query.filter(mind_map_nodes::Column::ParentId.is_null()),
    };
    let last = query
        .order_by_desc(mind_map_nodes::Column::SortOrder)
        .one(conn)
        .await?;
    Ok(last.map(|n| n.sort_order + 1).unwrap_or(0))
}

/// Write `sort_order = position` for every id whose stored order differs
pub(crate) async fn renumber<C: ConnectionTrait>(
    conn: &C,
    ordered_ids: &[String],
    current: &HashMap<&str, i32>,
) -> MindMapResult<()> {
    for (position, id) in ordered_ids.iter().enumerate() {
        let position = position as i32;
        if current.get(id.as_str()) == Some(&position) {
            continue;
        }
        mind_map_nodes::Entity::update_many()
            .col_expr(mind_map_nodes::Column::SortOrder, Expr::value(position))
            .filter(mind_map_nodes::Column::Id.eq(id.as_str()))
            .exec(conn)
            .await?;
    }
    Ok(())
}

/// Nodes and relationships a subtree removal would delete
pub(crate) async fn plan_removal<C: ConnectionTrait>(
    conn: &C,
    root: &mind_map_nodes::Model,
) -> MindMapResult<RemovalPreview> {
    let nodes = lesson_nodes(conn, &root.lesson_id).await?;
    let node_ids = hierarchy_of(&nodes).subtree(&root.id);

    let mut relationship_ids: IndexSet<String> = IndexSet::new();
    for chunk in node_ids.chunks(ID_CHUNK) {
        let ids: Vec<String> = chunk.to_vec();
        let rows = mind_map_relationships::Entity::find()
            .filter(
                mind_map_relationships::Column::FromNodeId
                    .is_in(ids.clone())
                    .or(mind_map_relationships::Column::ToNodeId.is_in(ids)),
            )
            .order_by_asc(mind_map_relationships::Column::CreatedAt)
            .order_by_asc(mind_map_relationships::Column::Id)
            .all(conn)
            .await?;
        relationship_ids.extend(rows.into_iter().map(|row| row.id));
    }

    Ok(RemovalPreview::new(
        node_ids,
        relationship_ids.into_iter().collect(),
    ))
}

/// Delete a planned subtree and close the gap among the siblings it left
pub(crate) async fn execute_removal<C: ConnectionTrait>(
    conn: &C,
    root: &mind_map_nodes::Model,
    plan: &RemovalPreview,
) -> MindMapResult<()> {
    for chunk in plan.relationship_ids.chunks(ID_CHUNK) {
        mind_map_relationships::Entity::delete_many()
            .filter(mind_map_relationships::Column::Id.is_in(chunk.iter().cloned()))
            .exec(conn)
            .await?;
    }

    for chunk in plan.node_ids.chunks(ID_CHUNK) {
        mind_map_nodes::Entity::delete_many()
            .filter(mind_map_nodes::Column::Id.is_in(chunk.iter().cloned()))
            .exec(conn)
            .await?;
    }

    let remaining = lesson_nodes(conn, &root.lesson_id).await?;
    let current: HashMap<&str, i32> = remaining
        .iter()
        .map(|n| (n.id.as_str(), n.sort_order))
        .collect();
    let siblings = sibling_ids(&hierarchy_of(&remaining), root.parent_id.as_deref());
    renumber(conn, &siblings, &current).await?;

    Ok(())
}
