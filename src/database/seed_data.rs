use anyhow::Result;
use tracing::info;

use crate::app_context::AppContext;
use crate::mindmap::{NewRelationship, NodeFields, NodeType, TreeSnapshot};

pub const SAMPLE_LESSON_ID: &str = "sample-lesson";

/// Create a small published mind map for `lesson_id`
///
/// Does nothing when the lesson already has nodes. Returns the lesson snapshot
/// either way.
pub async fn seed_sample_lesson(ctx: &AppContext, lesson_id: &str) -> Result<TreeSnapshot> {
    let nodes = ctx.node_service();
    let existing = nodes.get_tree(lesson_id).await?;
    if !existing.nodes.is_empty() {
        info!("Lesson {} already has nodes, skipping seed data creation", lesson_id);
        return Ok(existing.as_ref().clone());
    }

    info!("Seeding sample mind map for lesson {}", lesson_id);

    let root = nodes
        .create_node(
            lesson_id,
            None,
            NodeFields::titled("العلوم الإسلامية", "Islamic Knowledge")
                .with_type(NodeType::Root)
                .published(true),
        )
        .await?;

    let hierarchy = ctx.hierarchy_service();
    let aqeedah = hierarchy
        .add_child(
            &root.id,
            NodeFields::titled("العقيدة", "Aqeedah")
                .with_type(NodeType::Category)
                .published(true),
        )
        .await?;
    let tawheed = hierarchy
        .add_child(
            &aqeedah.id,
            NodeFields::titled("التوحيد", "Tawheed")
                .with_type(NodeType::Topic)
                .published(true),
        )
        .await?;
    hierarchy
        .add_child(
            &root.id,
            NodeFields::titled("الفقه", "Fiqh")
                .with_type(NodeType::Category)
                .published(true),
        )
        .await?;

    ctx.relationship_service()
        .create_relationship(NewRelationship::between(&aqeedah.id, &tawheed.id))
        .await?;

    let snapshot = nodes.get_tree(lesson_id).await?;
    info!(
        "Seeded lesson {} with {} nodes and {} relationship(s)",
        lesson_id,
        snapshot.nodes.len(),
        snapshot.relationships.len()
    );
    Ok(snapshot.as_ref().clone())
}
