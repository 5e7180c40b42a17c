//! Database functionality tests
//!
//! Migrations, entity round trips and the constraints the services rely on.

use anyhow::Result;
use chrono::Utc;
use ebad::database::entities::{mind_map_nodes, mind_map_relationships};
use ebad::database::migrations::Migrator;
use ebad::database::{establish_connection, setup_database};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use sea_orm_migration::MigratorTrait;
use tempfile::NamedTempFile;

/// Create a test database connection with migrations
async fn setup_test_db() -> Result<(DatabaseConnection, NamedTempFile)> {
    let temp_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", temp_file.path().display());

    let db = establish_connection(&db_url).await?;
    setup_database(&db).await?;

    Ok((db, temp_file))
}

fn node(id: &str, parent_id: Option<&str>, level: i32) -> mind_map_nodes::ActiveModel {
    let now = Utc::now();
    mind_map_nodes::ActiveModel {
        id: Set(id.to_string()),
        lesson_id: Set("lesson-1".to_string()),
        parent_id: Set(parent_id.map(str::to_string)),
        level: Set(level),
        sort_order: Set(0),
        title_ar: Set(format!("{} ar", id)),
        title_en: Set(id.to_string()),
        description_ar: Set(None),
        description_en: Set(None),
        node_type: Set("TOPIC".to_string()),
        color: Set("#3b82f6".to_string()),
        shape: Set("rect".to_string()),
        is_published: Set(false),
        position_x: Set(None),
        position_y: Set(None),
        date_hijri: Set(None),
        date_gregorian: Set(None),
        location: Set(None),
        participants: Set(Some("[\"Abu Bakr\",\"Umar\"]".to_string())),
        decision: Set(None),
        alternatives: Set(None),
        outcomes: Set(None),
        moral_lessons: Set(None),
        modern_apps: Set(None),
        security_impact: Set(None),
        sources: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

fn relationship(id: &str, from: &str, to: &str) -> mind_map_relationships::ActiveModel {
    mind_map_relationships::ActiveModel {
        id: Set(id.to_string()),
        lesson_id: Set("lesson-1".to_string()),
        from_node_id: Set(from.to_string()),
        to_node_id: Set(to.to_string()),
        relationship_type: Set("RELATED".to_string()),
        color: Set("#94a3b8".to_string()),
        line_width: Set(3),
        line_style: Set("solid".to_string()),
        label_ar: Set(None),
        label_en: Set(None),
        source_handle: Set(Some("right".to_string())),
        target_handle: Set(None),
        created_at: Set(Utc::now()),
    }
}

#[tokio::test]
async fn test_database_migrations() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    let nodes = mind_map_nodes::Entity::find().all(&db).await?;
    assert!(nodes.is_empty());

    let relationships = mind_map_relationships::Entity::find().all(&db).await?;
    assert!(relationships.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_migrations_roll_back_and_reapply() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    node("a", None, 0).insert(&db).await?;

    Migrator::down(&db, None).await?;
    assert!(mind_map_nodes::Entity::find().all(&db).await.is_err());

    Migrator::up(&db, None).await?;
    assert!(mind_map_nodes::Entity::find().all(&db).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_node_round_trip() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;

    node("root", None, 0).insert(&db).await?;
    node("child", Some("root"), 1).insert(&db).await?;

    let children = mind_map_nodes::Entity::find()
        .filter(mind_map_nodes::Column::ParentId.eq("root"))
        .all(&db)
        .await?;
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].level, 1);
    assert!(!children[0].is_root());
    assert!(!children[0].has_saved_position());
    assert_eq!(
        children[0].participants.as_deref(),
        Some("[\"Abu Bakr\",\"Umar\"]")
    );

    Ok(())
}

#[tokio::test]
async fn test_relationship_pair_is_unique_per_direction() -> Result<()> {
    let (db, _temp_file) = setup_test_db().await?;
    node("a", None, 0).insert(&db).await?;
    node("b", None, 0).insert(&db).await?;

    relationship("r1", "a", "b").insert(&db).await?;
    assert!(relationship("r2", "a", "b").insert(&db).await.is_err());
    relationship("r3", "b", "a").insert(&db).await?;

    let stored = mind_map_relationships::Entity::find().all(&db).await?;
    assert_eq!(stored.len(), 2);
    assert!(stored.iter().all(|r| r.touches("a") && r.touches("b")));
    assert!(stored
        .iter()
        .all(|r| r.source_handle.as_deref() == Some("right")));

    Ok(())
}
