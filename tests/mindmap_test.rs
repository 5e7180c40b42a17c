//! Tree invariants under sequences of structural edits

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use ebad::app_context::AppContext;
use ebad::database::{establish_connection, setup_database};
use ebad::errors::MindMapErrorKind;
use ebad::mindmap::{
    assemble, GraphMode, HierarchyIndex, NodeFields, TreeEditorState, TreeSnapshot,
};
use ebad::services::BulkOperation;
use tempfile::NamedTempFile;

const LESSON: &str = "lesson-seq";

async fn setup_context() -> Result<AppContext> {
    let db = establish_connection("sqlite::memory:").await?;
    setup_database(&db).await?;
    Ok(AppContext::new(db))
}

/// Deterministic pseudo-random picks, enough to shuffle the edit sequence
struct Lcg(u64);

impl Lcg {
    fn next(&mut self, bound: usize) -> usize {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.0 >> 33) as usize) % bound.max(1)
    }
}

fn assert_invariants(snapshot: &TreeSnapshot) {
    let index = HierarchyIndex::from_pairs(
        snapshot
            .nodes
            .iter()
            .map(|n| (n.id.clone(), n.parent_id.clone())),
    );

    let forest = assemble(snapshot.nodes.clone(), snapshot.relationships.clone());
    assert!(forest.cyclic.is_empty(), "cyclic nodes {:?}", forest.cyclic);
    assert!(forest.orphans.is_empty(), "orphans {:?}", forest.orphans);
    assert_eq!(forest.node_count(), snapshot.nodes.len());

    let mut siblings: HashMap<Option<String>, Vec<i32>> = HashMap::new();
    for node in &snapshot.nodes {
        assert_eq!(
            Some(node.level as usize),
            index.depth_of(&node.id),
            "level of {}",
            node.id
        );
        siblings
            .entry(node.parent_id.clone())
            .or_default()
            .push(node.order);
    }
    for (parent, mut orders) in siblings {
        orders.sort_unstable();
        let expected: Vec<i32> = (0..orders.len() as i32).collect();
        assert_eq!(orders, expected, "sibling order under {:?}", parent);
    }

    for relationship in &snapshot.relationships {
        assert!(index.contains(&relationship.from_node_id));
        assert!(index.contains(&relationship.to_node_id));
    }
}

#[tokio::test]
async fn random_edit_sequences_keep_the_forest_valid() -> Result<()> {
    let ctx = setup_context().await?;
    let nodes = ctx.node_service();
    let hierarchy = ctx.hierarchy_service();
    let mut rng = Lcg(42);

    for step in 0..120 {
        let snapshot = nodes.get_tree(LESSON).await?;
        let ids: Vec<String> = snapshot.nodes.iter().map(|n| n.id.clone()).collect();

        match rng.next(10) {
            0..=3 => {
                let parent = if ids.is_empty() || rng.next(4) == 0 {
                    None
                } else {
                    Some(ids[rng.next(ids.len())].clone())
                };
                let title = format!("Node {}", step);
                nodes
                    .create_node(LESSON, parent.as_deref(), NodeFields::titled("عقدة", title))
                    .await?;
            }
            4..=7 if ids.len() > 1 => {
                let node_id = &ids[rng.next(ids.len())];
                let new_parent = if rng.next(5) == 0 {
                    None
                } else {
                    Some(ids[rng.next(ids.len())].as_str())
                };
                let order = rng.next(ids.len() + 1) as i32;
                match hierarchy.reparent(node_id, new_parent, order).await {
                    Ok(moved) => assert_eq!(moved.parent_id.as_deref(), new_parent),
                    Err(err) => {
                        assert!(
                            matches!(
                                err.kind(),
                                MindMapErrorKind::CycleRejected | MindMapErrorKind::Validation
                            ),
                            "unexpected {:?}",
                            err
                        );
                        assert_eq!(nodes.get_tree(LESSON).await?, snapshot);
                    }
                }
            }
            8 if ids.len() > 2 => {
                let from = &ids[rng.next(ids.len())];
                let to = &ids[rng.next(ids.len())];
                if from != to {
                    let input = ebad::mindmap::NewRelationship::between(from, to);
                    match ctx.relationship_service().create_relationship(input).await {
                        Ok(_) => {}
                        Err(err) => assert_eq!(err.kind(), MindMapErrorKind::Conflict),
                    }
                }
            }
            9 if ids.len() > 6 => {
                let victim = &ids[rng.next(ids.len())];
                let preview = hierarchy.preview_removal(victim).await?;
                let deleted = nodes.delete_node(victim).await?;
                assert_eq!(deleted.deleted_node_ids.len(), preview.node_count);
            }
            _ => {}
        }

        assert_invariants(&*nodes.get_tree(LESSON).await?);
    }

    Ok(())
}

#[tokio::test]
async fn cascade_removes_descendants_and_their_relationships() -> Result<()> {
    let ctx = setup_context().await?;
    let nodes = ctx.node_service();

    let root = nodes
        .create_node(LESSON, None, NodeFields::titled("جذر", "Root"))
        .await?;
    let keep = nodes
        .create_node(LESSON, Some(&root.id), NodeFields::titled("باق", "Keep"))
        .await?;
    let doomed = nodes
        .create_node(LESSON, Some(&root.id), NodeFields::titled("محذوف", "Doomed"))
        .await?;
    let grandchild = nodes
        .create_node(LESSON, Some(&doomed.id), NodeFields::titled("حفيد", "Grandchild"))
        .await?;
    ctx.relationship_service()
        .create_relationship(ebad::mindmap::NewRelationship::between(&keep.id, &grandchild.id))
        .await?;

    let deleted = nodes.delete_node(&doomed.id).await?;
    assert_eq!(deleted.deleted_node_ids.len(), 2);

    let snapshot = nodes.get_tree(LESSON).await?;
    assert_eq!(snapshot.nodes.len(), 2);
    assert!(snapshot.relationships.is_empty());
    assert_invariants(&snapshot);

    Ok(())
}

#[tokio::test]
async fn bulk_publish_twice_matches_publish_once() -> Result<()> {
    let ctx = setup_context().await?;
    let nodes = ctx.node_service();
    let a = nodes
        .create_node(LESSON, None, NodeFields::titled("أ", "A"))
        .await?;
    let b = nodes
        .create_node(LESSON, Some(&a.id), NodeFields::titled("ب", "B"))
        .await?;
    let ids = vec![a.id.clone(), b.id.clone()];

    ctx.bulk_service()
        .execute(BulkOperation::Publish, ids.clone())
        .await?;
    let once: Vec<bool> = nodes
        .get_tree(LESSON)
        .await?
        .nodes
        .iter()
        .map(|n| n.is_published)
        .collect();

    ctx.bulk_service().execute(BulkOperation::Publish, ids).await?;
    let twice: Vec<bool> = nodes
        .get_tree(LESSON)
        .await?
        .nodes
        .iter()
        .map(|n| n.is_published)
        .collect();

    assert_eq!(once, vec![true, true]);
    assert_eq!(once, twice);

    Ok(())
}

#[test]
fn admin_and_student_views_agree_on_positions() {
    tokio_test::block_on(async {
        let ctx = setup_context().await.unwrap();
        let nodes = ctx.node_service();
        let root = nodes
            .create_node(LESSON, None, NodeFields::titled("جذر", "Root").published(true))
            .await
            .unwrap();
        for i in 0..4 {
            nodes
                .create_node(
                    LESSON,
                    Some(&root.id),
                    NodeFields::titled("فرع", format!("Branch {}", i)).published(i % 2 == 0),
                )
                .await
                .unwrap();
        }

        let trees = ctx.tree_service();
        let admin = trees.graph(LESSON, GraphMode::Admin).await.unwrap();
        let student = trees.graph(LESSON, GraphMode::Student).await.unwrap();
        assert_eq!(admin.nodes.len(), 5);
        assert_eq!(student.nodes.len(), 3);

        for seen in &student.nodes {
            let same = admin
                .nodes
                .iter()
                .find(|n| n.id == seen.id)
                .expect("student node missing from admin view");
            assert_eq!(same.position, seen.position);
        }
    });
}

#[tokio::test]
async fn tree_editor_follows_server_payloads() -> Result<()> {
    let ctx = setup_context().await?;
    let nodes = ctx.node_service();
    let root = nodes
        .create_node(LESSON, None, NodeFields::titled("جذر", "Root"))
        .await?;

    let mut editor = TreeEditorState::from_snapshot(&*nodes.get_tree(LESSON).await?);
    assert_eq!(editor.visible_rows().len(), 1);

    let child = ctx
        .hierarchy_service()
        .add_child(&root.id, NodeFields::titled("فرع", "Child"))
        .await?;
    editor.apply_created(child.clone());
    assert!(editor.is_expanded(&root.id));
    assert_eq!(editor.visible_rows().len(), 2);
    assert!(!editor.can_drop(&root.id, Some(&child.id)));
    assert!(editor.can_drop(&child.id, None));

    let second = ctx
        .hierarchy_service()
        .add_child(&root.id, NodeFields::titled("فرع ثان", "Second"))
        .await?;
    editor.apply_created(second.clone());
    let moved = ctx
        .hierarchy_service()
        .reparent(&second.id, Some(&root.id), 0)
        .await?;
    editor.apply_moved(moved);
    let server_view = TreeEditorState::from_snapshot(&*nodes.get_tree(LESSON).await?);
    for id in [&root.id, &child.id, &second.id] {
        assert_eq!(
            editor.get(id).map(|n| (n.level, n.order)),
            server_view.get(id).map(|n| (n.level, n.order)),
            "cached position of {}",
            id
        );
    }

    let deleted = nodes.delete_node(&root.id).await?;
    editor.apply_deleted(&deleted.deleted_node_ids);
    assert!(editor.is_empty());

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn cached_tree_never_lags_a_committed_write() -> Result<()> {
    // Pooled connections need a shared file, not an in-memory database
    let db_file = NamedTempFile::new()?;
    let db = establish_connection(&format!("sqlite://{}?mode=rwc", db_file.path().display())).await?;
    setup_database(&db).await?;
    let ctx = AppContext::new(db);

    let root = ctx
        .node_service()
        .create_node(LESSON, None, NodeFields::titled("جذر", "Root"))
        .await?;

    let stop = Arc::new(AtomicBool::new(false));
    let mut readers = Vec::new();
    for _ in 0..3 {
        let nodes = ctx.node_service().clone();
        let stop = stop.clone();
        readers.push(tokio::spawn(async move {
            while !stop.load(Ordering::Relaxed) {
                nodes.get_tree(LESSON).await?;
                tokio::task::yield_now().await;
            }
            Ok::<_, ebad::errors::MindMapError>(())
        }));
    }

    let nodes = ctx.node_service();
    let mut lagging = Vec::new();
    for i in 1..=150 {
        nodes
            .create_node(LESSON, Some(&root.id), NodeFields::titled("فرع", format!("Branch {}", i)))
            .await?;
        let seen = nodes.get_tree(LESSON).await?.nodes.len();
        if seen != i + 1 {
            lagging.push((i + 1, seen));
        }
    }

    stop.store(true, Ordering::Relaxed);
    for reader in readers {
        reader.await??;
    }

    assert!(lagging.is_empty(), "(expected, seen) after commit: {:?}", lagging);
    Ok(())
}
