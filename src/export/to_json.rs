use crate::mindmap::{Forest, TreeSnapshot};
use std::error::Error;

pub fn render(lesson_id: &str, snapshot: &TreeSnapshot, forest: &Forest) -> Result<String, Box<dyn Error>> {
    use serde_json::json;

    let res = json!({
        "lessonId": lesson_id,
        "nodes": snapshot.nodes,
        "relationships": snapshot.relationships,
        "nodeCount": snapshot.nodes.len(),
        "relationshipCount": snapshot.relationships.len(),
        "orphans": forest.orphans,
        "cyclic": forest.cyclic,
    });
    Ok(serde_json::to_string_pretty(&res)?)
}
