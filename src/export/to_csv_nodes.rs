use crate::mindmap::{MindMapNode, TreeSnapshot};
use csv::Writer;
use std::error::Error;

const LIST_SEPARATOR: &str = ";";

fn join(items: &Option<Vec<String>>) -> String {
    items
        .as_ref()
        .map(|items| items.join(LIST_SEPARATOR))
        .unwrap_or_default()
}

fn coordinate(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn record(node: &MindMapNode) -> Vec<String> {
    vec![
        node.id.clone(),
        node.lesson_id.clone(),
        node.parent_id.clone().unwrap_or_default(),
        node.level.to_string(),
        node.order.to_string(),
        node.node_type.to_string(),
        node.title_ar.clone(),
        node.title_en.clone(),
        node.is_published.to_string(),
        node.color.clone(),
        node.shape.to_string(),
        coordinate(node.position_x),
        coordinate(node.position_y),
        node.date_hijri.clone().unwrap_or_default(),
        node.date_gregorian.clone().unwrap_or_default(),
        node.location.clone().unwrap_or_default(),
        join(&node.participants),
        node.decision.clone().unwrap_or_default(),
        join(&node.alternatives),
        join(&node.outcomes),
        join(&node.moral_lessons),
        join(&node.modern_apps),
        node.security_impact.clone().unwrap_or_default(),
        join(&node.sources),
    ]
}

pub fn render(snapshot: &TreeSnapshot) -> Result<String, Box<dyn Error>> {
    let mut wtr = Writer::from_writer(vec![]);

    // Write the header
    wtr.write_record([
        "id",
        "lesson_id",
        "parent_id",
        "level",
        "order",
        "type",
        "title_ar",
        "title_en",
        "is_published",
        "color",
        "shape",
        "position_x",
        "position_y",
        "date_hijri",
        "date_gregorian",
        "location",
        "participants",
        "decision",
        "alternatives",
        "outcomes",
        "moral_lessons",
        "modern_apps",
        "security_impact",
        "sources",
    ])?;

    for node in &snapshot.nodes {
        wtr.write_record(record(node))?;
    }

    let data = wtr.into_inner()?;
    let csv_string = String::from_utf8(data)?;

    Ok(csv_string)
}
