pub mod to_csv_nodes;
pub mod to_json;
pub mod to_mermaid;

use std::error::Error;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::mindmap::{Forest, TreeSnapshot};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Mermaid,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Mermaid => "text/plain; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Mermaid => "mmd",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Mermaid => "mermaid",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            "mermaid" | "mmd" => Ok(ExportFormat::Mermaid),
            _ => Err(format!("Unknown export format: {}", s)),
        }
    }
}

/// Render one lesson in the requested format
pub fn render(
    format: ExportFormat,
    lesson_id: &str,
    snapshot: &TreeSnapshot,
    forest: &Forest,
    lang: &str,
) -> Result<String, Box<dyn Error>> {
    match format {
        ExportFormat::Json => to_json::render(lesson_id, snapshot, forest),
        ExportFormat::Csv => to_csv_nodes::render(snapshot),
        ExportFormat::Mermaid => to_mermaid::render(lesson_id, forest, lang),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mindmap::assemble;
    use crate::mindmap::forest::tests::node;

    fn snapshot() -> TreeSnapshot {
        let mut root = node("r", None, 0, 0);
        root.title_en = "Islamic Knowledge".to_string();
        root.shape = crate::mindmap::NodeShape::Circle;
        let mut child = node("c1", Some("r"), 1, 0);
        child.title_en = "Aqeedah".to_string();
        child.participants = Some(vec!["Abu Bakr".to_string(), "Umar".to_string()]);
        TreeSnapshot {
            nodes: vec![root, child],
            relationships: vec![],
        }
    }

    #[test]
    fn parses_format_names() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("mmd".parse::<ExportFormat>().unwrap(), ExportFormat::Mermaid);
        assert!("pdf".parse::<ExportFormat>().is_err());
    }

    #[test]
    fn csv_has_one_row_per_node_and_joined_lists() {
        let snapshot = snapshot();
        let forest = assemble(snapshot.nodes.clone(), vec![]);
        let out = render(ExportFormat::Csv, "lesson-1", &snapshot, &forest, "en").unwrap();

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,lesson_id,parent_id,level"));
        assert!(lines[2].contains("Abu Bakr;Umar"));
    }

    #[test]
    fn mermaid_renders_a_single_rooted_mindmap() {
        let snapshot = snapshot();
        let forest = assemble(snapshot.nodes.clone(), vec![]);
        let out = render(ExportFormat::Mermaid, "lesson-1", &snapshot, &forest, "en").unwrap();

        assert!(out.starts_with("mindmap\n"));
        assert!(out.contains("  nr((Islamic Knowledge))\n"));
        assert!(out.contains("    nc1[Aqeedah]\n"));
        assert!(!out.contains("lesson(("));
    }

    #[test]
    fn mermaid_wraps_several_roots() {
        let snapshot = TreeSnapshot {
            nodes: vec![node("a", None, 0, 0), node("b", None, 0, 1)],
            relationships: vec![],
        };
        let forest = assemble(snapshot.nodes.clone(), vec![]);
        let out = render(ExportFormat::Mermaid, "lesson-1", &snapshot, &forest, "en").unwrap();

        assert!(out.contains("  lesson((lesson-1))\n"));
        assert!(out.contains("    na[Node a]\n"));
        assert!(out.contains("    nb[Node b]\n"));
    }

    #[test]
    fn json_export_carries_counts() {
        let snapshot = snapshot();
        let forest = assemble(snapshot.nodes.clone(), vec![]);
        let out = render(ExportFormat::Json, "lesson-1", &snapshot, &forest, "en").unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["nodeCount"], 2);
        assert_eq!(value["nodes"][1]["participants"][1], "Umar");
    }
}
