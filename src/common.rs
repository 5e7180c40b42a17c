use handlebars::{handlebars_helper, Handlebars};
use serde_json::Value;
use tracing::error;

use std::fs::File;
use std::io::Write;
use std::path::Path;

pub fn write_string_to_file(filename: &str, content: &str) -> std::io::Result<()> {
    let path = Path::new(filename);
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

/// Strip characters Mermaid reads as shape delimiters
pub fn mermaid_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '[' | ']' | '{' | '}' | '"'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Mermaid identifiers must be plain words
pub fn mermaid_id(id: &str) -> String {
    let cleaned: String = id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    format!("n{}", cleaned)
}

pub fn get_handlebars() -> Handlebars<'static> {
    let mut handlebars = Handlebars::new();

    handlebars_helper!(exists: |v: Value| !v.is_null());
    handlebars.register_helper("exists", Box::new(exists));

    handlebars_helper!(isnull: |v: Value| v.is_null());
    handlebars.register_helper("isnull", Box::new(isnull));

    handlebars_helper!(stringeq: |s1: String, s2: String| s1.eq(&s2));
    handlebars.register_helper("stringeq", Box::new(stringeq));

    handlebars_helper!(mermaid_mindmap_tree: |node: Value, depth: u64, lang: String| {
        fn render_tree(node: &Value, depth: usize, lang: &str) -> String {
            let Value::Object(map) = node else {
                error!("Expected object, got: {:?}", node);
                return String::new();
            };

            let id = map.get("id").and_then(|v| v.as_str()).unwrap_or("no-id");
            let title_key = if lang == "ar" { "titleAr" } else { "titleEn" };
            let label = map
                .get(title_key)
                .and_then(|v| v.as_str())
                .map(mermaid_label)
                .unwrap_or_else(|| "Unnamed".to_string());
            let shape = map.get("shape").and_then(|v| v.as_str()).unwrap_or("rect");

            let indent = "  ".repeat(depth);
            let node_id = mermaid_id(id);
            let mut result = match shape {
                "circle" => format!("{}{}(({}))\n", indent, node_id, label),
                "diamond" => format!("{}{}{{{{{}}}}}\n", indent, node_id, label),
                _ => format!("{}{}[{}]\n", indent, node_id, label),
            };

            if let Some(children) = map.get("children").and_then(|v| v.as_array()) {
                for child in children {
                    result += &render_tree(child, depth + 1, lang);
                }
            }
            result
        }

        render_tree(&node, depth as usize, &lang)
    });
    handlebars.register_helper("mermaid_mindmap_tree", Box::new(mermaid_mindmap_tree));

    handlebars
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn handlebars_can_render() {
        let handlebars = get_handlebars();
        let res = handlebars
            .render_template("Hello {{name}}", &json!({"name": "foo"}))
            .expect("This to render");
        assert_eq!(res, "Hello foo");
    }

    #[test]
    fn handlebars_helper_stringeq_can_render() {
        let handlebars = get_handlebars();
        let res = handlebars
            .render_template(
                r#"{{#if (stringeq "TOPIC" node.type) }}
  {{node.titleEn}};
{{/if}}"#,
                &json!({
                    "node": {
                        "type": "TOPIC",
                        "titleEn": "Tawheed",
                    }
                }),
            )
            .expect("This to render");
        assert_eq!(res, "  Tawheed;\n");
    }

    #[test]
    fn handlebars_helper_isnull_can_render() {
        let handlebars = get_handlebars();
        let res = handlebars
            .render_template(
                r#"{{#if (isnull node.parentId) }}
  {{node.titleEn}};
{{/if}}"#,
                &json!({
                    "node": {
                        "titleEn": "Root"
                    }
                }),
            )
            .expect("This to render");
        assert_eq!(res, "  Root;\n");
    }

    #[test]
    fn mindmap_helper_renders_nested_shapes() {
        let handlebars = get_handlebars();
        let res = handlebars
            .render_template(
                "{{{mermaid_mindmap_tree root 1 \"en\"}}}",
                &json!({
                    "root": {
                        "id": "r-1",
                        "titleEn": "Islamic Knowledge",
                        "shape": "circle",
                        "children": [
                            { "id": "c-1", "titleEn": "Aqeedah (creed)", "shape": "rect", "children": [] }
                        ]
                    }
                }),
            )
            .expect("This to render");
        assert_eq!(res, "  nr1((Islamic Knowledge))\n    nc1[Aqeedah creed]\n");
    }

    #[test]
    fn write_string_to_file_creates_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("out.txt");
        let path = path.to_str().expect("utf-8 path");
        write_string_to_file(path, "mindmap").expect("write");
        assert_eq!(std::fs::read_to_string(path).expect("read"), "mindmap");
    }
}
