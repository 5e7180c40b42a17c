use crate::mindmap::Forest;
use std::error::Error;

/// Mermaid `mindmap` text of an assembled lesson
///
/// A mindmap has exactly one root, so lessons with several roots (or none) are
/// hung under a synthetic node named after the lesson.
pub fn render(lesson_id: &str, forest: &Forest, lang: &str) -> Result<String, Box<dyn Error>> {
    use serde_json::json;

    let single_root = forest.roots.len() == 1;
    let handlebars = crate::common::get_handlebars();
    let res = handlebars.render_template(
        &get_template(),
        &json!({
            "lesson_label": crate::common::mermaid_label(lesson_id),
            "single_root": single_root,
            "depth": if single_root { 1 } else { 2 },
            "lang": lang,
            "roots": forest.roots,
        }),
    )?;
    Ok(res)
}

pub fn get_template() -> String {
    let template = r##"mindmap
{{#unless single_root}}
  lesson(({{{lesson_label}}}))
{{/unless}}
{{#each roots as |root|}}{{{mermaid_mindmap_tree root @root.depth @root.lang}}}{{/each}}"##;

    template.to_string()
}
