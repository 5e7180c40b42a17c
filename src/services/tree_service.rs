use tracing::{debug, warn};

use super::node_service::NodeService;
use crate::errors::{MindMapError, MindMapResult};
use crate::export::{self, ExportFormat};
use crate::mindmap::{assemble, project_graph, Forest, GraphMode, GraphView, LayoutConfig};

/// Read-side views of a lesson: assembled forest, projected graph and exports
#[derive(Clone)]
pub struct TreeService {
    nodes: NodeService,
    layout: LayoutConfig,
}

impl TreeService {
    pub fn new(nodes: NodeService, layout: LayoutConfig) -> Self {
        Self { nodes, layout }
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    pub async fn assemble(&self, lesson_id: &str) -> MindMapResult<Forest> {
        let snapshot = self.nodes.get_tree(lesson_id).await?;
        let forest = assemble(snapshot.nodes.clone(), snapshot.relationships.clone());

        if !forest.orphans.is_empty() || !forest.cyclic.is_empty() {
            warn!(
                "Lesson {} has {} orphan(s) and {} cyclic node(s)",
                lesson_id,
                forest.orphans.len(),
                forest.cyclic.len()
            );
        }
        debug!("Assembled lesson {} with {} root(s)", lesson_id, forest.roots.len());
        Ok(forest)
    }

    pub async fn graph(&self, lesson_id: &str, mode: GraphMode) -> MindMapResult<GraphView> {
        let snapshot = self.nodes.get_tree(lesson_id).await?;
        Ok(project_graph(&snapshot, mode, &self.layout))
    }

    pub async fn export(
        &self,
        lesson_id: &str,
        format: ExportFormat,
        lang: &str,
    ) -> MindMapResult<String> {
        let snapshot = self.nodes.get_tree(lesson_id).await?;
        let forest = assemble(snapshot.nodes.clone(), snapshot.relationships.clone());
        export::render(format, lesson_id, &snapshot, &forest, lang)
            .map_err(|e| MindMapError::internal(format!("Failed to render {}: {}", format, e)))
    }
}
