use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::mindmap::LayoutConfig;
use crate::services::{
    BulkService, HierarchyService, LessonLocks, NodeService, RelationshipService, TreeCache,
    TreeService,
};

/// Shared application context exposing the mind-map services to the HTTP
/// adapter and the CLI
///
/// The lesson locks and the tree cache are created once here and handed to
/// every service, so all of them see the same invalidations.
#[derive(Clone)]
pub struct AppContext {
    db: DatabaseConnection,
    locks: Arc<LessonLocks>,
    cache: Arc<TreeCache>,
    node_service: Arc<NodeService>,
    relationship_service: Arc<RelationshipService>,
    hierarchy_service: Arc<HierarchyService>,
    bulk_service: Arc<BulkService>,
    tree_service: Arc<TreeService>,
}

impl AppContext {
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_settings(db, LayoutConfig::default(), crate::services::DEFAULT_TREE_CACHE_TTL)
    }

    pub fn with_settings(db: DatabaseConnection, layout: LayoutConfig, cache_ttl: Duration) -> Self {
        let locks = Arc::new(LessonLocks::new());
        let cache = Arc::new(TreeCache::new(cache_ttl));

        let node_service = NodeService::new(db.clone(), locks.clone(), cache.clone());
        let relationship_service = Arc::new(RelationshipService::new(db.clone(), cache.clone()));
        let hierarchy_service = Arc::new(HierarchyService::new(
            db.clone(),
            locks.clone(),
            cache.clone(),
            node_service.clone(),
        ));
        let bulk_service = Arc::new(BulkService::new(db.clone(), locks.clone(), cache.clone()));
        let tree_service = Arc::new(TreeService::new(node_service.clone(), layout));

        Self {
            db,
            locks,
            cache,
            node_service: Arc::new(node_service),
            relationship_service,
            hierarchy_service,
            bulk_service,
            tree_service,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn locks(&self) -> &Arc<LessonLocks> {
        &self.locks
    }

    pub fn cache(&self) -> &Arc<TreeCache> {
        &self.cache
    }

    pub fn node_service(&self) -> &Arc<NodeService> {
        &self.node_service
    }

    pub fn relationship_service(&self) -> &Arc<RelationshipService> {
        &self.relationship_service
    }

    pub fn hierarchy_service(&self) -> &Arc<HierarchyService> {
        &self.hierarchy_service
    }

    pub fn bulk_service(&self) -> &Arc<BulkService> {
        &self.bulk_service
    }

    pub fn tree_service(&self) -> &Arc<TreeService> {
        &self.tree_service
    }
}
