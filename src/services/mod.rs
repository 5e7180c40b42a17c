pub mod bulk_service;
pub mod hierarchy_service;
pub mod lesson_locks;
pub mod node_service;
pub mod relationship_service;
pub(crate) mod store;
pub mod tree_cache;
pub mod tree_service;
pub mod validation;

pub use bulk_service::*;
pub use hierarchy_service::*;
pub use lesson_locks::*;
pub use node_service::*;
pub use relationship_service::*;
pub use tree_cache::*;
pub use tree_service::*;
pub use validation::*;
