//! Domain error types for the mind-map engine
//!
//! Every store and service operation returns a [`MindMapResult`], so adapters
//! (HTTP handlers, the CLI) can map failures to responses by looking at
//! [`MindMapError::kind`] alone.
//!
//! # Examples
//!
//! ```rust
//! use ebad::errors::{MindMapError, MindMapErrorKind};
//!
//! let err = MindMapError::node_not_found("node-1");
//! assert_eq!(err.kind(), MindMapErrorKind::NotFound);
//! assert_eq!(err.error_code(), "NOT_FOUND");
//!
//! let err = MindMapError::cycle_rejected("a", "c");
//! assert!(err.is_client_error());
//! ```

pub mod db;

pub use db::DbErrorKind;

use thiserror::Error;

/// Result type alias for mind-map operations
pub type MindMapResult<T> = Result<T, MindMapError>;

/// Coarse error categories used for status mapping and retry decisions
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MindMapErrorKind {
    Validation,
    NotFound,
    Conflict,
    CycleRejected,
    Forbidden,
    Internal,
}

/// Mind-map errors
#[derive(Error, Debug)]
pub enum MindMapError {
    /// Malformed input: empty title, bad enum value, out-of-range width, empty batch
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Referenced node, relationship or lesson does not exist
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Entity name ("Node", "Relationship", ...)
        entity: &'static str,
        /// Identifier that failed to resolve
        id: String,
    },

    /// Duplicate relationship between the same ordered pair of nodes
    #[error("Relationship {from} -> {to} already exists")]
    RelationshipExists {
        /// Source node identifier
        from: String,
        /// Target node identifier
        to: String,
    },

    /// Re-parenting would make a node its own ancestor
    #[error("Cannot move node '{node_id}' into its own descendant '{new_parent_id}'")]
    CycleRejected {
        /// Node being moved
        node_id: String,
        /// Requested new parent
        new_parent_id: String,
    },

    /// Attempt to delete a derived parent-child edge through the relationship path
    #[error("Cannot delete hierarchical relationship '{0}'")]
    HierarchicalEdge(String),

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Any other storage or serialisation failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MindMapError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::not_found("Node", id)
    }

    pub fn relationship_not_found(id: impl Into<String>) -> Self {
        Self::not_found("Relationship", id)
    }

    pub fn relationship_exists(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::RelationshipExists {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn cycle_rejected(node_id: impl Into<String>, new_parent_id: impl Into<String>) -> Self {
        Self::CycleRejected {
            node_id: node_id.into(),
            new_parent_id: new_parent_id.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn kind(&self) -> MindMapErrorKind {
        match self {
            Self::Validation(_) => MindMapErrorKind::Validation,
            Self::NotFound { .. } => MindMapErrorKind::NotFound,
            Self::RelationshipExists { .. } => MindMapErrorKind::Conflict,
            Self::CycleRejected { .. } => MindMapErrorKind::CycleRejected,
            Self::HierarchicalEdge(_) => MindMapErrorKind::Forbidden,
            Self::Database(_) | Self::Internal(_) => MindMapErrorKind::Internal,
        }
    }

    /// Check if this is a client error (400-series)
    pub fn is_client_error(&self) -> bool {
        !matches!(self.kind(), MindMapErrorKind::Internal)
    }

    /// Internal failures are transient from the caller's point of view
    pub fn is_retryable(&self) -> bool {
        matches!(self.kind(), MindMapErrorKind::Internal)
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self.kind() {
            MindMapErrorKind::Validation => "VALIDATION_FAILED",
            MindMapErrorKind::NotFound => "NOT_FOUND",
            MindMapErrorKind::Conflict => "CONFLICT",
            MindMapErrorKind::CycleRejected => "CYCLE_REJECTED",
            MindMapErrorKind::Forbidden => "FORBIDDEN",
            MindMapErrorKind::Internal => "INTERNAL_ERROR",
        }
    }

    /// Arabic rendering for the errors editors show verbatim to authors
    pub fn message_ar(&self) -> Option<&'static str> {
        match self {
            Self::RelationshipExists { .. } => Some("توجد علاقة بين هاتين العقدتين بالفعل"),
            Self::CycleRejected { .. } => Some("لا يمكن نقل عقدة إلى أحد فروعها"),
            Self::HierarchicalEdge(_) => Some("لا يمكن حذف علاقة هرمية"),
            _ => None,
        }
    }

    /// Message safe to hand to API callers; storage details stay in the logs
    pub fn public_message(&self) -> String {
        match self.kind() {
            MindMapErrorKind::Internal => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    /// Classify a database error raised by a write
    ///
    /// Unique index violations on the relationship pair become
    /// [`MindMapError::RelationshipExists`]; everything else stays a database error.
    pub fn from_write(err: sea_orm::DbErr, from: &str, to: &str) -> Self {
        match DbErrorKind::from_db_err(&err) {
            DbErrorKind::UniqueViolation => Self::relationship_exists(from, to),
            _ => Self::Database(err),
        }
    }
}

impl From<serde_json::Error> for MindMapError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("Serialization error: {}", err))
    }
}
