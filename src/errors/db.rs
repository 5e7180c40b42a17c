//! Database error categorisation
//!
//! SQLite reports constraint violations as generic execution errors, so
//! the driver's structured error is consulted first and the message text
//! second.

use sea_orm::{DbErr, SqlErr};

/// Categories of database errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Record not found (query returned no results)
    NotFound,
    /// Unique constraint violation
    UniqueViolation,
    /// Foreign key constraint violation
    ForeignKeyViolation,
    /// Database connection error
    ConnectionError,
    /// Query or lock timeout (`database is locked` included)
    Timeout,
    /// Unknown/other database error
    Unknown,
}

impl DbErrorKind {
    /// Categorize a sea_orm database error
    ///
    /// ```
    /// use ebad::errors::DbErrorKind;
    /// use sea_orm::DbErr;
    ///
    /// let err = DbErr::RecordNotFound("node".to_string());
    /// assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::NotFound);
    /// ```
    pub fn from_db_err(err: &DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => return Self::UniqueViolation,
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => return Self::ForeignKeyViolation,
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(_) => Self::NotFound,
            DbErr::Conn(_) => Self::ConnectionError,
            DbErr::Exec(_) | DbErr::Query(_) => {
                let msg = err.to_string().to_lowercase();
                if msg.contains("unique") || msg.contains("duplicate") {
                    Self::UniqueViolation
                } else if msg.contains("foreign key") {
                    Self::ForeignKeyViolation
                } else if msg.contains("timeout") || msg.contains("database is locked") {
                    Self::Timeout
                } else {
                    Self::Unknown
                }
            }
            _ => Self::Unknown,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError | Self::Timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn classifies_unique_message() {
        let err = DbErr::Query(RuntimeErr::Internal(
            "UNIQUE constraint failed: mind_map_relationships.from_node_id".to_string(),
        ));
        assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::UniqueViolation);
    }

    #[test]
    fn classifies_locked_database_as_retryable() {
        let err = DbErr::Exec(RuntimeErr::Internal("database is locked".to_string()));
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::Timeout);
        assert!(kind.is_retryable());
    }

    #[test]
    fn unknown_errors_are_not_retryable() {
        let err = DbErr::Custom("boom".to_string());
        assert!(!DbErrorKind::from_db_err(&err).is_retryable());
    }
}
