//! Database-specific error types and conversions.

use things_core::error::ThingsError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Invalid stored value: {0}")]
    Decode(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate {entity}: {detail}")]
    Conflict { entity: String, detail: String },
}

impl DbError {
    /// Classify a failed write. Record-id collisions, unique index
    /// violations and concurrent commits on the same record become
    /// [`DbError::Conflict`].
    pub(crate) fn from_write(entity: &str, err: surrealdb::Error) -> Self {
        let detail = err.to_string();
        if is_uniqueness_violation(&detail) {
            DbError::Conflict {
                entity: entity.into(),
                detail,
            }
        } else {
            DbError::Query(detail)
        }
    }

    pub(crate) fn not_found(entity: &str, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }
}

fn is_uniqueness_violation(message: &str) -> bool {
    message.contains("already exists")
        || message.contains("already contains")
        || message.contains("read or write conflict")
}

impl From<DbError> for ThingsError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ThingsError::NotFound { entity, id },
            DbError::Conflict { entity, detail } => ThingsError::Conflict {
                entity,
                reason: detail,
            },
            other => ThingsError::Database(other.to_string()),
        }
    }
}
