/// Data-access error taxonomy
///
/// Every failure surfaced by the gateway falls into one of four classes,
/// classified in a single place so callers can map them to user-facing
/// responses without inspecting engine-specific error codes:
///
/// - [`DbError::Connectivity`]: the engine is unreachable. Never retried
///   here; the caller decides presentation.
/// - [`DbError::ConstraintViolation`]: unique/foreign-key/check violation
///   (e.g. duplicate email). Surfaced verbatim so the caller can produce a
///   meaningful message.
/// - [`DbError::InvalidOwner`]: an owner identifier that is not
///   integer-coercible. Always a caller defect, fatal for the request.
/// - [`DbError::Execution`]: malformed statement or schema mismatch. A
///   programming defect; full diagnostics go to operators via logs, a
///   generic message to end users.
///
/// The layer never retries and never attempts partial-write rollback.

use thiserror::Error;

/// Unified error type for the data-access layer
#[derive(Debug, Error)]
pub enum DbError {
    /// Engine unreachable (pool exhausted/closed, I/O, TLS)
    #[error("database unreachable: {0}")]
    Connectivity(String),

    /// Unique, foreign-key, or check constraint violated
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Owner identifier is not integer-coercible
    #[error("invalid owner identifier: {0:?}")]
    InvalidOwner(String),

    /// Malformed statement, schema mismatch, or unexpected row shape
    #[error("statement execution failed: {0}")]
    Execution(String),
}

impl DbError {
    /// True when the violation involves the users.email unique constraint
    pub fn is_duplicate_email(&self) -> bool {
        matches!(self, DbError::ConstraintViolation(msg) if msg.to_lowercase().contains("email"))
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed => DbError::Connectivity(err.to_string()),
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation()
                    || db_err.is_foreign_key_violation()
                    || db_err.is_check_violation() =>
            {
                DbError::ConstraintViolation(db_err.message().to_string())
            }
            _ => DbError::Execution(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DbError::InvalidOwner("abc".to_string());
        assert_eq!(err.to_string(), "invalid owner identifier: \"abc\"");

        let err = DbError::Connectivity("pool timed out".to_string());
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn test_duplicate_email_detection() {
        let err = DbError::ConstraintViolation("UNIQUE constraint failed: users.email".to_string());
        assert!(err.is_duplicate_email());

        let err = DbError::ConstraintViolation("CHECK constraint failed: status".to_string());
        assert!(!err.is_duplicate_email());
    }

    #[test]
    fn test_pool_errors_classify_as_connectivity() {
        let err: DbError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, DbError::Connectivity(_)));
    }

    #[test]
    fn test_row_not_found_classifies_as_execution() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Execution(_)));
    }
}
