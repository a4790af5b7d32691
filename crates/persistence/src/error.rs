//! Mapping of sqlx errors onto the domain store error.

use domain::store::StoreError;

/// PostgreSQL unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

pub(crate) fn map_db_error(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::UniqueViolation(db.constraint().unwrap_or("unique").to_string())
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(err.to_string())
        }
        _ => StoreError::Database(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert!(matches!(
            map_db_error(sqlx::Error::PoolTimedOut),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_db_error(sqlx::Error::RowNotFound),
            StoreError::Database(_)
        ));
    }
}
