use std::fmt;

/// Failures a [`crate::Store`] reports to its callers.
#[derive(Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write (duplicate quote/order number).
    Conflict { constraint: String },
    /// Anything else: connectivity, decoding, unexpected database errors.
    Backend(anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn conflict(constraint: impl Into<String>) -> Self {
        StoreError::Conflict {
            constraint: constraint.into(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Conflict { constraint } => {
                write!(f, "unique constraint violated: {constraint}")
            }
            StoreError::Backend(e) => write!(f, "storage error: {e:#}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<anyhow::Error> for StoreError {
    fn from(e: anyhow::Error) -> Self {
        StoreError::Backend(e)
    }
}

/// Postgres unique_violation is SQLSTATE 23505.
pub(crate) fn from_sqlx(err: sqlx::Error, context: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            return StoreError::Conflict { constraint };
        }
    }
    StoreError::Backend(anyhow::Error::new(err).context(context))
}
