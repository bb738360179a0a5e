use thiserror::Error;

/// Errors produced by the store layer.
///
/// A lookup that finds nothing is not an error; those operations return
/// `Ok(None)` or an empty collection instead.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A caller-supplied value violates a constraint. Not retryable; the
    /// caller must correct the input.
    #[error("invalid {field}: {reason}")]
    InvalidAttribute { field: &'static str, reason: String },

    /// The backend could not be reached or a statement failed. The store
    /// never retries internally; retry policy belongs to the caller.
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// Schema creation failed at startup. Fatal; the process must not serve
    /// store operations.
    #[error("schema init failed: {0}")]
    SchemaInit(String),
}

impl StoreError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            field,
            reason: reason.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
