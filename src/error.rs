use thiserror::Error;

use crate::forms::ValidationErrors;

/// What callers of the query and mutation layers can observe. Store failures
/// are reduced to a fixed, operation-specific message; the underlying error
/// is logged and dropped.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The submitted form did not match the invoice schema. Raised before any
    /// store call.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error("{0}")]
    Fetch(&'static str),
    #[error("{0}")]
    Mutation(&'static str),
}
