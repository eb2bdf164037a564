use thiserror::Error;

use crate::domain::backend::BackendError;

/// Result type for p-center compilation and solving
pub type Result<T> = std::result::Result<T, PCenterError>;

/// Errors that can occur while compiling or solving a p-center instance.
///
/// An instance without a feasible solution is not an error: it is reported
/// as a `Solution` with `SolveStatus::NoSolution`.
#[derive(Error, Debug)]
pub enum PCenterError {
    /// The variant selector did not name a known model
    #[error("Unknown variant: {0}")]
    UnknownVariant(String),

    /// The solver selector did not name an available backend
    #[error("Unknown solver: {0}")]
    UnknownSolver(String),

    /// The request sets an option the selected backend cannot honour
    #[error("Unsupported option: {0}")]
    UnsupportedOption(String),

    /// Instance data is missing or inconsistent for the requested variant
    #[error("Malformed instance: {0}")]
    MalformedInstance(String),

    /// The optimization backend failed while loading or running the problem
    #[error("Backend failure while solving '{instance}' with the {variant} model: {source}")]
    BackendFailure {
        variant: String,
        instance: String,
        #[source]
        source: BackendError,
    },
}

impl PCenterError {
    pub fn malformed(details: impl Into<String>) -> Self {
        PCenterError::MalformedInstance(details.into())
    }

    /// Whether the error was caused by the request rather than the solver
    pub fn is_client_error(&self) -> bool {
        !matches!(self, PCenterError::BackendFailure { .. })
    }
}
