/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Validation errors for business rules
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation illegal for the invoice's current status
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Payment would push amount paid beyond the invoice total
    #[error("Payment exceeds balance: {0}")]
    PaymentExceedsBalance(String),

    /// Edit would drop the total below payments already applied
    #[error("Overpayment inconsistency: {0}")]
    OverpaymentInconsistency(String),

    /// Stale read detected at write time; re-read and retry
    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        AppError::InvalidState(msg.into())
    }

    pub fn concurrent_modification(msg: impl Into<String>) -> Self {
        AppError::ConcurrentModification(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Whether the caller can meaningfully retry after re-reading the invoice
    pub fn is_retryable(&self) -> bool {
        matches!(self, AppError::ConcurrentModification(_))
    }
}
