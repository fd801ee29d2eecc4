//! # AppError
//!
//! Centralized error handling for the donor portal.
//! Every failure a screen can hit maps onto one of these variants; screens
//! turn them into notices instead of propagating them to the user as crashes.

use thiserror::Error;

/// The primary error type for all dp-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// The request never produced a response (DNS, connect, reset, timeout)
    #[error("network error: {0}")]
    Transport(String),

    /// The backend answered with a non-2xx status
    #[error("server returned {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    /// The response body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// User input rejected before (or by) the backend
    #[error("validation error: {0}")]
    Validation(String),

    /// An authenticated call was attempted without a credential
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Local failure (e.g. writing a downloaded file)
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Text suitable for a user-facing notice.
    ///
    /// Server-provided messages and validation messages are surfaced as-is;
    /// everything else collapses to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            AppError::Status { message: Some(message), .. } if !message.trim().is_empty() => {
                message.clone()
            }
            AppError::Validation(message) | AppError::Unauthorized(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }

    /// True when the backend reported the resource as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::Status { status: 404, .. })
    }
}

/// A specialized Result type for donor portal logic.
pub type Result<T> = std::result::Result<T, AppError>;
