// --- File: crates/termin_common/src/error.rs ---
use std::fmt;
use thiserror::Error;

/// The base error type shared by all Termin crates.
///
/// Each crate converts its own error enum into this one at the HTTP boundary
/// by implementing `From<SpecificError> for TerminError`.
#[derive(Error, Debug)]
pub enum TerminError {
    /// Missing or wrong credentials
    #[error("Authentication error: {0}")]
    AuthError(String),

    /// Malformed request
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Requester is on the block list
    #[error("Blocked: {0}")]
    BlockedError(String),

    /// A booking cap was reached
    #[error("Quota exceeded: {0}")]
    QuotaExceededError(String),

    /// The requested slot is gone (already booked, locked, or lost a race)
    #[error("Slot unavailable: {0}")]
    SlotUnavailableError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred due to a resource not being found
    #[error("Not found: {0}")]
    NotFoundError(String),

    /// Feature disabled or not configured
    #[error("Service unavailable: {0}")]
    UnavailableError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for TerminError {
    fn status_code(&self) -> u16 {
        match self {
            TerminError::AuthError(_) => 401,
            TerminError::ValidationError(_) => 400,
            TerminError::BlockedError(_) => 403,
            TerminError::QuotaExceededError(_) => 429,
            TerminError::SlotUnavailableError(_) => 409,
            TerminError::DatabaseError(_) => 500,
            TerminError::NotFoundError(_) => 404,
            TerminError::UnavailableError(_) => 503,
        }
    }
}

impl TerminError {
    /// Machine-readable rejection reason the front end switches on.
    pub fn reason(&self) -> &'static str {
        match self {
            TerminError::ValidationError(_) => "invalid_request",
            TerminError::BlockedError(_) => "blocked",
            TerminError::QuotaExceededError(_) => "quota_exceeded",
            TerminError::SlotUnavailableError(_) => "slot_taken",
            TerminError::NotFoundError(_) => "not_found",
            TerminError::AuthError(_) => "unauthorized",
            TerminError::DatabaseError(_) => "storage_error",
            TerminError::UnavailableError(_) => "unavailable",
        }
    }
}

impl From<crate::services::StoreError> for TerminError {
    fn from(err: crate::services::StoreError) -> Self {
        match err {
            crate::services::StoreError::NotFound(what) => TerminError::NotFoundError(what),
            other => TerminError::DatabaseError(other.to_string()),
        }
    }
}

pub fn validation_error<T: fmt::Display>(message: T) -> TerminError {
    TerminError::ValidationError(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::StoreError;

    #[test]
    fn booking_rejections_map_to_client_errors() {
        let cases = [
            (validation_error("bad date"), 400, "invalid_request"),
            (TerminError::BlockedError("ip".into()), 403, "blocked"),
            (TerminError::QuotaExceededError("daily".into()), 429, "quota_exceeded"),
            (TerminError::SlotUnavailableError("09:00".into()), 409, "slot_taken"),
        ];
        for (error, status, reason) in cases {
            assert_eq!(error.status_code(), status);
            assert_eq!(error.reason(), reason);
        }
    }

    #[test]
    fn store_errors_keep_not_found_distinct() {
        let missing = TerminError::from(StoreError::NotFound("Appointment".into()));
        assert_eq!(missing.status_code(), 404);

        let broken = TerminError::from(StoreError::Backend("pool closed".into()));
        assert_eq!(broken.status_code(), 500);
        assert_eq!(broken.reason(), "storage_error");
    }
}
