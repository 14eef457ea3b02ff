// --- File: crates/termin_booking/src/error.rs ---

use crate::quota::QuotaLimit;
use termin_common::{StoreError, TerminError};
use termin_config::ConfigValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),
    #[error("Booking is not allowed for this requester")]
    Blocked,
    #[error("The {limit} booking limit has been reached")]
    QuotaExceeded { limit: QuotaLimit },
    #[error("The requested slot is no longer available")]
    SlotUnavailable,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),
}

impl BookingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BookingError::Validation(message.into())
    }
}

impl From<BookingError> for TerminError {
    fn from(err: BookingError) -> Self {
        let message = err.to_string();
        match err {
            BookingError::Validation(_) | BookingError::Config(_) => {
                TerminError::ValidationError(message)
            }
            BookingError::Blocked => TerminError::BlockedError(message),
            BookingError::QuotaExceeded { .. } => TerminError::QuotaExceededError(message),
            BookingError::SlotUnavailable => TerminError::SlotUnavailableError(message),
            BookingError::NotFound(_) => TerminError::NotFoundError(message),
            BookingError::Storage(store) => TerminError::from(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use termin_common::HttpStatusCode;

    #[test]
    fn maps_to_http_status() {
        let cases: [(BookingError, u16); 6] = [
            (BookingError::validation("email is required"), 400),
            (BookingError::Blocked, 403),
            (BookingError::QuotaExceeded { limit: QuotaLimit::Weekly }, 429),
            (BookingError::SlotUnavailable, 409),
            (BookingError::NotFound("Appointment".into()), 404),
            (BookingError::Storage(StoreError::Backend("down".into())), 500),
        ];
        for (err, status) in cases {
            assert_eq!(TerminError::from(err).status_code(), status);
        }
    }

    #[test]
    fn quota_message_names_the_limit() {
        let err = BookingError::QuotaExceeded { limit: QuotaLimit::Daily };
        assert_eq!(err.to_string(), "The daily booking limit has been reached");
    }
}
