// --- File: crates/termin_common/src/lib.rs ---

pub mod error; // Error handling
pub mod features; // Runtime feature checks
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod models; // Shared domain data
pub mod services; // Store and notification traits

// Re-export error types and utilities for easier access
pub use error::{validation_error, HttpStatusCode, TerminError};

// Re-export HTTP utilities for easier access
pub use http::{
    client::{create_client, HTTP_CLIENT},
    IntoHttpResponse,
};

pub use features::{is_admin_enabled, is_feature_enabled, is_notifications_enabled};

pub use models::{
    normalize_email, Appointment, AppointmentStatus, BlockEntry, InsertOutcome, NewAppointment,
    NewBlockEntry, NewUser, User,
};
pub use services::{
    AppointmentStore, BlockStore, ConfigStore, NotificationError, NotificationEvent,
    NotificationKind, NotificationSink, StoreError, StoreResult, UserStore,
};
