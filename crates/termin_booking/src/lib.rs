// --- File: crates/termin_booking/src/lib.rs ---
pub mod auth;
pub mod availability;
#[cfg(test)]
mod availability_proptest;
#[cfg(test)]
mod availability_test;
pub mod calendar;
pub mod doc;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod links;
pub mod memory;
pub mod notification;
pub mod quota;
pub mod routes;
pub mod service;

pub use availability::{compute_available_slots, explain_slot, BookedInterval, SlotExclusion};
pub use calendar::{Clock, FixedClock, SystemClock};
pub use error::BookingError;
pub use lifecycle::{Lifecycle, LifecycleAction, Transition};
pub use links::LinkSigner;
pub use memory::MemoryStores;
pub use notification::{
    dispatcher_from_config, LogNotificationSink, NotificationDispatcher, WebhookNotificationSink,
};
pub use quota::{check_quota, evaluate_quota, QuotaDecision, QuotaLimit};
pub use service::{BookingReceipt, BookingRequest, BookingService, BookingStores};
