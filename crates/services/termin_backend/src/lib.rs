// --- File: crates/services/termin_backend/src/lib.rs ---
pub mod app;
pub mod service_factory;
