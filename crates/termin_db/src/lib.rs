//! SQL persistence for Termin
//!
//! Implements the store traits of `termin-common` on top of SQLx's `Any`
//! driver. SQLite is the default backend; dates, times and timestamps are
//! stored as sortable text because the `Any` driver has no chrono support.
//!
//! # Example
//!
//! ```rust,no_run
//! use termin_db::DbClientFactory;
//!
//! async fn setup() -> Result<(), termin_db::DbError> {
//!     let stores = DbClientFactory::new().in_memory().await?;
//!     assert!(stores.client.is_healthy().await);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod error;
pub mod factory;
pub mod repositories;

pub use client::DbClient;
pub use error::DbError;
pub use factory::{DbClientFactory, SqlStores};
pub use repositories::{
    SqlAppointmentRepository, SqlBlockRepository, SqlConfigRepository, SqlUserRepository,
};
