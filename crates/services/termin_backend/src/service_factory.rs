// --- File: crates/services/termin_backend/src/service_factory.rs ---
//! Builds the booking service from the application configuration.
//!
//! Stores are SQL-backed when `[database]` is configured and in-memory otherwise.

use std::sync::Arc;
use termin_booking::{
    dispatcher_from_config, BookingError, BookingService, BookingStores, LinkSigner,
    MemoryStores, SystemClock,
};
use termin_config::AppConfig;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum StartupError {
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] termin_db::DbError),
    #[error("Database configured but the `database` feature is disabled")]
    DatabaseUnavailable,
    #[error("Booking setup failed: {0}")]
    Booking(#[from] BookingError),
    #[error("Invalid admin link secret")]
    LinkSecret,
}

/// Picks the store implementation for `config`.
pub async fn create_stores(config: &AppConfig) -> Result<BookingStores, StartupError> {
    match &config.database {
        #[cfg(feature = "database")]
        Some(_) => {
            let stores = termin_db::DbClientFactory::new()
                .from_app_config(config)
                .await?;
            if !stores.client.is_healthy().await {
                warn!("Database at {} did not answer the health check", stores.client);
            }
            info!("Using SQL stores at {}", stores.client);
            Ok(BookingStores {
                users: stores.users,
                blocks: stores.blocks,
                appointments: stores.appointments,
                config: stores.config,
            })
        }
        #[cfg(not(feature = "database"))]
        Some(_) => Err(StartupError::DatabaseUnavailable),
        None => {
            warn!("No [database] section, bookings are kept in memory only");
            Ok(MemoryStores::new().into())
        }
    }
}

/// A signer when both `admin.link_secret` and `admin.public_base_url` are set.
pub fn create_link_signer(config: &AppConfig) -> Result<Option<LinkSigner>, StartupError> {
    let Some(admin) = config.admin.as_ref() else {
        return Ok(None);
    };
    match (admin.link_secret.as_deref(), admin.public_base_url.as_deref()) {
        (Some(secret), Some(base_url)) if !secret.is_empty() => {
            let signer =
                LinkSigner::new(secret, base_url).map_err(|_| StartupError::LinkSecret)?;
            Ok(Some(signer))
        }
        (Some(_), None) => {
            warn!("admin.link_secret is set without admin.public_base_url; signed links disabled");
            Ok(None)
        }
        _ => Ok(None),
    }
}

pub async fn create_booking_service(config: &AppConfig) -> Result<BookingService, StartupError> {
    let stores = create_stores(config).await?;
    let clock = Arc::new(SystemClock::from_zone_name(
        config.server.time_zone.as_deref(),
    ));
    let service = BookingService::with_persisted_config(
        stores,
        clock,
        dispatcher_from_config(config),
        create_link_signer(config)?,
        config.availability.clone(),
    )
    .await?;
    Ok(service)
}
