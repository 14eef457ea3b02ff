// --- File: crates/termin_booking/src/doc.rs ---

#![cfg(feature = "openapi")]

use crate::handlers::{
    AdminAppointmentsQuery, AvailabilityQuery, AvailabilityRangeQuery, AvailabilityRangeResponse,
    AvailabilityResponse, BlockResponse, HealthResponse, LinkQuery, TransitionResponse,
    TransitionResult,
};
use crate::lifecycle::LifecycleAction;
use crate::service::{BookingReceipt, BookingRequest};
use termin_common::{Appointment, AppointmentStatus, BlockEntry, NewBlockEntry};
use termin_config::AvailabilityConfig;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Registers the `X-Admin-Key` header scheme the admin paths refer to.
struct AdminKeyScheme;

impl Modify for AdminKeyScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "admin_key",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new(
                crate::auth::ADMIN_KEY_HEADER,
            ))),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health_handler,
        crate::handlers::get_availability_handler,
        crate::handlers::get_availability_range_handler,
        crate::handlers::book_appointment_handler,
        crate::handlers::get_appointment_handler,
        crate::handlers::cancel_appointment_handler,
        crate::handlers::signed_link_handler,
        crate::handlers::list_appointments_handler,
        crate::handlers::confirm_appointment_handler,
        crate::handlers::admin_cancel_appointment_handler,
        crate::handlers::list_blocks_handler,
        crate::handlers::add_block_handler,
        crate::handlers::remove_block_handler,
        crate::handlers::get_config_handler,
        crate::handlers::update_config_handler
    ),
    components(
        schemas(
            AvailabilityQuery,
            AvailabilityRangeQuery,
            AvailabilityResponse,
            AvailabilityRangeResponse,
            BookingRequest,
            BookingReceipt,
            Appointment,
            AppointmentStatus,
            TransitionResponse,
            TransitionResult,
            LifecycleAction,
            AdminAppointmentsQuery,
            BlockEntry,
            NewBlockEntry,
            BlockResponse,
            AvailabilityConfig,
            LinkQuery,
            HealthResponse
        )
    ),
    modifiers(&AdminKeyScheme),
    tags(
        (name = "Booking", description = "Slot availability and self-service booking"),
        (name = "Admin", description = "Appointment administration, block list and settings")
    ),
    servers(
        (url = "/api", description = "Termin booking API")
    )
)]
pub struct BookingApiDoc;
