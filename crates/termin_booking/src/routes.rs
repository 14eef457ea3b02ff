// --- File: crates/termin_booking/src/routes.rs ---

use crate::auth::{admin_auth_middleware, AdminAuthState};
use crate::handlers::{
    add_block_handler, admin_cancel_appointment_handler, book_appointment_handler,
    cancel_appointment_handler, confirm_appointment_handler, get_appointment_handler,
    get_availability_handler, get_availability_range_handler, get_config_handler,
    health_handler, list_appointments_handler, list_blocks_handler, remove_block_handler,
    signed_link_handler, update_config_handler, BookingState,
};
use crate::service::BookingService;
use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// All booking routes, relative to `/api`.
///
/// The `/admin` routes require `X-Admin-Key` to match `admin_key`.
pub fn routes(service: BookingService, admin_key: Option<String>) -> Router {
    let state = Arc::new(BookingState { service });
    let auth_state = Arc::new(AdminAuthState { api_key: admin_key });

    let admin = Router::new()
        .route("/admin/appointments", get(list_appointments_handler))
        .route(
            "/admin/appointments/{id}/confirm",
            post(confirm_appointment_handler),
        )
        .route(
            "/admin/appointments/{id}/cancel",
            post(admin_cancel_appointment_handler),
        )
        .route(
            "/admin/blocks",
            get(list_blocks_handler).post(add_block_handler),
        )
        .route("/admin/blocks/{id}", delete(remove_block_handler))
        .route(
            "/admin/config",
            get(get_config_handler).put(update_config_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            auth_state,
            admin_auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/availability", get(get_availability_handler))
        .route("/availability/range", get(get_availability_range_handler))
        .route("/appointments", post(book_appointment_handler))
        .route("/appointments/{token}", get(get_appointment_handler))
        .route(
            "/appointments/{token}/cancel",
            post(cancel_appointment_handler),
        )
        .route("/links/{action}/{id}", get(signed_link_handler))
        .merge(admin)
        .with_state(state)
}
