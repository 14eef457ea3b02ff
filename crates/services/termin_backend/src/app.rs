// --- File: crates/services/termin_backend/src/app.rs ---

use axum::Router;
use std::time::Duration;
use termin_booking::{routes::routes as booking_routes, BookingService};
use termin_common::is_admin_enabled;
use termin_config::AppConfig;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// The whole HTTP application: booking routes under `/api`, plus Swagger UI with `openapi`.
pub fn build_app(service: BookingService, config: &AppConfig) -> Router {
    let admin_key = config.admin.as_ref().and_then(|admin| admin.api_key.clone());
    if !is_admin_enabled(config) {
        info!("No admin api key configured, admin routes answer 503");
    }

    #[allow(unused_mut)] // only mutated with the openapi feature
    let mut app = Router::new().nest("/api", booking_routes(service, admin_key));

    #[cfg(feature = "openapi")]
    {
        use termin_booking::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        #[derive(OpenApi)]
        #[openapi(
            info(
                title = "Termin API",
                version = "0.1.0",
                description = "Appointment slot availability and booking",
                license(name = "MIT", url = "https://opensource.org/licenses/MIT")
            ),
            servers((url = "/api", description = "Main API Prefix")),
        )]
        struct ApiDoc;

        let mut openapi_doc = ApiDoc::openapi();
        openapi_doc.merge(BookingApiDoc::openapi());
        info!("Adding Swagger UI at /api/docs");
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", openapi_doc));
    }

    let timeout = Duration::from_secs(
        config
            .server
            .request_timeout_secs
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
    );
    app.layer(TimeoutLayer::new(timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
