// --- File: crates/termin_booking/src/handlers.rs ---

use crate::auth::ClientIp;
use crate::calendar::{date_range, parse_date};
use crate::error::BookingError;
use crate::lifecycle::{LifecycleAction, Transition};
use crate::service::{BookingReceipt, BookingRequest, BookingService, TransitionOutcome};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use termin_common::{
    validation_error, Appointment, AppointmentStatus, BlockEntry, NewBlockEntry, TerminError,
};
use termin_config::AvailabilityConfig;
use tracing::{info, warn};

/// Longest span `/availability/range` answers for.
pub const MAX_RANGE_DAYS: i64 = 62;

/// Shared state of the booking routes.
pub struct BookingState {
    pub service: BookingService,
}

// --- DTOs ---

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
pub struct AvailabilityQuery {
    /// `YYYY-MM-DD`
    pub date: String,
    /// Appointment length; the configured default when absent.
    pub duration_minutes: Option<u32>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
pub struct AvailabilityRangeQuery {
    pub start_date: String,
    pub end_date: String,
    pub duration_minutes: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvailabilityResponse {
    pub date: String,
    pub slots: Vec<String>,
    pub granularity_minutes: u32,
    pub duration_minutes: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AvailabilityRangeResponse {
    pub days: Vec<AvailabilityResponse>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum TransitionResult {
    Applied,
    AlreadyInState,
    Invalid,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TransitionResponse {
    pub appointment_id: i64,
    pub action: LifecycleAction,
    pub result: TransitionResult,
    pub status: AppointmentStatus,
}

impl From<&TransitionOutcome> for TransitionResponse {
    fn from(outcome: &TransitionOutcome) -> Self {
        let (result, action) = match outcome.transition {
            Transition::Applied { to, .. } => (TransitionResult::Applied, action_for(to)),
            Transition::AlreadyInState(status) => {
                (TransitionResult::AlreadyInState, action_for(status))
            }
            Transition::Invalid { action, .. } => (TransitionResult::Invalid, action),
        };
        Self {
            appointment_id: outcome.appointment.id,
            action,
            result,
            status: outcome.transition.resulting_status(),
        }
    }
}

fn action_for(status: AppointmentStatus) -> LifecycleAction {
    match status {
        AppointmentStatus::Cancelled => LifecycleAction::Cancel,
        AppointmentStatus::Blocked => LifecycleAction::Block,
        AppointmentStatus::Pending | AppointmentStatus::Confirmed => LifecycleAction::Confirm,
    }
}

/// Invalid transitions answer 409 with the same body shape.
fn transition_reply(outcome: &TransitionOutcome) -> (StatusCode, Json<TransitionResponse>) {
    let status = match outcome.transition {
        Transition::Invalid { .. } => StatusCode::CONFLICT,
        _ => StatusCode::OK,
    };
    (status, Json(TransitionResponse::from(outcome)))
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
pub struct AdminAppointmentsQuery {
    pub date: String,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BlockResponse {
    pub entry: BlockEntry,
    pub blocked_appointments: Vec<i64>,
}

#[derive(Deserialize, Debug)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams, utoipa::ToSchema))]
pub struct LinkQuery {
    pub sig: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct HealthResponse {
    pub status: String,
}

// --- Helpers ---

fn required_date(raw: &str, field: &str) -> Result<NaiveDate, TerminError> {
    parse_date(raw.trim())
        .ok_or_else(|| validation_error(format!("{field} must be formatted YYYY-MM-DD")))
}

fn requested_duration(
    duration: Option<u32>,
    config: &AvailabilityConfig,
) -> Result<u32, TerminError> {
    match duration {
        Some(0) => Err(validation_error("duration_minutes must be positive")),
        Some(minutes) if minutes > config.opening_minutes() => Err(validation_error(format!(
            "duration_minutes must not exceed {} minutes",
            config.opening_minutes()
        ))),
        Some(minutes) => Ok(minutes),
        None => Ok(config.effective_duration_minutes()),
    }
}

async fn day_availability(
    service: &BookingService,
    date: NaiveDate,
    config: &AvailabilityConfig,
    duration: u32,
) -> Result<AvailabilityResponse, TerminError> {
    let slots = service.available_slots(date, config, duration).await?;
    Ok(AvailabilityResponse {
        date: date.format(crate::calendar::DATE_FORMAT).to_string(),
        slots,
        granularity_minutes: config.slot_granularity_minutes,
        duration_minutes: duration,
    })
}

// --- Public handlers ---

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "Booking"
))]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Free start times for one day.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Bookable start times", body = AvailabilityResponse),
        (status = 400, description = "Invalid date or duration"),
        (status = 500, description = "Storage error")
    ),
    tag = "Booking"
))]
pub async fn get_availability_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, TerminError> {
    let config = state.service.snapshot().await;
    let date = required_date(&query.date, "date")?;
    let duration = requested_duration(query.duration_minutes, &config)?;
    Ok(Json(
        day_availability(&state.service, date, &config, duration).await?,
    ))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/availability/range",
    params(AvailabilityRangeQuery),
    responses(
        (status = 200, description = "Bookable start times per day", body = AvailabilityRangeResponse),
        (status = 400, description = "Invalid dates or range too long")
    ),
    tag = "Booking"
))]
pub async fn get_availability_range_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AvailabilityRangeQuery>,
) -> Result<Json<AvailabilityRangeResponse>, TerminError> {
    let config = state.service.snapshot().await;
    let start = required_date(&query.start_date, "start_date")?;
    let end = required_date(&query.end_date, "end_date")?;
    if end < start {
        return Err(validation_error("end_date must not be before start_date"));
    }
    if (end - start).num_days() >= MAX_RANGE_DAYS {
        return Err(validation_error(format!(
            "a range covers at most {MAX_RANGE_DAYS} days"
        )));
    }
    let duration = requested_duration(query.duration_minutes, &config)?;

    let mut days = Vec::new();
    for date in date_range(start, end) {
        days.push(day_availability(&state.service, date, &config, duration).await?);
    }
    Ok(Json(AvailabilityRangeResponse { days }))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/appointments",
    request_body = BookingRequest,
    responses(
        (status = 201, description = "Appointment created as pending", body = BookingReceipt),
        (status = 400, description = "invalid_request"),
        (status = 403, description = "blocked"),
        (status = 409, description = "slot_taken"),
        (status = 429, description = "quota_exceeded")
    ),
    tag = "Booking"
))]
pub async fn book_appointment_handler(
    State(state): State<Arc<BookingState>>,
    ClientIp(origin_ip): ClientIp,
    Json(request): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingReceipt>), TerminError> {
    let config = state.service.snapshot().await;
    let receipt = state
        .service
        .book(request, &config, origin_ip.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/appointments/{token}",
    params(("token" = String, Path, description = "External appointment token")),
    responses(
        (status = 200, description = "The appointment", body = Appointment),
        (status = 404, description = "Unknown token")
    ),
    tag = "Booking"
))]
pub async fn get_appointment_handler(
    State(state): State<Arc<BookingState>>,
    Path(token): Path<String>,
) -> Result<Json<Appointment>, TerminError> {
    Ok(Json(state.service.find_by_token(&token).await?))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/appointments/{token}/cancel",
    params(("token" = String, Path, description = "External appointment token")),
    responses(
        (status = 200, description = "Cancelled, or already cancelled", body = TransitionResponse),
        (status = 404, description = "Unknown token"),
        (status = 409, description = "Appointment is blocked", body = TransitionResponse)
    ),
    tag = "Booking"
))]
pub async fn cancel_appointment_handler(
    State(state): State<Arc<BookingState>>,
    Path(token): Path<String>,
) -> Result<(StatusCode, Json<TransitionResponse>), TerminError> {
    let outcome = state.service.cancel_by_token(&token).await?;
    Ok(transition_reply(&outcome))
}

/// Target of the signed confirm/cancel links in admin notifications.
#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/links/{action}/{id}",
    params(
        ("action" = String, Path, description = "confirm or cancel"),
        ("id" = i64, Path, description = "Appointment id"),
        LinkQuery
    ),
    responses(
        (status = 200, description = "Lifecycle outcome", body = TransitionResponse),
        (status = 401, description = "Invalid signature"),
        (status = 503, description = "Signed links are not configured")
    ),
    tag = "Admin"
))]
pub async fn signed_link_handler(
    State(state): State<Arc<BookingState>>,
    Path((action, id)): Path<(String, i64)>,
    Query(query): Query<LinkQuery>,
) -> Result<(StatusCode, Json<TransitionResponse>), TerminError> {
    let signer = state.service.link_signer().ok_or_else(|| {
        TerminError::UnavailableError("Signed links are not configured".to_string())
    })?;
    let action: LifecycleAction = action
        .parse()
        .map_err(|_| TerminError::AuthError("Invalid link".to_string()))?;
    if action == LifecycleAction::Block || !signer.verify(action, id, &query.sig) {
        warn!("Rejected signed link for appointment {}", id);
        return Err(TerminError::AuthError("Invalid link signature".to_string()));
    }

    let outcome = state.service.apply_action(id, action).await?;
    Ok(transition_reply(&outcome))
}

// --- Admin handlers ---

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/admin/appointments",
    params(AdminAppointmentsQuery),
    responses(
        (status = 200, description = "Appointments on the date", body = Vec<Appointment>),
        (status = 401, description = "Missing or invalid admin key")
    ),
    security(("admin_key" = [])),
    tag = "Admin"
))]
pub async fn list_appointments_handler(
    State(state): State<Arc<BookingState>>,
    Query(query): Query<AdminAppointmentsQuery>,
) -> Result<Json<Vec<Appointment>>, TerminError> {
    let date = required_date(&query.date, "date")?;
    let rows = state
        .service
        .appointments_on(date, query.include_inactive)
        .await?;
    Ok(Json(rows))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/admin/appointments/{id}/confirm",
    params(("id" = i64, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Confirmed, or already confirmed", body = TransitionResponse),
        (status = 404, description = "Unknown appointment"),
        (status = 409, description = "Appointment is cancelled or blocked", body = TransitionResponse)
    ),
    security(("admin_key" = [])),
    tag = "Admin"
))]
pub async fn confirm_appointment_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<TransitionResponse>), TerminError> {
    let outcome = state.service.confirm(id).await?;
    Ok(transition_reply(&outcome))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/admin/appointments/{id}/cancel",
    params(("id" = i64, Path, description = "Appointment id")),
    responses(
        (status = 200, description = "Cancelled, or already cancelled", body = TransitionResponse),
        (status = 404, description = "Unknown appointment"),
        (status = 409, description = "Appointment is blocked", body = TransitionResponse)
    ),
    security(("admin_key" = [])),
    tag = "Admin"
))]
pub async fn admin_cancel_appointment_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<TransitionResponse>), TerminError> {
    let outcome = state.service.cancel(id).await?;
    Ok(transition_reply(&outcome))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/admin/blocks",
    responses((status = 200, description = "Block list", body = Vec<BlockEntry>)),
    security(("admin_key" = [])),
    tag = "Admin"
))]
pub async fn list_blocks_handler(
    State(state): State<Arc<BookingState>>,
) -> Result<Json<Vec<BlockEntry>>, TerminError> {
    Ok(Json(state.service.list_blocks().await?))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/admin/blocks",
    request_body = NewBlockEntry,
    responses(
        (status = 201, description = "Entry added; matching appointments blocked", body = BlockResponse),
        (status = 400, description = "Entry names no ip, user or email")
    ),
    security(("admin_key" = [])),
    tag = "Admin"
))]
pub async fn add_block_handler(
    State(state): State<Arc<BookingState>>,
    Json(entry): Json<NewBlockEntry>,
) -> Result<(StatusCode, Json<BlockResponse>), TerminError> {
    let outcome = state.service.block(entry).await?;
    Ok((
        StatusCode::CREATED,
        Json(BlockResponse {
            entry: outcome.entry,
            blocked_appointments: outcome.blocked_appointments,
        }),
    ))
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    delete,
    path = "/admin/blocks/{id}",
    params(("id" = i64, Path, description = "Block entry id")),
    responses(
        (status = 204, description = "Entry removed"),
        (status = 404, description = "Unknown entry")
    ),
    security(("admin_key" = [])),
    tag = "Admin"
))]
pub async fn remove_block_handler(
    State(state): State<Arc<BookingState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, TerminError> {
    state.service.unblock(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/admin/config",
    responses((status = 200, description = "Current availability settings", body = AvailabilityConfig)),
    security(("admin_key" = [])),
    tag = "Admin"
))]
pub async fn get_config_handler(
    State(state): State<Arc<BookingState>>,
) -> Json<AvailabilityConfig> {
    Json(state.service.snapshot().await.as_ref().clone())
}

#[axum::debug_handler]
#[cfg_attr(feature = "openapi", utoipa::path(
    put,
    path = "/admin/config",
    request_body = AvailabilityConfig,
    responses(
        (status = 200, description = "Stored and applied to later requests", body = AvailabilityConfig),
        (status = 400, description = "Settings violate an invariant")
    ),
    security(("admin_key" = [])),
    tag = "Admin"
))]
pub async fn update_config_handler(
    State(state): State<Arc<BookingState>>,
    Json(config): Json<AvailabilityConfig>,
) -> Result<Json<AvailabilityConfig>, TerminError> {
    let applied = state
        .service
        .update_config(config)
        .await
        .map_err(|err: BookingError| {
            info!("Refused availability config: {}", err);
            TerminError::from(err)
        })?;
    Ok(Json(applied.as_ref().clone()))
}
