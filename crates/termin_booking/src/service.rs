// --- File: crates/termin_booking/src/service.rs ---

//! Booking orchestration: the write path and every lifecycle entry point.

use crate::availability::{compute_available_slots, explain_slot, BookedInterval};
use crate::calendar::{minutes_of_day, parse_date, parse_time, Clock};
use crate::error::BookingError;
use crate::lifecycle::{Lifecycle, LifecycleAction, Transition};
use crate::links::LinkSigner;
use crate::notification::NotificationDispatcher;
use crate::quota::check_quota;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use termin_common::{
    normalize_email, Appointment, AppointmentStore, BlockEntry, BlockStore, ConfigStore,
    InsertOutcome, NewAppointment, NewBlockEntry, NewUser, NotificationEvent, NotificationKind,
    User, UserStore,
};
use termin_config::AvailabilityConfig;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Guarded status updates retry this often when the row changes underneath them.
const MAX_TRANSITION_ATTEMPTS: usize = 3;

#[derive(Deserialize, Debug, Clone)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingRequest {
    #[cfg_attr(feature = "openapi", schema(format = "date", example = "2025-06-02"))]
    pub date: String,
    #[cfg_attr(feature = "openapi", schema(example = "09:00"))]
    pub time_start: String,
    #[cfg_attr(feature = "openapi", schema(example = "09:30"))]
    pub time_end: String,
    pub name: String,
    pub surname: String,
    #[serde(default)]
    pub middle_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub appointment_type: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingReceipt {
    pub appointment_id: i64,
    pub external_token: String,
}

/// A booking request that passed field validation.
#[derive(Debug, Clone)]
struct ValidBooking {
    date: NaiveDate,
    start: chrono::NaiveTime,
    end: chrono::NaiveTime,
    email: String,
}

/// The store handles the service works against.
#[derive(Clone)]
pub struct BookingStores {
    pub users: Arc<dyn UserStore>,
    pub blocks: Arc<dyn BlockStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub config: Arc<dyn ConfigStore>,
}

/// Result of a lifecycle call: the appointment as it is now, and what happened.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub appointment: Appointment,
    pub transition: Transition,
}

/// Result of blocking an identity.
#[derive(Debug, Clone)]
pub struct BlockOutcome {
    pub entry: BlockEntry,
    pub blocked_appointments: Vec<i64>,
}

pub struct BookingService {
    stores: BookingStores,
    clock: Arc<dyn Clock>,
    notifier: NotificationDispatcher,
    links: Option<LinkSigner>,
    config: RwLock<Arc<AvailabilityConfig>>,
    date_locks: Mutex<HashMap<NaiveDate, Arc<tokio::sync::Mutex<()>>>>,
}

impl BookingService {
    pub fn new(
        stores: BookingStores,
        clock: Arc<dyn Clock>,
        notifier: NotificationDispatcher,
        links: Option<LinkSigner>,
        config: AvailabilityConfig,
    ) -> Self {
        Self {
            stores,
            clock,
            notifier,
            links,
            config: RwLock::new(Arc::new(config)),
            date_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Like [`BookingService::new`], but prefers a configuration persisted by an admin
    /// over `fallback`.
    pub async fn with_persisted_config(
        stores: BookingStores,
        clock: Arc<dyn Clock>,
        notifier: NotificationDispatcher,
        links: Option<LinkSigner>,
        fallback: AvailabilityConfig,
    ) -> Result<Self, BookingError> {
        let config = match stores.config.load().await? {
            Some(stored) if stored.validate().is_ok() => {
                info!("Using availability config from storage");
                stored
            }
            Some(_) => {
                warn!("Stored availability config is invalid, using file config");
                fallback
            }
            None => fallback,
        };
        Ok(Self::new(stores, clock, notifier, links, config))
    }

    /// The configuration requests should capture once and pass down.
    pub async fn snapshot(&self) -> Arc<AvailabilityConfig> {
        Arc::clone(&*self.config.read().await)
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn link_signer(&self) -> Option<&LinkSigner> {
        self.links.as_ref()
    }

    /// Validates and persists `config`; later snapshots see it.
    pub async fn update_config(
        &self,
        config: AvailabilityConfig,
    ) -> Result<Arc<AvailabilityConfig>, BookingError> {
        config.validate()?;
        self.stores.config.save(&config).await?;
        let snapshot = Arc::new(config);
        *self.config.write().await = Arc::clone(&snapshot);
        info!("Availability config updated");
        Ok(snapshot)
    }

    // --- Read path ---

    pub async fn available_slots(
        &self,
        date: NaiveDate,
        config: &AvailabilityConfig,
        duration_minutes: u32,
    ) -> Result<Vec<String>, BookingError> {
        let booked = self.booked_intervals(date).await?;
        Ok(compute_available_slots(
            date,
            config,
            &booked,
            self.clock.now(),
            duration_minutes,
        ))
    }

    async fn booked_intervals(&self, date: NaiveDate) -> Result<Vec<BookedInterval>, BookingError> {
        let active = self.stores.appointments.active_on(date).await?;
        Ok(active.iter().map(BookedInterval::from).collect())
    }

    pub async fn appointments_on(
        &self,
        date: NaiveDate,
        include_inactive: bool,
    ) -> Result<Vec<Appointment>, BookingError> {
        let rows = if include_inactive {
            self.stores.appointments.all_on(date).await?
        } else {
            self.stores.appointments.active_on(date).await?
        };
        Ok(rows)
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Appointment, BookingError> {
        self.stores
            .appointments
            .find_by_token(token)
            .await?
            .ok_or_else(|| BookingError::NotFound("Appointment".to_string()))
    }

    // --- Write path ---

    fn validate(request: &BookingRequest) -> Result<ValidBooking, BookingError> {
        let date = parse_date(request.date.trim())
            .ok_or_else(|| BookingError::validation("date must be formatted YYYY-MM-DD"))?;
        let start = parse_time(request.time_start.trim())
            .ok_or_else(|| BookingError::validation("time_start must be formatted HH:MM"))?;
        let end = parse_time(request.time_end.trim())
            .ok_or_else(|| BookingError::validation("time_end must be formatted HH:MM"))?;
        if start >= end {
            return Err(BookingError::validation("time_start must be before time_end"));
        }
        if request.name.trim().is_empty() {
            return Err(BookingError::validation("name is required"));
        }
        if request.surname.trim().is_empty() {
            return Err(BookingError::validation("surname is required"));
        }
        let email = normalize_email(&request.email);
        if !is_plausible_email(&email) {
            return Err(BookingError::validation("email is invalid"));
        }
        Ok(ValidBooking {
            date,
            start,
            end,
            email,
        })
    }

    /// The per-date critical section. Entries nobody holds are pruned on the way.
    fn date_lock(&self, date: NaiveDate) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = match self.date_locks.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        locks.retain(|d, lock| *d == date || Arc::strong_count(lock) > 1);
        Arc::clone(locks.entry(date).or_default())
    }

    /// Books a slot as `pending` and returns the appointment id and its external token.
    pub async fn book(
        &self,
        request: BookingRequest,
        config: &AvailabilityConfig,
        origin_ip: Option<&str>,
    ) -> Result<BookingReceipt, BookingError> {
        let valid = Self::validate(&request)?;
        let existing = self.stores.users.find_by_email(&valid.email).await?;
        let user_id = existing.as_ref().map(|u| u.id);

        if self
            .stores
            .blocks
            .is_blocked(origin_ip, user_id, Some(&valid.email))
            .await?
        {
            info!("Rejected booking from blocked requester {}", valid.email);
            return Err(BookingError::Blocked);
        }

        let lock = self.date_lock(valid.date);
        let guard = lock.lock().await;

        // A concurrent first booking by the same email may have created the user meanwhile.
        let user_id = match user_id {
            Some(id) => Some(id),
            None => self
                .stores
                .users
                .find_by_email(&valid.email)
                .await?
                .map(|u| u.id),
        };
        let decision =
            check_quota(self.stores.appointments.as_ref(), user_id, valid.date, config).await?;
        if let Some(limit) = decision.reason.filter(|_| !decision.allowed) {
            info!("Rejected booking for {}: {} limit reached", valid.email, limit);
            return Err(BookingError::QuotaExceeded { limit });
        }

        let duration = minutes_of_day(valid.end) - minutes_of_day(valid.start);
        let booked = self.booked_intervals(valid.date).await?;
        if let Some(reason) = explain_slot(
            valid.date,
            valid.start,
            config,
            &booked,
            self.clock.now(),
            duration,
        ) {
            info!(
                "Rejected booking {} {}-{}: {}",
                valid.date, request.time_start, request.time_end, reason
            );
            return Err(BookingError::SlotUnavailable);
        }

        let user = self
            .stores
            .users
            .upsert(NewUser {
                email: valid.email.clone(),
                name: request.name.trim().to_string(),
                surname: request.surname.trim().to_string(),
                middle_name: non_empty(request.middle_name),
                phone: non_empty(request.phone),
                origin_ip: origin_ip.map(str::to_string),
                access_token: Uuid::new_v4().simple().to_string(),
            })
            .await?;

        let outcome = self
            .stores
            .appointments
            .insert_if_free(NewAppointment {
                token: Uuid::new_v4().simple().to_string(),
                user_id: user.id,
                date: valid.date,
                time_start: valid.start,
                time_end: valid.end,
                appointment_type: non_empty(request.appointment_type),
            })
            .await?;
        drop(guard);

        let appointment = match outcome {
            InsertOutcome::Inserted(appointment) => appointment,
            InsertOutcome::Overlap => {
                warn!(
                    "Booking {} {} lost a race at the store",
                    valid.date, request.time_start
                );
                return Err(BookingError::SlotUnavailable);
            }
        };

        info!(
            "Booked appointment {} on {} {}-{} for user {}",
            appointment.id, appointment.date, request.time_start, request.time_end, user.id
        );
        self.notify(NotificationKind::NewAppointment, &appointment, Some(&user));

        Ok(BookingReceipt {
            appointment_id: appointment.id,
            external_token: appointment.token,
        })
    }

    // --- Lifecycle ---

    async fn transition(
        &self,
        mut appointment: Appointment,
        action: LifecycleAction,
    ) -> Result<TransitionOutcome, BookingError> {
        for _ in 0..MAX_TRANSITION_ATTEMPTS {
            let transition = appointment.status.apply(action);
            let Transition::Applied { from, to } = transition else {
                debug!(
                    "Appointment {} {}: {:?}",
                    appointment.id, action, transition
                );
                return Ok(TransitionOutcome {
                    appointment,
                    transition,
                });
            };

            if let Some(updated) = self
                .stores
                .appointments
                .update_status(appointment.id, from, to)
                .await?
            {
                info!("Appointment {} {} -> {}", updated.id, from, to);
                let user = self.stores.users.find_by_id(updated.user_id).await?;
                self.notify(action.notification_kind(), &updated, user.as_ref());
                return Ok(TransitionOutcome {
                    appointment: updated,
                    transition,
                });
            }

            // Someone else changed the status first; decide again on the fresh row.
            appointment = self
                .stores
                .appointments
                .find_by_id(appointment.id)
                .await?
                .ok_or_else(|| BookingError::NotFound("Appointment".to_string()))?;
        }
        Err(BookingError::Storage(termin_common::StoreError::Backend(
            format!("appointment {} kept changing", appointment.id),
        )))
    }

    pub async fn apply_action(
        &self,
        id: i64,
        action: LifecycleAction,
    ) -> Result<TransitionOutcome, BookingError> {
        let appointment = self
            .stores
            .appointments
            .find_by_id(id)
            .await?
            .ok_or_else(|| BookingError::NotFound("Appointment".to_string()))?;
        self.transition(appointment, action).await
    }

    pub async fn confirm(&self, id: i64) -> Result<TransitionOutcome, BookingError> {
        self.apply_action(id, LifecycleAction::Confirm).await
    }

    pub async fn cancel(&self, id: i64) -> Result<TransitionOutcome, BookingError> {
        self.apply_action(id, LifecycleAction::Cancel).await
    }

    /// Self-service cancellation with the external token.
    pub async fn cancel_by_token(&self, token: &str) -> Result<TransitionOutcome, BookingError> {
        let appointment = self.find_by_token(token).await?;
        self.transition(appointment, LifecycleAction::Cancel).await
    }

    // --- Block list ---

    /// Adds a block entry and moves the matching user's active appointments to `blocked`.
    pub async fn block(&self, entry: NewBlockEntry) -> Result<BlockOutcome, BookingError> {
        if !entry.has_identity() {
            return Err(BookingError::validation(
                "a block entry needs an ip, a user_id or an email",
            ));
        }

        let user = match (entry.user_id, entry.email.as_deref()) {
            (Some(id), _) => self.stores.users.find_by_id(id).await?,
            (None, Some(email)) if !email.is_empty() => {
                self.stores.users.find_by_email(email).await?
            }
            _ => None,
        };

        let stored = self.stores.blocks.add(entry).await?;
        info!("Added block entry {}", stored.id);

        let mut blocked_appointments = Vec::new();
        if let Some(user) = user {
            for appointment in self.stores.appointments.active_for_user(user.id).await? {
                let outcome = self.transition(appointment, LifecycleAction::Block).await?;
                if outcome.transition.is_applied() {
                    blocked_appointments.push(outcome.appointment.id);
                }
            }
            if !blocked_appointments.is_empty() {
                info!(
                    "Blocked {} appointment(s) of user {}",
                    blocked_appointments.len(),
                    user.id
                );
            }
        }

        Ok(BlockOutcome {
            entry: stored,
            blocked_appointments,
        })
    }

    pub async fn unblock(&self, id: i64) -> Result<(), BookingError> {
        if self.stores.blocks.remove(id).await? {
            info!("Removed block entry {}", id);
            Ok(())
        } else {
            Err(BookingError::NotFound("Block entry".to_string()))
        }
    }

    pub async fn list_blocks(&self) -> Result<Vec<BlockEntry>, BookingError> {
        Ok(self.stores.blocks.list().await?)
    }

    fn notify(&self, kind: NotificationKind, appointment: &Appointment, user: Option<&User>) {
        let mut event = NotificationEvent::for_appointment(kind, appointment);
        if let Some(user) = user {
            event = event.with_user(user);
        }
        if kind == NotificationKind::NewAppointment {
            if let Some(signer) = &self.links {
                event.confirm_url = Some(signer.url(LifecycleAction::Confirm, appointment.id));
                event.cancel_url = Some(signer.url(LifecycleAction::Cancel, appointment.id));
            }
        }
        self.notifier.dispatch(event);
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// One `@` with something on both sides, and no whitespace.
fn is_plausible_email(email: &str) -> bool {
    let mut parts = email.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BookingRequest {
        BookingRequest {
            date: "2025-06-02".into(),
            time_start: "09:00".into(),
            time_end: "09:30".into(),
            name: "Jane".into(),
            surname: "Doe".into(),
            middle_name: None,
            email: " Jane@Example.com".into(),
            phone: None,
            appointment_type: None,
        }
    }

    #[test]
    fn validation_normalizes_email() {
        let valid = BookingService::validate(&request()).unwrap();
        assert_eq!(valid.email, "jane@example.com");
    }

    #[test]
    fn validation_rejects_bad_fields() {
        let cases: Vec<Box<dyn Fn(&mut BookingRequest)>> = vec![
            Box::new(|r| r.date = "02.06.2025".into()),
            Box::new(|r| r.time_start = "9:00".into()),
            Box::new(|r| r.time_end = "09:00".into()),
            Box::new(|r| r.name = "  ".into()),
            Box::new(|r| r.surname = String::new()),
            Box::new(|r| r.email = "jane.example.com".into()),
            Box::new(|r| r.email = "a@b@c".into()),
            Box::new(|r| r.email = "@example.com".into()),
        ];
        for mutate in cases {
            let mut r = request();
            mutate(&mut r);
            assert!(matches!(
                BookingService::validate(&r),
                Err(BookingError::Validation(_))
            ));
        }
    }

    #[test]
    fn blank_optionals_become_none() {
        assert_eq!(non_empty(Some("  ".into())), None);
        assert_eq!(non_empty(Some(" x ".into())), Some("x".to_string()));
    }
}
