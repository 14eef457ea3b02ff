// --- File: crates/termin_booking/src/memory.rs ---

//! In-memory stores for tests and deployments without a database.
//!
//! Each store keeps its rows behind a `std::sync::Mutex` that is never held
//! across an `.await`, which makes the overlap check plus insert atomic.

use crate::service::BookingStores;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use termin_common::{
    normalize_email, Appointment, AppointmentStatus, AppointmentStore, BlockEntry, BlockStore,
    ConfigStore, InsertOutcome, NewAppointment, NewBlockEntry, NewUser, StoreError, StoreResult,
    User, UserStore,
};
use termin_config::AvailabilityConfig;

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
}

#[derive(Debug)]
struct Table<T> {
    next_id: i64,
    rows: Vec<T>,
}

// Derived `Default` would require `T: Default`.
impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            rows: Vec::new(),
        }
    }
}

impl<T> Table<T> {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    table: Mutex<Table<User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let table = lock(&self.table)?;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let table = lock(&self.table)?;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn upsert(&self, user: NewUser) -> StoreResult<User> {
        let email = normalize_email(&user.email);
        let now = Utc::now();
        let mut table = lock(&self.table)?;

        if let Some(existing) = table.rows.iter_mut().find(|u| u.email == email) {
            existing.name = user.name;
            existing.surname = user.surname;
            if user.middle_name.is_some() {
                existing.middle_name = user.middle_name;
            }
            if user.phone.is_some() {
                existing.phone = user.phone;
            }
            if user.origin_ip.is_some() {
                existing.origin_ip = user.origin_ip;
            }
            existing.updated_at = now;
            return Ok(existing.clone());
        }

        let created = User {
            id: table.allocate_id(),
            email,
            name: user.name,
            surname: user.surname,
            middle_name: user.middle_name,
            phone: user.phone,
            origin_ip: user.origin_ip,
            access_token: user.access_token,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(created.clone());
        Ok(created)
    }
}

#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    table: Mutex<Table<BlockEntry>>,
}

#[async_trait]
impl BlockStore for MemoryBlockStore {
    async fn is_blocked(
        &self,
        ip: Option<&str>,
        user_id: Option<i64>,
        email: Option<&str>,
    ) -> StoreResult<bool> {
        let table = lock(&self.table)?;
        Ok(table.rows.iter().any(|entry| entry.matches(ip, user_id, email)))
    }

    async fn add(&self, entry: NewBlockEntry) -> StoreResult<BlockEntry> {
        let mut table = lock(&self.table)?;
        let created = BlockEntry {
            id: table.allocate_id(),
            ip: entry.ip.filter(|ip| !ip.is_empty()),
            user_id: entry.user_id,
            email: entry
                .email
                .filter(|email| !email.is_empty())
                .map(|email| normalize_email(&email)),
            reason: entry.reason,
            created_at: Utc::now(),
        };
        table.rows.push(created.clone());
        Ok(created)
    }

    async fn list(&self) -> StoreResult<Vec<BlockEntry>> {
        Ok(lock(&self.table)?.rows.clone())
    }

    async fn remove(&self, id: i64) -> StoreResult<bool> {
        let mut table = lock(&self.table)?;
        let before = table.rows.len();
        table.rows.retain(|entry| entry.id != id);
        Ok(table.rows.len() != before)
    }
}

#[derive(Debug, Default)]
pub struct MemoryAppointmentStore {
    table: Mutex<Table<Appointment>>,
}

impl MemoryAppointmentStore {
    fn sorted(mut rows: Vec<Appointment>) -> Vec<Appointment> {
        rows.sort_by_key(|a| (a.date, a.time_start, a.id));
        rows
    }
}

#[async_trait]
impl AppointmentStore for MemoryAppointmentStore {
    async fn active_on(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let table = lock(&self.table)?;
        let rows = table
            .rows
            .iter()
            .filter(|a| a.date == date && a.status.occupies_slot())
            .cloned()
            .collect();
        Ok(Self::sorted(rows))
    }

    async fn all_on(&self, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let table = lock(&self.table)?;
        let rows = table.rows.iter().filter(|a| a.date == date).cloned().collect();
        Ok(Self::sorted(rows))
    }

    async fn count_active_for_user(
        &self,
        user_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<u32> {
        let table = lock(&self.table)?;
        let count = table
            .rows
            .iter()
            .filter(|a| {
                a.user_id == user_id && a.date >= from && a.date <= to && a.status.occupies_slot()
            })
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn insert_if_free(&self, appointment: NewAppointment) -> StoreResult<InsertOutcome> {
        let mut table = lock(&self.table)?;
        let taken = table.rows.iter().any(|a| {
            a.date == appointment.date
                && a.status.occupies_slot()
                && appointment.overlaps(a.time_start, a.time_end)
        });
        if taken {
            return Ok(InsertOutcome::Overlap);
        }

        let now = Utc::now();
        let created = Appointment {
            id: table.allocate_id(),
            token: appointment.token,
            user_id: appointment.user_id,
            date: appointment.date,
            time_start: appointment.time_start,
            time_end: appointment.time_end,
            status: AppointmentStatus::Pending,
            appointment_type: appointment.appointment_type,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(created.clone());
        Ok(InsertOutcome::Inserted(created))
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<Appointment>> {
        let table = lock(&self.table)?;
        Ok(table.rows.iter().find(|a| a.id == id).cloned())
    }

    async fn find_by_token(&self, token: &str) -> StoreResult<Option<Appointment>> {
        let table = lock(&self.table)?;
        Ok(table.rows.iter().find(|a| a.token == token).cloned())
    }

    async fn update_status(
        &self,
        id: i64,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> StoreResult<Option<Appointment>> {
        let mut table = lock(&self.table)?;
        let Some(row) = table
            .rows
            .iter_mut()
            .find(|a| a.id == id && a.status == expected)
        else {
            return Ok(None);
        };
        row.status = status;
        row.updated_at = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn active_for_user(&self, user_id: i64) -> StoreResult<Vec<Appointment>> {
        let table = lock(&self.table)?;
        let rows = table
            .rows
            .iter()
            .filter(|a| a.user_id == user_id && a.status.occupies_slot())
            .cloned()
            .collect();
        Ok(Self::sorted(rows))
    }
}

#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    current: Mutex<Option<AvailabilityConfig>>,
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn load(&self) -> StoreResult<Option<AvailabilityConfig>> {
        Ok(lock(&self.current)?.clone())
    }

    async fn save(&self, config: &AvailabilityConfig) -> StoreResult<()> {
        *lock(&self.current)? = Some(config.clone());
        Ok(())
    }
}

/// One of each in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStores {
    pub users: Arc<MemoryUserStore>,
    pub blocks: Arc<MemoryBlockStore>,
    pub appointments: Arc<MemoryAppointmentStore>,
    pub config: Arc<MemoryConfigStore>,
}

impl MemoryStores {
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<MemoryStores> for BookingStores {
    fn from(stores: MemoryStores) -> Self {
        BookingStores {
            users: stores.users,
            blocks: stores.blocks,
            appointments: stores.appointments,
            config: stores.config,
        }
    }
}
