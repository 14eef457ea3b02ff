
use fixtures::{monday, request, service_on, sunday_morning};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use termin_booking::{
    BookingError, BookingReceipt, BookingService, BookingStores, MemoryStores,
    NotificationDispatcher, QuotaLimit,
};
use termin_common::{NewUser, StoreResult, User, UserStore};
use termin_config::AvailabilityConfig;
use termin_db::{DbClientFactory, SqlStores};
use tokio::task::JoinSet;

const CONTENDERS: usize = 8;

fn sql_booking_stores(stores: &SqlStores) -> BookingStores {
    BookingStores {
        users: stores.users.clone(),
        blocks: stores.blocks.clone(),
        appointments: stores.appointments.clone(),
        config: stores.config.clone(),
    }
}

/// Everyone asks for 10:00-10:30 on Monday at once; returns each result.
async fn race(
    services: Vec<Arc<BookingService>>,
) -> Vec<Result<BookingReceipt, BookingError>> {
    let config = AvailabilityConfig::default();
    let mut tasks = JoinSet::new();
    for n in 0..CONTENDERS {
        let service = Arc::clone(&services[n % services.len()]);
        let config = config.clone();
        tasks.spawn(async move {
            let email = format!("racer{n}@example.com");
            service
                .book(request(monday(), "10:00", "10:30", &email), &config, None)
                .await
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.expect("booking task panicked"));
    }
    results
}

fn assert_single_winner(results: &[Result<BookingReceipt, BookingError>]) {
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one booking may win: {results:?}");
    for loser in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(loser, Err(BookingError::SlotUnavailable)), "{loser:?}");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_bookings_have_one_winner() {
    let service = Arc::new(service_on(
        MemoryStores::new(),
        sunday_morning(),
        AvailabilityConfig::default(),
        NotificationDispatcher::log_only(),
    ));
    let results = race(vec![Arc::clone(&service)]).await;
    assert_single_winner(&results);

    let config = service.snapshot().await;
    let active = service.appointments_on(monday(), false).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(service.available_slots(monday(), &config, 30).await.unwrap().len(), 15);
}

/// Separate service instances do not share the per-date lock; the store's
/// conditional insert alone must keep the slot single-booked.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn store_insert_guards_across_instances() {
    let stores = MemoryStores::new();
    let services = (0..CONTENDERS)
        .map(|_| {
            Arc::new(service_on(
                stores.clone(),
                sunday_morning(),
                AvailabilityConfig::default(),
                NotificationDispatcher::log_only(),
            ))
        })
        .collect();
    assert_single_winner(&race(services).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sqlite_backed_bookings_have_one_winner() {
    let stores = DbClientFactory::new()
        .in_memory()
        .await
        .expect("in-memory sqlite must open");
    let services = (0..2)
        .map(|_| {
            Arc::new(service_on(
                sql_booking_stores(&stores),
                sunday_morning(),
                AvailabilityConfig::default(),
                NotificationDispatcher::log_only(),
            ))
        })
        .collect();
    assert_single_winner(&race(services).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn different_dates_book_in_parallel() {
    let service = Arc::new(service_on(
        MemoryStores::new(),
        sunday_morning(),
        AvailabilityConfig::default(),
        NotificationDispatcher::log_only(),
    ));
    let config = AvailabilityConfig::default();

    let mut tasks = JoinSet::new();
    for offset in 0..5u64 {
        let service = Arc::clone(&service);
        let config = config.clone();
        tasks.spawn(async move {
            let day = monday() + chrono::Days::new(offset);
            service
                .book(request(day, "09:00", "09:30", "multi@example.com"), &config, None)
                .await
        });
    }
    while let Some(joined) = tasks.join_next().await {
        joined.unwrap().expect("bookings on different days do not conflict");
    }
}

/// A user store whose email lookups answer late, widening the window between
/// lookup and write.
struct SlowUserStore {
    inner: Arc<dyn UserStore>,
}

#[async_trait]
impl UserStore for SlowUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let found = self.inner.find_by_email(email).await?;
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(found)
    }

    async fn find_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        self.inner.find_by_id(id).await
    }

    async fn upsert(&self, user: NewUser) -> StoreResult<User> {
        self.inner.upsert(user).await
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn daily_limit_holds_for_a_new_user_booking_twice_at_once() {
    let memory = MemoryStores::new();
    let mut stores: BookingStores = memory.clone().into();
    stores.users = Arc::new(SlowUserStore {
        inner: memory.users.clone(),
    });
    let config = AvailabilityConfig {
        daily_booking_limit: 1,
        ..AvailabilityConfig::default()
    };
    let service = Arc::new(service_on(
        stores,
        sunday_morning(),
        config.clone(),
        NotificationDispatcher::log_only(),
    ));

    let first = {
        let service = Arc::clone(&service);
        let config = config.clone();
        tokio::spawn(async move {
            service
                .book(request(monday(), "09:00", "09:30", "fresh@example.com"), &config, None)
                .await
        })
    };
    let second = {
        let service = Arc::clone(&service);
        let config = config.clone();
        tokio::spawn(async move {
            service
                .book(request(monday(), "10:00", "10:30", "fresh@example.com"), &config, None)
                .await
        })
    };
    let results = [first.await.unwrap(), second.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1, "{results:?}");
    assert!(results.iter().any(|r| matches!(
        r,
        Err(BookingError::QuotaExceeded {
            limit: QuotaLimit::Daily
        })
    )));
    assert_eq!(service.appointments_on(monday(), false).await.unwrap().len(), 1);
}
