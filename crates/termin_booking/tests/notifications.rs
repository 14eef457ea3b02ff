
use fixtures::{monday, request, sunday_morning};
use serde_json::json;
use std::sync::{Arc, Mutex};
use termin_booking::{
    BookingService, FixedClock, LifecycleAction, LinkSigner, MemoryStores,
    NotificationDispatcher, WebhookNotificationSink,
};
use termin_common::{
    Appointment, AppointmentStatus, NotificationError, NotificationEvent, NotificationKind,
    NotificationSink,
};
use termin_config::AvailabilityConfig;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn appointment() -> Appointment {
    Appointment {
        id: 42,
        token: "abc123".to_string(),
        user_id: 7,
        date: monday(),
        time_start: chrono::NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        time_end: chrono::NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
        status: AppointmentStatus::Pending,
        appointment_type: None,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    }
}

#[tokio::test]
async fn webhook_receives_the_event_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hooks/termin"))
        .and(body_partial_json(json!({
            "kind": "new_appointment",
            "appointment_id": 42,
            "date": "2025-06-02",
            "time_start": "09:00",
            "admin_emails": ["office@example.com"]
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sink = WebhookNotificationSink::new(
        format!("{}/hooks/termin", server.uri()),
        vec!["office@example.com".to_string()],
    );
    let event = NotificationEvent::for_appointment(NotificationKind::NewAppointment, &appointment());
    sink.emit(&event).await.expect("webhook accepted the event");
}

#[tokio::test]
async fn webhook_errors_are_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sink = WebhookNotificationSink::new(server.uri(), Vec::new());
    let event =
        NotificationEvent::for_appointment(NotificationKind::AppointmentCancelled, &appointment());
    let err = sink.emit(&event).await.unwrap_err();
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn failing_sink_does_not_fail_the_booking() {
    struct Broken;

    #[async_trait::async_trait]
    impl NotificationSink for Broken {
        async fn emit(&self, _event: &NotificationEvent) -> Result<(), NotificationError> {
            Err(NotificationError("smtp down".to_string()))
        }
    }

    let config = AvailabilityConfig::default();
    let service = fixtures::memory_service_with_sink(config.clone(), Arc::new(Broken));
    service
        .book(request(monday(), "09:00", "09:30", "n@example.com"), &config, None)
        .await
        .expect("delivery failures are logged only");
    fixtures::settle().await;
}

#[derive(Default)]
struct Capture(Mutex<Vec<NotificationEvent>>);

#[async_trait::async_trait]
impl NotificationSink for Capture {
    async fn emit(&self, event: &NotificationEvent) -> Result<(), NotificationError> {
        self.0.lock().unwrap().push(event.clone());
        Ok(())
    }
}

#[tokio::test]
async fn new_bookings_carry_signed_admin_links() {
    let capture = Arc::new(Capture::default());
    let signer = LinkSigner::new("link-secret", "https://termin.example/").unwrap();
    let config = AvailabilityConfig::default();
    let service = BookingService::new(
        MemoryStores::new().into(),
        Arc::new(FixedClock(sunday_morning())),
        NotificationDispatcher::new(capture.clone()),
        Some(signer.clone()),
        config.clone(),
    );

    let receipt = service
        .book(request(monday(), "09:00", "09:30", "links@example.com"), &config, None)
        .await
        .unwrap();
    fixtures::settle().await;

    let events = capture.0.lock().unwrap().clone();
    assert_eq!(events.len(), 1);
    let event = &events[0];
    assert_eq!(event.user_email.as_deref(), Some("links@example.com"));
    assert_eq!(event.user_name.as_deref(), Some("Erika Mustermann"));
    assert_eq!(
        event.confirm_url.as_deref(),
        Some(signer.url(LifecycleAction::Confirm, receipt.appointment_id).as_str())
    );
    assert!(event
        .cancel_url
        .as_deref()
        .is_some_and(|url| url.starts_with("https://termin.example/api/links/cancel/")));
}
