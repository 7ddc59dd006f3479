use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::{NewClient, NewVisit, Organization, Reservation, DEFAULT_VISIT_MINUTES};
use crate::services::clock::Clock;
use crate::services::notify::{Notification, NotificationQueue};
use crate::services::repository::{ClientRegistry, OrganizationDirectory, VisitLedger};
use crate::services::slots::{self, SlotRejection};

const MAX_DURATION_MINUTES: i32 = 24 * 60;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Rejected(#[from] SlotRejection),

    #[error("This time slot is no longer available")]
    Conflict,

    #[error("organization not found: {0}")]
    OrganizationNotFound(String),

    #[error("{0}")]
    Persistence(String),
}

impl BookingError {
    pub fn status(&self) -> StatusCode {
        match self {
            BookingError::Validation(_) => StatusCode::BAD_REQUEST,
            BookingError::Rejected(SlotRejection::BookingDisabled) => StatusCode::FORBIDDEN,
            BookingError::Rejected(_) => StatusCode::BAD_REQUEST,
            BookingError::Conflict => StatusCode::CONFLICT,
            BookingError::OrganizationNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), axum::Json(body)).into_response()
    }
}

fn persistence(e: anyhow::Error) -> BookingError {
    tracing::error!(error = %e, "booking persistence failure");
    BookingError::Persistence(format!("{e:#}"))
}

/// Body of `POST /booking/{slug}/book`. Everything defaults so that missing
/// fields surface as validation messages instead of extractor rejections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BookingRequest {
    pub service_id: Option<String>,
    pub service_name: Option<String>,
    pub client_name: String,
    pub client_phone: String,
    pub client_email: Option<String>,
    pub date: String,
    pub time: String,
    pub duration_minutes: Option<i32>,
    pub price: Option<serde_json::Value>,
    pub notes: Option<String>,
    pub locale: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub booking_id: String,
    pub message: String,
    pub scheduled_at: String,
    pub service_name: String,
    pub organization_name: String,
}

enum ServiceRef {
    Id(String),
    Name(String),
}

struct ValidatedRequest {
    service: ServiceRef,
    client_name: String,
    client_phone: String,
    client_email: Option<String>,
    start: NaiveDateTime,
    duration_minutes: Option<i32>,
    price: Option<String>,
    notes: String,
    locale: Option<String>,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

pub fn parse_date(s: &str) -> Result<NaiveDate, BookingError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| BookingError::Validation(format!("invalid date: {s:?}, expected YYYY-MM-DD")))
}

fn parse_time(s: &str) -> Result<NaiveTime, BookingError> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|_| BookingError::Validation(format!("invalid time: {s:?}, expected HH:MM")))
}

pub fn validate_duration(minutes: Option<i32>) -> Result<Option<i32>, BookingError> {
    match minutes {
        Some(m) if !(1..=MAX_DURATION_MINUTES).contains(&m) => Err(BookingError::Validation(
            format!("duration_minutes must be between 1 and {MAX_DURATION_MINUTES}"),
        )),
        other => Ok(other),
    }
}

/// Numbers and numeric strings are stored in their textual form.
fn coerce_price(value: Option<&serde_json::Value>) -> Result<Option<String>, BookingError> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_json::Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else if s.parse::<f64>().is_ok() {
                Ok(Some(s.to_string()))
            } else {
                Err(BookingError::Validation(format!("price must be numeric, got {s:?}")))
            }
        }
        Some(other) => Err(BookingError::Validation(format!(
            "price must be a number, got {other}"
        ))),
    }
}

impl BookingRequest {
    fn validate(&self) -> Result<ValidatedRequest, BookingError> {
        let service = match (
            non_empty(self.service_id.as_deref()),
            non_empty(self.service_name.as_deref()),
        ) {
            (Some(id), _) => ServiceRef::Id(id),
            (None, Some(name)) => ServiceRef::Name(name),
            (None, None) => {
                return Err(BookingError::Validation(
                    "service_id or service_name is required".to_string(),
                ))
            }
        };

        let client_name = non_empty(Some(self.client_name.as_str()))
            .ok_or_else(|| BookingError::Validation("client_name is required".to_string()))?;
        let client_phone = non_empty(Some(self.client_phone.as_str()))
            .ok_or_else(|| BookingError::Validation("client_phone is required".to_string()))?;

        if self.date.trim().is_empty() || self.time.trim().is_empty() {
            return Err(BookingError::Validation(
                "date and time are required".to_string(),
            ));
        }
        let start = parse_date(&self.date)?.and_time(parse_time(&self.time)?);

        Ok(ValidatedRequest {
            service,
            client_name,
            client_phone,
            client_email: non_empty(self.client_email.as_deref()),
            start,
            duration_minutes: validate_duration(self.duration_minutes)?,
            price: coerce_price(self.price.as_ref())?,
            notes: self.notes.as_deref().map(str::trim).unwrap_or_default().to_string(),
            locale: non_empty(self.locale.as_deref()),
        })
    }
}

/// Decides whether a requested slot can be booked and commits it.
pub struct BookingEngine {
    directory: Arc<dyn OrganizationDirectory>,
    clients: Arc<dyn ClientRegistry>,
    visits: Arc<dyn VisitLedger>,
    notifications: NotificationQueue,
    clock: Arc<dyn Clock>,
    slot_step_minutes: i64,
}

impl BookingEngine {
    pub fn new(
        directory: Arc<dyn OrganizationDirectory>,
        clients: Arc<dyn ClientRegistry>,
        visits: Arc<dyn VisitLedger>,
        notifications: NotificationQueue,
        clock: Arc<dyn Clock>,
        slot_step_minutes: i64,
    ) -> Self {
        Self {
            directory,
            clients,
            visits,
            notifications,
            clock,
            slot_step_minutes,
        }
    }

    pub async fn organization(&self, slug: &str) -> Result<Organization, BookingError> {
        self.directory
            .find_by_slug(slug)
            .await
            .map_err(persistence)?
            .ok_or_else(|| BookingError::OrganizationNotFound(slug.to_string()))
    }

    /// Current wall-clock time at the organization.
    pub fn local_now(&self, org: &Organization) -> NaiveDateTime {
        (self.clock.now() + Duration::minutes(org.utc_offset_minutes as i64)).naive_utc()
    }

    pub async fn book(
        &self,
        slug: &str,
        request: BookingRequest,
    ) -> Result<BookingConfirmation, BookingError> {
        let req = request.validate()?;
        let org = self.organization(slug).await?;

        let (service_name, duration_minutes, price) = match &req.service {
            ServiceRef::Name(name) => (
                name.clone(),
                req.duration_minutes.unwrap_or(DEFAULT_VISIT_MINUTES),
                req.price.clone(),
            ),
            ServiceRef::Id(id) => {
                let service = self
                    .directory
                    .find_service(&org.id, id)
                    .await
                    .map_err(persistence)?
                    .ok_or_else(|| BookingError::Validation(format!("unknown service: {id}")))?;
                (
                    service.name,
                    req.duration_minutes.unwrap_or(service.duration_minutes),
                    req.price.clone().or(service.price),
                )
            }
        };

        let now = self.local_now(&org);
        if let Err(rejection) = slots::validate_slot(&req.start, &org.booking_settings, &now) {
            tracing::info!(slug = %slug, start = %req.start, reason = %rejection, "booking rejected");
            return Err(rejection.into());
        }

        let end = req.start + Duration::minutes(duration_minutes as i64);
        let conflicts = self
            .visits
            .find_overlapping(&org.id, req.start, end)
            .await
            .map_err(persistence)?;
        if !conflicts.is_empty() {
            tracing::info!(slug = %slug, start = %req.start, conflicts = conflicts.len(), "slot already taken");
            return Err(BookingError::Conflict);
        }

        let client_id = self
            .resolve_client(&org.id, &req.client_name, &req.client_phone, req.client_email.as_deref())
            .await;

        let new_visit = NewVisit {
            organization_id: org.id.clone(),
            client_id,
            service_name,
            scheduled_at: req.start,
            duration_minutes,
            price,
            notes: req.notes,
        };

        let visit = match self.visits.create_if_free(new_visit).await.map_err(persistence)? {
            Reservation::Created(visit) => visit,
            Reservation::Conflict(_) => {
                tracing::info!(slug = %slug, start = %req.start, "slot taken by a concurrent booking");
                return Err(BookingError::Conflict);
            }
        };

        tracing::info!(
            slug = %slug,
            visit_id = %visit.id,
            client_id = ?visit.client_id,
            scheduled_at = %visit.scheduled_at,
            "booking created"
        );

        if let Some(chat_id) = &org.telegram_chat_id {
            self.notifications.enqueue(Notification {
                channel: chat_id.clone(),
                message: format!(
                    "New booking\nClient: {} ({})\nService: {}\nDate: {}\nTime: {}",
                    req.client_name,
                    req.client_phone,
                    visit.service_name,
                    visit.scheduled_at.format("%Y-%m-%d"),
                    visit.scheduled_at.format("%H:%M"),
                ),
            });
        }

        Ok(BookingConfirmation {
            booking_id: visit.id,
            message: org
                .booking_settings
                .confirmation_for(req.locale.as_deref()),
            scheduled_at: visit.scheduled_at.format("%Y-%m-%d %H:%M").to_string(),
            service_name: visit.service_name,
            organization_name: org.display_name,
        })
    }

    /// Find-or-create by phone. Failures degrade to an unlinked visit.
    async fn resolve_client(
        &self,
        organization_id: &str,
        full_name: &str,
        phone: &str,
        email: Option<&str>,
    ) -> Option<String> {
        match self.clients.find_by_phone(organization_id, phone).await {
            Ok(Some(client)) => return Some(client.id),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(error = %e, "client lookup failed, booking without client");
                return None;
            }
        }

        let new_client = NewClient::from_booking(full_name, phone, email);
        match self.clients.create(organization_id, new_client).await {
            Ok(client) => {
                tracing::info!(client_id = %client.id, "created client from public booking");
                Some(client.id)
            }
            Err(e) => {
                // Phone is unique per organization; a concurrent booking may have won the insert.
                match self.clients.find_by_phone(organization_id, phone).await {
                    Ok(Some(client)) => {
                        tracing::info!(client_id = %client.id, "client created concurrently, reusing it");
                        Some(client.id)
                    }
                    _ => {
                        tracing::warn!(error = %e, "client creation failed, booking without client");
                        None
                    }
                }
            }
        }
    }

    /// Free start times on `date` for a visit of `duration_minutes`.
    pub async fn available_slots(
        &self,
        slug: &str,
        date: NaiveDate,
        duration_minutes: Option<i32>,
    ) -> Result<Vec<NaiveDateTime>, BookingError> {
        let org = self.organization(slug).await?;
        if !org.booking_settings.enabled {
            return Err(SlotRejection::BookingDisabled.into());
        }

        let duration = validate_duration(duration_minutes)?.unwrap_or(DEFAULT_VISIT_MINUTES);
        let day_start = date.and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1) + Duration::minutes(duration as i64);

        let taken = self
            .visits
            .find_overlapping(&org.id, day_start, day_end)
            .await
            .map_err(persistence)?;

        Ok(slots::free_slots(
            date,
            duration,
            self.slot_step_minutes,
            &org.booking_settings,
            &self.local_now(&org),
            &taken,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, SqliteStore};
    use crate::db::queries;
    use crate::models::{BookingSettings, Client, DayHours, Service, Visit};
    use crate::services::clock::FixedClock;
    use crate::services::notify::{LogNotifier, RetryPolicy};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    struct FailingClients;

    #[async_trait]
    impl ClientRegistry for FailingClients {
        async fn find_by_phone(&self, _: &str, _: &str) -> anyhow::Result<Option<Client>> {
            Ok(None)
        }

        async fn create(&self, _: &str, _: NewClient) -> anyhow::Result<Client> {
            anyhow::bail!("clients table is read-only")
        }
    }

    fn settings() -> BookingSettings {
        let mut settings = BookingSettings {
            enabled: true,
            ..BookingSettings::default()
        };
        settings.working_hours.days.insert(
            0,
            Some(DayHours {
                open: "09:00".to_string(),
                close: "18:00".to_string(),
            }),
        );
        settings
    }

    /// Fails the overlap lookup or the final commit, delegating everything else.
    struct BrokenLedger {
        store: SqliteStore,
        fail_lookup: bool,
    }

    #[async_trait]
    impl VisitLedger for BrokenLedger {
        async fn find_overlapping(
            &self,
            organization_id: &str,
            start: NaiveDateTime,
            end: NaiveDateTime,
        ) -> anyhow::Result<Vec<Visit>> {
            if self.fail_lookup {
                anyhow::bail!("disk I/O error");
            }
            self.store.find_overlapping(organization_id, start, end).await
        }

        async fn create(&self, visit: NewVisit) -> anyhow::Result<Visit> {
            VisitLedger::create(&self.store, visit).await
        }

        async fn create_if_free(&self, _: NewVisit) -> anyhow::Result<Reservation> {
            anyhow::bail!("database is locked")
        }
    }

    /// Misses the client on the first lookup, as if another booking inserted
    /// the same phone in between.
    struct RacingClients {
        store: SqliteStore,
        lookups: Mutex<u32>,
    }

    #[async_trait]
    impl ClientRegistry for RacingClients {
        async fn find_by_phone(&self, org_id: &str, phone: &str) -> anyhow::Result<Option<Client>> {
            {
                let mut lookups = self.lookups.lock().unwrap();
                *lookups += 1;
                if *lookups == 1 {
                    return Ok(None);
                }
            }
            self.store.find_by_phone(org_id, phone).await
        }

        async fn create(&self, org_id: &str, client: NewClient) -> anyhow::Result<Client> {
            ClientRegistry::create(&self.store, org_id, client).await
        }
    }

    fn seeded_db() -> Arc<Mutex<rusqlite::Connection>> {
        let conn = Arc::new(Mutex::new(db::init_db(":memory:").unwrap()));
        {
            let db = conn.lock().unwrap();
            queries::save_organization(
                &db,
                &Organization {
                    id: "org-1".to_string(),
                    slug: "demo-salon".to_string(),
                    display_name: "Demo Salon".to_string(),
                    booking_settings: settings(),
                    telegram_chat_id: None,
                    utc_offset_minutes: 0,
                },
            )
            .unwrap();
            queries::create_service(
                &db,
                &Service {
                    id: "svc-color".to_string(),
                    organization_id: "org-1".to_string(),
                    name: "Coloring".to_string(),
                    duration_minutes: 90,
                    price: Some("250".to_string()),
                },
            )
            .unwrap();
        }
        conn
    }

    fn engine(
        conn: &Arc<Mutex<rusqlite::Connection>>,
        clients: Option<Arc<dyn ClientRegistry>>,
        visits: Option<Arc<dyn VisitLedger>>,
    ) -> BookingEngine {
        let store = Arc::new(SqliteStore::new(conn.clone()));
        let (queue, _) = NotificationQueue::spawn(Arc::new(LogNotifier), RetryPolicy::default(), 8);
        // Wednesday 2025-06-11 08:00 UTC
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 6, 11, 8, 0, 0).unwrap()));
        BookingEngine::new(
            store.clone(),
            clients.unwrap_or_else(|| store.clone() as Arc<dyn ClientRegistry>),
            visits.unwrap_or_else(|| store as Arc<dyn VisitLedger>),
            queue,
            clock,
            30,
        )
    }

    fn setup(clients: Option<Arc<dyn ClientRegistry>>) -> (BookingEngine, Arc<Mutex<rusqlite::Connection>>) {
        let conn = seeded_db();
        (engine(&conn, clients, None), conn)
    }

    fn counts(conn: &Arc<Mutex<rusqlite::Connection>>) -> (usize, usize) {
        let db = conn.lock().unwrap();
        (
            queries::list_clients(&db, "org-1", 100).unwrap().len(),
            queries::list_visits(&db, "org-1", None, 100).unwrap().len(),
        )
    }

    fn request(date: &str, time: &str) -> BookingRequest {
        BookingRequest {
            service_name: Some("Haircut".to_string()),
            client_name: "Dana Levi".to_string(),
            client_phone: "0501234567".to_string(),
            date: date.to_string(),
            time: time.to_string(),
            ..BookingRequest::default()
        }
    }

    #[tokio::test]
    async fn test_missing_service_is_validation_error() {
        let (engine, _) = setup(None);
        let mut req = request("2025-06-15", "10:00");
        req.service_name = None;
        let err = engine.book("demo-salon", req).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_validation_runs_before_lookup() {
        let (engine, _) = setup(None);
        let err = engine
            .book("does-not-exist", request("2025-06-15", "25:99"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_service_id_fills_duration_and_price() {
        let (engine, conn) = setup(None);
        let mut req = request("2025-06-15", "10:00");
        req.service_name = None;
        req.service_id = Some("svc-color".to_string());

        let confirmation = engine.book("demo-salon", req).await.unwrap();
        assert_eq!(confirmation.service_name, "Coloring");

        let db = conn.lock().unwrap();
        let visit = queries::get_visit(&db, &confirmation.booking_id).unwrap().unwrap();
        assert_eq!(visit.duration_minutes, 90);
        assert_eq!(visit.price.as_deref(), Some("250"));
    }

    #[tokio::test]
    async fn test_unknown_service_id_rejected() {
        let (engine, _) = setup(None);
        let mut req = request("2025-06-15", "10:00");
        req.service_id = Some("svc-missing".to_string());
        let err = engine.book("demo-salon", req).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_price_coercion() {
        let (engine, conn) = setup(None);
        let mut req = request("2025-06-15", "10:00");
        req.price = Some(serde_json::json!(120.5));
        let confirmation = engine.book("demo-salon", req).await.unwrap();

        let db = conn.lock().unwrap();
        let visit = queries::get_visit(&db, &confirmation.booking_id).unwrap().unwrap();
        assert_eq!(visit.price.as_deref(), Some("120.5"));
        assert_eq!(visit.duration_minutes, DEFAULT_VISIT_MINUTES);
        assert_eq!(visit.notes, "");
    }

    #[tokio::test]
    async fn test_non_numeric_price_rejected() {
        let (engine, _) = setup(None);
        let mut req = request("2025-06-15", "10:00");
        req.price = Some(serde_json::json!("cheap"));
        let err = engine.book("demo-salon", req).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn test_overlap_with_earlier_long_visit_conflicts() {
        let (engine, _) = setup(None);
        let mut first = request("2025-06-15", "09:00");
        first.duration_minutes = Some(120);
        engine.book("demo-salon", first).await.unwrap();

        let err = engine
            .book("demo-salon", request("2025-06-15", "10:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Conflict));
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_client_creation_failure_is_not_fatal() {
        let (engine, conn) = setup(Some(Arc::new(FailingClients)));
        let confirmation = engine
            .book("demo-salon", request("2025-06-15", "10:00"))
            .await
            .unwrap();

        let db = conn.lock().unwrap();
        let visit = queries::get_visit(&db, &confirmation.booking_id).unwrap().unwrap();
        assert!(visit.client_id.is_none());
    }

    #[tokio::test]
    async fn test_conflict_lookup_failure_is_fatal() {
        let conn = seeded_db();
        let ledger = Arc::new(BrokenLedger {
            store: SqliteStore::new(conn.clone()),
            fail_lookup: true,
        });
        let engine = engine(&conn, None, Some(ledger));

        let err = engine
            .book("demo-salon", request("2025-06-15", "10:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Persistence(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("disk I/O error"));
        // Fails before the client is resolved
        assert_eq!(counts(&conn), (0, 0));
    }

    #[tokio::test]
    async fn test_commit_failure_surfaces_persistence_error() {
        let conn = seeded_db();
        let ledger = Arc::new(BrokenLedger {
            store: SqliteStore::new(conn.clone()),
            fail_lookup: false,
        });
        let engine = engine(&conn, None, Some(ledger));

        let err = engine
            .book("demo-salon", request("2025-06-15", "10:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Persistence(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("database is locked"));
        assert_eq!(counts(&conn).1, 0);
    }

    #[tokio::test]
    async fn test_client_inserted_concurrently_is_reused() {
        let conn = seeded_db();
        let existing = {
            let db = conn.lock().unwrap();
            queries::create_client(
                &db,
                "org-1",
                &NewClient::from_booking("Dana Levi", "0501234567", None),
            )
            .unwrap()
        };
        let clients = Arc::new(RacingClients {
            store: SqliteStore::new(conn.clone()),
            lookups: Mutex::new(0),
        });
        let engine = engine(&conn, Some(clients), None);

        let confirmation = engine
            .book("demo-salon", request("2025-06-15", "10:00"))
            .await
            .unwrap();

        assert_eq!(counts(&conn), (1, 1));
        let db = conn.lock().unwrap();
        let visit = queries::get_visit(&db, &confirmation.booking_id).unwrap().unwrap();
        assert_eq!(visit.client_id.as_deref(), Some(existing.id.as_str()));
    }

    #[tokio::test]
    async fn test_existing_client_reused() {
        let (engine, conn) = setup(None);
        engine
            .book("demo-salon", request("2025-06-15", "10:00"))
            .await
            .unwrap();
        engine
            .book("demo-salon", request("2025-06-15", "12:00"))
            .await
            .unwrap();

        let db = conn.lock().unwrap();
        let clients = queries::list_clients(&db, "org-1", 10).unwrap();
        assert_eq!(clients.len(), 1);
        let visits = queries::list_visits(&db, "org-1", None, 10).unwrap();
        assert_eq!(visits.len(), 2);
        assert!(visits
            .iter()
            .all(|v| v.client_id.as_deref() == Some(clients[0].id.as_str())));
    }

    #[test]
    fn test_disabled_is_forbidden() {
        let err = BookingError::Rejected(SlotRejection::BookingDisabled);
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
        let err = BookingError::Rejected(SlotRejection::InPast);
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_available_slots_excludes_booked_time() {
        let (engine, _) = setup(None);
        engine
            .book("demo-salon", request("2025-06-15", "10:00"))
            .await
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 6, 15).unwrap();
        let slots = engine
            .available_slots("demo-salon", date, Some(60))
            .await
            .unwrap();
        let times: Vec<String> = slots.iter().map(|s| s.format("%H:%M").to_string()).collect();

        assert_eq!(times.first().map(String::as_str), Some("09:00"));
        assert!(!times.contains(&"09:30".to_string()));
        assert!(!times.contains(&"10:00".to_string()));
        assert!(!times.contains(&"10:30".to_string()));
        assert!(times.contains(&"11:00".to_string()));
        assert_eq!(times.last().map(String::as_str), Some("17:30"));
    }
}
