use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::availability::domain::{
    AccessKey, AvailabilityMapping, Engagement, Intervenant, IntervenantId, TimeSlot, WeekId,
};
use crate::workflows::availability::evaluation::WorkweekCalendar;
use crate::workflows::availability::repository::{
    IntervenantRepository, RepositoryError, SearchQuery,
};
use crate::workflows::availability::{availability_router, AvailabilityService};

pub(super) const REQUIRED_HOURS: f64 = 20.0;

pub(super) fn instant(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("valid instant")
}

pub(super) fn week(label: &str) -> WeekId {
    label.parse().expect("valid week label")
}

pub(super) fn slot(start: &str, end: &str) -> TimeSlot {
    TimeSlot::parse(start, end).expect("valid slot")
}

/// 2024-03-04 (Monday of W10) through 2024-03-15 (Friday of W11).
pub(super) fn engagement() -> Engagement {
    Engagement::new(
        NaiveDate::from_ymd_opt(2024, 3, 4).expect("valid"),
        NaiveDate::from_ymd_opt(2024, 3, 15).expect("valid"),
    )
    .expect("valid engagement")
}

pub(super) fn calendar() -> WorkweekCalendar {
    WorkweekCalendar::new(REQUIRED_HOURS).expect("valid hours")
}

pub(super) fn intervenant(
    id: &str,
    token: &str,
    expires_at: DateTime<Utc>,
    availability: AvailabilityMapping,
) -> Intervenant {
    Intervenant {
        id: IntervenantId(id.to_string()),
        email: format!("{id}@formation.example"),
        firstname: "Camille".to_string(),
        lastname: "Durand".to_string(),
        key: AccessKey {
            token: token.to_string(),
            expires_at,
        },
        availability,
        last_modified: None,
    }
}

/// One four-hour morning in 2024-W10 and nothing else.
pub(super) fn partial_availability() -> AvailabilityMapping {
    let mut availability = AvailabilityMapping::new();
    availability.insert(week("2024-W10"), vec![slot("08:00", "12:00")]);
    availability
}

pub(super) fn full_availability() -> AvailabilityMapping {
    let mut availability = AvailabilityMapping::new();
    for label in ["2024-W10", "2024-W11"] {
        availability.insert(
            week(label),
            vec![
                slot("08:00", "12:00"),
                slot("13:00", "17:00"),
                slot("08:00", "12:00"),
                slot("13:00", "17:00"),
                slot("09:00", "13:00"),
            ],
        );
    }
    availability
}

#[derive(Default)]
pub(super) struct MemoryRepository {
    records: Mutex<HashMap<IntervenantId, Intervenant>>,
    lookups: AtomicUsize,
}

impl MemoryRepository {
    pub(super) fn with(records: Vec<Intervenant>) -> Self {
        let repository = Self::default();
        for record in records {
            repository.put(record);
        }
        repository
    }

    pub(super) fn put(&self, record: Intervenant) {
        self.records
            .lock()
            .expect("repository mutex poisoned")
            .insert(record.id.clone(), record);
    }

    pub(super) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl IntervenantRepository for MemoryRepository {
    fn fetch_by_key(&self, token: &str) -> Result<Option<Intervenant>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .find(|record| record.key.token == token)
            .cloned())
    }

    fn fetch_by_id(&self, id: &IntervenantId) -> Result<Option<Intervenant>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Intervenant>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(query.apply(guard.values()))
    }
}

pub(super) struct UnavailableRepository;

impl IntervenantRepository for UnavailableRepository {
    fn fetch_by_key(&self, _token: &str) -> Result<Option<Intervenant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_by_id(&self, _id: &IntervenantId) -> Result<Option<Intervenant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn search(&self, _query: &SearchQuery) -> Result<Vec<Intervenant>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn build_service(
    records: Vec<Intervenant>,
) -> (
    AvailabilityService<MemoryRepository, WorkweekCalendar>,
    Arc<MemoryRepository>,
) {
    let repository = Arc::new(MemoryRepository::with(records));
    let service = AvailabilityService::new(
        repository.clone(),
        Arc::new(calendar()),
        engagement(),
    );
    (service, repository)
}

pub(super) fn unavailable_service() -> AvailabilityService<UnavailableRepository, WorkweekCalendar>
{
    AvailabilityService::new(
        Arc::new(UnavailableRepository),
        Arc::new(calendar()),
        engagement(),
    )
}

pub(super) fn availability_router_with_service(
    service: AvailabilityService<MemoryRepository, WorkweekCalendar>,
) -> axum::Router {
    availability_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
