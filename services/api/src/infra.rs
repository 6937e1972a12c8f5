use chrono::{DateTime, Utc};
use intervenant_availability::workflows::availability::{
    ImportError, Intervenant, IntervenantId, IntervenantImporter, IntervenantRepository,
    RepositoryError, SearchQuery,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryIntervenantRepository {
    records: Arc<Mutex<HashMap<IntervenantId, Intervenant>>>,
}

impl InMemoryIntervenantRepository {
    pub(crate) fn from_records(records: Vec<Intervenant>) -> Self {
        let map = records
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();
        Self {
            records: Arc::new(Mutex::new(map)),
        }
    }

    /// Load records from a JSON seed file, or start empty when none is configured.
    pub(crate) fn from_seed(path: Option<&Path>) -> Result<Self, ImportError> {
        match path {
            Some(path) => Ok(Self::from_records(IntervenantImporter::from_path(path)?)),
            None => Ok(Self::default()),
        }
    }

    pub(crate) fn record_count(&self) -> Result<usize, RepositoryError> {
        Ok(self.guard()?.len())
    }

    fn guard(&self) -> Result<MutexGuard<'_, HashMap<IntervenantId, Intervenant>>, RepositoryError> {
        self.records
            .lock()
            .map_err(|_| RepositoryError::Unavailable("intervenant store lock poisoned".to_string()))
    }
}

impl IntervenantRepository for InMemoryIntervenantRepository {
    fn fetch_by_key(&self, token: &str) -> Result<Option<Intervenant>, RepositoryError> {
        let guard = self.guard()?;
        Ok(guard
            .values()
            .find(|record| record.key.token == token)
            .cloned())
    }

    fn fetch_by_id(&self, id: &IntervenantId) -> Result<Option<Intervenant>, RepositoryError> {
        let guard = self.guard()?;
        Ok(guard.get(id).cloned())
    }

    fn search(&self, query: &SearchQuery) -> Result<Vec<Intervenant>, RepositoryError> {
        let guard = self.guard()?;
        Ok(query.apply(guard.values()))
    }
}

pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw.trim())
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| format!("failed to parse '{raw}' as an RFC 3339 timestamp ({err})"))
}

#[cfg(test)]
pub(crate) const SAMPLE_SEED: &str = r#"[
    {
        "id": "int-1",
        "email": "camille.durand@formation.example",
        "firstname": "Camille",
        "lastname": "Durand",
        "key": { "token": "k-camille", "expires_at": "2100-01-01T00:00:00Z" },
        "availability": {
            "2024-W10": [{ "start_time": "08:00", "end_time": "12:00" }]
        },
        "last_modified": "2024-03-04T09:30:00Z"
    }
]"#;
