use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Intervenant, IntervenantId};

/// Largest page a search may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Storage abstraction so the validator and service can be exercised in isolation.
///
/// Implementations own their connection handling: whatever they acquire for a call is
/// released before the call returns, on success and on failure.
pub trait IntervenantRepository: Send + Sync {
    /// Exact, case-sensitive lookup on the access key token.
    fn fetch_by_key(&self, token: &str) -> Result<Option<Intervenant>, RepositoryError>;
    fn fetch_by_id(&self, id: &IntervenantId) -> Result<Option<Intervenant>, RepositoryError>;
    fn search(&self, query: &SearchQuery) -> Result<Vec<Intervenant>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Sanitized directory entry. Never carries the access key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervenantSummary {
    pub id: IntervenantId,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

impl From<&Intervenant> for IntervenantSummary {
    fn from(intervenant: &Intervenant) -> Self {
        Self {
            id: intervenant.id.clone(),
            email: intervenant.email.clone(),
            firstname: intervenant.firstname.clone(),
            lastname: intervenant.lastname.clone(),
            last_modified: intervenant.last_modified,
        }
    }
}

/// Free-text, paginated intervenant search. Only built through [`SearchQuery::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    text: String,
    page: u32,
    limit: u32,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>, page: u32, limit: u32) -> Result<Self, SearchQueryError> {
        if page == 0 {
            return Err(SearchQueryError::InvalidPage);
        }
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(SearchQueryError::InvalidLimit(limit));
        }

        Ok(Self {
            text: text.into(),
            page,
            limit,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> usize {
        (self.page as usize).saturating_sub(1) * self.limit as usize
    }

    /// Case-insensitive substring match on email, first name or last name.
    pub fn matches(&self, intervenant: &Intervenant) -> bool {
        let needle = self.text.to_lowercase();
        [
            &intervenant.email,
            &intervenant.firstname,
            &intervenant.lastname,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
    }

    /// Filter, order by last name then first name, and slice out the requested page.
    pub fn apply<'a, I>(&self, records: I) -> Vec<Intervenant>
    where
        I: IntoIterator<Item = &'a Intervenant>,
    {
        let mut matching: Vec<&Intervenant> = records
            .into_iter()
            .filter(|intervenant| self.matches(intervenant))
            .collect();
        matching.sort_by(|left, right| directory_order(left, right));

        matching
            .into_iter()
            .skip(self.offset())
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

fn directory_order(left: &Intervenant, right: &Intervenant) -> Ordering {
    left.lastname
        .cmp(&right.lastname)
        .then_with(|| left.firstname.cmp(&right.firstname))
        .then_with(|| left.id.cmp(&right.id))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchQueryError {
    #[error("page numbers start at 1")]
    InvalidPage,
    #[error("page size {0} outside 1..=100")]
    InvalidLimit(u32),
}
