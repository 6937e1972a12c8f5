use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, warn};

use super::domain::Intervenant;
use super::repository::{IntervenantRepository, RepositoryError};

pub const UNKNOWN_KEY_MESSAGE: &str = "Clé inconnue";
pub const EXPIRED_KEY_MESSAGE: &str = "Clé expirée";

/// User-facing reasons a presented key is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum KeyError {
    #[error("Clé inconnue")]
    Unknown,
    #[error("Clé expirée")]
    Expired,
}

impl KeyError {
    pub const fn message(self) -> &'static str {
        match self {
            KeyError::Unknown => UNKNOWN_KEY_MESSAGE,
            KeyError::Expired => EXPIRED_KEY_MESSAGE,
        }
    }
}

/// Failure while validating a key: either a classified refusal or a storage fault.
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Resolves access keys to intervenant records.
pub struct AccessKeyValidator<R> {
    repository: Arc<R>,
}

impl<R> AccessKeyValidator<R>
where
    R: IntervenantRepository,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Look up `token` and check it against `now`.
    ///
    /// The token is matched verbatim. The returned record is exactly what the
    /// repository produced.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<Intervenant, AccessError> {
        if token.is_empty() {
            return Err(KeyError::Unknown.into());
        }

        let intervenant = self
            .repository
            .fetch_by_key(token)
            .inspect_err(|err| error!(error = %err, "access key lookup failed"))?
            .ok_or(KeyError::Unknown)?;

        Ok(check_expiry(intervenant, now)?)
    }
}

/// Reject the record when its key expired strictly before `now`.
pub fn check_expiry(intervenant: Intervenant, now: DateTime<Utc>) -> Result<Intervenant, KeyError> {
    if intervenant.key.is_expired_at(now) {
        warn!(
            intervenant_id = %intervenant.id,
            expired_at = %intervenant.key.expires_at,
            "access key expired"
        );
        return Err(KeyError::Expired);
    }

    debug!(intervenant_id = %intervenant.id, "access key accepted");
    Ok(intervenant)
}

/// `{valid, intervenant?, message?}` view of a key lookup.
#[derive(Debug, Clone, Serialize)]
pub struct KeyCheck {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intervenant: Option<Intervenant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl KeyCheck {
    pub fn from_outcome(outcome: Result<Intervenant, KeyError>) -> Self {
        match outcome {
            Ok(intervenant) => Self {
                valid: true,
                intervenant: Some(intervenant),
                message: None,
            },
            Err(reason) => Self {
                valid: false,
                intervenant: None,
                message: Some(reason.message()),
            },
        }
    }
}
