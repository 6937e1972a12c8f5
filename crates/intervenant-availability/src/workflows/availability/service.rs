use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error};

use super::access::{AccessError, AccessKeyValidator, KeyCheck, KeyError};
use super::domain::{Engagement, Intervenant, IntervenantId, WeekId};
use super::evaluation::{evaluate, RequirementError, ValidationResult, WorkweekRequirements};
use super::repository::{IntervenantRepository, RepositoryError, SearchQuery};

/// Fresh availability check for one key holder. Never cached or persisted.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    pub intervenant: Intervenant,
    pub expected_weeks: Vec<WeekId>,
    pub result: ValidationResult,
}

/// Service composing the key validator, the requirement source and the checker for
/// a single engagement.
pub struct AvailabilityService<R, P> {
    validator: AccessKeyValidator<R>,
    repository: Arc<R>,
    requirements: Arc<P>,
    engagement: Engagement,
}

impl<R, P> AvailabilityService<R, P>
where
    R: IntervenantRepository + 'static,
    P: WorkweekRequirements + 'static,
{
    pub fn new(repository: Arc<R>, requirements: Arc<P>, engagement: Engagement) -> Self {
        Self {
            validator: AccessKeyValidator::new(repository.clone()),
            repository,
            requirements,
            engagement,
        }
    }

    pub fn engagement(&self) -> Engagement {
        self.engagement
    }

    /// Classify a key the way the key lookup endpoint reports it.
    ///
    /// Unknown and expired keys become an invalid [`KeyCheck`]; storage faults propagate.
    pub fn check_key(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<KeyCheck, AvailabilityServiceError> {
        match self.validator.validate(token, now) {
            Ok(intervenant) => Ok(KeyCheck::from_outcome(Ok(intervenant))),
            Err(AccessError::Key(reason)) => Ok(KeyCheck::from_outcome(Err(reason))),
            Err(AccessError::Repository(err)) => Err(err.into()),
        }
    }

    /// Validate the key, then check the holder's availability against the engagement.
    pub fn report(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AvailabilityReport, AvailabilityServiceError> {
        let intervenant = self.validator.validate(token, now)?;

        let expected_weeks = self
            .requirements
            .expected_weeks(&self.engagement)
            .inspect_err(|err| error!(error = %err, "expected weeks unavailable"))?;

        let requirements = &self.requirements;
        let result = evaluate(&intervenant, &expected_weeks, |week| {
            requirements.required_hours(week)
        });

        debug!(
            intervenant_id = %intervenant.id,
            expected = expected_weeks.len(),
            missing = result.missing_weeks.len(),
            insufficient = result.insufficient_hours.len(),
            "availability evaluated"
        );

        Ok(AvailabilityReport {
            intervenant,
            expected_weeks,
            result,
        })
    }

    pub fn get(&self, id: &IntervenantId) -> Result<Intervenant, AvailabilityServiceError> {
        let intervenant = self
            .repository
            .fetch_by_id(id)
            .inspect_err(|err| error!(error = %err, intervenant_id = %id, "intervenant lookup failed"))?
            .ok_or(RepositoryError::NotFound)?;
        Ok(intervenant)
    }

    pub fn search(&self, query: &SearchQuery) -> Result<Vec<Intervenant>, AvailabilityServiceError> {
        let records = self
            .repository
            .search(query)
            .inspect_err(|err| error!(error = %err, "intervenant search failed"))?;
        Ok(records)
    }
}

/// Error raised by the availability service.
#[derive(Debug, thiserror::Error)]
pub enum AvailabilityServiceError {
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Requirements(#[from] RequirementError),
}

impl From<AccessError> for AvailabilityServiceError {
    fn from(value: AccessError) -> Self {
        match value {
            AccessError::Key(reason) => Self::Key(reason),
            AccessError::Repository(err) => Self::Repository(err),
        }
    }
}
