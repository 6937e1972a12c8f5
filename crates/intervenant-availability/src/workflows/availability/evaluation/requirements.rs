use std::collections::BTreeMap;

use super::super::domain::{Engagement, WeekId};

/// Source of the weeks an engagement expects and the hours each of them requires.
pub trait WorkweekRequirements: Send + Sync {
    /// Expected weeks in chronological order, without duplicates.
    fn expected_weeks(&self, engagement: &Engagement) -> Result<Vec<WeekId>, RequirementError>;
    fn required_hours(&self, week: &WeekId) -> f64;
}

#[derive(Debug, thiserror::Error)]
pub enum RequirementError {
    #[error("required hours must be finite and non-negative (found {0})")]
    InvalidHours(f64),
    #[error("requirement source unavailable: {0}")]
    Unavailable(String),
}

/// Calendar-driven requirements: every ISO week of the engagement, with a weekly
/// minimum that individual weeks may override.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkweekCalendar {
    default_hours: f64,
    overrides: BTreeMap<WeekId, f64>,
}

impl WorkweekCalendar {
    pub fn new(default_hours: f64) -> Result<Self, RequirementError> {
        Ok(Self {
            default_hours: checked_hours(default_hours)?,
            overrides: BTreeMap::new(),
        })
    }

    pub fn with_override(mut self, week: WeekId, hours: f64) -> Result<Self, RequirementError> {
        self.overrides.insert(week, checked_hours(hours)?);
        Ok(self)
    }

    pub fn default_hours(&self) -> f64 {
        self.default_hours
    }

    pub fn overrides(&self) -> &BTreeMap<WeekId, f64> {
        &self.overrides
    }
}

impl WorkweekRequirements for WorkweekCalendar {
    fn expected_weeks(&self, engagement: &Engagement) -> Result<Vec<WeekId>, RequirementError> {
        Ok(engagement.weeks())
    }

    fn required_hours(&self, week: &WeekId) -> f64 {
        self.overrides
            .get(week)
            .copied()
            .unwrap_or(self.default_hours)
    }
}

fn checked_hours(hours: f64) -> Result<f64, RequirementError> {
    if hours.is_finite() && hours >= 0.0 {
        Ok(hours)
    } else {
        Err(RequirementError::InvalidHours(hours))
    }
}
