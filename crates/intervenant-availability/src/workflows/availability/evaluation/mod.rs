mod requirements;

pub use requirements::{RequirementError, WorkweekCalendar, WorkweekRequirements};

use super::domain::{Intervenant, TimeSlot, WeekId};
use serde::{Deserialize, Serialize};

/// A week that has slots, but fewer hours than required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsufficientWeek {
    pub week: WeekId,
    pub total_hours: f64,
    pub required_hours: f64,
}

/// Outcome of a completeness and sufficiency check, in expected-week order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub missing_weeks: Vec<WeekId>,
    pub insufficient_hours: Vec<InsufficientWeek>,
}

impl ValidationResult {
    /// Every expected week has enough hours.
    pub fn is_complete(&self) -> bool {
        self.missing_weeks.is_empty() && self.insufficient_hours.is_empty()
    }
}

/// Where a single expected week lands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WeekClassification {
    Missing,
    Insufficient { total_hours: f64, required_hours: f64 },
    Sufficient { total_hours: f64 },
}

/// Sum of slot durations. Overlapping slots are counted twice.
pub fn total_hours(slots: &[TimeSlot]) -> f64 {
    slots.iter().map(TimeSlot::duration_hours).sum()
}

pub fn classify_week(slots: &[TimeSlot], required_hours: f64) -> WeekClassification {
    if slots.is_empty() {
        return WeekClassification::Missing;
    }

    let total_hours = total_hours(slots);
    if total_hours < required_hours {
        WeekClassification::Insufficient {
            total_hours,
            required_hours,
        }
    } else {
        WeekClassification::Sufficient { total_hours }
    }
}

/// Classify each expected week of `intervenant`.
///
/// `required_hours_of` is only consulted for weeks that have at least one slot.
pub fn evaluate<F>(
    intervenant: &Intervenant,
    expected_weeks: &[WeekId],
    required_hours_of: F,
) -> ValidationResult
where
    F: Fn(&WeekId) -> f64,
{
    let mut result = ValidationResult::default();

    for week in expected_weeks {
        let slots = intervenant.slots_for(week);
        if slots.is_empty() {
            result.missing_weeks.push(*week);
            continue;
        }

        match classify_week(slots, required_hours_of(week)) {
            WeekClassification::Insufficient {
                total_hours,
                required_hours,
            } => result.insufficient_hours.push(InsufficientWeek {
                week: *week,
                total_hours,
                required_hours,
            }),
            WeekClassification::Sufficient { .. } | WeekClassification::Missing => {}
        }
    }

    result
}
