//! Display-side shapes for the availability page.
//!
//! Everything here is derived from an [`AvailabilityReport`]; nothing is cached between
//! requests.

use chrono::{DateTime, FixedOffset, Locale, Utc};
use serde::Serialize;

use super::domain::{format_wall_clock, AvailabilityMapping};
use super::evaluation::ValidationResult;
use super::service::AvailabilityReport;

/// Time zone `last_modified` is shown in.
pub const DISPLAY_TIME_ZONE: &str = "Europe/Paris";

/// One calendar block per submitted slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    pub days: String,
    pub from: String,
    pub to: String,
}

pub fn calendar_entries(availability: &AvailabilityMapping) -> Vec<CalendarEntry> {
    availability
        .iter()
        .flat_map(|(week, slots)| {
            slots.iter().map(move |slot| CalendarEntry {
                days: week.to_string(),
                from: format_wall_clock(slot.start_time()),
                to: format_wall_clock(slot.end_time()),
            })
        })
        .collect()
}

/// Render a timestamp the way a `fr-FR` reader in Paris expects it, for example
/// `lundi 4 mars 2024 à 10:30`.
pub fn format_last_modified(at: DateTime<Utc>) -> Result<String, DisplayError> {
    let zoned = jiff::Timestamp::from_second(at.timestamp())?.in_tz(DISPLAY_TIME_ZONE)?;
    let offset = FixedOffset::east_opt(zoned.offset().seconds())
        .ok_or(DisplayError::OffsetOutOfRange)?;

    Ok(at
        .with_timezone(&offset)
        .format_localized("%A %-d %B %Y à %H:%M", Locale::fr_FR)
        .to_string())
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("unable to resolve the Europe/Paris offset: {0}")]
    TimeZone(#[from] jiff::Error),
    #[error("time zone offset out of range")]
    OffsetOutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsufficientHoursNotice {
    pub heading: String,
    pub lines: Vec<String>,
}

/// Everything the availability page shows for a valid key.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityPageView {
    pub title: String,
    pub firstname: String,
    pub lastname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_weeks_notice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insufficient_hours_notice: Option<InsufficientHoursNotice>,
    #[serde(flatten)]
    pub result: ValidationResult,
    pub calendar: Vec<CalendarEntry>,
    pub intervenant_key: String,
}

impl AvailabilityPageView {
    pub fn from_report(report: &AvailabilityReport) -> Result<Self, DisplayError> {
        let intervenant = &report.intervenant;
        let last_modified = intervenant
            .last_modified
            .map(format_last_modified)
            .transpose()?;

        Ok(Self {
            title: format!("Disponibilités de {}", intervenant.full_name()),
            firstname: intervenant.firstname.clone(),
            lastname: intervenant.lastname.clone(),
            last_modified,
            missing_weeks_notice: missing_weeks_notice(&report.result),
            insufficient_hours_notice: insufficient_hours_notice(&report.result),
            result: report.result.clone(),
            calendar: calendar_entries(&intervenant.availability),
            intervenant_key: intervenant.key.token.clone(),
        })
    }
}

fn missing_weeks_notice(result: &ValidationResult) -> Option<String> {
    if result.missing_weeks.is_empty() {
        return None;
    }

    let weeks: Vec<String> = result.missing_weeks.iter().map(ToString::to_string).collect();
    Some(format!(
        "Vous n'avez pas encore saisi de disponibilités pour les semaines: {}.",
        weeks.join(", ")
    ))
}

fn insufficient_hours_notice(result: &ValidationResult) -> Option<InsufficientHoursNotice> {
    if result.insufficient_hours.is_empty() {
        return None;
    }

    let lines = result
        .insufficient_hours
        .iter()
        .map(|entry| {
            format!(
                "Semaine {}: {} heures saisies, {} heures requises",
                entry.week, entry.total_hours, entry.required_hours
            )
        })
        .collect();

    Some(InsufficientHoursNotice {
        heading: "Vous avez saisi moins d'heures que nécessaire pour les semaines suivantes:"
            .to_string(),
        lines,
    })
}
