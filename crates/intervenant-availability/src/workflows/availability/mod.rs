//! Key-gated availability checks.
//!
//! A presented access key is resolved to its intervenant through the repository, then
//! the intervenant's submitted slots are checked week by week: weeks without any slot
//! are reported as missing, weeks below the required hours as insufficient.

pub mod access;
pub mod domain;
pub mod evaluation;
pub mod import;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use access::{
    check_expiry, AccessError, AccessKeyValidator, KeyCheck, KeyError, EXPIRED_KEY_MESSAGE,
    UNKNOWN_KEY_MESSAGE,
};
pub use domain::{
    AccessKey, AvailabilityMapping, Engagement, EngagementError, EngagementRecord, Intervenant,
    IntervenantId, SlotError, TimeSlot, TimeSlotRecord, WeekId, WeekIdError,
};
pub use evaluation::{
    classify_week, evaluate, total_hours, InsufficientWeek, RequirementError, ValidationResult,
    WeekClassification, WorkweekCalendar, WorkweekRequirements,
};
pub use import::{ImportError, IntervenantImporter};
pub use repository::{
    IntervenantRepository, IntervenantSummary, RepositoryError, SearchQuery, SearchQueryError,
    MAX_PAGE_SIZE,
};
pub use router::availability_router;
pub use service::{AvailabilityReport, AvailabilityService, AvailabilityServiceError};
pub use views::{
    calendar_entries, format_last_modified, AvailabilityPageView, CalendarEntry, DisplayError,
    DISPLAY_TIME_ZONE,
};
