use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for intervenant records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntervenantId(pub String);

impl fmt::Display for IntervenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token bound to exactly one intervenant.
///
/// `expires_at` is the last instant at which the key is still accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKey {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessKey {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// ISO-8601 calendar week, written `YYYY-Www` (for example `2024-W10`).
///
/// Field order makes the derived ordering chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WeekId {
    year: i32,
    week: u32,
}

impl WeekId {
    pub fn new(year: i32, week: u32) -> Result<Self, WeekIdError> {
        NaiveDate::from_isoywd_opt(year, week, Weekday::Mon)
            .map(|_| Self { year, week })
            .ok_or(WeekIdError::OutOfRange { year, week })
    }

    /// The ISO week a calendar date falls into.
    pub fn containing(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }
}

impl fmt::Display for WeekId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-W{:02}", self.year, self.week)
    }
}

impl FromStr for WeekId {
    type Err = WeekIdError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || WeekIdError::Malformed(raw.to_string());
        let (year, week) = raw.split_once("-W").ok_or_else(malformed)?;

        let all_digits = |part: &str| part.bytes().all(|byte| byte.is_ascii_digit());
        if year.len() != 4 || week.len() != 2 || !all_digits(year) || !all_digits(week) {
            return Err(malformed());
        }

        let year = year.parse::<i32>().map_err(|_| malformed())?;
        let week = week.parse::<u32>().map_err(|_| malformed())?;
        Self::new(year, week)
    }
}

impl TryFrom<String> for WeekId {
    type Error = WeekIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WeekId> for String {
    fn from(value: WeekId) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WeekIdError {
    #[error("invalid week label '{0}' (expected YYYY-Www)")]
    Malformed(String),
    #[error("week {week} does not exist in ISO year {year}")]
    OutOfRange { year: i32, week: u32 },
}

/// Wall-clock interval within a single calendar day. Always ends after it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeSlotRecord", into = "TimeSlotRecord")]
pub struct TimeSlot {
    start_time: NaiveTime,
    end_time: NaiveTime,
}

impl TimeSlot {
    pub fn new(start_time: NaiveTime, end_time: NaiveTime) -> Result<Self, SlotError> {
        if end_time <= start_time {
            return Err(SlotError::NonPositiveDuration {
                start_time,
                end_time,
            });
        }

        Ok(Self {
            start_time,
            end_time,
        })
    }

    /// Parse `HH:MM` or `HH:MM:SS` bounds.
    pub fn parse(start_time: &str, end_time: &str) -> Result<Self, SlotError> {
        Self::new(parse_wall_clock(start_time)?, parse_wall_clock(end_time)?)
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    /// Length of the slot in fractional hours.
    pub fn duration_hours(&self) -> f64 {
        let seconds = (self.end_time - self.start_time).num_seconds();
        seconds as f64 / 3600.0
    }
}

/// Wire form of a [`TimeSlot`], as stored alongside the intervenant record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlotRecord {
    pub start_time: String,
    pub end_time: String,
}

impl TryFrom<TimeSlotRecord> for TimeSlot {
    type Error = SlotError;

    fn try_from(record: TimeSlotRecord) -> Result<Self, Self::Error> {
        Self::parse(&record.start_time, &record.end_time)
    }
}

impl From<TimeSlot> for TimeSlotRecord {
    fn from(slot: TimeSlot) -> Self {
        Self {
            start_time: format_wall_clock(slot.start_time),
            end_time: format_wall_clock(slot.end_time),
        }
    }
}

pub(crate) fn format_wall_clock(time: NaiveTime) -> String {
    if time.second() == 0 {
        time.format("%H:%M").to_string()
    } else {
        time.format("%H:%M:%S").to_string()
    }
}

fn parse_wall_clock(raw: &str) -> Result<NaiveTime, SlotError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| SlotError::InvalidTime(raw.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    #[error("invalid wall-clock time '{0}' (expected HH:MM or HH:MM:SS)")]
    InvalidTime(String),
    #[error("time slot must end after it starts ({start_time} - {end_time})")]
    NonPositiveDuration {
        start_time: NaiveTime,
        end_time: NaiveTime,
    },
}

/// Submitted slots grouped by week.
pub type AvailabilityMapping = BTreeMap<WeekId, Vec<TimeSlot>>;

/// Repository record for an external contributor and their submitted availability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intervenant {
    pub id: IntervenantId,
    pub email: String,
    pub firstname: String,
    pub lastname: String,
    pub key: AccessKey,
    #[serde(default)]
    pub availability: AvailabilityMapping,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

impl Intervenant {
    /// Slots submitted for `week`, empty when the week has no entry.
    pub fn slots_for(&self, week: &WeekId) -> &[TimeSlot] {
        self.availability
            .get(week)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }
}

/// Inclusive date range an intervenant is engaged for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EngagementRecord", into = "EngagementRecord")]
pub struct Engagement {
    start: NaiveDate,
    end: NaiveDate,
}

impl Engagement {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, EngagementError> {
        if end < start {
            return Err(EngagementError::EndsBeforeStart { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Every ISO week touched by the range, oldest first, without duplicates.
    pub fn weeks(&self) -> Vec<WeekId> {
        let mut weeks: Vec<WeekId> = Vec::new();
        let mut cursor = self.start;

        loop {
            let week = WeekId::containing(cursor);
            if weeks.last() != Some(&week) {
                weeks.push(week);
            }
            if cursor >= self.end {
                break;
            }
            cursor = match cursor.checked_add_days(Days::new(7)) {
                Some(next) if next <= self.end => next,
                _ => self.end,
            };
        }

        weeks
    }
}

/// Wire form of an [`Engagement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementRecord {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl TryFrom<EngagementRecord> for Engagement {
    type Error = EngagementError;

    fn try_from(record: EngagementRecord) -> Result<Self, Self::Error> {
        Self::new(record.start, record.end)
    }
}

impl From<Engagement> for EngagementRecord {
    fn from(engagement: Engagement) -> Self {
        Self {
            start: engagement.start,
            end: engagement.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngagementError {
    #[error("engagement ends ({end}) before it starts ({start})")]
    EndsBeforeStart { start: NaiveDate, end: NaiveDate },
}
