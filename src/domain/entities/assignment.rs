use crate::domain::errors::{DomainError, DomainResult};
use chrono::{DateTime, Datelike, NaiveDate, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stored in place of a missing end so an open-ended booking sorts after every real instant.
pub const OPEN_END_SENTINEL: &str = "9999-12-31T23:59:59.999999Z";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    InProgress,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AssignmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AssignmentStatus::Pending),
            "in_progress" => Ok(AssignmentStatus::InProgress),
            "completed" => Ok(AssignmentStatus::Completed),
            other => Err(DomainError::ValidationError(format!(
                "Invalid status '{}': expected pending, in_progress or completed",
                other
            ))),
        }
    }
}

/// Half-open booking window `[start, end)`; `end = None` is unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Interval {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> DomainResult<Self> {
        if let Some(end) = end {
            if end < start {
                return Err(DomainError::ValidationError(
                    "end_date must not be before start_date".to_string(),
                ));
            }
        }
        Ok(Self { start, end })
    }

    /// `s1 < e2 AND s2 < e1`, with a missing end treated as +inf.
    pub fn overlaps(&self, other: &Interval) -> bool {
        let starts_before_other_ends = other.end.map_or(true, |e2| self.start < e2);
        let other_starts_before_end = self.end.map_or(true, |e1| other.start < e1);
        starts_before_other_ends && other_starts_before_end
    }

    /// Point-in-time membership used by the current listing; both bounds inclusive.
    pub fn covers(&self, now: DateTime<Utc>) -> bool {
        self.start <= now && self.end.map_or(true, |end| end >= now)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: String,
    pub driver_id: String,
    pub vehicle_id: String,
    pub route_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: AssignmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn new(
        driver_id: String,
        vehicle_id: String,
        route_id: String,
        interval: Interval,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            driver_id,
            vehicle_id,
            route_id,
            start_date: interval.start,
            end_date: interval.end,
            status: AssignmentStatus::Pending,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start_date,
            end: self.end_date,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn shares_resource_with(&self, driver_id: &str, vehicle_id: &str) -> bool {
        self.driver_id == driver_id || self.vehicle_id == vehicle_id
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CreateAssignmentRequest {
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub route_id: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Whitelisted fields of an update. Unknown fields are ignored.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateAssignmentRequest {
    pub driver_id: Option<String>,
    pub vehicle_id: Option<String>,
    pub route_id: Option<String>,
    pub start_date: Option<String>,
    /// Absent leaves the end untouched, `null` makes the booking open-ended.
    #[serde(default, deserialize_with = "deserialize_present")]
    pub end_date: Option<Option<String>>,
    pub status: Option<AssignmentStatus>,
}

fn deserialize_present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

#[derive(Debug, Deserialize, Default)]
pub struct ListAssignmentsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
    pub start_date: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AssignmentFilter {
    pub status: Option<AssignmentStatus>,
    pub start_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentPage {
    pub assignments: Vec<Assignment>,
    pub total_pages: i64,
    pub current_page: i64,
    pub total_count: i64,
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
///
/// Results are truncated to microseconds and limited to years 0000..=9999, the
/// range the fixed-width storage form can represent.
pub fn parse_instant(field: &str, value: &str) -> DomainResult<DateTime<Utc>> {
    let value = value.trim();
    let invalid = || DomainError::ValidationError(format!("Invalid {}: '{}'", field, value));

    let instant = match DateTime::parse_from_rfc3339(value) {
        Ok(dt) => dt.with_timezone(&Utc),
        Err(_) => NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(invalid)?,
    };

    if !(0..=9999).contains(&instant.year()) {
        return Err(DomainError::ValidationError(format!(
            "Invalid {}: '{}' (year must be between 0000 and 9999)",
            field, value
        )));
    }

    Ok(instant.trunc_subsecs(6))
}

/// Fixed-width storage form; lexicographic order matches chronological order.
pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Micros, true)
}
