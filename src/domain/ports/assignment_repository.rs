use crate::domain::entities::{Assignment, AssignmentFilter, Interval};
use crate::domain::errors::DomainResult;
use chrono::{DateTime, Utc};

/// System of record for scheduling. Every query excludes tombstoned rows.
#[async_trait::async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persist a new assignment. Fails with `ScheduleConflict` when the commit-time
    /// constraint finds an overlapping live booking.
    async fn insert(&self, assignment: &Assignment) -> DomainResult<()>;

    async fn find_by_id(&self, id: &str) -> DomainResult<Option<Assignment>>;

    /// Live assignments sharing the driver or the vehicle whose window overlaps `interval`.
    async fn find_overlapping(
        &self,
        driver_id: &str,
        vehicle_id: &str,
        interval: &Interval,
        exclude_id: Option<&str>,
    ) -> DomainResult<Vec<Assignment>>;

    /// Write the whitelisted fields of a patched snapshot back to its row.
    async fn update_fields(&self, assignment: &Assignment) -> DomainResult<()>;

    /// Tombstone a live row. Returns false when nothing was deleted.
    async fn soft_delete(&self, id: &str, deleted_at: DateTime<Utc>) -> DomainResult<bool>;

    async fn list(
        &self,
        filter: &AssignmentFilter,
        limit: i64,
        offset: i64,
    ) -> DomainResult<(Vec<Assignment>, i64)>;

    /// In-progress assignments whose window covers `now`.
    async fn list_current(&self, now: DateTime<Utc>) -> DomainResult<Vec<Assignment>>;
}
