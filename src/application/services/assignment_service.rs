use crate::application::services::cache_layer::{query_fingerprint, CacheLayer, CacheScope};
use crate::domain::entities::{
    parse_instant, Assignment, AssignmentFilter, AssignmentPage, AssignmentStatus,
    CreateAssignmentRequest, Interval, ListAssignmentsQuery, ResourceKind,
    UpdateAssignmentRequest, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{
    assignment_repository::AssignmentRepository, clock::Clock,
    resource_registry::ResourceRegistry,
};
use crate::domain::services::assignment_lifecycle;
use crate::domain::services::{ConflictChecker, ScheduleProposal};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Cache collection name for assignment listings and details.
pub const ASSIGNMENTS: &str = "assignments";

#[derive(Serialize)]
struct ListCacheParams<'a> {
    filter: &'a AssignmentFilter,
    page: i64,
    limit: i64,
}

fn required(field: &str, value: Option<String>) -> DomainResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(DomainError::ValidationError(format!(
            "Missing required field: {}",
            field
        ))),
    }
}

fn not_found(id: &str) -> DomainError {
    DomainError::NotFound(format!("Assignment {} not found", id))
}

/// Owns the assignment lifecycle: resolves references, rejects overlapping
/// bookings, commits through the repository and then invalidates the cache.
#[derive(Clone)]
pub struct AssignmentService {
    assignment_repo: Arc<dyn AssignmentRepository>,
    registry: Arc<dyn ResourceRegistry>,
    conflict_checker: ConflictChecker,
    cache: CacheLayer,
    clock: Arc<dyn Clock>,
}

impl AssignmentService {
    pub fn new(
        assignment_repo: Arc<dyn AssignmentRepository>,
        registry: Arc<dyn ResourceRegistry>,
        cache: CacheLayer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            conflict_checker: ConflictChecker::new(assignment_repo.clone()),
            assignment_repo,
            registry,
            cache,
            clock,
        }
    }

    pub fn cache(&self) -> &CacheLayer {
        &self.cache
    }

    fn note_conflict(err: DomainError) -> DomainError {
        if matches!(err, DomainError::ScheduleConflict { .. }) {
            metrics::counter!("assignment_conflicts_total").increment(1);
        }
        err
    }

    fn log_internal(
        operation: &'static str,
        id: String,
    ) -> impl FnOnce(DomainError) -> DomainError {
        move |err| {
            if let DomainError::Internal(ref msg) = err {
                tracing::error!("Assignment {} failed for {}: {}", operation, id, msg);
            }
            err
        }
    }

    async fn require_resource(&self, kind: ResourceKind, id: &str) -> DomainResult<()> {
        if self.registry.exists(kind, id).await? {
            Ok(())
        } else {
            Err(DomainError::NotFound(format!("{} {} not found", kind, id)))
        }
    }

    /// Invalidate the listings, and the detail entry when `id` is given.
    async fn invalidate(&self, id: Option<&str>) {
        self.cache
            .invalidate_scope(&CacheScope::collection(ASSIGNMENTS))
            .await;
        if let Some(id) = id {
            self.cache
                .invalidate_scope(&CacheScope::item(ASSIGNMENTS, id))
                .await;
        }
    }

    /// Book a driver and a vehicle onto a route. The new assignment starts `pending`.
    pub async fn create(&self, request: CreateAssignmentRequest) -> DomainResult<Assignment> {
        let driver_id = required("driver_id", request.driver_id)?;
        let vehicle_id = required("vehicle_id", request.vehicle_id)?;
        let route_id = required("route_id", request.route_id)?;
        let start_raw = required("start_date", request.start_date)?;

        let start = parse_instant("start_date", &start_raw)?;
        let end = request
            .end_date
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(|raw| parse_instant("end_date", raw))
            .transpose()?;
        let interval = Interval::new(start, end)?;

        tokio::try_join!(
            self.require_resource(ResourceKind::Driver, &driver_id),
            self.require_resource(ResourceKind::Vehicle, &vehicle_id),
            self.require_resource(ResourceKind::Route, &route_id),
        )?;

        self.conflict_checker
            .check_conflict(&ScheduleProposal {
                driver_id: &driver_id,
                vehicle_id: &vehicle_id,
                interval,
                exclude_id: None,
            })
            .await
            .map_err(Self::note_conflict)?;

        let assignment =
            Assignment::new(driver_id, vehicle_id, route_id, interval, self.clock.now());
        self.assignment_repo
            .insert(&assignment)
            .await
            .map_err(Self::note_conflict)
            .map_err(Self::log_internal("create", assignment.id.clone()))?;

        tracing::info!(
            "Assignment created: id={}, driver={}, vehicle={}, route={}",
            assignment.id,
            assignment.driver_id,
            assignment.vehicle_id,
            assignment.route_id
        );

        self.invalidate(None).await;
        Ok(assignment)
    }

    pub async fn get(&self, id: &str) -> DomainResult<Assignment> {
        let scope = CacheScope::item(ASSIGNMENTS, id);
        self.cache
            .get_or_load(&scope, None, || async {
                self.assignment_repo
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| not_found(id))
            })
            .await
    }

    /// Paginated listing ordered by start date, newest first.
    pub async fn list(&self, query: ListAssignmentsQuery) -> DomainResult<AssignmentPage> {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if page < 1 {
            return Err(DomainError::ValidationError(
                "page must be at least 1".to_string(),
            ));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(DomainError::ValidationError(format!(
                "limit must be between 1 and {}",
                MAX_PAGE_LIMIT
            )));
        }

        let filter = AssignmentFilter {
            status: query
                .status
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(str::parse::<AssignmentStatus>)
                .transpose()?,
            start_date: query
                .start_date
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(|raw| parse_instant("start_date", raw))
                .transpose()?,
        };

        let scope = CacheScope::collection(ASSIGNMENTS);
        let fingerprint = query_fingerprint(&ListCacheParams {
            filter: &filter,
            page,
            limit,
        })
        .map_err(|e| DomainError::Internal(e.to_string()))?;

        self.cache
            .get_or_load(&scope, Some(&fingerprint), || async {
                let offset = (page - 1) * limit;
                let (assignments, total_count) =
                    self.assignment_repo.list(&filter, limit, offset).await?;
                Ok(AssignmentPage {
                    assignments,
                    total_pages: (total_count + limit - 1) / limit,
                    current_page: page,
                    total_count,
                })
            })
            .await
    }

    /// Apply a whitelisted patch. Changing the driver, the vehicle or the window
    /// re-runs the conflict check against every other live booking.
    pub async fn update(
        &self,
        id: &str,
        patch: UpdateAssignmentRequest,
    ) -> DomainResult<Assignment> {
        let current = self
            .assignment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;
        let now = self.clock.now();
        let mut next = current.clone();

        if let Some(driver_id) = patch.driver_id {
            next.driver_id = required("driver_id", Some(driver_id))?;
        }
        if let Some(vehicle_id) = patch.vehicle_id {
            next.vehicle_id = required("vehicle_id", Some(vehicle_id))?;
        }
        if let Some(route_id) = patch.route_id {
            next.route_id = required("route_id", Some(route_id))?;
        }
        if let Some(start) = patch.start_date {
            next.start_date = parse_instant("start_date", &start)?;
        }
        if let Some(end) = patch.end_date {
            next.end_date = end
                .as_deref()
                .map(|raw| parse_instant("end_date", raw))
                .transpose()?;
        }
        Interval::new(next.start_date, next.end_date)?;

        if next.driver_id != current.driver_id {
            self.require_resource(ResourceKind::Driver, &next.driver_id).await?;
        }
        if next.vehicle_id != current.vehicle_id {
            self.require_resource(ResourceKind::Vehicle, &next.vehicle_id).await?;
        }
        if next.route_id != current.route_id {
            self.require_resource(ResourceKind::Route, &next.route_id).await?;
        }

        if let Some(status) = patch.status {
            if status == AssignmentStatus::Completed
                && current.status != AssignmentStatus::Completed
            {
                assignment_lifecycle::complete(&mut next, now)?;
            } else {
                assignment_lifecycle::validate_transition(id, current.status, status)?;
                next.status = status;
            }
        }

        let schedule_changed = next.driver_id != current.driver_id
            || next.vehicle_id != current.vehicle_id
            || next.start_date != current.start_date
            || next.end_date != current.end_date;

        if schedule_changed {
            self.conflict_checker
                .check_conflict(&ScheduleProposal {
                    driver_id: &next.driver_id,
                    vehicle_id: &next.vehicle_id,
                    interval: next.interval(),
                    exclude_id: Some(id),
                })
                .await
                .map_err(Self::note_conflict)?;
        }

        next.updated_at = now;
        self.assignment_repo
            .update_fields(&next)
            .await
            .map_err(Self::note_conflict)
            .map_err(Self::log_internal("update", id.to_string()))?;

        tracing::info!("Assignment updated: id={}, status={}", next.id, next.status);

        self.invalidate(Some(id)).await;
        Ok(next)
    }

    /// Mark an assignment completed, closing an open end at the current time.
    pub async fn complete(&self, id: &str) -> DomainResult<Assignment> {
        let mut assignment = self
            .assignment_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| not_found(id))?;

        assignment_lifecycle::complete(&mut assignment, self.clock.now())?;
        self.assignment_repo
            .update_fields(&assignment)
            .await
            .map_err(Self::note_conflict)
            .map_err(Self::log_internal("complete", id.to_string()))?;

        tracing::info!("Assignment completed: id={}", id);

        self.invalidate(Some(id)).await;
        Ok(assignment)
    }

    /// Tombstone an assignment; it no longer blocks bookings or appears in listings.
    pub async fn delete(&self, id: &str) -> DomainResult<()> {
        let deleted = self
            .assignment_repo
            .soft_delete(id, self.clock.now())
            .await
            .map_err(Self::log_internal("delete", id.to_string()))?;
        if !deleted {
            return Err(not_found(id));
        }

        tracing::info!("Assignment deleted: id={}", id);

        self.invalidate(Some(id)).await;
        Ok(())
    }

    /// In-progress assignments whose window covers `now`. Never cached.
    pub async fn list_current(&self, now: DateTime<Utc>) -> DomainResult<Vec<Assignment>> {
        self.assignment_repo.list_current(now).await
    }

    pub async fn current_assignments(&self) -> DomainResult<Vec<Assignment>> {
        self.list_current(self.clock.now()).await
    }
}
