use crate::domain::entities::{Assignment, Interval};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::assignment_repository::AssignmentRepository;
use std::sync::Arc;

/// A window someone wants to book for a driver and a vehicle.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleProposal<'a> {
    pub driver_id: &'a str,
    pub vehicle_id: &'a str,
    pub interval: Interval,
    /// The assignment being rescheduled, which never conflicts with itself.
    pub exclude_id: Option<&'a str>,
}

/// First live booking in `existing` that collides with the proposal.
pub fn detect_conflict<'a>(
    existing: &'a [Assignment],
    proposal: &ScheduleProposal<'_>,
) -> Option<&'a Assignment> {
    existing.iter().find(|assignment| {
        !assignment.is_deleted()
            && proposal.exclude_id != Some(assignment.id.as_str())
            && assignment.shares_resource_with(proposal.driver_id, proposal.vehicle_id)
            && assignment.interval().overlaps(&proposal.interval)
    })
}

/// Early, user-facing overlap rejection. The commit-time constraint in the store
/// remains the final arbiter when two requests race past this check.
#[derive(Clone)]
pub struct ConflictChecker {
    assignment_repo: Arc<dyn AssignmentRepository>,
}

impl ConflictChecker {
    pub fn new(assignment_repo: Arc<dyn AssignmentRepository>) -> Self {
        Self { assignment_repo }
    }

    pub async fn check_conflict(&self, proposal: &ScheduleProposal<'_>) -> DomainResult<()> {
        let candidates = self
            .assignment_repo
            .find_overlapping(
                proposal.driver_id,
                proposal.vehicle_id,
                &proposal.interval,
                proposal.exclude_id,
            )
            .await?;

        match detect_conflict(&candidates, proposal) {
            Some(existing) => {
                tracing::info!(
                    "Schedule conflict: driver={}, vehicle={} collides with assignment {}",
                    proposal.driver_id,
                    proposal.vehicle_id,
                    existing.id
                );
                Err(DomainError::conflict_with(existing.id.clone()))
            }
            None => Ok(()),
        }
    }
}
