use crate::domain::entities::{Assignment, AssignmentStatus};
use crate::domain::errors::{DomainError, DomainResult};
use chrono::{DateTime, Utc};

/// Validates a status change of `assignment_id` from `from` to `to`.
///
/// `pending -> in_progress -> completed`, with `pending -> completed` allowed as a
/// shortcut. `completed` is terminal.
pub fn validate_transition(
    assignment_id: &str,
    from: AssignmentStatus,
    to: AssignmentStatus,
) -> DomainResult<()> {
    use AssignmentStatus::*;

    match (from, to) {
        (a, b) if a == b => Ok(()),

        (Pending, InProgress) => Ok(()),
        (Pending, Completed) => Ok(()),
        (InProgress, Completed) => Ok(()),

        (Completed, _) => Err(DomainError::AlreadyCompleted(assignment_id.to_string())),
        _ => Err(DomainError::ValidationError(format!(
            "Invalid status transition from {} to {}",
            from, to
        ))),
    }
}

/// End instant recorded when an assignment completes: an existing end is kept,
/// an open end is closed at `now` but never before the start.
///
/// An end already in the past is kept as well rather than moved up to `now`;
/// moving it would lengthen the booking and could overlap the next one.
pub fn completion_end(
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    end.unwrap_or_else(|| now.max(start))
}

/// Move a snapshot to `completed`, stamping its end.
pub fn complete(assignment: &mut Assignment, now: DateTime<Utc>) -> DomainResult<()> {
    if assignment.status == AssignmentStatus::Completed {
        return Err(DomainError::AlreadyCompleted(assignment.id.clone()));
    }
    validate_transition(&assignment.id, assignment.status, AssignmentStatus::Completed)?;

    assignment.status = AssignmentStatus::Completed;
    assignment.end_date = Some(completion_end(assignment.start_date, assignment.end_date, now));
    assignment.updated_at = now;
    Ok(())
}
