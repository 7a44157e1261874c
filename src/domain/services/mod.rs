pub mod assignment_lifecycle;
pub mod conflict_checker;

pub use conflict_checker::{detect_conflict, ConflictChecker, ScheduleProposal};
