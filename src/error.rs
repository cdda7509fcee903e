use crate::status::{ApprovalAction, ApprovalStatus, Role};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Unknown approval status value: {0}")]
    UnknownStatus(String),
    #[error("Unknown approval action value: {0}")]
    UnknownAction(String),
    #[error("Unknown role value: {0}")]
    UnknownRole(String),
    #[error("{0} is not set")]
    MissingField(&'static str),
    #[error("Week start date {0} is not a Monday")]
    WeekStartNotMonday(chrono::NaiveDate),
    #[error("Hours {value} outside allowed range {min}..={max} (hundredths)")]
    HoursOutOfRange { value: u32, min: u32, max: u32 },
    #[error("Hourly rate {value} outside allowed range {min}..={max} (cents)")]
    RateOutOfRange { value: u64, min: u64, max: u64 },
    #[error("Description must be between 1 and {max} characters")]
    InvalidDescription { max: usize },
    #[error("Comment exceeds {max} characters")]
    CommentTooLong { max: usize },
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Cannot perform {action} on a timesheet in status {from}")]
    InvalidTransition {
        from: ApprovalStatus,
        action: ApprovalAction,
    },
    #[error("Role {role} may not perform {action} on a timesheet in status {from}")]
    Forbidden {
        role: Role,
        from: ApprovalStatus,
        action: ApprovalAction,
    },
    #[error("{actor_id} does not own timesheet {timesheet_id}")]
    NotOwner {
        actor_id: String,
        timesheet_id: String,
    },
    #[error("A timesheet for tutor {tutor_id}, course {course_code}, week {week_start} already exists")]
    Duplicate {
        tutor_id: String,
        course_code: String,
        week_start: chrono::NaiveDate,
    },
    #[error("Timesheet cannot be edited in status {0}")]
    NotEditable(ApprovalStatus),
    #[error("Timesheet {0} not found")]
    NotFound(String),
    #[error("Conflicting rules for {from} --{action}-->: {first} and {second}")]
    ConflictingRule {
        from: ApprovalStatus,
        action: ApprovalAction,
        first: ApprovalStatus,
        second: ApprovalStatus,
    },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
