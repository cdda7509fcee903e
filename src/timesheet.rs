//! Timesheet entity, its draft builder and the entity-level transition guard
use super::config::WorkflowConfig;
use super::error::{ValidationError, WorkflowError};
use super::machine::ApprovalStateMachine;
use super::record::{ApprovalRecord, MAX_COMMENT_LEN};
use super::status::{ApprovalAction, ApprovalStatus, Role};
use super::types::{Date, TimeStamp};
use super::utils;
use chrono::Utc;

pub const MAX_DESCRIPTION_LEN: usize = 1000;

// Used for constructing drafts
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimesheetDetails {
    tutor_id: Option<String>,
    course_code: Option<String>,
    week_start: Option<Date>,
    hours: u32,       // hundredths of an hour
    hourly_rate: u64, // cents
    description: Option<String>,
    created_by: Option<String>,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, PartialEq, Eq)]
pub struct Timesheet {
    #[n(0)]
    pub id: String, // bech32 encoded uuid7
    #[n(1)]
    pub tutor_id: String,
    #[n(2)]
    pub course_code: String,
    #[n(3)]
    pub week_start: Date,
    #[n(4)]
    pub hours: u32,
    #[n(5)]
    pub hourly_rate: u64,
    #[n(6)]
    pub description: String,
    #[n(7)]
    pub status: ApprovalStatus,
    #[n(8)]
    pub created_by: String,
    #[n(9)]
    pub created_at: TimeStamp<Utc>,
    #[n(10)]
    pub updated_at: TimeStamp<Utc>,
    #[n(11)]
    pub version: u64, // bumped on every persisted change
}

impl TimesheetDetails {
    /// Construct a new builder object, this becomes the basis for a draft
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_tutor(mut self, tutor_id: &str) -> Self {
        self.tutor_id = Some(tutor_id.to_string());
        self
    }
    pub fn set_course(mut self, course_code: &str) -> Self {
        self.course_code = Some(course_code.to_string());
        self
    }
    pub fn set_week_start(mut self, date: Date) -> Self {
        self.week_start = Some(date);
        self
    }
    pub fn set_hours(mut self, hundredths: u32) -> Self {
        self.hours = hundredths;
        self
    }
    pub fn set_hourly_rate(mut self, cents: u64) -> Self {
        self.hourly_rate = cents;
        self
    }
    pub fn set_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
    /// Defaults to the tutor when unset
    pub fn set_created_by(mut self, user_id: &str) -> Self {
        self.created_by = Some(user_id.to_string());
        self
    }

    // Checks fields, and performs validation. returns a fresh DRAFT timesheet
    pub fn validate_and_finalise(self, config: &WorkflowConfig) -> anyhow::Result<Timesheet> {
        let tutor_id = self
            .tutor_id
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingField("Tutor"))?;
        let course_code = self
            .course_code
            .filter(|c| !c.is_empty())
            .ok_or(ValidationError::MissingField("Course"))?;
        let week_start = self
            .week_start
            .ok_or(ValidationError::MissingField("Week start date"))?;
        if !week_start.is_monday() {
            return Err(ValidationError::WeekStartNotMonday(week_start.to_naive()).into());
        }
        let description = self.description.unwrap_or_default().trim().to_string();
        check_limits(self.hours, self.hourly_rate, &description, config)?;

        let now = TimeStamp::new();
        Ok(Timesheet {
            id: utils::new_uuid_to_bech32("timesheet_")?,
            created_by: self.created_by.unwrap_or_else(|| tutor_id.clone()),
            tutor_id,
            course_code,
            week_start,
            hours: self.hours,
            hourly_rate: self.hourly_rate,
            description,
            status: ApprovalStatus::Draft,
            created_at: now.clone(),
            updated_at: now,
            version: 0,
        })
    }
}

fn check_limits(
    hours: u32,
    hourly_rate: u64,
    description: &str,
    config: &WorkflowConfig,
) -> Result<(), ValidationError> {
    let (min, max) = config.hours_range();
    if hours < min || hours > max {
        return Err(ValidationError::HoursOutOfRange {
            value: hours,
            min,
            max,
        });
    }
    let (min, max) = config.rate_range();
    if hourly_rate < min || hourly_rate > max {
        return Err(ValidationError::RateOutOfRange {
            value: hourly_rate,
            min,
            max,
        });
    }
    let len = description.chars().count();
    if len == 0 || len > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::InvalidDescription {
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(())
}

impl Timesheet {
    /// Pay in cents, rounded half up. `None` if it does not fit in a u64.
    pub fn amount_cents(&self) -> Option<u64> {
        (self.hours as u64)
            .checked_mul(self.hourly_rate)?
            .checked_add(50)
            .map(|v| v / 100)
    }

    /// Rejects actors acting on a timesheet that isn't theirs
    pub fn check_owner(&self, actor_id: &str, role: Role) -> Result<(), WorkflowError> {
        if role.requires_ownership() && actor_id != self.tutor_id {
            return Err(WorkflowError::NotOwner {
                actor_id: actor_id.to_string(),
                timesheet_id: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Actions `actor_id` holding `role` could take right now
    pub fn permitted_actions(
        &self,
        machine: &ApprovalStateMachine,
        actor_id: &str,
        role: Role,
    ) -> Vec<ApprovalAction> {
        if self.check_owner(actor_id, role).is_err() {
            return vec![];
        }
        machine
            .valid_actions(self.status)
            .into_iter()
            .filter(|action| role.may_perform(self.status, *action))
            .collect()
    }

    /// Apply `action` through `machine`. The entity is left untouched unless a
    /// record is returned.
    pub fn apply(
        &mut self,
        machine: &ApprovalStateMachine,
        action: ApprovalAction,
        actor_id: &str,
        role: Role,
        comment: Option<String>,
    ) -> Result<ApprovalRecord, WorkflowError> {
        let from = self.status;
        let to = machine
            .next_status(from, action)
            .ok_or(WorkflowError::InvalidTransition { from, action })?;

        if !role.may_perform(from, action) {
            return Err(WorkflowError::Forbidden { role, from, action });
        }
        self.check_owner(actor_id, role)?;
        if let Some(c) = &comment {
            if c.chars().count() > MAX_COMMENT_LEN {
                return Err(ValidationError::CommentTooLong {
                    max: MAX_COMMENT_LEN,
                }
                .into());
            }
        }

        let record = ApprovalRecord::new(
            self.id.clone(),
            actor_id.to_string(),
            role,
            action,
            from,
            to,
            comment,
        );
        self.status = to;
        self.updated_at = record.timestamp.clone();
        self.version += 1;

        Ok(record)
    }

    pub fn update_details(
        &mut self,
        hours: u32,
        hourly_rate: u64,
        description: &str,
        config: &WorkflowConfig,
    ) -> Result<(), WorkflowError> {
        if !self.status.is_editable() {
            return Err(WorkflowError::NotEditable(self.status));
        }
        let description = description.trim();
        check_limits(hours, hourly_rate, description, config)?;

        self.hours = hours;
        self.hourly_rate = hourly_rate;
        self.description = description.to_string();
        self.updated_at = TimeStamp::new();
        self.version += 1;
        Ok(())
    }
}
