//! Service layer API for timesheet workflow operations
use super::config::WorkflowConfig;
use super::error::WorkflowError;
use super::machine::ApprovalStateMachine;
use super::record::ApprovalRecord;
use super::status::{ApprovalAction, ApprovalStatus, Role};
use super::timesheet::{Timesheet, TimesheetDetails};
use anyhow::Context;
use sled::Transactional;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use std::sync::Arc;

const TIMESHEETS: &str = "timesheets";
const APPROVALS: &str = "approvals";
const WEEK_INDEX: &str = "timesheet_weeks";

pub struct TimesheetService {
    instance: Arc<sled::Db>,
    timesheets: sled::Tree,
    approvals: sled::Tree, // keyed by <timesheet id>/<version, big endian>
    weeks: sled::Tree,     // <tutor>/<course>/<week start> -> timesheet id
    machine: ApprovalStateMachine,
    config: WorkflowConfig,
}

fn abort(e: impl Into<anyhow::Error>) -> ConflictableTransactionError<anyhow::Error> {
    ConflictableTransactionError::Abort(e.into())
}

fn record_key(timesheet_id: &str, version: u64) -> Vec<u8> {
    let mut key = history_prefix(timesheet_id);
    key.extend_from_slice(&version.to_be_bytes());
    key
}

fn history_prefix(timesheet_id: &str) -> Vec<u8> {
    let mut key = timesheet_id.as_bytes().to_vec();
    key.push(b'/');
    key
}

fn week_key(timesheet: &Timesheet) -> Vec<u8> {
    format!(
        "{}/{}/{}",
        timesheet.tutor_id,
        timesheet.course_code,
        timesheet.week_start.to_naive()
    )
    .into_bytes()
}

fn unwrap_tx<T>(res: Result<T, TransactionError<anyhow::Error>>) -> anyhow::Result<T> {
    match res {
        Ok(value) => Ok(value),
        Err(TransactionError::Abort(e)) => Err(e),
        Err(TransactionError::Storage(e)) => Err(e.into()),
    }
}

impl TimesheetService {
    pub fn new(instance: Arc<sled::Db>, config: WorkflowConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let timesheets = instance.open_tree(TIMESHEETS)?;
        let approvals = instance.open_tree(APPROVALS)?;
        let weeks = instance.open_tree(WEEK_INDEX)?;
        let machine = ApprovalStateMachine::from_config(&config);

        Ok(Self {
            instance,
            timesheets,
            approvals,
            weeks,
            machine,
            config,
        })
    }

    pub fn machine(&self) -> &ApprovalStateMachine {
        &self.machine
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Validate a draft and store it in DRAFT status. A tutor has at most one
    /// timesheet per course and week.
    pub fn create_draft(&self, details: TimesheetDetails) -> anyhow::Result<Timesheet> {
        let timesheet = details.validate_and_finalise(&self.config)?;
        let encoded = minicbor::to_vec(&timesheet)?;
        let key = week_key(&timesheet);

        let res = (&self.timesheets, &self.weeks).transaction(|(timesheets, weeks)| {
            if weeks.get(&key)?.is_some() {
                return Err(abort(WorkflowError::Duplicate {
                    tutor_id: timesheet.tutor_id.clone(),
                    course_code: timesheet.course_code.clone(),
                    week_start: timesheet.week_start.to_naive(),
                }));
            }
            weeks.insert(key.as_slice(), timesheet.id.as_bytes())?;
            timesheets.insert(timesheet.id.as_bytes(), encoded.as_slice())?;
            Ok(())
        });
        if let Err(e) = unwrap_tx(res) {
            tracing::warn!(tutor_id = %timesheet.tutor_id, course = %timesheet.course_code, error = %e, "draft refused");
            return Err(e);
        }

        tracing::info!(
            timesheet_id = %timesheet.id,
            tutor_id = %timesheet.tutor_id,
            course = %timesheet.course_code,
            "draft timesheet created"
        );
        Ok(timesheet)
    }

    pub fn load(&self, timesheet_id: &str) -> anyhow::Result<Timesheet> {
        tracing::debug!(timesheet_id, "loading timesheet");
        let raw = self
            .timesheets
            .get(timesheet_id.as_bytes())?
            .ok_or_else(|| WorkflowError::NotFound(timesheet_id.to_string()))?;

        minicbor::decode(&raw).context("failed to decode stored timesheet")
    }

    /// Change hours, rate and description while DRAFT or MODIFICATION_REQUESTED
    pub fn update_details(
        &self,
        timesheet_id: &str,
        hours: u32,
        hourly_rate: u64,
        description: &str,
    ) -> anyhow::Result<Timesheet> {
        let res = self.timesheets.transaction(|tree| {
            let raw = tree
                .get(timesheet_id.as_bytes())?
                .ok_or_else(|| abort(WorkflowError::NotFound(timesheet_id.to_string())))?;
            let mut timesheet: Timesheet = minicbor::decode(&raw).map_err(abort)?;

            timesheet
                .update_details(hours, hourly_rate, description, &self.config)
                .map_err(abort)?;
            tree.insert(
                timesheet_id.as_bytes(),
                minicbor::to_vec(&timesheet).map_err(abort)?,
            )?;

            Ok(timesheet)
        });

        let timesheet = unwrap_tx(res)?;
        tracing::info!(timesheet_id, version = timesheet.version, "timesheet details updated");
        Ok(timesheet)
    }

    /// Remove a timesheet that was never sent for confirmation, or was sent
    /// back for changes. Its approval history is kept.
    pub fn delete_draft(&self, timesheet_id: &str, actor_id: &str, role: Role) -> anyhow::Result<()> {
        let res = (&self.timesheets, &self.weeks).transaction(|(timesheets, weeks)| {
            let raw = timesheets
                .get(timesheet_id.as_bytes())?
                .ok_or_else(|| abort(WorkflowError::NotFound(timesheet_id.to_string())))?;
            let timesheet: Timesheet = minicbor::decode(&raw).map_err(abort)?;

            if !timesheet.status.is_editable() {
                return Err(abort(WorkflowError::NotEditable(timesheet.status)));
            }
            timesheet.check_owner(actor_id, role).map_err(abort)?;

            timesheets.remove(timesheet_id.as_bytes())?;
            weeks.remove(week_key(&timesheet))?;
            Ok(())
        });

        unwrap_tx(res)?;
        tracing::info!(timesheet_id, actor_id, %role, "timesheet deleted");
        Ok(())
    }

    /// Load, check and apply `action` as one serializable transaction over the
    /// timesheet and its history. Nothing is written when the check fails.
    pub fn perform_action(
        &self,
        timesheet_id: &str,
        action: ApprovalAction,
        actor_id: &str,
        role: Role,
        comment: Option<String>,
    ) -> anyhow::Result<ApprovalRecord> {
        let res = (&self.timesheets, &self.approvals).transaction(|(timesheets, approvals)| {
            let raw = timesheets
                .get(timesheet_id.as_bytes())?
                .ok_or_else(|| abort(WorkflowError::NotFound(timesheet_id.to_string())))?;
            let mut timesheet: Timesheet = minicbor::decode(&raw).map_err(abort)?;

            let record = timesheet
                .apply(&self.machine, action, actor_id, role, comment.clone())
                .map_err(abort)?;

            timesheets.insert(
                timesheet_id.as_bytes(),
                minicbor::to_vec(&timesheet).map_err(abort)?,
            )?;
            approvals.insert(
                record_key(timesheet_id, timesheet.version),
                minicbor::to_vec(&record).map_err(abort)?,
            )?;

            Ok(record)
        });

        match unwrap_tx(res) {
            Ok(record) => {
                tracing::info!(
                    timesheet_id,
                    actor_id,
                    %action,
                    from = %record.previous_status,
                    to = %record.new_status,
                    "transition applied"
                );
                Ok(record)
            }
            Err(e) => {
                tracing::warn!(timesheet_id, actor_id, %role, %action, error = %e, "transition refused");
                Err(e)
            }
        }
    }

    pub fn submit(&self, timesheet_id: &str, actor_id: &str, role: Role) -> anyhow::Result<ApprovalRecord> {
        self.perform_action(timesheet_id, ApprovalAction::SubmitForApproval, actor_id, role, None)
    }

    pub fn tutor_confirm(&self, timesheet_id: &str, tutor_id: &str) -> anyhow::Result<ApprovalRecord> {
        self.perform_action(timesheet_id, ApprovalAction::TutorConfirm, tutor_id, Role::Tutor, None)
    }

    pub fn lecturer_confirm(
        &self,
        timesheet_id: &str,
        lecturer_id: &str,
        comment: Option<String>,
    ) -> anyhow::Result<ApprovalRecord> {
        self.perform_action(
            timesheet_id,
            ApprovalAction::LecturerConfirm,
            lecturer_id,
            Role::Lecturer,
            comment,
        )
    }

    pub fn hr_confirm(&self, timesheet_id: &str, hr_id: &str) -> anyhow::Result<ApprovalRecord> {
        self.perform_action(timesheet_id, ApprovalAction::HrConfirm, hr_id, Role::Hr, None)
    }

    pub fn reject(
        &self,
        timesheet_id: &str,
        actor_id: &str,
        role: Role,
        reason: String,
    ) -> anyhow::Result<ApprovalRecord> {
        self.perform_action(timesheet_id, ApprovalAction::Reject, actor_id, role, Some(reason))
    }

    pub fn request_modification(
        &self,
        timesheet_id: &str,
        actor_id: &str,
        role: Role,
        reason: String,
    ) -> anyhow::Result<ApprovalRecord> {
        self.perform_action(
            timesheet_id,
            ApprovalAction::RequestModification,
            actor_id,
            role,
            Some(reason),
        )
    }

    /// Approval records in the order they were appended
    pub fn history(&self, timesheet_id: &str) -> anyhow::Result<Vec<ApprovalRecord>> {
        self.approvals
            .scan_prefix(history_prefix(timesheet_id))
            .values()
            .map(|raw| {
                let raw = raw?;
                minicbor::decode(&raw).context("failed to decode approval record")
            })
            .collect()
    }

    fn scan(&self, mut keep: impl FnMut(&Timesheet) -> bool) -> anyhow::Result<Vec<Timesheet>> {
        let mut out = Vec::new();
        for raw in self.timesheets.iter().values() {
            let timesheet: Timesheet = minicbor::decode(&raw?)?;
            if keep(&timesheet) {
                out.push(timesheet);
            }
        }
        Ok(out)
    }

    pub fn list_by_status(&self, status: ApprovalStatus) -> anyhow::Result<Vec<Timesheet>> {
        self.scan(|t| t.status == status)
    }

    /// Pending timesheets waiting on something `actor_id` holding `role` may do
    pub fn pending_for(&self, actor_id: &str, role: Role) -> anyhow::Result<Vec<Timesheet>> {
        self.scan(|t| {
            t.status.is_pending() && !t.permitted_actions(&self.machine, actor_id, role).is_empty()
        })
    }

    /// Hours, in hundredths, a tutor has recorded against a course across all statuses
    pub fn total_hours(&self, tutor_id: &str, course_code: &str) -> anyhow::Result<u64> {
        Ok(self
            .scan(|t| t.tutor_id == tutor_id && t.course_code == course_code)?
            .iter()
            .map(|t| t.hours as u64)
            .sum())
    }

    /// Actions `actor_id` holding `role` could take on the timesheet right now
    pub fn available_actions(
        &self,
        timesheet_id: &str,
        actor_id: &str,
        role: Role,
    ) -> anyhow::Result<Vec<ApprovalAction>> {
        let timesheet = self.load(timesheet_id)?;
        Ok(timesheet.permitted_actions(&self.machine, actor_id, role))
    }

    pub fn flush(&self) -> anyhow::Result<()> {
        self.instance.flush()?;
        Ok(())
    }
}
