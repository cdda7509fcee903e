//! The approval state machine: single source of truth for status transitions
use super::config::WorkflowConfig;
use super::error::WorkflowError;
use super::status::{ApprovalAction, ApprovalStatus};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: ApprovalStatus,
    pub action: ApprovalAction,
    pub to: ApprovalStatus,
}

const fn rule(from: ApprovalStatus, action: ApprovalAction, to: ApprovalStatus) -> TransitionRule {
    TransitionRule { from, action, to }
}

use ApprovalAction as A;
use ApprovalStatus as S;

pub const DEFAULT_RULES: [TransitionRule; 9] = [
    rule(S::Draft, A::SubmitForApproval, S::PendingTutorConfirmation),
    rule(S::PendingTutorConfirmation, A::TutorConfirm, S::TutorConfirmed),
    rule(S::PendingTutorConfirmation, A::Reject, S::Rejected),
    rule(S::PendingTutorConfirmation, A::RequestModification, S::ModificationRequested),
    rule(S::TutorConfirmed, A::LecturerConfirm, S::LecturerConfirmed),
    rule(S::TutorConfirmed, A::Reject, S::Rejected),
    rule(S::LecturerConfirmed, A::HrConfirm, S::FinalConfirmed),
    rule(S::LecturerConfirmed, A::Reject, S::Rejected),
    rule(S::ModificationRequested, A::SubmitForApproval, S::PendingTutorConfirmation),
];

pub const RESUBMIT_AFTER_REJECTION: TransitionRule =
    rule(S::Rejected, A::SubmitForApproval, S::PendingTutorConfirmation);

/// Immutable once built, share it by reference or `Arc`.
#[derive(Debug, Clone)]
pub struct ApprovalStateMachine {
    rules: Vec<TransitionRule>,
    table: HashMap<(ApprovalStatus, ApprovalAction), ApprovalStatus>,
}

impl Default for ApprovalStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalStateMachine {
    /// The confirmation workflow with REJECTED and FINAL_CONFIRMED terminal
    pub fn new() -> Self {
        let table = DEFAULT_RULES
            .iter()
            .map(|r| ((r.from, r.action), r.to))
            .collect();

        Self {
            rules: DEFAULT_RULES.to_vec(),
            table,
        }
    }

    pub fn from_config(config: &WorkflowConfig) -> Self {
        let mut machine = Self::new();
        if config.allow_resubmission_after_rejection {
            let r = RESUBMIT_AFTER_REJECTION;
            machine.rules.push(r);
            machine.table.insert((r.from, r.action), r.to);
        }
        machine
    }

    /// Build from an arbitrary rule list. Exact duplicates collapse, two
    /// destinations for the same (from, action) pair are rejected.
    pub fn from_rules(rules: &[TransitionRule]) -> Result<Self, WorkflowError> {
        let mut table = HashMap::with_capacity(rules.len());
        let mut kept = Vec::with_capacity(rules.len());

        for r in rules {
            match table.insert((r.from, r.action), r.to) {
                None => kept.push(*r),
                Some(prev) if prev == r.to => {}
                Some(prev) => {
                    return Err(WorkflowError::ConflictingRule {
                        from: r.from,
                        action: r.action,
                        first: prev,
                        second: r.to,
                    });
                }
            }
        }

        Ok(Self { rules: kept, table })
    }

    pub fn rules(&self) -> &[TransitionRule] {
        &self.rules
    }

    pub fn can_transition(&self, from: ApprovalStatus, action: ApprovalAction) -> bool {
        self.table.contains_key(&(from, action))
    }

    pub fn next_status(&self, from: ApprovalStatus, action: ApprovalAction) -> Option<ApprovalStatus> {
        self.table.get(&(from, action)).copied()
    }

    pub fn validate_transition(
        &self,
        from: ApprovalStatus,
        action: ApprovalAction,
        expected: ApprovalStatus,
    ) -> bool {
        self.next_status(from, action) == Some(expected)
    }

    /// Lookup on raw wire values. Missing or unrecognized input is treated as
    /// "not permitted".
    pub fn next_status_raw(&self, from: Option<&str>, action: Option<&str>) -> Option<ApprovalStatus> {
        let from = from?.parse().ok()?;
        let action = action?.parse().ok()?;
        self.next_status(from, action)
    }

    pub fn can_transition_raw(&self, from: Option<&str>, action: Option<&str>) -> bool {
        self.next_status_raw(from, action).is_some()
    }

    pub fn validate_transition_raw(
        &self,
        from: Option<&str>,
        action: Option<&str>,
        expected: Option<&str>,
    ) -> bool {
        let Some(expected) = expected.and_then(|s| s.parse::<ApprovalStatus>().ok()) else {
            return false;
        };
        self.next_status_raw(from, action) == Some(expected)
    }

    pub fn valid_actions(&self, status: ApprovalStatus) -> Vec<ApprovalAction> {
        ApprovalAction::ALL
            .into_iter()
            .filter(|action| self.can_transition(status, *action))
            .collect()
    }

    pub fn next_possible_statuses(&self, status: ApprovalStatus) -> Vec<ApprovalStatus> {
        let mut out: Vec<ApprovalStatus> = Vec::new();
        for action in ApprovalAction::ALL {
            if let Some(to) = self.next_status(status, action) {
                if !out.contains(&to) {
                    out.push(to);
                }
            }
        }
        out
    }

    pub fn is_terminal(&self, status: ApprovalStatus) -> bool {
        !self.table.keys().any(|(from, _)| *from == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_deterministic() {
        assert!(ApprovalStateMachine::from_rules(&DEFAULT_RULES).is_ok());
        assert_eq!(ApprovalStateMachine::new().table.len(), DEFAULT_RULES.len());
    }

    #[test]
    fn conflicting_rules_rejected() {
        let rules = [
            rule(S::Draft, A::SubmitForApproval, S::PendingTutorConfirmation),
            rule(S::Draft, A::SubmitForApproval, S::TutorConfirmed),
        ];
        let err = ApprovalStateMachine::from_rules(&rules).unwrap_err();

        assert_eq!(
            err,
            WorkflowError::ConflictingRule {
                from: S::Draft,
                action: A::SubmitForApproval,
                first: S::PendingTutorConfirmation,
                second: S::TutorConfirmed,
            }
        );
    }

    #[test]
    fn exact_duplicates_collapse() {
        let rules = [DEFAULT_RULES[0], DEFAULT_RULES[0], DEFAULT_RULES[1]];
        let machine = ApprovalStateMachine::from_rules(&rules).unwrap();

        assert_eq!(machine.rules().len(), 2);
    }

    #[test]
    fn resubmission_edge_is_opt_in() {
        let strict = ApprovalStateMachine::from_config(&WorkflowConfig::default());
        assert!(strict.is_terminal(S::Rejected));

        let config = WorkflowConfig {
            allow_resubmission_after_rejection: true,
            ..WorkflowConfig::default()
        };
        let lenient = ApprovalStateMachine::from_config(&config);
        assert_eq!(
            lenient.next_status(S::Rejected, A::SubmitForApproval),
            Some(S::PendingTutorConfirmation)
        );
        assert!(lenient.is_terminal(S::FinalConfirmed));
    }

    #[test]
    fn valid_actions_in_declaration_order() {
        let machine = ApprovalStateMachine::new();

        assert_eq!(
            machine.valid_actions(S::PendingTutorConfirmation),
            vec![A::TutorConfirm, A::Reject, A::RequestModification]
        );
        assert!(machine.valid_actions(S::FinalConfirmed).is_empty());
        assert_eq!(
            machine.next_possible_statuses(S::LecturerConfirmed),
            vec![S::FinalConfirmed, S::Rejected]
        );
    }
}
