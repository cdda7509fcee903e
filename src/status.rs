//! Workflow vocabulary: statuses, actions and the roles that issue them
use super::error::ValidationError;
use std::fmt;
use std::str::FromStr;

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApprovalStatus {
    #[n(0)]
    Draft,
    #[n(1)]
    PendingTutorConfirmation,
    #[n(2)]
    TutorConfirmed,
    #[n(3)]
    LecturerConfirmed,
    #[n(4)]
    FinalConfirmed,
    #[n(5)]
    Rejected,
    #[n(6)]
    ModificationRequested,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ApprovalAction {
    #[n(0)]
    SubmitForApproval,
    #[n(1)]
    TutorConfirm,
    #[n(2)]
    LecturerConfirm,
    #[n(3)]
    HrConfirm,
    #[n(4)]
    Reject,
    #[n(5)]
    RequestModification,
}

#[derive(minicbor::Encode, minicbor::Decode, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    #[n(0)]
    Tutor,
    #[n(1)]
    Lecturer,
    #[n(2)]
    Admin,
    #[n(3)]
    Hr,
}

impl ApprovalStatus {
    pub const ALL: [ApprovalStatus; 7] = [
        Self::Draft,
        Self::PendingTutorConfirmation,
        Self::TutorConfirmed,
        Self::LecturerConfirmed,
        Self::FinalConfirmed,
        Self::Rejected,
        Self::ModificationRequested,
    ];

    /// Upper-case enum name, e.g. `PENDING_TUTOR_CONFIRMATION`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingTutorConfirmation => "PENDING_TUTOR_CONFIRMATION",
            Self::TutorConfirmed => "TUTOR_CONFIRMED",
            Self::LecturerConfirmed => "LECTURER_CONFIRMED",
            Self::FinalConfirmed => "FINAL_CONFIRMED",
            Self::Rejected => "REJECTED",
            Self::ModificationRequested => "MODIFICATION_REQUESTED",
        }
    }

    /// Persisted wire value, e.g. `pending_tutor_confirmation`
    pub fn value(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingTutorConfirmation => "pending_tutor_confirmation",
            Self::TutorConfirmed => "tutor_confirmed",
            Self::LecturerConfirmed => "lecturer_confirmed",
            Self::FinalConfirmed => "final_confirmed",
            Self::Rejected => "rejected",
            Self::ModificationRequested => "modification_requested",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::PendingTutorConfirmation => "Pending Tutor Confirmation",
            Self::TutorConfirmed => "Tutor Confirmed",
            Self::LecturerConfirmed => "Lecturer Confirmed",
            Self::FinalConfirmed => "Final Confirmed",
            Self::Rejected => "Rejected",
            Self::ModificationRequested => "Modification Requested",
        }
    }

    /// Awaiting a confirmation from tutor, lecturer or HR
    pub fn is_pending(&self) -> bool {
        matches!(
            self,
            Self::PendingTutorConfirmation | Self::TutorConfirmed | Self::LecturerConfirmed
        )
    }

    /// Hours, rate and description may only change in these statuses
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::ModificationRequested)
    }
}

impl ApprovalAction {
    pub const ALL: [ApprovalAction; 6] = [
        Self::SubmitForApproval,
        Self::TutorConfirm,
        Self::LecturerConfirm,
        Self::HrConfirm,
        Self::Reject,
        Self::RequestModification,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SubmitForApproval => "SUBMIT_FOR_APPROVAL",
            Self::TutorConfirm => "TUTOR_CONFIRM",
            Self::LecturerConfirm => "LECTURER_CONFIRM",
            Self::HrConfirm => "HR_CONFIRM",
            Self::Reject => "REJECT",
            Self::RequestModification => "REQUEST_MODIFICATION",
        }
    }
}

use ApprovalAction as A;
use ApprovalStatus as S;

// (role, from status, action) triples a non-admin role may issue. The
// transition table still decides whether the action is legal at all.
const ROLE_PERMISSIONS: [(Role, ApprovalStatus, ApprovalAction); 12] = [
    (Role::Lecturer, S::Draft, A::SubmitForApproval),
    (Role::Lecturer, S::TutorConfirmed, A::LecturerConfirm),
    (Role::Lecturer, S::TutorConfirmed, A::RequestModification),
    (Role::Lecturer, S::TutorConfirmed, A::Reject),
    (Role::Tutor, S::Draft, A::SubmitForApproval),
    (Role::Tutor, S::PendingTutorConfirmation, A::TutorConfirm),
    (Role::Tutor, S::PendingTutorConfirmation, A::RequestModification),
    (Role::Tutor, S::PendingTutorConfirmation, A::Reject),
    (Role::Tutor, S::ModificationRequested, A::SubmitForApproval),
    (Role::Tutor, S::Rejected, A::SubmitForApproval),
    (Role::Hr, S::LecturerConfirmed, A::HrConfirm),
    (Role::Hr, S::LecturerConfirmed, A::Reject),
];

impl Role {
    pub const ALL: [Role; 4] = [Self::Tutor, Self::Lecturer, Self::Admin, Self::Hr];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tutor => "TUTOR",
            Self::Lecturer => "LECTURER",
            Self::Admin => "ADMIN",
            Self::Hr => "HR",
        }
    }

    /// Whether this role may issue `action` against a timesheet in `from`.
    /// Admin may issue anything.
    pub fn may_perform(&self, from: ApprovalStatus, action: ApprovalAction) -> bool {
        *self == Self::Admin
            || ROLE_PERMISSIONS
                .iter()
                .any(|(role, status, a)| role == self && *status == from && *a == action)
    }

    /// Tutors act only on their own timesheets
    pub fn requires_ownership(&self) -> bool {
        matches!(self, Self::Tutor)
    }
}

impl FromStr for ApprovalStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.value() == s || status.name() == s)
            .ok_or_else(|| ValidationError::UnknownStatus(s.to_string()))
    }
}

impl FromStr for ApprovalAction {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.name() == s)
            .ok_or_else(|| ValidationError::UnknownAction(s.to_string()))
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TUTOR" => Ok(Self::Tutor),
            "LECTURER" => Ok(Self::Lecturer),
            "ADMIN" => Ok(Self::Admin),
            "HR" => Ok(Self::Hr),
            _ => Err(ValidationError::UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
