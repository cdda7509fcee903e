use super::status::{ApprovalAction, ApprovalStatus, Role};
use super::types::TimeStamp;
use chrono::Utc;

pub const MAX_COMMENT_LEN: usize = 500;

/// One executed transition. Appended to a timesheet's history, never changed.
#[derive(Debug, PartialEq, Eq, minicbor::Encode, minicbor::Decode, Clone)]
pub struct ApprovalRecord {
    #[n(0)]
    pub timesheet_id: String,
    #[n(1)]
    pub actor_id: String,
    #[n(2)]
    pub role: Role,
    #[n(3)]
    pub action: ApprovalAction,
    #[n(4)]
    pub previous_status: ApprovalStatus,
    #[n(5)]
    pub new_status: ApprovalStatus,
    #[n(6)]
    pub comment: Option<String>,
    #[n(7)]
    pub timestamp: TimeStamp<Utc>, // issued when the transition is applied
}

impl ApprovalRecord {
    pub fn new(
        timesheet_id: String,
        actor_id: String,
        role: Role,
        action: ApprovalAction,
        previous_status: ApprovalStatus,
        new_status: ApprovalStatus,
        comment: Option<String>,
    ) -> Self {
        Self {
            timesheet_id,
            actor_id,
            role,
            action,
            previous_status,
            new_status,
            comment,
            timestamp: TimeStamp::new(),
        }
    }

    /// CBOR encoding and its sha256 digest
    pub fn build(&self) -> anyhow::Result<(String, Vec<u8>)> {
        let cbor = minicbor::to_vec(self)?;
        let hash = sha256::digest(&cbor);

        Ok((hash, cbor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_covers_contents() {
        let record = ApprovalRecord::new(
            "timesheet_1".into(),
            "user_1".into(),
            Role::Tutor,
            ApprovalAction::TutorConfirm,
            ApprovalStatus::PendingTutorConfirmation,
            ApprovalStatus::TutorConfirmed,
            None,
        );
        let mut commented = record.clone();
        commented.comment = Some("hours match the roster".into());

        let (hash, cbor) = record.build().unwrap();
        let (other, _) = commented.build().unwrap();

        assert_ne!(hash, other);
        let decoded: ApprovalRecord = minicbor::decode(&cbor).unwrap();
        assert_eq!(decoded, record);
    }
}
