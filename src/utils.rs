//! Identifier helpers and workflow guidance text
use super::status::ApprovalStatus;
use bech32::Bech32m;
use uuid7::uuid7;

// construct a unique id then encode using bech32
pub fn new_uuid_to_bech32(hrp: &str) -> anyhow::Result<String> {
    let hrp = bech32::Hrp::parse(hrp)?;
    let encode = bech32::encode::<Bech32m>(hrp, uuid7().as_bytes())?;
    Ok(encode)
}

/// What happens next for a timesheet that just entered `status`
pub fn next_steps(status: ApprovalStatus) -> &'static [&'static str] {
    match status {
        ApprovalStatus::Draft => &[
            "Timesheet is in draft status",
            "Can be edited and updated as needed",
            "Submit for approval when ready",
        ],
        ApprovalStatus::PendingTutorConfirmation => &[
            "Timesheet is awaiting tutor confirmation",
            "Lecturer may reject or request changes",
        ],
        ApprovalStatus::TutorConfirmed => &[
            "Timesheet has been confirmed by the tutor",
            "Lecturer should now confirm",
        ],
        ApprovalStatus::LecturerConfirmed => &[
            "Timesheet has been confirmed by the lecturer",
            "Awaiting final HR confirmation",
        ],
        ApprovalStatus::FinalConfirmed => &[
            "Timesheet has been fully confirmed",
            "Ready for payroll processing",
            "No further approvals required",
        ],
        ApprovalStatus::Rejected => &[
            "Timesheet has been rejected",
            "Review the rejection reason",
            "Resubmit if enabled, otherwise create a new timesheet",
        ],
        ApprovalStatus::ModificationRequested => &[
            "Modifications have been requested",
            "Review the feedback and update the timesheet",
            "Resubmit after making the requested changes",
        ],
    }
}
