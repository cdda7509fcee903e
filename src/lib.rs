pub mod config;
pub mod error;
pub mod machine;
pub mod record;
pub mod service;
pub mod status;
pub mod timesheet;
pub mod types;
pub mod utils;

pub use config::WorkflowConfig;
pub use error::{ValidationError, WorkflowError};
pub use machine::{ApprovalStateMachine, TransitionRule};
pub use status::{ApprovalAction, ApprovalStatus, Role};
