//! Walks one timesheet through the confirmation chain against a local sled db.
//!
//! `RUST_LOG=debug cargo run --example workflow [config.toml]`
use std::sync::Arc;
use timesheet_approval::{
    service::TimesheetService, timesheet::TimesheetDetails, types::Date, utils, Role,
    WorkflowConfig,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => WorkflowConfig::from_file(path)?,
        None => WorkflowConfig::default(),
    };

    let db = sled::open("sled")?;
    if !db.is_empty() {
        db.clear()?;
    }
    let service = TimesheetService::new(Arc::new(db), config)?;

    let tutor_id = utils::new_uuid_to_bech32("user_")?;
    let lecturer_id = utils::new_uuid_to_bech32("user_")?;
    let hr_id = utils::new_uuid_to_bech32("user_")?;
    let week_start = Date::from_ymd(2025, 3, 3).ok_or_else(|| anyhow::anyhow!("bad date"))?;

    let draft = service.create_draft(
        TimesheetDetails::new()
            .set_tutor(&tutor_id)
            .set_course("COMP5349")
            .set_week_start(week_start)
            .set_hours(650)
            .set_hourly_rate(5200)
            .set_description("Tutorials and consultation")
            .set_created_by(&lecturer_id),
    )?;

    service.submit(&draft.id, &lecturer_id, Role::Lecturer)?;
    service.tutor_confirm(&draft.id, &tutor_id)?;
    service.lecturer_confirm(&draft.id, &lecturer_id, None)?;
    let last = service.hr_confirm(&draft.id, &hr_id)?;

    for step in utils::next_steps(last.new_status) {
        println!("- {step}");
    }
    for record in service.history(&draft.id)? {
        let (hash, _) = record.build()?;
        println!(
            "{} -> {} via {} by {} ({})",
            record.previous_status, record.new_status, record.action, record.role, hash
        );
    }

    service.flush()
}
