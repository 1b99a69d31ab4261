//! `tagflow wf` command - Review and progress workflows
//!
//! Review records move draft → submitted → under_review → approved or
//! rejected; progress records move in_progress → completed.

mod approve;
mod progress;
mod reject;
mod review;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use console::style;
use miette::{bail, IntoDiagnostic, Result};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::helpers::{open_session, parse_record_id, parse_reference, truncate_str};
use crate::cli::output::{print_list, print_record};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::{RecordId, RecordPrefix};
use crate::core::{WorkflowEngine, WorkflowFamily, WorkflowRecord, WorkflowStatus};

pub use approve::ApproveArgs;
pub use progress::ProgressArgs;
pub use reject::RejectArgs;
pub use review::ReviewArgs;

#[derive(Debug, Subcommand)]
pub enum WorkflowCommands {
    /// Start a workflow for an entity
    New(NewArgs),

    /// Submit a draft for review
    Submit(IdArgs),

    /// Take a submitted record into review
    Review(ReviewArgs),

    /// Approve a record under review
    Approve(ApproveArgs),

    /// Reject a record under review
    Reject(RejectArgs),

    /// Send a rejected record back to draft
    Reopen(IdArgs),

    /// Update progress on a progress workflow
    Progress(ProgressArgs),

    /// Show a workflow record
    Show(IdArgs),

    /// Check whether a record holds a current approval
    Valid(IdArgs),

    /// List workflow records
    List(ListArgs),
}

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Entity the workflow is about (e.g. Person:5)
    pub subject: String,

    /// Create a progress workflow instead of a review
    #[arg(long)]
    pub progress: bool,
}

#[derive(Debug, Args)]
pub struct IdArgs {
    /// Workflow id (WFL-...)
    pub id: String,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only records in this status
    #[arg(long, short = 's')]
    pub status: Option<WorkflowStatus>,

    /// Only records about this entity
    #[arg(long)]
    pub subject: Option<String>,
}

impl WorkflowCommands {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        match self {
            WorkflowCommands::New(args) => args.run(global),
            WorkflowCommands::Submit(args) => run_submit(args, global),
            WorkflowCommands::Review(args) => args.run(global),
            WorkflowCommands::Approve(args) => args.run(global),
            WorkflowCommands::Reject(args) => args.run(global),
            WorkflowCommands::Reopen(args) => run_reopen(args, global),
            WorkflowCommands::Progress(args) => args.run(global),
            WorkflowCommands::Show(args) => run_show(args, global),
            WorkflowCommands::Valid(args) => run_valid(args, global),
            WorkflowCommands::List(args) => args.run(global),
        }
    }
}

impl IdArgs {
    fn record_id(&self) -> Result<RecordId> {
        parse_record_id(&self.id, RecordPrefix::Wfl)
    }
}

/// A record together with its read-time state
#[derive(Serialize)]
struct WorkflowView<'a> {
    #[serde(flatten)]
    record: &'a WorkflowRecord,
    effective_state: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    days_until_expiry: Option<i64>,
}

impl<'a> WorkflowView<'a> {
    fn new(engine: &WorkflowEngine, record: &'a WorkflowRecord, now: DateTime<Utc>) -> Self {
        Self {
            record,
            effective_state: engine.effective_state(record, now).to_string(),
            valid: engine.is_valid(record, now),
            days_until_expiry: engine.days_until_expiry(record, now),
        }
    }
}

#[derive(Tabled, Serialize)]
struct WorkflowRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "SUBJECT")]
    subject: String,
    #[tabled(rename = "FAMILY")]
    family: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "PROGRESS")]
    progress: String,
    #[tabled(rename = "REVIEWER")]
    reviewer: String,
    #[tabled(rename = "UPDATED")]
    updated: String,
    #[tabled(rename = "NOTE")]
    note: String,
}

impl WorkflowRow {
    fn new(view: &WorkflowView<'_>) -> Self {
        let record = view.record;
        let progress = match record.family {
            WorkflowFamily::Progress => format!("{}%", record.progress),
            WorkflowFamily::Review => String::new(),
        };
        Self {
            id: record.id.to_string(),
            subject: record.subject.to_string(),
            family: record.family.to_string(),
            state: view.effective_state.clone(),
            progress,
            reviewer: record
                .reviewer
                .as_ref()
                .map(|r| r.to_string())
                .unwrap_or_default(),
            updated: record.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            note: record
                .rejection_reason
                .as_deref()
                .or(record.notes.as_deref())
                .map(|n| truncate_str(n, 40))
                .unwrap_or_default(),
        }
    }
}

/// Print a record after a transition
fn report(record: &WorkflowRecord, verb: &str, global: &GlobalOpts) -> Result<()> {
    if global.format != OutputFormat::Auto {
        return print_record(record, global.format, &record.id.to_string());
    }
    println!(
        "{} {} {} ({}) → {}",
        style("✓").green(),
        verb,
        style(record.id.short()).cyan(),
        record.subject,
        style(record.status).yellow()
    );
    Ok(())
}

impl NewArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let subject = parse_reference(&self.subject)?;
        let family = if self.progress {
            WorkflowFamily::Progress
        } else {
            WorkflowFamily::Review
        };
        let mut session = open_session(global)?;
        let record = session
            .store
            .create_workflow(family, &subject)
            .into_diagnostic()?;

        match global.format {
            OutputFormat::Auto => {
                println!(
                    "{} Created {} workflow {} for {}",
                    style("✓").green(),
                    family,
                    style(&record.id).cyan(),
                    style(&subject).yellow()
                );
                Ok(())
            }
            format => print_record(&record, format, &record.id.to_string()),
        }
    }
}

fn run_submit(args: &IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = args.record_id()?;
    let mut session = open_session(global)?;
    let engine = session.engine();
    let record = session
        .store
        .transition(&id, |record, now| engine.submit(record, now))
        .into_diagnostic()?;
    report(&record, "Submitted", global)
}

fn run_reopen(args: &IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = args.record_id()?;
    let mut session = open_session(global)?;
    let engine = session.engine();
    let record = session
        .store
        .transition(&id, |record, now| engine.reopen(record, now))
        .into_diagnostic()?;
    report(&record, "Reopened", global)
}

fn run_show(args: &IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = args.record_id()?;
    let session = open_session(global)?;
    let engine = session.engine();
    let Some(record) = session.store.workflow(&id).into_diagnostic()? else {
        bail!("Workflow not found: {}", id);
    };
    let view = WorkflowView::new(&engine, &record, session.store.now());
    print_record(&view, global.format, &record.id.to_string())
}

fn run_valid(args: &IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = args.record_id()?;
    let session = open_session(global)?;
    let engine = session.engine();
    let Some(record) = session.store.workflow(&id).into_diagnostic()? else {
        bail!("Workflow not found: {}", id);
    };
    let now = session.store.now();
    let valid = engine.is_valid(&record, now);

    match global.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({
                "id": record.id,
                "valid": valid,
                "days_until_expiry": engine.days_until_expiry(&record, now),
            })
        ),
        _ if valid => match engine.days_until_expiry(&record, now) {
            Some(days) => println!(
                "{} valid (expires in {} days)",
                style("✓").green(),
                style(days).cyan()
            ),
            None => println!("{} valid (no expiry)", style("✓").green()),
        },
        _ => println!(
            "{} not valid ({})",
            style("✗").red(),
            engine.effective_state(&record, now)
        ),
    }
    Ok(())
}

impl ListArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let session = open_session(global)?;
        let engine = session.engine();
        let now = session.store.now();

        let mut records = match &self.subject {
            Some(subject) => {
                let subject = parse_reference(subject)?;
                session.store.workflows_for(&subject).into_diagnostic()?
            }
            None => session.store.list_workflows(self.status).into_diagnostic()?,
        };
        if let Some(status) = self.status {
            records.retain(|r| r.status == status);
        }

        if records.is_empty() && global.format == OutputFormat::Auto {
            println!("No workflows found.");
            return Ok(());
        }

        let views: Vec<WorkflowView<'_>> = records
            .iter()
            .map(|record| WorkflowView::new(&engine, record, now))
            .collect();
        print_list(&views, global.format, WorkflowRow::new, |v| {
            v.record.id.to_string()
        })
    }
}
