//! Reject command - Reject records under review

use clap::Args;
use miette::{IntoDiagnostic, Result};

use super::report;
use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{open_session, parse_record_id, resolve_actor};
use crate::core::identity::RecordPrefix;

/// Reject a record under review
#[derive(Debug, Args)]
pub struct RejectArgs {
    /// Workflow id (WFL-...)
    pub id: String,

    /// Rejection reason (required)
    #[arg(long, short = 'r')]
    pub reason: String,

    /// Reviewer (Kind:id); defaults to the configured actor
    #[arg(long = "as", value_name = "REVIEWER")]
    pub reviewer: Option<String>,

    /// Additional notes
    #[arg(long, short = 'm')]
    pub notes: Option<String>,
}

impl RejectArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let id = parse_record_id(&self.id, RecordPrefix::Wfl)?;
        let mut session = open_session(global)?;
        let reviewer = resolve_actor(self.reviewer.as_deref(), &session.config)?;
        let engine = session.engine();

        let record = session
            .store
            .transition(&id, |record, now| {
                engine.reject(record, &reviewer, &self.reason, self.notes.as_deref(), now)
            })
            .into_diagnostic()?;
        report(&record, "Rejected", global)
    }
}
