//! Review command - Take a submitted record into review

use clap::Args;
use miette::{IntoDiagnostic, Result};

use super::report;
use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{open_session, parse_record_id, resolve_actor};
use crate::core::identity::RecordPrefix;

/// Begin reviewing a submitted record
#[derive(Debug, Args)]
pub struct ReviewArgs {
    /// Workflow id (WFL-...)
    pub id: String,

    /// Reviewer (Kind:id); defaults to the configured actor
    #[arg(long = "as", value_name = "REVIEWER")]
    pub reviewer: Option<String>,
}

impl ReviewArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let id = parse_record_id(&self.id, RecordPrefix::Wfl)?;
        let mut session = open_session(global)?;
        let reviewer = resolve_actor(self.reviewer.as_deref(), &session.config)?;
        let engine = session.engine();

        let record = session
            .store
            .transition(&id, |record, now| engine.begin_review(record, &reviewer, now))
            .into_diagnostic()?;
        report(&record, "Reviewing", global)
    }
}
