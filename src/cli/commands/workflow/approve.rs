//! Approve command - Approve records under review

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};

use super::report;
use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{open_session, parse_record_id, resolve_actor};
use crate::cli::OutputFormat;
use crate::core::identity::RecordPrefix;
use crate::core::workflow::validity_days;

/// Approve a record under review (or a submitted one, which passes through
/// review)
#[derive(Debug, Args)]
pub struct ApproveArgs {
    /// Workflow id (WFL-...)
    pub id: String,

    /// Reviewer (Kind:id); defaults to the configured actor
    #[arg(long = "as", value_name = "REVIEWER")]
    pub reviewer: Option<String>,

    /// Approval notes
    #[arg(long, short = 'm')]
    pub notes: Option<String>,

    /// Review score
    #[arg(long, allow_negative_numbers = true)]
    pub score: Option<i32>,

    /// Days the approval stays valid, 0 for no expiry (defaults to
    /// workflow.default_validity_days)
    #[arg(long, conflicts_with = "no_expiry")]
    pub valid_days: Option<u32>,

    /// The approval never expires
    #[arg(long)]
    pub no_expiry: bool,
}

impl ApproveArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let id = parse_record_id(&self.id, RecordPrefix::Wfl)?;
        let mut session = open_session(global)?;
        let reviewer = resolve_actor(self.reviewer.as_deref(), &session.config)?;
        let engine = session.engine();

        let mut options = engine.approval_options(reviewer);
        options.notes = self.notes.clone();
        options.score = self.score;
        if self.no_expiry {
            options.validity = None;
        } else if let Some(days) = self.valid_days {
            options.validity = validity_days(days);
        }

        let record = session
            .store
            .transition(&id, |record, now| engine.approve(record, &options, now))
            .into_diagnostic()?;

        report(&record, "Approved", global)?;
        if global.format == OutputFormat::Auto {
            match record.expires_at {
                Some(expires_at) => println!(
                    "  valid until {}",
                    style(expires_at.format("%Y-%m-%d")).cyan()
                ),
                None => println!("  no expiry"),
            }
        }
        Ok(())
    }
}
