//! Progress command - Update progress on a progress workflow

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};

use super::report;
use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{open_session, parse_record_id};
use crate::cli::OutputFormat;
use crate::core::identity::RecordPrefix;
use crate::core::FixedPoints;

/// Set progress (0-100); reaching 100 completes the workflow
#[derive(Debug, Args)]
pub struct ProgressArgs {
    /// Workflow id (WFL-...)
    pub id: String,

    /// New progress; values outside 0-100 are clamped
    #[arg(allow_negative_numbers = true)]
    pub progress: i64,

    /// Associated measurement (e.g. hours spent)
    #[arg(long)]
    pub value: Option<f64>,
}

impl ProgressArgs {
    pub fn run(&self, global: &GlobalOpts) -> Result<()> {
        let id = parse_record_id(&self.id, RecordPrefix::Wfl)?;
        let mut session = open_session(global)?;
        let engine = session.engine();
        let scorer = FixedPoints(engine.config().completion_points);

        let outcome = session
            .store
            .update_progress(&engine, &id, self.progress, self.value, &scorer)
            .into_diagnostic()?;

        report(&outcome.record, "Updated", global)?;
        if global.format == OutputFormat::Auto {
            println!("  progress {}%", style(outcome.record.progress).cyan());
            if outcome.completed_now {
                println!(
                    "  {} completed, {} points earned",
                    style("★").yellow(),
                    style(outcome.record.points_earned.unwrap_or_default()).green()
                );
            }
        }
        Ok(())
    }
}
