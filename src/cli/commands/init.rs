//! `tagflow init` command - Create a project in the current directory

use clap::Args;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::{Config, Project, Store};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory)
    pub path: Option<PathBuf>,
}

pub fn run(args: InitArgs, _global: &GlobalOpts) -> Result<()> {
    let root = match args.path {
        Some(path) => path,
        None => std::env::current_dir().into_diagnostic()?,
    };

    let project = Project::init(&root).map_err(|e| miette::miette!("{}", e))?;
    let config = Config::load(Some(&project));
    Store::open(&config.store_path(&project)).into_diagnostic()?;

    println!(
        "{} Initialized tagflow project in {}",
        style("✓").green(),
        style(project.root().display()).cyan()
    );
    println!();
    println!(
        "Attach a label with: {}",
        style("tagflow label attach Tag:1 Event:42").yellow()
    );
    Ok(())
}
