//! Shared helper functions for CLI commands

use std::fs;
use std::io::{self, BufRead, IsTerminal};

use miette::{miette, IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::identity::{RecordId, RecordPrefix};
use crate::core::reference::EntityReference;
use crate::core::{Config, Project, Store, WorkflowEngine};

/// Everything a command needs to touch the project database
pub struct Session {
    pub project: Project,
    pub config: Config,
    pub store: Store,
}

impl Session {
    /// Workflow engine using the project's workflow settings
    pub fn engine(&self) -> WorkflowEngine {
        WorkflowEngine::new(self.config.workflow.clone())
    }
}

/// Discover the project, load its config and open its store
pub fn open_session(global: &GlobalOpts) -> Result<Session> {
    let project = match &global.project {
        Some(path) => Project::discover_from(path),
        None => Project::discover(),
    }
    .map_err(|e| miette!("{}", e))?;

    let config = Config::load(Some(&project));
    let path = config.store_path(&project);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).into_diagnostic()?;
    }
    let store = Store::open(&path).into_diagnostic()?;

    Ok(Session {
        project,
        config,
        store,
    })
}

/// Parse a `Kind:id` entity reference from the command line
pub fn parse_reference(input: &str) -> Result<EntityReference> {
    input
        .parse()
        .map_err(|e| miette!(help = "references look like Event:42", "{}", e))
}

/// Parse a record id, requiring the given prefix
pub fn parse_record_id(input: &str, prefix: RecordPrefix) -> Result<RecordId> {
    RecordId::parse_with_prefix(input.trim(), prefix).into_diagnostic()
}

/// The acting entity: `--as` if given, else the configured `actor`
pub fn resolve_actor(explicit: Option<&str>, config: &Config) -> Result<EntityReference> {
    if let Some(actor) = explicit {
        return parse_reference(actor);
    }
    config.actor().into_diagnostic()?.ok_or_else(|| {
        miette!(
            help = "pass --as Kind:id or set `actor` in .tagflow/config.yaml",
            "No acting reviewer given"
        )
    })
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Read ids from stdin if it is piped
///
/// Returns `None` when stdin is a terminal. Blank lines are ignored, which
/// lets pipelines like `tagflow label list Event:1 -f id | sort -r |
/// tagflow label reorder Event:1 -` work.
pub fn read_ids_from_stdin() -> Option<Vec<String>> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return None;
    }

    let ids: Vec<String> = stdin
        .lock()
        .lines()
        .map_while(|line| line.ok())
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    if ids.is_empty() {
        None
    } else {
        Some(ids)
    }
}
