//! `tagflow label` command - Attach labels to entities and query them

use clap::Subcommand;
use console::style;
use miette::{bail, IntoDiagnostic, Result};
use serde::Serialize;
use tabled::Tabled;

use crate::cli::helpers::{open_session, parse_reference, parse_record_id, read_ids_from_stdin};
use crate::cli::output::{print_list, print_record};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::identity::RecordPrefix;
use crate::core::reference::{EntityKind, EntityReference};
use crate::core::{Association, AttachOptions};

#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Attach a label to a target
    Attach(AttachArgs),

    /// Remove a label from a target
    Detach(DetachArgs),

    /// List the labels on a target in display order
    List(ListArgs),

    /// Show the primary label of a kind on a target
    Primary(PrimaryArgs),

    /// Make an association the primary of its label kind
    Promote(IdArgs),

    /// Clear the primary flag on an association
    Demote(IdArgs),

    /// Change the usage of an association
    SetUsage(SetUsageArgs),

    /// Set the display order of a target's labels
    Reorder(ReorderArgs),

    /// List the targets carrying a label
    Targets(TargetsArgs),

    /// Count targets per label of a kind
    Counts(CountsArgs),

    /// Drop every association involving an entity (after deleting it)
    Forget(ForgetArgs),
}

#[derive(clap::Args, Debug)]
pub struct AttachArgs {
    /// Label entity (e.g. Color:3)
    pub label: String,

    /// Target entity (e.g. Event:42)
    pub target: String,

    /// Role of the label on the target
    #[arg(long, short = 'u')]
    pub usage: Option<String>,

    /// Make this the primary label of its kind on the target
    #[arg(long)]
    pub primary: bool,

    /// Explicit sort position
    #[arg(long, allow_negative_numbers = true)]
    pub order: Option<i64>,
}

#[derive(clap::Args, Debug)]
pub struct DetachArgs {
    pub label: String,
    pub target: String,

    /// Usage of the association to remove
    #[arg(long, short = 'u')]
    pub usage: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Target entity
    pub target: String,

    /// Only labels of this kind
    #[arg(long, short = 'k')]
    pub kind: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct PrimaryArgs {
    pub target: String,

    /// Label kind (e.g. Color)
    pub kind: String,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Association id (ASC-...)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SetUsageArgs {
    /// Association id (ASC-...)
    pub id: String,

    /// New usage (omit to clear)
    pub usage: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReorderArgs {
    pub target: String,

    /// Association ids in their new order (or - to read from stdin)
    #[arg(required = true)]
    pub ids: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct TargetsArgs {
    /// Label entity
    pub label: String,
}

#[derive(clap::Args, Debug)]
pub struct CountsArgs {
    /// Label kind
    pub kind: String,

    /// Limit number of labels shown
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ForgetArgs {
    /// Entity being deleted
    pub entity: String,
}

/// Flattened association for table and CSV output
#[derive(Tabled, Serialize)]
struct AssociationRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "LABEL")]
    label: String,
    #[tabled(rename = "TARGET")]
    target: String,
    #[tabled(rename = "USAGE")]
    usage: String,
    #[tabled(rename = "PRIMARY")]
    primary: String,
    #[tabled(rename = "ORDER")]
    order: i64,
    #[tabled(rename = "CREATED")]
    created: String,
}

impl From<&Association> for AssociationRow {
    fn from(a: &Association) -> Self {
        Self {
            id: a.id.to_string(),
            label: a.label.to_string(),
            target: a.target.to_string(),
            usage: a.usage.clone().unwrap_or_default(),
            primary: if a.is_primary { "*".to_string() } else { String::new() },
            order: a.sort_order,
            created: a.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Tabled, Serialize)]
struct CountRow {
    #[tabled(rename = "LABEL")]
    label: String,
    #[tabled(rename = "TARGETS")]
    targets: usize,
}

#[derive(Serialize)]
struct LabelCount {
    label: EntityReference,
    targets: usize,
}

/// Run a label subcommand
pub fn run(cmd: LabelCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LabelCommands::Attach(args) => run_attach(args, global),
        LabelCommands::Detach(args) => run_detach(args, global),
        LabelCommands::List(args) => run_list(args, global),
        LabelCommands::Primary(args) => run_primary(args, global),
        LabelCommands::Promote(args) => run_promote(args, global),
        LabelCommands::Demote(args) => run_demote(args, global),
        LabelCommands::SetUsage(args) => run_set_usage(args, global),
        LabelCommands::Reorder(args) => run_reorder(args, global),
        LabelCommands::Targets(args) => run_targets(args, global),
        LabelCommands::Counts(args) => run_counts(args, global),
        LabelCommands::Forget(args) => run_forget(args, global),
    }
}

fn parse_kind(input: &str) -> Result<EntityKind> {
    input.parse().into_diagnostic()
}

fn print_associations(list: &[Association], format: OutputFormat) -> Result<()> {
    print_list(list, format, |a| AssociationRow::from(a), |a| a.id.to_string())
}

/// Confirmation line in auto mode, the record itself otherwise
fn report(association: &Association, verb: &str, global: &GlobalOpts) -> Result<()> {
    if global.format != OutputFormat::Auto {
        return print_record(association, global.format, &association.id.to_string());
    }
    let usage = association
        .usage
        .as_deref()
        .map(|u| format!(" as {}", style(u).magenta()))
        .unwrap_or_default();
    let primary = if association.is_primary {
        format!(" {}", style("(primary)").green())
    } else {
        String::new()
    };
    println!(
        "{} {} {} → {}{}{} [{}]",
        style("✓").green(),
        verb,
        style(&association.label).yellow(),
        style(&association.target).cyan(),
        usage,
        primary,
        style(association.id.short()).dim()
    );
    Ok(())
}

fn run_attach(args: AttachArgs, global: &GlobalOpts) -> Result<()> {
    let label = parse_reference(&args.label)?;
    let target = parse_reference(&args.target)?;
    let mut session = open_session(global)?;

    let options = AttachOptions {
        usage: args.usage,
        make_primary: args.primary,
        order: args.order,
    };
    let association = session
        .store
        .attach(&label, &target, options)
        .into_diagnostic()?;
    report(&association, "Attached", global)
}

fn run_detach(args: DetachArgs, global: &GlobalOpts) -> Result<()> {
    let label = parse_reference(&args.label)?;
    let target = parse_reference(&args.target)?;
    let mut session = open_session(global)?;

    let removed = session
        .store
        .detach(&label, &target, args.usage.as_deref())
        .into_diagnostic()?;

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "removed": removed })),
        _ if removed => println!(
            "{} Detached {} from {}",
            style("✓").green(),
            style(&label).yellow(),
            style(&target).cyan()
        ),
        _ => println!("No matching association; nothing to detach."),
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let target = parse_reference(&args.target)?;
    let kind = args.kind.as_deref().map(parse_kind).transpose()?;
    let session = open_session(global)?;

    let list = session
        .store
        .list_for_target(&target, kind.as_ref())
        .into_diagnostic()?;

    if list.is_empty() && global.format == OutputFormat::Auto {
        println!("No labels on {}.", style(&target).cyan());
        return Ok(());
    }
    print_associations(&list, global.format)
}

fn run_primary(args: PrimaryArgs, global: &GlobalOpts) -> Result<()> {
    let target = parse_reference(&args.target)?;
    let kind = parse_kind(&args.kind)?;
    let session = open_session(global)?;

    match session.store.primary_for(&target, &kind).into_diagnostic()? {
        Some(association) => print_record(
            &association,
            global.format,
            &association.id.to_string(),
        ),
        None => {
            if global.format == OutputFormat::Json {
                println!("null");
            } else {
                println!("No primary {} on {}.", kind, style(&target).cyan());
            }
            Ok(())
        }
    }
}

fn run_promote(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = parse_record_id(&args.id, RecordPrefix::Asc)?;
    let mut session = open_session(global)?;
    let association = session.store.set_primary(&id).into_diagnostic()?;
    report(&association, "Promoted", global)
}

fn run_demote(args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = parse_record_id(&args.id, RecordPrefix::Asc)?;
    let mut session = open_session(global)?;
    let association = session.store.clear_primary(&id).into_diagnostic()?;
    report(&association, "Demoted", global)
}

fn run_set_usage(args: SetUsageArgs, global: &GlobalOpts) -> Result<()> {
    let id = parse_record_id(&args.id, RecordPrefix::Asc)?;
    let mut session = open_session(global)?;
    let association = session
        .store
        .set_usage(&id, args.usage.as_deref())
        .into_diagnostic()?;
    report(&association, "Updated", global)
}

fn run_reorder(args: ReorderArgs, global: &GlobalOpts) -> Result<()> {
    let target = parse_reference(&args.target)?;

    let raw_ids = if args.ids.len() == 1 && args.ids[0] == "-" {
        match read_ids_from_stdin() {
            Some(ids) => ids,
            None => bail!("No ids on stdin"),
        }
    } else {
        args.ids
    };
    let ids = raw_ids
        .iter()
        .map(|id| parse_record_id(id, RecordPrefix::Asc))
        .collect::<Result<Vec<_>>>()?;

    let mut session = open_session(global)?;
    let list = session.store.reorder(&target, &ids).into_diagnostic()?;
    print_associations(&list, global.format)
}

fn run_targets(args: TargetsArgs, global: &GlobalOpts) -> Result<()> {
    let label = parse_reference(&args.label)?;
    let session = open_session(global)?;
    let list = session.store.list_for_label(&label).into_diagnostic()?;

    if list.is_empty() && global.format == OutputFormat::Auto {
        println!("{} is not attached to anything.", style(&label).yellow());
        return Ok(());
    }
    print_associations(&list, global.format)
}

fn run_counts(args: CountsArgs, global: &GlobalOpts) -> Result<()> {
    let kind = parse_kind(&args.kind)?;
    let session = open_session(global)?;

    let mut counts: Vec<LabelCount> = session
        .store
        .label_counts(&kind)
        .into_diagnostic()?
        .into_iter()
        .map(|(label, targets)| LabelCount { label, targets })
        .collect();
    if let Some(limit) = args.limit {
        counts.truncate(limit);
    }

    if counts.is_empty() && global.format == OutputFormat::Auto {
        println!("No {} labels in use.", kind);
        return Ok(());
    }
    print_list(
        &counts,
        global.format,
        |c| CountRow {
            label: c.label.to_string(),
            targets: c.targets,
        },
        |c| c.label.to_string(),
    )
}

fn run_forget(args: ForgetArgs, global: &GlobalOpts) -> Result<()> {
    let entity = parse_reference(&args.entity)?;
    let mut session = open_session(global)?;
    let removed = session.store.remove_entity(&entity).into_diagnostic()?;

    match global.format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "removed": removed })),
        _ => println!(
            "{} Removed {} association(s) involving {}",
            style("✓").green(),
            style(removed).cyan(),
            style(&entity).yellow()
        ),
    }
    Ok(())
}
