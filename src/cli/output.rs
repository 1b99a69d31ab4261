//! Output formatting utilities

use std::io;

use miette::{bail, IntoDiagnostic, Result};
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Tsv
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print a list of records
///
/// JSON and YAML serialize the records themselves; table and CSV output use
/// the flattened row produced by `to_row`.
pub fn print_list<D, R>(
    items: &[D],
    format: OutputFormat,
    to_row: impl Fn(&D) -> R,
    to_id: impl Fn(&D) -> String,
) -> Result<()>
where
    D: Serialize,
    R: Serialize + Tabled,
{
    match effective_format(format, true) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items).into_diagnostic()?);
        }
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(items).into_diagnostic()?);
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(io::stdout());
            for item in items {
                writer.serialize(to_row(item)).into_diagnostic()?;
            }
            writer.flush().into_diagnostic()?;
        }
        OutputFormat::Id => {
            for item in items {
                println!("{}", to_id(item));
            }
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            let rows: Vec<R> = items.iter().map(to_row).collect();
            let mut table = Table::new(rows);
            table.with(Style::blank());
            println!("{}", table);
        }
    }
    Ok(())
}

/// Print a single record
pub fn print_record<D: Serialize>(item: &D, format: OutputFormat, id: &str) -> Result<()> {
    match effective_format(format, false) {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item).into_diagnostic()?);
        }
        OutputFormat::Id => println!("{}", id),
        OutputFormat::Csv => bail!("CSV output is only available for lists"),
        OutputFormat::Yaml | OutputFormat::Tsv | OutputFormat::Auto => {
            print!("{}", serde_yml::to_string(item).into_diagnostic()?);
        }
    }
    Ok(())
}
