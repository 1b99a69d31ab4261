//! `tagflow derive` command - Display values derived from raw data

use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use console::style;
use miette::{miette, IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::output::print_record;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::color::{contrast_text, css_rgb, css_rgba, is_dark, luminance, rgb_of, Rgb};
use crate::core::format::{days_until, format_duration, percentile_bucket, PercentileBucket};

#[derive(Subcommand, Debug)]
pub enum DeriveCommands {
    /// Luminance, contrast and CSS forms of a hex colour
    Color(ColorArgs),

    /// Format a number of minutes as hours and minutes
    Duration(DurationArgs),

    /// Performance band of a percentile rank
    Percentile(PercentileArgs),

    /// Whole days from today until a date
    DaysUntil(DaysUntilArgs),
}

#[derive(clap::Args, Debug)]
pub struct ColorArgs {
    /// Hex colour, e.g. #1A2B3C
    pub hex: String,

    /// Alpha for the rgba() form (clamped to 0-1)
    #[arg(long)]
    pub alpha: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct DurationArgs {
    pub minutes: u64,
}

#[derive(clap::Args, Debug)]
pub struct PercentileArgs {
    /// Percentile rank (omit when unknown)
    pub value: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct DaysUntilArgs {
    /// Date as YYYY-MM-DD
    pub date: NaiveDate,
}

#[derive(Serialize)]
struct ColorInfo {
    hex: String,
    rgb: Rgb,
    luminance: u32,
    dark: bool,
    contrast_text: &'static str,
    css_rgb: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    css_rgba: Option<String>,
}

#[derive(Serialize)]
struct PercentileInfo {
    percentile: Option<f64>,
    bucket: PercentileBucket,
}

pub fn run(cmd: DeriveCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DeriveCommands::Color(args) => run_color(args, global),
        DeriveCommands::Duration(args) => run_duration(args, global),
        DeriveCommands::Percentile(args) => run_percentile(args, global),
        DeriveCommands::DaysUntil(args) => run_days_until(args, global),
    }
}

fn run_color(args: ColorArgs, global: &GlobalOpts) -> Result<()> {
    let rgb = rgb_of(&args.hex).into_diagnostic()?;
    let info = ColorInfo {
        hex: rgb.to_hex(),
        rgb,
        luminance: luminance(rgb),
        dark: is_dark(&args.hex).into_diagnostic()?,
        contrast_text: contrast_text(&args.hex).into_diagnostic()?,
        css_rgb: css_rgb(&args.hex).into_diagnostic()?,
        css_rgba: args
            .alpha
            .map(|alpha| css_rgba(&args.hex, alpha))
            .transpose()
            .into_diagnostic()?,
    };

    if global.format != OutputFormat::Auto {
        return print_record(&info, global.format, &info.hex);
    }
    println!("{}", style(&info.hex).bold());
    println!("  rgb        {} {} {}", rgb.r, rgb.g, rgb.b);
    println!(
        "  luminance  {} ({})",
        info.luminance,
        if info.dark { "dark" } else { "light" }
    );
    println!("  text       {}", info.contrast_text);
    println!("  css        {}", info.css_rgb);
    if let Some(rgba) = &info.css_rgba {
        println!("  css alpha  {}", rgba);
    }
    Ok(())
}

fn run_duration(args: DurationArgs, global: &GlobalOpts) -> Result<()> {
    let formatted = format_duration(args.minutes);
    match global.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "minutes": args.minutes, "formatted": formatted })
        ),
        _ => println!("{}", formatted),
    }
    Ok(())
}

fn run_percentile(args: PercentileArgs, global: &GlobalOpts) -> Result<()> {
    let info = PercentileInfo {
        percentile: args.value,
        bucket: percentile_bucket(args.value),
    };
    match global.format {
        OutputFormat::Auto | OutputFormat::Tsv | OutputFormat::Id => {
            println!("{}", info.bucket);
            Ok(())
        }
        format => print_record(&info, format, info.bucket.as_str()),
    }
}

fn run_days_until(args: DaysUntilArgs, global: &GlobalOpts) -> Result<()> {
    let target = args
        .date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| miette!("Invalid date: {}", args.date))?
        .and_utc();
    let days = days_until(target, Utc::now());
    match global.format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "date": args.date, "days": days })
        ),
        _ => println!("{}", days),
    }
    Ok(())
}
