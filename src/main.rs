use clap::Parser;
use miette::Result;
use tagflow::cli::{Cli, Commands};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose turns on debug output
    let default_filter = if cli.global.verbose {
        "tagflow=debug"
    } else {
        "tagflow=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();

    let global = &cli.global;
    match cli.command {
        Commands::Init(args) => tagflow::cli::commands::init::run(args, global),
        Commands::Label(cmd) => tagflow::cli::commands::label::run(cmd, global),
        Commands::Workflow(cmd) => cmd.run(global),
        Commands::Derive(cmd) => tagflow::cli::commands::derive::run(cmd, global),
        Commands::Completions(args) => tagflow::cli::commands::completions::run(args),
    }
}
