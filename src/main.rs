use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use vigil::cli::{handle_completions, handle_report, Cli, Commands};

fn main() {
    // Diagnostics go to stderr only; stdout carries nothing but the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("VIGIL_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Report(args) => match handle_report(&args) {
            Ok(document) => print!("{}", document),
            Err(e) => {
                eprintln!("{} {}", "error:".red(), e);
                std::process::exit(e.exit_code());
            }
        },
        Commands::Completions(args) => handle_completions(&args),
    }
}
