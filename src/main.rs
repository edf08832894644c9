//! relprep CLI entry point

use clap::Parser;
use relprep::config::{Cli, Settings};
use relprep::pipeline;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(&cli);

    let settings = Settings::from_cli(&cli);

    if let Err(e) = validate_inputs(&cli) {
        eprintln!("Error: {}", e);
        return ExitCode::from(2);
    }

    match pipeline::run(&settings) {
        Ok(result) => {
            if !cli.quiet {
                eprintln!();
                eprintln!(
                    "Summary: {} tracks in {} albums, {} failed, {} torrents written, {} skipped",
                    result.tracks,
                    result.albums,
                    result.failed,
                    result.torrents_written.len(),
                    result.torrents_skipped
                );
            }

            if result.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            eprintln!("Fatal error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = if cli.quiet { "error" } else { filter };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn validate_inputs(cli: &Cli) -> Result<(), String> {
    // The report file itself is created, its directory must already exist
    if let Some(parent) = cli.report.as_deref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(format!(
                "Report directory does not exist: {}\n\n  Tip: Create it first, or omit -o to print the report.\n  Example: mkdir -p {}",
                parent.display(),
                parent.display()
            ));
        }
    }

    if cli.torrent_dir.is_file() {
        return Err(format!(
            "Torrent directory is a file: {}",
            cli.torrent_dir.display()
        ));
    }

    Ok(())
}
