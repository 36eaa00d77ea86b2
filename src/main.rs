//! kvc - command-line front end for the KEY=VALUE configuration store

use clap::Parser;
use keyval_config::{
    app::App,
    cli::Cli,
    config::load_settings,
    error::{AppError, ErrorReporter, Result},
};
use std::io::{self, Write};
use std::process;

fn main() {
    let cli = Cli::parse();
    let mut reporter = ErrorReporter::new(cli.use_colors(), cli.verbose || cli.debug);

    if let Err(e) = run_application(cli, &mut reporter) {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

/// Main application logic. Only command output goes to stdout.
fn run_application(cli: Cli, reporter: &mut ErrorReporter) -> Result<()> {
    if cli.debug {
        eprintln!("{}", keyval_config::build_info());
        eprintln!("Debug mode enabled");
        eprintln!();
    }

    let settings = load_settings(cli.clone())?;
    reporter.use_color = settings.enable_color;
    let app = App::new(settings);

    let output = app.run(&cli.command)?;
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&output)
        .and_then(|_| stdout.flush())
        .map_err(|e| AppError::io("<stdout>", e))?;

    Ok(())
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::NotConfigured | AppError::Config(_) => {
            eprintln!();
            eprintln!("Settings help:");
            eprintln!("  - Pass the file with --file <PATH> or set KVC_FILE");
            eprintln!("  - Run 'kvc env-help' to list supported variables");
        }
        AppError::MalformedLine { .. } => {
            eprintln!();
            eprintln!("File format help:");
            eprintln!("  - Each line must be KEY=VALUE with a non-empty key");
            eprintln!("  - Comment lines start with '#'; inline comments are not supported");
        }
        _ => {}
    }
}
