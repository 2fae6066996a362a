//! stepforge CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use stepforge::cli::{Cli, CommandDispatcher, Project};
use stepforge::ui::{OutputMode, TerminalUI};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("stepforge=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stepforge=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("stepforge starting with args: {:?}", cli);

    let output_mode = OutputMode::from_flags(cli.verbose, cli.quiet);
    let mut ui = TerminalUI::new(output_mode, cli.no_color);

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            eprintln!("Error: cannot read current directory: {}", e);
            return ExitCode::from(1);
        }
    };
    let project_root = Project::discover_root(cli.project.as_deref(), &cwd);

    let dispatcher = CommandDispatcher::new(project_root, cli.config.clone());
    let result = dispatcher.dispatch(&cli, &mut ui);
    ExitCode::from(result.exit_code as u8)
}
