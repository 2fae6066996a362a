//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::options::OptionOverride;

/// Plan and run multi-step dependency builds.
#[derive(Debug, Parser)]
#[command(name = "stepforge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to an alternate configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Project root (defaults to the nearest directory with .stepforge/)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Echo command output while steps run
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors and the final result only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Build a step and everything it depends on (default)
    Run(RunArgs),

    /// Show which steps would run, without running them
    Plan(PlanArgs),

    /// List configured steps
    List(ListArgs),

    /// Show the resolved options of one step
    Options(OptionsArgs),
}

/// Arguments for the `run` command.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Step to build (defaults to settings.default_root)
    pub root: Option<String>,

    /// Override an option, written STEP.OPTION=VALUE (repeatable)
    #[arg(short = 'o', long = "option", value_name = "STEP.OPTION=VALUE")]
    pub options: Vec<OptionOverride>,

    /// Print the plan with resolved options instead of running it
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct PlanArgs {
    /// Step to plan (defaults to settings.default_root)
    pub root: Option<String>,

    /// Override an option, written STEP.OPTION=VALUE (repeatable)
    #[arg(short = 'o', long = "option", value_name = "STEP.OPTION=VALUE")]
    pub options: Vec<OptionOverride>,

    /// Print the plan as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ListArgs {
    /// Print the step list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Clone, Default, Args)]
pub struct OptionsArgs {
    /// Step whose options to show
    pub step: String,

    /// Override an option, written STEP.OPTION=VALUE (repeatable)
    #[arg(short = 'o', long = "option", value_name = "STEP.OPTION=VALUE")]
    pub options: Vec<OptionOverride>,

    /// Print the options as JSON
    #[arg(long)]
    pub json: bool,
}
