//! External command invocation.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Instant;

use tracing::{debug, info};

use super::scoped_dir::ScopedDir;
use crate::config::ToolchainConfig;
use crate::error::{Result, StepforgeError};
use crate::platform::Platform;

/// Runs external commands in a given directory.
pub trait ProcessRunner {
    /// Run `argv` with `directory` as the working directory.
    ///
    /// # Errors
    ///
    /// A command that cannot start or exits nonzero yields
    /// `ProcessError` carrying the command, directory and exit code.
    fn invoke(&self, directory: &Path, argv: &[String]) -> Result<()>;

    /// Whether `argv` exits with status 0. Used by skip predicates.
    fn succeeds(&self, directory: &Path, argv: &[String]) -> bool {
        self.invoke(directory, argv).is_ok()
    }
}

/// Activation prefix placed in front of every command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    activate: Vec<String>,
}

impl Toolchain {
    pub fn new(activate: Vec<String>) -> Self {
        Self { activate }
    }

    /// The configured toolchain, if it applies on `platform`.
    pub fn from_config(config: Option<&ToolchainConfig>, platform: Platform) -> Option<Self> {
        let config = config?;
        if config.activate.is_empty() || !platform.matches(&config.platforms) {
            return None;
        }
        Some(Self::new(config.activate.clone()))
    }

    pub fn wrap(&self, argv: &[String]) -> Vec<String> {
        self.activate.iter().chain(argv).cloned().collect()
    }
}

/// Render an argument vector for messages, quoting arguments with spaces.
pub fn display_command(argv: &[String]) -> String {
    argv.iter()
        .map(|arg| {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                format!("\"{}\"", arg)
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Output line from a running command.
#[derive(Debug, Clone)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Number of trailing output lines attached to a failure.
const FAILURE_TAIL: usize = 20;

/// Runs commands on the host, streaming their output.
#[derive(Debug, Clone, Default)]
pub struct SystemRunner {
    toolchain: Option<Toolchain>,
    echo: bool,
}

impl SystemRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_toolchain(mut self, toolchain: Option<Toolchain>) -> Self {
        self.toolchain = toolchain;
        self
    }

    /// Print command output as it arrives.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// The argument vector actually spawned for `argv`.
    pub fn command_line(&self, argv: &[String]) -> Vec<String> {
        match &self.toolchain {
            Some(toolchain) => toolchain.wrap(argv),
            None => argv.to_vec(),
        }
    }

    fn failure(
        &self,
        argv: &[String],
        directory: &Path,
        code: Option<i32>,
        log: Option<String>,
    ) -> StepforgeError {
        StepforgeError::ProcessError {
            command: display_command(argv),
            directory: directory.to_path_buf(),
            code,
            log,
        }
    }

    fn spawn_streaming(&self, argv: &[String], directory: &Path) -> Result<()> {
        let start = Instant::now();

        let mut child = Command::new(&argv[0])
            .args(&argv[1..])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.failure(argv, directory, None, Some(e.to_string())))?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || {
                for line in BufReader::new(stdout).lines().map_while(std::result::Result::ok) {
                    let _ = tx.send(OutputLine::Stdout(line));
                }
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(std::result::Result::ok) {
                    let _ = tx.send(OutputLine::Stderr(line));
                }
            }));
        }
        drop(tx);

        let mut tail: Vec<String> = Vec::new();
        for line in rx {
            let text = match &line {
                OutputLine::Stdout(text) | OutputLine::Stderr(text) => text.clone(),
            };
            if self.echo {
                match line {
                    OutputLine::Stdout(text) => println!("{}", text),
                    OutputLine::Stderr(text) => eprintln!("{}", text),
                }
            }
            if tail.len() == FAILURE_TAIL {
                tail.remove(0);
            }
            tail.push(text);
        }
        for reader in readers {
            let _ = reader.join();
        }

        let status = child
            .wait()
            .map_err(|e| self.failure(argv, directory, None, Some(e.to_string())))?;
        debug!(
            "{} finished in {:?} with {}",
            display_command(argv),
            start.elapsed(),
            status
        );

        if status.success() {
            Ok(())
        } else {
            let log = (!tail.is_empty()).then(|| tail.join("\n"));
            Err(self.failure(argv, directory, status.code(), log))
        }
    }
}

impl ProcessRunner for SystemRunner {
    fn invoke(&self, directory: &Path, argv: &[String]) -> Result<()> {
        let argv = self.command_line(argv);
        if argv.is_empty() {
            let log = Some("empty command".to_string());
            return Err(self.failure(&argv, directory, None, log));
        }

        info!("Running {} in {}", display_command(&argv), directory.display());
        let _guard = ScopedDir::enter(directory).map_err(|e| {
            let log = Some(format!("cannot enter directory: {}", e));
            self.failure(&argv, directory, None, log)
        })?;
        self.spawn_streaming(&argv, directory)
    }
}
