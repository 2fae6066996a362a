//! Recording process runner for tests.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::runner::{display_command, ProcessRunner};
use crate::error::{Result, StepforgeError};

/// A recorded command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub directory: PathBuf,
    pub argv: Vec<String>,
}

impl Invocation {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }
}

type Effect = Box<dyn Fn(&Path, &[String]) -> std::io::Result<()>>;

/// Records invocations instead of spawning processes.
///
/// Failures are scripted per program name, and an optional effect can
/// touch the filesystem the way the real command would.
#[derive(Default)]
pub struct RecordingRunner {
    invocations: RefCell<Vec<Invocation>>,
    failures: Vec<(String, i32)>,
    effect: Option<Effect>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every invocation of `program` exit with `code`.
    pub fn fail_on(mut self, program: impl Into<String>, code: i32) -> Self {
        self.failures.push((program.into(), code));
        self
    }

    /// Run `effect` for each successful invocation.
    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&Path, &[String]) -> std::io::Result<()> + 'static,
    {
        self.effect = Some(Box::new(effect));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.borrow().clone()
    }

    /// Program names in invocation order.
    pub fn programs(&self) -> Vec<String> {
        self.invocations
            .borrow()
            .iter()
            .map(|i| i.program().to_string())
            .collect()
    }

    pub fn clear(&self) {
        self.invocations.borrow_mut().clear();
    }
}

impl ProcessRunner for RecordingRunner {
    fn invoke(&self, directory: &Path, argv: &[String]) -> Result<()> {
        self.invocations.borrow_mut().push(Invocation {
            directory: directory.to_path_buf(),
            argv: argv.to_vec(),
        });

        let program = argv.first().map(String::as_str).unwrap_or_default();
        if let Some((_, code)) = self.failures.iter().find(|(p, _)| p == program) {
            return Err(StepforgeError::ProcessError {
                command: display_command(argv),
                directory: directory.to_path_buf(),
                code: Some(*code),
                log: None,
            });
        }

        if let Some(effect) = &self.effect {
            effect(directory, argv)?;
        }
        Ok(())
    }
}
