//! Error types for stepforge operations.
//!
//! This module defines [`StepforgeError`], the primary error type used
//! throughout the engine, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Configuration problems (missing options, cycles, bad placeholders) are
//!   detected while the plan is built, before any step executes
//! - Fetch, process and patch failures carry enough context (URL, command,
//!   directory, exit code) to diagnose the failure without re-running
//! - A failing step is wrapped in [`StepforgeError::StepFailed`] so the
//!   step name travels with the underlying error
//! - Use `anyhow::Error` (via `StepforgeError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for stepforge operations.
#[derive(Debug, Error)]
pub enum StepforgeError {
    /// Configuration file not found at expected location.
    #[error("Configuration not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Failed to parse configuration file.
    #[error("Failed to parse config at {path}: {message}")]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration structure or values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// A step name that is not in the registry.
    #[error("Unknown step '{name}' (referenced by {referenced_by})")]
    UnknownStep { name: String, referenced_by: String },

    /// A required option is still unset after references and defaults.
    #[error("Step '{step}' is missing required option '{option}'")]
    MissingOption { step: String, option: String },

    /// Option references form a cycle.
    #[error("Circular option reference: {cycle}")]
    CircularReference { cycle: String },

    /// Step dependencies form a cycle.
    #[error("Circular dependency detected: {cycle}")]
    CircularDependency { cycle: String },

    /// A `{placeholder}` could not be filled in a single templating pass.
    #[error("Step '{step}': option '{option}' has unresolved placeholder {{{placeholder}}}")]
    UnresolvedPlaceholder {
        step: String,
        option: String,
        placeholder: String,
    },

    /// Network retrieval or archive extraction failed.
    #[error("Failed to fetch {url}: {message}")]
    FetchError { url: String, message: String },

    /// External command exited nonzero (or could not be started).
    #[error("Command failed with exit code {code:?}: {command} (in {})", directory.display())]
    ProcessError {
        command: String,
        directory: PathBuf,
        code: Option<i32>,
        log: Option<String>,
    },

    /// A post-fetch patch declined to apply.
    #[error("Patch not applied to {}: {message}", path.display())]
    PatchError { path: PathBuf, message: String },

    /// A step's action failed.
    #[error("Step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: Box<StepforgeError>,
    },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Broad classification of a [`StepforgeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Fetch,
    Process,
    Patch,
    Io,
    Other,
}

impl StepforgeError {
    /// Classify this error. A [`StepFailed`](Self::StepFailed) error
    /// reports the kind of the error it wraps.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConfigNotFound { .. }
            | Self::ConfigParseError { .. }
            | Self::ConfigValidationError { .. }
            | Self::UnknownStep { .. }
            | Self::MissingOption { .. }
            | Self::CircularReference { .. }
            | Self::CircularDependency { .. }
            | Self::UnresolvedPlaceholder { .. } => ErrorKind::Configuration,
            Self::FetchError { .. } => ErrorKind::Fetch,
            Self::ProcessError { .. } => ErrorKind::Process,
            Self::PatchError { .. } => ErrorKind::Patch,
            Self::StepFailed { source, .. } => source.kind(),
            Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Name of the failing step, if this error is attributed to one.
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            Self::StepFailed { step, .. } => Some(step),
            _ => None,
        }
    }

    /// Captured log context attached to a process failure.
    pub fn log_context(&self) -> Option<&str> {
        match self {
            Self::ProcessError { log, .. } => log.as_deref(),
            Self::StepFailed { source, .. } => source.log_context(),
            _ => None,
        }
    }
}

/// Result type alias for stepforge operations.
pub type Result<T> = std::result::Result<T, StepforgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_not_found_displays_path() {
        let err = StepforgeError::ConfigNotFound {
            path: PathBuf::from("/foo/config.yml"),
        };
        assert!(err.to_string().contains("/foo/config.yml"));
    }

    #[test]
    fn missing_option_names_step_and_option() {
        let err = StepforgeError::MissingOption {
            step: "build_zlib".into(),
            option: "source_dir".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("build_zlib"));
        assert!(msg.contains("source_dir"));
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn unresolved_placeholder_shows_braces() {
        let err = StepforgeError::UnresolvedPlaceholder {
            step: "fetch_zlib".into(),
            option: "url".into(),
            placeholder: "version".into(),
        };
        assert!(err.to_string().contains("{version}"));
    }

    #[test]
    fn process_error_displays_command_code_and_directory() {
        let err = StepforgeError::ProcessError {
            command: "make install".into(),
            directory: PathBuf::from("/tmp/zlib"),
            code: Some(2),
            log: None,
        };
        let msg = err.to_string();
        assert!(msg.contains("make install"));
        assert!(msg.contains("2"));
        assert!(msg.contains("/tmp/zlib"));
        assert_eq!(err.kind(), ErrorKind::Process);
    }

    #[test]
    fn step_failed_reports_inner_kind_and_step() {
        let err = StepforgeError::StepFailed {
            step: "build_x".into(),
            source: Box::new(StepforgeError::ProcessError {
                command: "cmake".into(),
                directory: PathBuf::from("."),
                code: Some(1),
                log: Some("CMake Error".into()),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::Process);
        assert_eq!(err.failed_step(), Some("build_x"));
        assert_eq!(err.log_context(), Some("CMake Error"));
        assert!(err.to_string().contains("build_x"));
    }

    #[test]
    fn step_failed_exposes_source() {
        use std::error::Error as _;
        let err = StepforgeError::StepFailed {
            step: "fetch_x".into(),
            source: Box::new(StepforgeError::FetchError {
                url: "https://example.com/x.tar.gz".into(),
                message: "HTTP 404".into(),
            }),
        };
        assert!(err.source().is_some());
        assert_eq!(err.kind(), ErrorKind::Fetch);
    }

    #[test]
    fn patch_error_is_its_own_kind() {
        let err = StepforgeError::PatchError {
            path: PathBuf::from("src/CMakeLists.txt"),
            message: "hash mismatch".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Patch);
    }

    #[test]
    fn io_error_converts_from_std() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: StepforgeError = io_err.into();
        assert!(matches!(err, StepforgeError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
