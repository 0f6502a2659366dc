//! CLI error types with exit code handling
//!
//! Every fatal failure is a [`CliError`] tagged with the pipeline [`Stage`]
//! it came from. The pair decides the process exit code.

use std::fmt;

use helmwrap_core::CoreError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// Pipeline stages, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Load,
    RegisterReferencedRepository,
    ExtractArchive,
    BuildDependencies,
    BuildCommand,
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Load => "load config",
            Stage::RegisterReferencedRepository => "register referenced repository",
            Stage::ExtractArchive => "extract chart archive",
            Stage::BuildDependencies => "build chart dependencies",
            Stage::BuildCommand => "build command",
            Stage::Execute => "execute",
        };
        f.write_str(name)
    }
}

/// Failure causes
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Config record missing, unreadable, or not JSON
    #[error("Failed to load config: {message}")]
    #[diagnostic(code(helmwrap::config::load))]
    ConfigLoad {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Unknown type or command, or contradictory fields
    #[error("Unsupported config: {message}")]
    #[diagnostic(
        code(helmwrap::config::shape),
        help(
            "type must be 'repository' or 'release'; command must be one of install, upgrade, uninstall, status, get-values"
        )
    )]
    UnsupportedConfigShape { message: String },

    #[error("{message}")]
    #[diagnostic(code(helmwrap::archive))]
    ExtractionFailed { message: String },

    /// Logged, never fatal: the repository may already exist
    #[error("Failed to add repository {name} ({url}): {reason}; it may already exist")]
    #[diagnostic(code(helmwrap::repo::add))]
    RepositoryRegistrationFailed {
        name: String,
        url: String,
        reason: String,
    },

    #[error("Failed to update repository index: {reason}")]
    #[diagnostic(code(helmwrap::repo::update))]
    RepositoryUpdateFailed { reason: String },

    #[error("Failed to build chart dependencies for {chart}: {reason}")]
    #[diagnostic(code(helmwrap::dependency::build))]
    DependencyBuildFailed { chart: String, reason: String },

    /// Helm ran and reported failure
    #[error("{program} exited with status {code}")]
    #[diagnostic(code(helmwrap::helm))]
    PrimaryCommandFailed { program: String, code: i32 },

    /// Helm could not be launched at all
    #[error("Failed to start {program}: {message}")]
    #[diagnostic(
        code(helmwrap::spawn),
        help("check that the helm binary exists and is executable, or pass --helm")
    )]
    ProcessStartFailed { program: String, message: String },
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        if err.is_unsupported_shape() {
            return CliError::UnsupportedConfigShape {
                message: err.to_string(),
            };
        }
        match err {
            CoreError::ExtractionFailed { .. } => CliError::ExtractionFailed {
                message: err.to_string(),
            },
            CoreError::ConfigRead { .. } => CliError::ConfigLoad {
                message: err.to_string(),
                help: Some("the --config path must point at a readable JSON file".to_string()),
            },
            other => CliError::ConfigLoad {
                message: other.to_string(),
                help: None,
            },
        }
    }
}

/// A fatal failure and the stage that produced it
#[derive(Error, Debug, Diagnostic)]
#[error("Stage '{stage}' failed")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    #[diagnostic_source]
    pub cause: CliError,
}

impl StageError {
    pub fn new(stage: Stage, cause: impl Into<CliError>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }

    /// Exit code for the whole process
    ///
    /// Helm's own status is mirrored when the primary command ran; any
    /// earlier failure uses a fixed engine code.
    pub fn exit_code(&self) -> i32 {
        match (&self.cause, self.stage) {
            (CliError::PrimaryCommandFailed { code, .. }, _) => *code,
            (CliError::ProcessStartFailed { .. }, Stage::Execute) => {
                exit_codes::COMMAND_NOT_FOUND
            }
            _ => exit_codes::ENGINE_ERROR,
        }
    }
}

/// Result type for pipeline runs
pub type Result<T> = std::result::Result<T, StageError>;

/// Tag an error with the stage it happened in
pub trait StageContext<T> {
    fn stage(self, stage: Stage) -> Result<T>;
}

impl<T, E: Into<CliError>> StageContext<T> for std::result::Result<T, E> {
    fn stage(self, stage: Stage) -> Result<T> {
        self.map_err(|e| StageError::new(stage, e))
    }
}
