use thiserror::Error;

use crate::pipeline::Stage;
use crate::tools::Tool;

/// Unified error type for bump-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Version parsing error: {0}")]
    Parse(String),

    #[error("Missing CI credential: environment variable {variable} is not set")]
    MissingCredential { variable: String },

    #[error("{tool} failed with {}", describe_status(.exit_status))]
    ExternalTool {
        tool: Tool,
        exit_status: Option<i32>,
    },

    #[error("Failed to launch {tool}: {source}")]
    ToolLaunch {
        tool: Tool,
        #[source]
        source: std::io::Error,
    },

    #[error("No release notes found in changelog for tag {tag}")]
    ReleaseNotesNotFound { tag: String },

    #[error("Failed to create release {tag}: {}", describe_status(.exit_status))]
    ReleaseCreation {
        tag: String,
        exit_status: Option<i32>,
    },

    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git repository error: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in bump-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("exit code {}", code),
        None => "no exit code".to_string(),
    }
}

impl ReleaseError {
    /// Create a parse error with context
    pub fn parse(msg: impl Into<String>) -> Self {
        ReleaseError::Parse(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a missing credential error for an environment variable
    pub fn missing_credential(variable: impl Into<String>) -> Self {
        ReleaseError::MissingCredential {
            variable: variable.into(),
        }
    }

    /// Exit status reported by the failing external tool, if any
    pub fn tool_status(&self) -> Option<i32> {
        match self {
            ReleaseError::ExternalTool { exit_status, .. }
            | ReleaseError::ReleaseCreation { exit_status, .. } => *exit_status,
            _ => None,
        }
    }
}

/// A failure attributed to the pipeline stage in which it occurred.
///
/// Stages before the failing one have already run to completion, so the stage
/// name tells an operator which mutations (manifest edits, commits, pushes) may
/// need manual attention.
#[derive(Error, Debug)]
#[error("Stage '{stage}' failed: {cause}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub cause: ReleaseError,
}

impl PipelineError {
    pub fn new(stage: Stage, cause: ReleaseError) -> Self {
        PipelineError { stage, cause }
    }

    /// Process exit code for this failure.
    ///
    /// Propagates the failing tool's status when it fits in a process exit
    /// code, and falls back to 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self.cause.tool_status() {
            Some(code) if (1..=255).contains(&code) => code as u8,
            _ => 1,
        }
    }
}
