//! External tool abstraction layer
//!
//! Every side effect outside the manifest and changelog files goes through the
//! [ToolRunner] trait: one program invocation in, one exit status out. The
//! concrete implementations are:
//!
//! - [system::SystemRunner]: spawns the real process and waits for it
//! - [mock::RecordingRunner]: records invocations and fails on demand, for tests
//!
//! # Usage
//!
//! ```rust
//! # use bump_release::tools::{Invocation, Tool, ToolRunner};
//! # fn example<R: ToolRunner>(runner: &R) -> bump_release::Result<()> {
//! let push = Invocation::new(Tool::Git, "git").arg("push");
//! let status = runner.run(&push)?;
//! if !status.success() {
//!     println!("push failed with {:?}", status.code);
//! }
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod system;

pub use mock::RecordingRunner;
pub use system::SystemRunner;

use crate::error::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// Role an external program plays in the release
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    /// Workspace-wide dependency lock refresh (`cargo update`)
    LockRefresh,
    /// Secondary manifest version setter (`yarn version`, `napi version`)
    SecondaryManifest,
    /// Changelog generator (`git-cliff`)
    ChangelogGenerator,
    /// Version-control client (`git`)
    Git,
    /// Release hosting client (`gh`)
    ReleaseHost,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::LockRefresh => "dependency-lock refresher",
            Tool::SecondaryManifest => "secondary-manifest version setter",
            Tool::ChangelogGenerator => "changelog generator",
            Tool::Git => "version-control client",
            Tool::ReleaseHost => "release-creation tool",
        }
    }

    /// Installed as a `.cmd` script on Windows, which `Command` cannot start
    /// without going through `cmd /C`
    pub fn is_script_shim(&self) -> bool {
        matches!(self, Tool::SecondaryManifest)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single program invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: Tool,
    pub program: String,
    pub args: Vec<String>,
    /// Working directory; `None` inherits the current one
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(tool: Tool, program: impl Into<String>) -> Self {
        Invocation {
            tool,
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// First argument, usually the subcommand (`push`, `release`, ...)
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Shell-like rendering for display. Long arguments are shortened.
    pub fn command_line(&self) -> String {
        let mut parts = vec![self.program.clone()];
        for arg in &self.args {
            parts.push(display_arg(arg));
        }
        parts.join(" ")
    }
}

fn display_arg(arg: &str) -> String {
    const MAX: usize = 60;
    let first_line = arg.lines().next().unwrap_or("");
    let mut shown: String = first_line.chars().take(MAX).collect();
    if shown.len() < arg.len() {
        shown.push('…');
    }
    if shown.is_empty() || shown.contains(char::is_whitespace) {
        format!("\"{}\"", shown)
    } else {
        shown
    }
}

/// Exit status of a finished invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolStatus {
    /// `None` when the process was terminated by a signal
    pub code: Option<i32>,
}

impl ToolStatus {
    pub fn from_code(code: i32) -> Self {
        ToolStatus { code: Some(code) }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs synchronously.
///
/// Implementations block until the program exits. A program that cannot be
/// started is an `Err`; a program that ran and failed is an `Ok` with a
/// non-success [ToolStatus].
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> Result<ToolStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_builder() {
        let inv = Invocation::new(Tool::LockRefresh, "cargo")
            .args(["update", "--workspace"])
            .current_dir("/repo");

        assert_eq!(inv.program, "cargo");
        assert_eq!(inv.args, vec!["update", "--workspace"]);
        assert_eq!(inv.cwd, Some(PathBuf::from("/repo")));
        assert_eq!(inv.subcommand(), Some("update"));
    }

    #[test]
    fn test_command_line_quotes_whitespace() {
        let inv = Invocation::new(Tool::Git, "git").args(["commit", "-m", "Bump version to v1.0.0"]);
        assert_eq!(
            inv.command_line(),
            "git commit -m \"Bump version to v1.0.0\""
        );
    }

    #[test]
    fn test_command_line_shortens_multiline_notes() {
        let inv = Invocation::new(Tool::ReleaseHost, "gh").args(["--notes", "first\nsecond"]);
        assert_eq!(inv.command_line(), "gh --notes first…");
    }

    #[test]
    fn test_command_line_empty_arg() {
        let inv = Invocation::new(Tool::ReleaseHost, "gh").args(["--notes", ""]);
        assert_eq!(inv.command_line(), "gh --notes \"\"");
    }

    #[test]
    fn test_only_secondary_manifest_tools_are_shims() {
        assert!(Tool::SecondaryManifest.is_script_shim());
        for tool in [Tool::LockRefresh, Tool::ChangelogGenerator, Tool::Git, Tool::ReleaseHost] {
            assert!(!tool.is_script_shim(), "{:?}", tool);
        }
    }

    #[test]
    fn test_tool_status() {
        assert!(ToolStatus::from_code(0).success());
        assert!(!ToolStatus::from_code(2).success());
        assert!(!ToolStatus { code: None }.success());
    }
}
